//! Authentication route handlers.
//!
//! Form errors redirect back to the form with a short `error` code that the
//! page turns into a message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::safe_next;
use crate::middleware::{OptionalAuth, ShopSession, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::models::user::User;
use crate::routes::Layout;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
    pub next: Option<String>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error display and post-login redirect.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub error: Option<String>,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub error: Option<String>,
    pub next: String,
}

/// Error code carried in the redirect back to a form.
fn error_code(err: &AuthError) -> &'static str {
    match err {
        AuthError::InvalidUsername(_) => "username",
        AuthError::InvalidCredentials => "credentials",
        AuthError::UserAlreadyExists => "username_taken",
        AuthError::WeakPassword(_) => "password_too_short",
        AuthError::PasswordMismatch => "password_mismatch",
        AuthError::Repository(_) | AuthError::PasswordHash => "unavailable",
    }
}

/// Message shown for an error code.
fn error_message(code: &str) -> String {
    match code {
        "username" => "El usuario debe tener de 3 a 32 caracteres: letras, números, punto, guion o guion bajo".to_owned(),
        "credentials" => "Usuario o contraseña incorrectos".to_owned(),
        "username_taken" => "Ese usuario ya existe".to_owned(),
        "password_too_short" => "La contraseña debe tener al menos 8 caracteres".to_owned(),
        "password_mismatch" => "Las contraseñas no coinciden".to_owned(),
        "session" => "No se pudo iniciar la sesión, intenta de nuevo".to_owned(),
        _ => "No se pudo completar la operación, intenta más tarde".to_owned(),
    }
}

fn form_redirect(path: &str, code: &str, next: &str) -> Redirect {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("error", code)
        .append_pair("next", next)
        .finish();
    Redirect::to(&format!("{path}?{query}"))
}

/// Store the user in the session and go to `next`.
async fn log_in(session: &ShopSession, user: User, next: &str) -> Result<Redirect, AppError> {
    set_sentry_user(&user.id, Some(user.username.as_str()));
    let current = CurrentUser {
        id: user.id,
        username: user.username,
    };

    if let Err(e) = set_current_user(session.session(), &current).await {
        tracing::error!(error = %e, "Failed to set session");
        return Ok(form_redirect("/auth/login", "session", next));
    }

    Ok(Redirect::to(next))
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
///
/// A user who is already logged in goes straight to `next`.
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    session: ShopSession,
    Query(query): Query<MessageQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref());
    if user.is_some() {
        return Redirect::to(next).into_response();
    }

    LoginTemplate {
        layout: Layout::load(&session).await,
        error: query.error.as_deref().map(error_message),
        next: next.to_owned(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: ShopSession,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, AppError> {
    let next = safe_next(form.next.as_deref());

    match AuthService::new(state.repo())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => log_in(&session, user, next).await,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            Ok(form_redirect("/auth/login", error_code(&e), next))
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    OptionalAuth(user): OptionalAuth,
    session: ShopSession,
    Query(query): Query<MessageQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref());
    if user.is_some() {
        return Redirect::to(next).into_response();
    }

    RegisterTemplate {
        layout: Layout::load(&session).await,
        error: query.error.as_deref().map(error_message),
        next: next.to_owned(),
    }
    .into_response()
}

/// Handle registration form submission.
///
/// A successful registration logs the new user in.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    session: ShopSession,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, AppError> {
    let next = safe_next(form.next.as_deref());

    match AuthService::new(state.repo())
        .register(&form.username, &form.password, &form.password_confirm)
        .await
    {
        Ok(user) => log_in(&session, user, next).await,
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            Ok(form_redirect("/auth/register", error_code(&e), next))
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Log out, keeping the carts.
pub async fn logout(session: ShopSession) -> Result<Redirect, AppError> {
    clear_current_user(session.session()).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_has_a_distinct_message() {
        let codes = [
            "username",
            "credentials",
            "username_taken",
            "password_too_short",
            "password_mismatch",
            "session",
        ];
        let fallback = error_message("unavailable");
        for code in codes {
            assert_ne!(error_message(code), fallback, "{code}");
        }
    }

    #[test]
    fn test_form_redirect_encodes_next() {
        let response = form_redirect("/auth/login", "credentials", "/checkout").into_response();
        assert_eq!(
            response.headers()["location"],
            "/auth/login?error=credentials&next=%2Fcheckout"
        );
    }
}
