//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /about                  - About the shop
//! GET  /contact                - Contact page
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (backend ping)
//!
//! # Catalog
//! GET  /{style}                - Category listing (hippie, gotico, colorido, minimalista)
//!
//! # Cart
//! GET  /cart                   - Cart page (shows and clears the flash message)
//! POST /cart/add               - Add to cart
//! POST /cart/buy-now           - Single-item cart, then checkout
//! POST /cart/update            - Reconcile quantity against stock
//! POST /cart/remove            - Remove item
//!
//! # Checkout (requires auth)
//! GET  /checkout               - Order summary
//! POST /checkout/confirm       - Validate, purchase, download receipt
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod pages;

use axum::{
    Router,
    routing::{get, post},
};

use tity_core::Style;

use crate::middleware::{ShopSession, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route("/contact", get(pages::contact))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/cart", get(cart::show))
        .route("/cart/add", post(cart::add))
        .route("/cart/buy-now", post(cart::buy_now))
        .route("/cart/update", post(cart::update))
        .route("/cart/remove", post(cart::remove))
        .route("/checkout", get(checkout::show))
        .route("/checkout/confirm", post(checkout::confirm))
        .nest("/auth", auth_routes().layer(auth_rate_limiter()))
        .route("/{style}", get(catalog::category))
}

/// Data every page layout needs.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Logged-in username.
    pub user: Option<String>,
    /// Units in the persistent cart.
    pub cart_count: u32,
    pub styles: [Style; 4],
}

impl Layout {
    /// Build the layout from the session, treating unreadable data as empty.
    pub async fn load(session: &ShopSession) -> Self {
        let user = session.current_user().await.ok().flatten();
        let cart_count = session.cart().await.map(|c| c.item_count()).unwrap_or(0);

        Self {
            user: user.map(|u| u.username.into_inner()),
            cart_count,
            styles: Style::ALL,
        }
    }
}
