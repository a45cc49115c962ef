//! Static page handlers: home, about, contact.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::filters;
use crate::middleware::ShopSession;
use crate::routes::Layout;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub layout: Layout,
}

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub layout: Layout,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/contact.html")]
pub struct ContactTemplate {
    pub layout: Layout,
}

/// Display the home page.
#[instrument(skip(session))]
pub async fn home(session: ShopSession) -> impl IntoResponse {
    HomeTemplate {
        layout: Layout::load(&session).await,
    }
}

/// Display the about page.
pub async fn about(session: ShopSession) -> impl IntoResponse {
    AboutTemplate {
        layout: Layout::load(&session).await,
    }
}

/// Display the contact page.
pub async fn contact(session: ShopSession) -> impl IntoResponse {
    ContactTemplate {
        layout: Layout::load(&session).await,
    }
}
