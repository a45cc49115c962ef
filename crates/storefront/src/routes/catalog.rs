//! Category listing handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use tity_core::{Product, Style};

use crate::error::AppError;
use crate::filters;
use crate::middleware::ShopSession;
use crate::routes::Layout;
use crate::state::AppState;

/// Category page template.
#[derive(Template, WebTemplate)]
#[template(path = "category.html")]
pub struct CategoryTemplate {
    pub layout: Layout,
    pub style: Style,
    pub products: Vec<Product>,
    /// Set when the listing could not be loaded.
    pub unavailable: bool,
}

/// Display the products of one style.
///
/// An unknown style is a 404. A backend outage renders an empty listing.
#[instrument(skip(state, session))]
pub async fn category(
    State(state): State<AppState>,
    session: ShopSession,
    Path(style): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let style: Style = style
        .parse()
        .map_err(|_| AppError::NotFound(format!("style {style}")))?;

    let (products, unavailable) = match state.catalog().products(style).await {
        Ok(products) => (products.as_ref().clone(), false),
        Err(e) => {
            tracing::error!(style = %style, error = %e, "Failed to load category");
            (Vec::new(), true)
        }
    };

    Ok(CategoryTemplate {
        layout: Layout::load(&session).await,
        style,
        products,
        unavailable,
    })
}
