//! Cart route handlers.
//!
//! Every mutation stores its outcome as the session flash message and
//! redirects; the cart page shows the message once and clears it.
//!
//! Coming back to the cart ends a "buy now" purchase: the pending
//! single-item cart is dropped so checkout uses the persistent cart again.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use tity_core::{Cart, FlashMessage, Style, coerce_quantity};

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::ShopSession;
use crate::routes::Layout;
use crate::services::cart::{CartService, ProductChoice, remove_item};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Add-to-cart and buy-now form data.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub style: String,
    pub name: String,
    pub quantity: Option<String>,
}

/// Quantity update form data.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub name: String,
    pub quantity: Option<String>,
}

/// Remove form data.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub name: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub layout: Layout,
    pub cart: Cart,
    pub flash: Option<FlashMessage>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip(session))]
pub async fn show(session: ShopSession) -> Result<impl IntoResponse, AppError> {
    if session.discard_temp_cart().await? {
        tracing::debug!("Dropped abandoned buy-now cart");
    }
    let cart = session.cart().await?;
    let flash = session.take_flash().await?;

    Ok(CartTemplate {
        layout: Layout::load(&session).await,
        cart,
        flash,
    })
}

/// Resolve a product form against the catalog.
///
/// Prices always come from the catalog, never from the form.
async fn choose(state: &AppState, form: &ProductForm) -> Result<ProductChoice, FlashMessage> {
    let style: Style = form
        .style
        .parse()
        .map_err(|_| FlashMessage::error("Categoría desconocida"))?;

    match state.catalog().find(style, &form.name).await {
        Ok(Some(product)) => Ok(ProductChoice {
            name: product.name,
            unit_price: product.price,
            style: Some(style),
            image: product.image,
        }),
        Ok(None) => Err(FlashMessage::error(format!(
            "«{}» ya no está en el catálogo",
            form.name
        ))),
        Err(e) => {
            tracing::error!(style = %style, product = %form.name, error = %e, "Catalog lookup failed");
            Err(FlashMessage::error(
                "El catálogo no está disponible en este momento, intenta más tarde",
            ))
        }
    }
}

/// Add a product to the persistent cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: ShopSession,
    Form(form): Form<ProductForm>,
) -> Result<Redirect, AppError> {
    let message = match choose(&state, &form).await {
        Ok(choice) => {
            session.discard_temp_cart().await?;
            let mut cart = session.cart().await?;
            let quantity = coerce_quantity(form.quantity.as_deref());
            let message = CartService::new(state.repo())
                .add(&mut cart, choice, quantity)
                .await;
            session.save_cart(&cart).await?;
            add_breadcrumb("cart", "Added to cart", Some(&[("product", form.name.as_str())]));
            message
        }
        Err(message) => message,
    };

    session.flash(&message).await?;
    Ok(Redirect::to("/cart"))
}

/// Put a single product in the "buy now" cart and go to checkout.
///
/// The persistent cart is left alone.
#[instrument(skip(state, session))]
pub async fn buy_now(
    State(state): State<AppState>,
    session: ShopSession,
    Form(form): Form<ProductForm>,
) -> Result<Redirect, AppError> {
    let choice = match choose(&state, &form).await {
        Ok(choice) => choice,
        Err(message) => {
            session.flash(&message).await?;
            return Ok(Redirect::to("/cart"));
        }
    };

    let quantity = coerce_quantity(form.quantity.as_deref());
    let (temp, message) = CartService::new(state.repo())
        .buy_now(choice, quantity)
        .await;

    if temp.is_empty() {
        session.flash(&message).await?;
        return Ok(Redirect::to("/cart"));
    }

    session.save_temp_cart(Some(&temp)).await?;
    if message.severity != tity_core::Severity::Success {
        session.flash(&message).await?;
    }
    Ok(Redirect::to("/checkout"))
}

/// Change the quantity of a cart line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: ShopSession,
    Form(form): Form<UpdateForm>,
) -> Result<Redirect, AppError> {
    let mut cart = session.cart().await?;
    let quantity = coerce_quantity(form.quantity.as_deref());

    if let Some(message) = CartService::new(state.repo())
        .update_quantity(&mut cart, &form.name, quantity)
        .await
    {
        session.save_cart(&cart).await?;
        session.flash(&message).await?;
    }

    Ok(Redirect::to("/cart"))
}

/// Remove a cart line.
#[instrument(skip(session))]
pub async fn remove(session: ShopSession, Form(form): Form<RemoveForm>) -> Result<Redirect, AppError> {
    let mut cart = session.cart().await?;

    if let Some(message) = remove_item(&mut cart, &form.name) {
        session.save_cart(&cart).await?;
        session.flash(&message).await?;
    }

    Ok(Redirect::to("/cart"))
}
