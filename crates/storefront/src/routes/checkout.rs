//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Local;
use tracing::instrument;

use tity_core::{Cart, FlashMessage};

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{RequireAuth, ShopSession};
use crate::routes::Layout;
use crate::services::checkout::{CheckoutOutcome, CheckoutService};
use crate::services::receipt::Receipt;
use crate::state::AppState;

/// Checkout summary template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: Cart,
    /// Whether this is a "buy now" purchase.
    pub buy_now: bool,
    pub flash: Option<FlashMessage>,
}

/// Display the order summary for the active cart.
#[instrument(skip(session, user), fields(user_id = %user.id))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    session: ShopSession,
) -> Result<Response, AppError> {
    let carts = session.carts().await?;

    if carts.active().is_empty() {
        session.flash(&FlashMessage::info("Tu carrito está vacío")).await?;
        return Ok(Redirect::to("/cart").into_response());
    }

    let flash = session.take_flash().await?;

    Ok(CheckoutTemplate {
        layout: Layout::load(&session).await,
        buy_now: carts.uses_temp(),
        cart: carts.active().clone(),
        flash,
    }
    .into_response())
}

/// Confirm the purchase and download the receipt.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn confirm(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: ShopSession,
) -> Result<Response, AppError> {
    let mut carts = session.carts().await?;

    let outcome = CheckoutService::new(state.repo())
        .confirm(&mut carts, &user.username, Local::now().fixed_offset())
        .await;

    session.save_carts(&carts).await?;

    match outcome {
        CheckoutOutcome::EmptyCart(message) | CheckoutOutcome::Adjusted(message) => {
            session.flash(&message).await?;
            Ok(Redirect::to("/cart").into_response())
        }
        CheckoutOutcome::Completed { receipt, failures } => {
            state.catalog().invalidate_purchased(receipt.items()).await;

            if !failures.is_empty() {
                let products: Vec<&str> = failures.iter().map(|f| f.product.as_str()).collect();
                tracing::error!(
                    products = ?products,
                    "Purchase completed with stock left unchanged for some products"
                );
            }

            add_breadcrumb("checkout", "Purchase completed", None);
            Ok(receipt_response(&receipt))
        }
    }
}

/// Plain-text attachment response for a receipt.
fn receipt_response(receipt: &Receipt) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", receipt.filename()),
            ),
        ],
        receipt.render(),
    )
        .into_response()
}
