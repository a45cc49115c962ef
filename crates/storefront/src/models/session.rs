//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};

use tity_core::{UserId, Username};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's store ID.
    pub id: UserId,
    /// User's login name (printed on receipts).
    pub username: Username,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the persistent multi-item cart.
    pub const CART: &str = "cart";

    /// Key for the single-item "buy now" cart.
    pub const TEMP_CART: &str = "temp_cart";

    /// Key for the pending flash message.
    pub const FLASH: &str = "flash";
}
