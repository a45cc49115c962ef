//! Per-request view of the shopper's session.
//!
//! Wraps the `tower-sessions` handle with typed accessors for the two
//! carts, the pending flash message and the logged-in user.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tower_sessions::session::Error;

use tity_core::{Cart, FlashMessage};

use crate::models::{CurrentUser, session_keys};
use crate::services::checkout::SessionCarts;

/// Typed session accessor, extracted in handlers.
#[derive(Debug, Clone)]
pub struct ShopSession(Session);

impl ShopSession {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self(session)
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.0
    }

    /// The persistent cart (empty if none was saved yet).
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails or holds malformed data.
    pub async fn cart(&self) -> Result<Cart, Error> {
        Ok(self.0.get::<Cart>(session_keys::CART).await?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save_cart(&self, cart: &Cart) -> Result<(), Error> {
        self.0.insert(session_keys::CART, cart).await
    }

    /// The "buy now" cart, if one is pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails or holds malformed data.
    pub async fn temp_cart(&self) -> Result<Option<Cart>, Error> {
        self.0.get::<Cart>(session_keys::TEMP_CART).await
    }

    /// Store or delete the "buy now" cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save_temp_cart(&self, cart: Option<&Cart>) -> Result<(), Error> {
        match cart {
            Some(cart) => self.0.insert(session_keys::TEMP_CART, cart).await,
            None => {
                self.0.remove::<Cart>(session_keys::TEMP_CART).await?;
                Ok(())
            }
        }
    }

    /// Drop a pending "buy now" cart.
    ///
    /// Returns whether one was pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or modified.
    pub async fn discard_temp_cart(&self) -> Result<bool, Error> {
        if self.temp_cart().await?.is_none() {
            return Ok(false);
        }
        self.save_temp_cart(None).await?;
        Ok(true)
    }

    /// Both carts.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails or holds malformed data.
    pub async fn carts(&self) -> Result<SessionCarts, Error> {
        Ok(SessionCarts {
            cart: self.cart().await?,
            temp: self.temp_cart().await?,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save_carts(&self, carts: &SessionCarts) -> Result<(), Error> {
        self.save_cart(&carts.cart).await?;
        self.save_temp_cart(carts.temp.as_ref()).await
    }

    /// Replace the pending flash message.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn flash(&self, message: &FlashMessage) -> Result<(), Error> {
        self.0.insert(session_keys::FLASH, message).await
    }

    /// Take the pending flash message, clearing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn take_flash(&self) -> Result<Option<FlashMessage>, Error> {
        self.0.remove::<FlashMessage>(session_keys::FLASH).await
    }

    /// The logged-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails or holds malformed data.
    pub async fn current_user(&self) -> Result<Option<CurrentUser>, Error> {
        self.0.get::<CurrentUser>(session_keys::CURRENT_USER).await
    }
}

impl<S> FromRequestParts<S> for ShopSession
where
    S: Send + Sync,
{
    type Rejection = <Session as FromRequestParts<S>>::Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Session::from_request_parts(parts, state).await.map(Self)
    }
}
