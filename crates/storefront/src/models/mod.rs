//! Domain models for storefront.
//!
//! Catalog and cart types live in `tity-core`; this module holds the
//! storefront-only user types and the session schema.

pub mod session;
pub mod user;

pub use session::{CurrentUser, keys as session_keys};
pub use user::{StoredUser, User};
