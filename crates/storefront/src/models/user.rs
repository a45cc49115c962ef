//! User domain types.
//!
//! These types represent validated domain objects separate from storage rows
//! and documents.

use chrono::{DateTime, Utc};

use tity_core::{UserId, Username};

/// A storefront user (domain type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// A user together with the stored password value.
///
/// `password_hash` is normally an argon2 PHC string. Accounts created by the
/// first version of the shop stored the raw password instead; the auth
/// service recognizes and accepts those.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}
