//! Newtype IDs for type-safe entity references.
//!
//! Document stores hand out opaque string keys while the relational store
//! uses serial integers, so IDs are carried as strings and the integer form
//! is converted at the repository boundary.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a registered storefront user.
///
/// # Example
///
/// ```rust
/// use tity_core::UserId;
///
/// let from_document = UserId::new("aZ81kQ");
/// let from_row = UserId::from(42);
///
/// assert_eq!(from_document.as_str(), "aZ81kQ");
/// assert_eq!(from_row.as_str(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new ID from any string-like key.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
