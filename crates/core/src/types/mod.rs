//! Core types for Tity Creations.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod message;
pub mod price;
pub mod product;
pub mod style;
pub mod username;

pub use id::UserId;
pub use message::{FlashMessage, Severity};
pub use price::Price;
pub use product::Product;
pub use style::{Style, StyleError};
pub use username::{Username, UsernameError};
