//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Username/password accounts (argon2)
//! - `cart` - Stock-aware cart mutations
//! - `catalog` - Cached category listings
//! - `checkout` - Final validation, stock decrement and receipt
//! - `receipt` - Plain-text purchase receipt

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod receipt;
