//! Tity Creations Core - Shared domain types.
//!
//! This crate provides the types used across the Tity Creations components:
//! - `storefront` - Public-facing shop (catalog, cart, checkout)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure cart logic - no I/O, no
//! database access, no HTTP clients. Stock lookups and persistence live in
//! the storefront crate behind the `ProductRepository` trait.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, usernames, styles and messages
//! - [`cart`] - Session cart model and its mutation primitives

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartItem, coerce_quantity};
pub use types::*;
