//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded in the span, Sentry scope and response)
//! 4. Session layer (tower-sessions, `PostgreSQL` or in-memory store)
//! 5. Rate limiting on `/auth` (governor)
//!
//! Handlers read session state through [`ShopSession`] and the auth
//! extractors rather than touching raw session keys.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;
pub mod shop_session;

pub use auth::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
pub use shop_session::ShopSession;
