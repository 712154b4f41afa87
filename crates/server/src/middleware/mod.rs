//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Rate limiting on `/login` only (governor)
//!
//! Authentication is an extractor ([`RequireAuth`]) rather than a layer, so
//! public routes need no opt-out.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::RequireAuth;
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
