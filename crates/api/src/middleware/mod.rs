//! HTTP middleware for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. CORS (answers preflight, allows the `Token` header)
//! 3. `TraceLayer` (`http_request` span)
//! 4. Request ID (records into the span, echoes `x-request-id`)
//!
//! Session-gated handlers additionally take the [`RequireUser`] extractor.

pub mod auth;
pub mod request_id;

pub use auth::{RequireUser, TOKEN_HEADER};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
