//! Middleware for the dispatch API
//!
//! Request tracing and CORS layers, plus the bearer-token extractors handlers use to
//! obtain the caller's identity.

pub mod auth;
mod cors;
mod tracing;

pub use self::cors::cors_layer;
pub use self::tracing::request_tracing;
