//! Bearer-token authentication
//!
//! Identities are issued by an external provider; this crate only mints
//! tokens for tooling and verifies the ones presented on each request.
//! - HS256 JWT generation and validation
//! - Claims carry the user id and role flag

mod jwt;

pub use jwt::{generate_access_token, verify_token, Claims, JwtKeys};
