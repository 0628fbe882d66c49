//! API handlers for the dispatch backend

mod extract;

pub mod configs;
pub mod incidents;
pub mod ratings;
pub mod staff;
pub mod zones;

pub use extract::{ValidatedJson, ValidatedPath, ValidatedQuery};

// Re-export the identity extractors for handler use
pub use crate::middleware::auth::{AdminUser, AuthenticatedUser, StaffUser};
