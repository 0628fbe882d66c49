//! Business logic services for the dispatch backend

pub mod config_service;
pub mod dispatch_service;
pub mod incident_service;
pub mod rating_service;
pub mod zone_service;

pub use config_service::ConfigService;
pub use dispatch_service::DispatchService;
pub use incident_service::{IncidentService, SEARCH_RADIUS_KEY};
pub use rating_service::RatingService;
pub use zone_service::ZoneService;
