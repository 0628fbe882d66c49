//! Record store ports.
//!
//! The core never caches entity state between requests; every operation
//! re-reads through these traits. Status transitions go through
//! [`IncidentStore::apply_transition`], which checks and writes the status
//! and appends the handling record as one atomic step. Rating writes carry
//! their staff aggregate change in the same step.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{
    HandlingRecord, HeatAdjustment, Incident, IncidentFilter, NewHandlingRecord, NewIncident,
    NewRating, NewStaff, Rating, RatingAdjustment, RatingPatch, StaffProfile, SystemConfig, Transition,
    TransitionOutcome, VerificationStatus, Zone, ZoneDraft,
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Incidents and their handling records.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    async fn insert_incident(&self, incident: NewIncident) -> StoreResult<Incident>;

    /// Live (non-tombstoned) incident by id.
    async fn get_incident(&self, id: Uuid) -> StoreResult<Option<Incident>>;

    /// Newest first. Returns the page and the total matching count.
    async fn list_incidents(
        &self,
        filter: &IncidentFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<Incident>, i64)>;

    async fn apply_transition(&self, transition: Transition) -> StoreResult<TransitionOutcome>;

    /// Append a record without touching status. The incident must currently
    /// be `Processing` and assigned to `record.staff_id`.
    async fn append_progress(&self, record: NewHandlingRecord) -> StoreResult<TransitionOutcome>;

    async fn list_records(&self, incident_id: Uuid) -> StoreResult<Vec<HandlingRecord>>;

    /// Returns false when no live incident matched.
    async fn tombstone_incident(&self, id: Uuid) -> StoreResult<bool>;
}

/// Staff profiles and their aggregates.
#[async_trait]
pub trait StaffStore: Send + Sync {
    /// Returns `None` if the user already holds a profile.
    async fn insert_staff(&self, staff: NewStaff) -> StoreResult<Option<StaffProfile>>;

    async fn get_staff(&self, id: Uuid) -> StoreResult<Option<StaffProfile>>;

    async fn get_staff_by_user(&self, user_id: Uuid) -> StoreResult<Option<StaffProfile>>;

    async fn set_availability(
        &self,
        id: Uuid,
        latitude: f64,
        longitude: f64,
        online: bool,
    ) -> StoreResult<Option<StaffProfile>>;

    async fn set_verification(
        &self,
        id: Uuid,
        status: VerificationStatus,
    ) -> StoreResult<Option<StaffProfile>>;

    /// Approved and online staff that carry a coordinate.
    async fn list_dispatchable(&self) -> StoreResult<Vec<StaffProfile>>;

    async fn increment_completed(&self, id: Uuid) -> StoreResult<Option<StaffProfile>>;

    async fn adjust_rating(
        &self,
        id: Uuid,
        adjustment: RatingAdjustment,
    ) -> StoreResult<Option<StaffProfile>>;
}

/// Risk zones.
#[async_trait]
pub trait ZoneStore: Send + Sync {
    async fn insert_zone(&self, draft: ZoneDraft) -> StoreResult<Zone>;

    async fn get_zone(&self, id: Uuid) -> StoreResult<Option<Zone>>;

    async fn update_zone(&self, id: Uuid, draft: ZoneDraft) -> StoreResult<Option<Zone>>;

    async fn delete_zone(&self, id: Uuid) -> StoreResult<bool>;

    async fn list_active_zones(&self) -> StoreResult<Vec<Zone>>;

    async fn adjust_heat(&self, id: Uuid, adjustment: HeatAdjustment) -> StoreResult<Option<Zone>>;
}

/// Ratings. At most one live rating per (incident, staff).
///
/// Every write folds its score change into the rated staff member's
/// aggregate atomically with the rating row.
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Returns `None` when a live rating already exists for the pair.
    async fn insert_rating(&self, rating: NewRating) -> StoreResult<Option<Rating>>;

    async fn get_rating(&self, id: Uuid) -> StoreResult<Option<Rating>>;

    async fn rating_for_incident(&self, incident_id: Uuid) -> StoreResult<Option<Rating>>;

    async fn ratings_for_staff(&self, staff_id: Uuid) -> StoreResult<Vec<Rating>>;

    /// A changed score replaces the old one in the aggregate.
    async fn update_rating(&self, id: Uuid, patch: RatingPatch) -> StoreResult<Option<Rating>>;

    /// Takes the score back out of the aggregate.
    async fn tombstone_rating(&self, id: Uuid) -> StoreResult<bool>;
}

/// Key/value runtime settings.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Returns `None` if the key is taken.
    async fn insert_config(&self, entry: SystemConfig) -> StoreResult<Option<SystemConfig>>;

    async fn get_config(&self, key: &str) -> StoreResult<Option<SystemConfig>>;

    async fn list_configs(&self) -> StoreResult<Vec<SystemConfig>>;

    async fn update_config(&self, entry: SystemConfig) -> StoreResult<Option<SystemConfig>>;

    async fn delete_config(&self, key: &str) -> StoreResult<bool>;
}

/// Every port the services need, behind one handle.
pub trait Store: IncidentStore + StaffStore + ZoneStore + RatingStore + ConfigStore {}

impl<T> Store for T where T: IncidentStore + StaffStore + ZoneStore + RatingStore + ConfigStore {}

pub type SharedStore = Arc<dyn Store>;
