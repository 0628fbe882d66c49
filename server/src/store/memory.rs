//! In-process record store.
//!
//! One mutex guards all tables, so every trait method is atomic with respect
//! to every other. Used for local development and the test suite.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ConfigStore, IncidentStore, RatingStore, StaffStore, ZoneStore};
use crate::error::StoreResult;
use crate::models::{
    HandlingRecord, HeatAdjustment, Incident, IncidentFilter, IncidentStatus, NewHandlingRecord,
    NewIncident, NewRating, NewStaff, Rating, RatingAdjustment, RatingPatch, RecordState, StaffProfile,
    SystemConfig, Transition, TransitionOutcome, VerificationStatus, Zone, ZoneDraft,
};

#[derive(Default)]
struct Tables {
    incidents: HashMap<Uuid, Incident>,
    records: Vec<HandlingRecord>,
    staff: HashMap<Uuid, StaffProfile>,
    zones: HashMap<Uuid, Zone>,
    ratings: HashMap<Uuid, Rating>,
    configs: HashMap<String, SystemConfig>,
}

impl Tables {
    fn live_incident(&self, id: Uuid) -> Option<&Incident> {
        self.incidents.get(&id).filter(|incident| incident.is_live())
    }

    fn staff_is_busy(&self, staff_id: Uuid) -> bool {
        self.incidents.values().any(|incident| {
            incident.is_live()
                && incident.status == IncidentStatus::Processing
                && incident.assigned_staff == Some(staff_id)
        })
    }

    fn adjust_staff_rating(&mut self, staff_id: Uuid, adjustment: RatingAdjustment) {
        if let Some(staff) = self.staff.get_mut(&staff_id) {
            let (average, count) = adjustment.apply(staff.average_rating, staff.rating_count);
            staff.average_rating = average;
            staff.rating_count = count;
            staff.updated_at = Utc::now();
        }
    }

    fn push_record(&mut self, record: NewHandlingRecord) {
        self.records.push(HandlingRecord {
            id: Uuid::new_v4(),
            incident_id: record.incident_id,
            actor_id: record.actor_id,
            staff_id: record.staff_id,
            action: record.action,
            note: record.note,
            created_at: Utc::now(),
        });
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IncidentStore for MemoryStore {
    async fn insert_incident(&self, incident: NewIncident) -> StoreResult<Incident> {
        let now = Utc::now();
        let row = Incident {
            id: Uuid::new_v4(),
            reporter_id: incident.reporter_id,
            category: incident.category,
            description: incident.description,
            address: incident.address,
            latitude: incident.coordinate.latitude,
            longitude: incident.coordinate.longitude,
            status: IncidentStatus::Pending,
            assigned_staff: None,
            record_state: RecordState::Active,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.incidents.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_incident(&self, id: Uuid) -> StoreResult<Option<Incident>> {
        Ok(self.tables.lock().await.live_incident(id).cloned())
    }

    async fn list_incidents(
        &self,
        filter: &IncidentFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<Incident>, i64)> {
        let tables = self.tables.lock().await;
        let mut matching: Vec<&Incident> = tables
            .incidents
            .values()
            .filter(|incident| incident.is_live())
            .filter(|incident| filter.status.map_or(true, |s| incident.status == s))
            .filter(|incident| filter.reporter_id.map_or(true, |r| incident.reporter_id == r))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn apply_transition(&self, transition: Transition) -> StoreResult<TransitionOutcome> {
        let mut tables = self.tables.lock().await;

        let Some(current) = tables.live_incident(transition.incident_id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        if !current.status.can_transition_to(transition.next) {
            return Ok(TransitionOutcome::Rejected(current.status));
        }
        if let Some(required) = transition.require_assignee {
            if current.assigned_staff != Some(required) {
                return Ok(TransitionOutcome::NotAssignee);
            }
        }
        if let Some(staff_id) = transition.assign_staff {
            let Some(staff) = tables.staff.get(&staff_id) else {
                return Ok(TransitionOutcome::StaffNotFound(staff_id));
            };
            if !staff.is_dispatchable() {
                return Ok(TransitionOutcome::StaffUnavailable);
            }
            if tables.staff_is_busy(staff_id) {
                return Ok(TransitionOutcome::StaffBusy);
            }
        }

        let Some(incident) = tables.incidents.get_mut(&transition.incident_id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        incident.status = transition.next;
        if let Some(staff_id) = transition.assign_staff {
            incident.assigned_staff = Some(staff_id);
        }
        incident.updated_at = Utc::now();
        let updated = incident.clone();

        if transition.credit_completion {
            if let Some(staff) = updated
                .assigned_staff
                .and_then(|staff_id| tables.staff.get_mut(&staff_id))
            {
                staff.completed_orders += 1;
                staff.updated_at = Utc::now();
            }
        }

        tables.push_record(transition.record);
        Ok(TransitionOutcome::Applied(updated))
    }

    async fn append_progress(&self, record: NewHandlingRecord) -> StoreResult<TransitionOutcome> {
        let mut tables = self.tables.lock().await;

        let Some(current) = tables.live_incident(record.incident_id) else {
            return Ok(TransitionOutcome::NotFound);
        };
        if current.status != IncidentStatus::Processing {
            return Ok(TransitionOutcome::Rejected(current.status));
        }
        if record.staff_id.is_none() || current.assigned_staff != record.staff_id {
            return Ok(TransitionOutcome::NotAssignee);
        }

        let incident = current.clone();
        tables.push_record(record);
        Ok(TransitionOutcome::Applied(incident))
    }

    async fn list_records(&self, incident_id: Uuid) -> StoreResult<Vec<HandlingRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .records
            .iter()
            .filter(|record| record.incident_id == incident_id)
            .cloned()
            .collect())
    }

    async fn tombstone_incident(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables.incidents.get_mut(&id) {
            Some(incident) if incident.is_live() => {
                incident.record_state = RecordState::Tombstoned;
                incident.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl StaffStore for MemoryStore {
    async fn insert_staff(&self, staff: NewStaff) -> StoreResult<Option<StaffProfile>> {
        let mut tables = self.tables.lock().await;
        if tables.staff.values().any(|existing| existing.user_id == staff.user_id) {
            return Ok(None);
        }
        let now = Utc::now();
        let profile = StaffProfile {
            id: Uuid::new_v4(),
            user_id: staff.user_id,
            company_name: staff.company_name,
            license_number: staff.license_number,
            cert_files: staff.cert_files,
            verification: VerificationStatus::Pending,
            online: false,
            current_latitude: None,
            current_longitude: None,
            completed_orders: 0,
            rating_count: 0,
            average_rating: 0.0,
            created_at: now,
            updated_at: now,
        };
        tables.staff.insert(profile.id, profile.clone());
        Ok(Some(profile))
    }

    async fn get_staff(&self, id: Uuid) -> StoreResult<Option<StaffProfile>> {
        Ok(self.tables.lock().await.staff.get(&id).cloned())
    }

    async fn get_staff_by_user(&self, user_id: Uuid) -> StoreResult<Option<StaffProfile>> {
        let tables = self.tables.lock().await;
        Ok(tables.staff.values().find(|staff| staff.user_id == user_id).cloned())
    }

    async fn set_availability(
        &self,
        id: Uuid,
        latitude: f64,
        longitude: f64,
        online: bool,
    ) -> StoreResult<Option<StaffProfile>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.staff.get_mut(&id).map(|staff| {
            staff.current_latitude = Some(latitude);
            staff.current_longitude = Some(longitude);
            staff.online = online;
            staff.updated_at = Utc::now();
            staff.clone()
        }))
    }

    async fn set_verification(
        &self,
        id: Uuid,
        status: VerificationStatus,
    ) -> StoreResult<Option<StaffProfile>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.staff.get_mut(&id).map(|staff| {
            staff.verification = status;
            staff.updated_at = Utc::now();
            staff.clone()
        }))
    }

    async fn list_dispatchable(&self) -> StoreResult<Vec<StaffProfile>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .staff
            .values()
            .filter(|staff| staff.is_dispatchable())
            .cloned()
            .collect())
    }

    async fn increment_completed(&self, id: Uuid) -> StoreResult<Option<StaffProfile>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.staff.get_mut(&id).map(|staff| {
            staff.completed_orders += 1;
            staff.updated_at = Utc::now();
            staff.clone()
        }))
    }

    async fn adjust_rating(
        &self,
        id: Uuid,
        adjustment: RatingAdjustment,
    ) -> StoreResult<Option<StaffProfile>> {
        let mut tables = self.tables.lock().await;
        tables.adjust_staff_rating(id, adjustment);
        Ok(tables.staff.get(&id).cloned())
    }
}

#[async_trait]
impl ZoneStore for MemoryStore {
    async fn insert_zone(&self, draft: ZoneDraft) -> StoreResult<Zone> {
        let now = Utc::now();
        let zone = Zone {
            id: Uuid::new_v4(),
            name: draft.name,
            description: draft.description,
            danger_level: draft.danger_level,
            latitude: draft.center.latitude,
            longitude: draft.center.longitude,
            radius_meters: draft.radius_meters,
            heat_level: 0,
            active: draft.active,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.zones.insert(zone.id, zone.clone());
        Ok(zone)
    }

    async fn get_zone(&self, id: Uuid) -> StoreResult<Option<Zone>> {
        Ok(self.tables.lock().await.zones.get(&id).cloned())
    }

    async fn update_zone(&self, id: Uuid, draft: ZoneDraft) -> StoreResult<Option<Zone>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.zones.get_mut(&id).map(|zone| {
            zone.name = draft.name;
            zone.description = draft.description;
            zone.danger_level = draft.danger_level;
            zone.latitude = draft.center.latitude;
            zone.longitude = draft.center.longitude;
            zone.radius_meters = draft.radius_meters;
            zone.active = draft.active;
            zone.updated_at = Utc::now();
            zone.clone()
        }))
    }

    async fn delete_zone(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.lock().await.zones.remove(&id).is_some())
    }

    async fn list_active_zones(&self) -> StoreResult<Vec<Zone>> {
        let tables = self.tables.lock().await;
        let mut zones: Vec<Zone> = tables.zones.values().filter(|z| z.active).cloned().collect();
        zones.sort_by_key(|zone| zone.id);
        Ok(zones)
    }

    async fn adjust_heat(&self, id: Uuid, adjustment: HeatAdjustment) -> StoreResult<Option<Zone>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.zones.get_mut(&id).map(|zone| {
            zone.heat_level = adjustment.apply(zone.heat_level);
            zone.updated_at = Utc::now();
            zone.clone()
        }))
    }
}

#[async_trait]
impl RatingStore for MemoryStore {
    async fn insert_rating(&self, rating: NewRating) -> StoreResult<Option<Rating>> {
        let mut tables = self.tables.lock().await;
        let duplicate = tables.ratings.values().any(|existing| {
            existing.record_state == RecordState::Active
                && existing.incident_id == rating.incident_id
                && existing.staff_id == rating.staff_id
        });
        if duplicate {
            return Ok(None);
        }

        let now = Utc::now();
        let row = Rating {
            id: Uuid::new_v4(),
            incident_id: rating.incident_id,
            rater_id: rating.rater_id,
            staff_id: rating.staff_id,
            score: rating.score,
            comment: rating.comment,
            is_public: rating.is_public,
            record_state: RecordState::Active,
            created_at: now,
            updated_at: now,
        };
        tables.ratings.insert(row.id, row.clone());
        tables.adjust_staff_rating(row.staff_id, RatingAdjustment::Add(row.score));
        Ok(Some(row))
    }

    async fn get_rating(&self, id: Uuid) -> StoreResult<Option<Rating>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .ratings
            .get(&id)
            .filter(|r| r.record_state == RecordState::Active)
            .cloned())
    }

    async fn rating_for_incident(&self, incident_id: Uuid) -> StoreResult<Option<Rating>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .ratings
            .values()
            .find(|r| r.record_state == RecordState::Active && r.incident_id == incident_id)
            .cloned())
    }

    async fn ratings_for_staff(&self, staff_id: Uuid) -> StoreResult<Vec<Rating>> {
        let tables = self.tables.lock().await;
        let mut ratings: Vec<Rating> = tables
            .ratings
            .values()
            .filter(|r| r.record_state == RecordState::Active && r.staff_id == staff_id)
            .cloned()
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(ratings)
    }

    async fn update_rating(&self, id: Uuid, patch: RatingPatch) -> StoreResult<Option<Rating>> {
        let mut tables = self.tables.lock().await;
        let Some(rating) = tables
            .ratings
            .get_mut(&id)
            .filter(|r| r.record_state == RecordState::Active)
        else {
            return Ok(None);
        };

        let old = rating.score;
        if let Some(score) = patch.score {
            rating.score = score;
        }
        if let Some(comment) = patch.comment {
            rating.comment = comment;
        }
        if let Some(is_public) = patch.is_public {
            rating.is_public = is_public;
        }
        rating.updated_at = Utc::now();
        let updated = rating.clone();

        if updated.score != old {
            tables.adjust_staff_rating(
                updated.staff_id,
                RatingAdjustment::Replace {
                    old,
                    new: updated.score,
                },
            );
        }
        Ok(Some(updated))
    }

    async fn tombstone_rating(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        let (staff_id, score) = match tables.ratings.get_mut(&id) {
            Some(rating) if rating.record_state == RecordState::Active => {
                rating.record_state = RecordState::Tombstoned;
                rating.updated_at = Utc::now();
                (rating.staff_id, rating.score)
            }
            _ => return Ok(false),
        };
        tables.adjust_staff_rating(staff_id, RatingAdjustment::Remove(score));
        Ok(true)
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn insert_config(&self, entry: SystemConfig) -> StoreResult<Option<SystemConfig>> {
        let mut tables = self.tables.lock().await;
        if tables.configs.contains_key(&entry.key) {
            return Ok(None);
        }
        tables.configs.insert(entry.key.clone(), entry.clone());
        Ok(Some(entry))
    }

    async fn get_config(&self, key: &str) -> StoreResult<Option<SystemConfig>> {
        Ok(self.tables.lock().await.configs.get(key).cloned())
    }

    async fn list_configs(&self) -> StoreResult<Vec<SystemConfig>> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<SystemConfig> = tables.configs.values().cloned().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    async fn update_config(&self, entry: SystemConfig) -> StoreResult<Option<SystemConfig>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.configs.get_mut(&entry.key).map(|existing| {
            existing.value = entry.value;
            existing.remark = entry.remark;
            existing.updated_at = Utc::now();
            existing.clone()
        }))
    }

    async fn delete_config(&self, key: &str) -> StoreResult<bool> {
        Ok(self.tables.lock().await.configs.remove(key).is_some())
    }
}
