//! Incident lifecycle.
//!
//! Every status change goes through [`IncidentStore::apply_transition`], so
//! the guard checks, the status write, the handling record and any
//! completion credit land together or not at all.
//!
//! [`IncidentStore::apply_transition`]: crate::store::IncidentStore::apply_transition

use tracing::{info, warn};
use uuid::Uuid;

use super::{ConfigService, DispatchService, ZoneService};
use crate::error::DispatchError;
use crate::geo::Coordinate;
use crate::models::{
    HandlingAction, HandlingRecord, Identity, Incident, IncidentFilter, IncidentReport,
    IncidentStatus, NewHandlingRecord, NewIncident, PaginatedResponse, PaginationParams,
    RecordProgressRequest, ReportIncidentRequest, Transition, TransitionOutcome,
};
use crate::store::SharedStore;

/// Runtime override for the candidate search radius.
pub const SEARCH_RADIUS_KEY: &str = "dispatch.search_radius_meters";

#[derive(Clone)]
pub struct IncidentService {
    store: SharedStore,
    dispatch: DispatchService,
    zones: ZoneService,
    config: ConfigService,
    default_radius_meters: f64,
}

impl IncidentService {
    /// Create new incident service instance
    pub fn new(
        store: SharedStore,
        dispatch: DispatchService,
        zones: ZoneService,
        config: ConfigService,
        default_radius_meters: f64,
    ) -> Self {
        Self {
            store,
            dispatch,
            zones,
            config,
            default_radius_meters,
        }
    }

    /// Open a new incident in `Pending`. No handling record is written; the
    /// incident row is the creation event.
    ///
    /// The zone check and candidate count are read before the insert, so a
    /// failed report stores nothing.
    pub async fn report(
        &self,
        identity: &Identity,
        request: ReportIncidentRequest,
    ) -> Result<IncidentReport, DispatchError> {
        let coordinate = Coordinate::new(request.latitude, request.longitude)?;

        let zone_check = self.zones.check_point(coordinate).await?;
        let radius = self.search_radius().await?;
        let nearby_staff = self.dispatch.find_candidates(coordinate, radius).await?.len();

        let incident = self
            .store
            .insert_incident(NewIncident {
                reporter_id: identity.user_id,
                category: request.category,
                description: request.description,
                address: request.address,
                coordinate,
            })
            .await?;
        info!(incident_id = %incident.id, category = ?incident.category, nearby_staff, "incident reported");
        if zone_check.inside {
            warn!(incident_id = %incident.id, zones = zone_check.zones.len(), "incident inside risk zone");
        }

        Ok(IncidentReport {
            incident,
            zone_check,
            nearby_staff,
        })
    }

    /// Live incident visible to the caller
    pub async fn get(&self, identity: &Identity, id: Uuid) -> Result<Incident, DispatchError> {
        let incident = self
            .store
            .get_incident(id)
            .await?
            .ok_or_else(|| DispatchError::not_found("incident", id))?;

        // Plain users only see what they reported.
        if !identity.sees_all_incidents() && incident.reporter_id != identity.user_id {
            return Err(DispatchError::not_found("incident", id));
        }
        Ok(incident)
    }

    /// Newest first, optionally filtered by status
    pub async fn list(
        &self,
        identity: &Identity,
        status: Option<IncidentStatus>,
        pagination: PaginationParams,
    ) -> Result<PaginatedResponse<Incident>, DispatchError> {
        let (page, size) = pagination.normalized();
        let filter = IncidentFilter {
            status,
            reporter_id: (!identity.sees_all_incidents()).then_some(identity.user_id),
        };
        let offset = i64::from(page - 1) * i64::from(size);

        let (items, total) = self
            .store
            .list_incidents(&filter, i64::from(size), offset)
            .await?;

        Ok(PaginatedResponse {
            items,
            total,
            page,
            size,
        })
    }

    /// `Pending -> Processing` for `staff_id`
    ///
    /// The staff member's availability is checked under the same lock as the
    /// incident status, after it.
    pub async fn assign(
        &self,
        identity: &Identity,
        incident_id: Uuid,
        staff_id: Uuid,
    ) -> Result<Incident, DispatchError> {
        let outcome = self
            .store
            .apply_transition(Transition {
                incident_id,
                next: IncidentStatus::Processing,
                assign_staff: Some(staff_id),
                require_assignee: None,
                credit_completion: false,
                record: NewHandlingRecord {
                    incident_id,
                    actor_id: identity.user_id,
                    staff_id: Some(staff_id),
                    action: HandlingAction::Accept,
                    note: String::new(),
                },
            })
            .await?;

        let incident = resolve(outcome, incident_id, "assign")?;
        info!(%incident_id, %staff_id, "incident assigned");
        Ok(incident)
    }

    /// A staff member takes the incident for themselves
    pub async fn accept(&self, identity: &Identity, incident_id: Uuid) -> Result<Incident, DispatchError> {
        let staff = self.dispatch.profile_for_user(identity.user_id).await?;
        self.assign(identity, incident_id, staff.id).await
    }

    /// Log an `arrive` or `note` entry without changing status
    pub async fn record_progress(
        &self,
        identity: &Identity,
        incident_id: Uuid,
        request: RecordProgressRequest,
    ) -> Result<Incident, DispatchError> {
        if !request.action.is_progress() {
            return Err(DispatchError::Validation(format!(
                "{:?} cannot be recorded as progress",
                request.action
            )));
        }
        let staff_id = self.caller_staff_id(identity).await?;

        let outcome = self
            .store
            .append_progress(NewHandlingRecord {
                incident_id,
                actor_id: identity.user_id,
                staff_id: Some(staff_id),
                action: request.action,
                note: request.note,
            })
            .await?;

        let incident = resolve(outcome, incident_id, "record progress on")?;
        info!(%incident_id, %staff_id, action = ?request.action, "progress recorded");
        Ok(incident)
    }

    /// `Processing -> Completed`, by the assigned staff member only
    pub async fn complete(
        &self,
        identity: &Identity,
        incident_id: Uuid,
        note: String,
    ) -> Result<Incident, DispatchError> {
        let staff_id = self.caller_staff_id(identity).await?;

        let outcome = self
            .store
            .apply_transition(Transition {
                incident_id,
                next: IncidentStatus::Completed,
                assign_staff: None,
                require_assignee: Some(staff_id),
                credit_completion: true,
                record: NewHandlingRecord {
                    incident_id,
                    actor_id: identity.user_id,
                    staff_id: Some(staff_id),
                    action: HandlingAction::Complete,
                    note,
                },
            })
            .await?;

        let incident = resolve(outcome, incident_id, "complete")?;
        info!(%incident_id, %staff_id, "incident completed");
        Ok(incident)
    }

    /// `{Pending, Processing} -> Cancelled`
    ///
    /// Allowed for the reporter, the assigned staff member and admins.
    pub async fn cancel(
        &self,
        identity: &Identity,
        incident_id: Uuid,
        reason: String,
    ) -> Result<Incident, DispatchError> {
        let current = self
            .store
            .get_incident(incident_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("incident", incident_id))?;

        let assignee = match current.assigned_staff {
            Some(staff_id) => self
                .store
                .get_staff(staff_id)
                .await?
                .filter(|staff| staff.user_id == identity.user_id)
                .map(|staff| staff.id),
            None => None,
        };
        let is_reporter = current.reporter_id == identity.user_id;
        if !is_reporter && !identity.is_admin() && assignee.is_none() {
            return Err(DispatchError::Forbidden(
                "only the reporter, the assigned staff member or an admin may cancel".into(),
            ));
        }

        let outcome = self
            .store
            .apply_transition(Transition {
                incident_id,
                next: IncidentStatus::Cancelled,
                assign_staff: None,
                require_assignee: if is_reporter || identity.is_admin() {
                    None
                } else {
                    assignee
                },
                credit_completion: false,
                record: NewHandlingRecord {
                    incident_id,
                    actor_id: identity.user_id,
                    staff_id: assignee,
                    action: HandlingAction::Cancel,
                    note: reason,
                },
            })
            .await?;

        let incident = resolve(outcome, incident_id, "cancel")?;
        info!(%incident_id, actor = %identity.user_id, "incident cancelled");
        Ok(incident)
    }

    /// Audit trail in insertion order
    pub async fn records(
        &self,
        identity: &Identity,
        incident_id: Uuid,
    ) -> Result<Vec<HandlingRecord>, DispatchError> {
        self.get(identity, incident_id).await?;
        Ok(self.store.list_records(incident_id).await?)
    }

    /// Hide an incident from every read; its records are kept.
    pub async fn tombstone(&self, incident_id: Uuid) -> Result<(), DispatchError> {
        if !self.store.tombstone_incident(incident_id).await? {
            return Err(DispatchError::not_found("incident", incident_id));
        }
        info!(%incident_id, "incident tombstoned");
        Ok(())
    }

    /// Candidate search radius. A runtime override that is not a usable
    /// distance is ignored.
    async fn search_radius(&self) -> Result<f64, DispatchError> {
        let radius = self
            .config
            .number_or(SEARCH_RADIUS_KEY, self.default_radius_meters)
            .await?;
        if radius.is_finite() && radius >= 0.0 {
            return Ok(radius);
        }
        warn!(key = SEARCH_RADIUS_KEY, radius, "invalid search radius override; using default");
        Ok(self.default_radius_meters)
    }

    async fn caller_staff_id(&self, identity: &Identity) -> Result<Uuid, DispatchError> {
        self.store
            .get_staff_by_user(identity.user_id)
            .await?
            .map(|staff| staff.id)
            .ok_or(DispatchError::NotAssignedStaff)
    }
}

fn resolve(
    outcome: TransitionOutcome,
    incident_id: Uuid,
    action: &'static str,
) -> Result<Incident, DispatchError> {
    match outcome {
        TransitionOutcome::Applied(incident) => Ok(incident),
        TransitionOutcome::NotFound => Err(DispatchError::not_found("incident", incident_id)),
        TransitionOutcome::Rejected(from) => {
            warn!(%incident_id, %from, action, "transition rejected");
            Err(DispatchError::InvalidTransition { from, action })
        }
        TransitionOutcome::NotAssignee => Err(DispatchError::NotAssignedStaff),
        TransitionOutcome::StaffNotFound(staff_id) => Err(DispatchError::not_found("staff", staff_id)),
        TransitionOutcome::StaffUnavailable => {
            warn!(%incident_id, action, "staff unavailable for dispatch");
            Err(DispatchError::StaffUnavailable)
        }
        TransitionOutcome::StaffBusy => Err(DispatchError::StaffBusy),
    }
}
