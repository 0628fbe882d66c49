use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use super::{RecordState, ZoneCheck};
use crate::geo::Coordinate;

/// Incident status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "incident_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// The lifecycle graph:
    /// `Pending -> Processing -> Completed`, and `{Pending, Processing} -> Cancelled`.
    pub fn can_transition_to(&self, next: IncidentStatus) -> bool {
        use IncidentStatus::*;
        matches!(
            (*self, next),
            (Pending, Processing) | (Processing, Completed) | (Pending, Cancelled) | (Processing, Cancelled)
        )
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incident categories
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "incident_category", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum IncidentCategory {
    General,
    DomesticViolence,
    Medical,
    Fraud,
}

/// Incident model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Incident {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub category: IncidentCategory,
    pub description: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub status: IncidentStatus,
    pub assigned_staff: Option<Uuid>,
    #[serde(skip)]
    pub record_state: RecordState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Incident {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    pub fn is_live(&self) -> bool {
        self.record_state == RecordState::Active
    }

    /// Processing and Completed incidents always carry their staff member.
    /// Cancelled incidents keep whoever had accepted them, if anyone did.
    pub fn assignment_is_consistent(&self) -> bool {
        match self.status {
            IncidentStatus::Pending => self.assigned_staff.is_none(),
            IncidentStatus::Processing | IncidentStatus::Completed => self.assigned_staff.is_some(),
            IncidentStatus::Cancelled => true,
        }
    }
}

/// Action kinds recorded against an incident
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "handling_action", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HandlingAction {
    Accept,
    Arrive,
    Complete,
    Note,
    Cancel,
}

impl HandlingAction {
    /// Actions a staff member may log without changing the incident status.
    pub fn is_progress(&self) -> bool {
        matches!(self, Self::Arrive | Self::Note)
    }
}

/// Append-only audit entry
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct HandlingRecord {
    pub id: Uuid,
    pub incident_id: Uuid,
    /// The user who acted.
    pub actor_id: Uuid,
    /// Set when the actor acted in their capacity as a staff member.
    pub staff_id: Option<Uuid>,
    pub action: HandlingAction,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewIncident {
    pub reporter_id: Uuid,
    pub category: IncidentCategory,
    pub description: String,
    pub address: Option<String>,
    pub coordinate: Coordinate,
}

#[derive(Debug, Clone)]
pub struct NewHandlingRecord {
    pub incident_id: Uuid,
    pub actor_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub action: HandlingAction,
    pub note: String,
}

/// A guarded status change, applied atomically together with its record.
#[derive(Debug, Clone)]
pub struct Transition {
    pub incident_id: Uuid,
    pub next: IncidentStatus,
    /// Staff member to assign; only meaningful when `next` is Processing.
    /// They must exist, be dispatchable and hold no other Processing incident.
    pub assign_staff: Option<Uuid>,
    /// When set, the incident's current assignee must equal this staff id.
    pub require_assignee: Option<Uuid>,
    /// Count the move against the assignee's completed orders.
    pub credit_completion: bool,
    pub record: NewHandlingRecord,
}

/// What the store observed while applying a `Transition`.
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    Applied(Incident),
    NotFound,
    /// The current status does not permit the requested move.
    Rejected(IncidentStatus),
    NotAssignee,
    /// `assign_staff` names no staff profile.
    StaffNotFound(Uuid),
    /// `assign_staff` is offline, unapproved or has no position.
    StaffUnavailable,
    StaffBusy,
}

#[derive(Debug, Clone, Default)]
pub struct IncidentFilter {
    pub status: Option<IncidentStatus>,
    pub reporter_id: Option<Uuid>,
}

/// What a reporter gets back: the new incident plus the situation around it.
#[derive(Debug, Serialize, Clone)]
pub struct IncidentReport {
    pub incident: Incident,
    pub zone_check: ZoneCheck,
    /// Dispatchable staff within the search radius at report time.
    pub nearby_staff: usize,
}

/// Request DTO for reporting an incident
#[derive(Debug, Deserialize, Validate)]
pub struct ReportIncidentRequest {
    pub category: IncidentCategory,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
}

/// Request DTO for appending a progress record
#[derive(Debug, Deserialize, Validate)]
pub struct RecordProgressRequest {
    pub action: HandlingAction,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub note: String,
}

/// Request DTO for completing an incident
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CompleteIncidentRequest {
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub note: String,
}

/// Request DTO for `PUT /incidents/:id/status`
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateIncidentStatusRequest {
    pub status: IncidentStatus,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub reason: String,
}

/// Request DTO for an admin dispatching a specific staff member
#[derive(Debug, Deserialize, Validate)]
pub struct AssignIncidentRequest {
    pub staff_id: Uuid,
}

/// Query parameters for listing incidents
#[derive(Debug, Deserialize)]
pub struct ListIncidentsQuery {
    pub status: Option<IncidentStatus>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}
