use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::geo::Coordinate;

/// Vetting state of a staff application
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "verification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Security staff profile
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct StaffProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub license_number: String,
    /// References to uploaded certificates, as supplied by the applicant.
    pub cert_files: Vec<String>,
    pub verification: VerificationStatus,
    pub online: bool,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub completed_orders: i64,
    pub rating_count: i64,
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StaffProfile {
    pub fn current_coordinate(&self) -> Option<Coordinate> {
        match (self.current_latitude, self.current_longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinate {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    /// Approved, online, and carrying a position.
    pub fn is_dispatchable(&self) -> bool {
        self.verification == VerificationStatus::Approved
            && self.online
            && self.current_coordinate().is_some()
    }
}

/// What an applicant submits for an admin to vet.
#[derive(Debug, Clone)]
pub struct NewStaff {
    pub user_id: Uuid,
    pub company_name: String,
    pub license_number: String,
    pub cert_files: Vec<String>,
}

/// A staff member eligible for an incident, with their distance to it.
#[derive(Debug, Serialize, Clone)]
pub struct Candidate {
    pub staff: StaffProfile,
    pub distance_meters: f64,
}

/// A change to a staff member's rating aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatingAdjustment {
    Add(i16),
    Replace { old: i16, new: i16 },
    Remove(i16),
}

impl RatingAdjustment {
    /// Apply to `(average, count)`, returning the new pair.
    pub fn apply(self, average: f64, count: i64) -> (f64, i64) {
        match self {
            Self::Add(score) => (running_average(average, count, score), count + 1),
            Self::Replace { old, new } => {
                if count <= 0 {
                    return (average, count);
                }
                let n = count as f64;
                ((average * n - f64::from(old) + f64::from(new)) / n, count)
            }
            Self::Remove(old) => {
                if count <= 1 {
                    return (0.0, 0);
                }
                let n = count as f64;
                ((average * n - f64::from(old)) / (n - 1.0), count - 1)
            }
        }
    }
}

/// `(old_avg * old_count + score) / (old_count + 1)`
pub fn running_average(old_average: f64, old_count: i64, score: i16) -> f64 {
    let n = old_count.max(0) as f64;
    (old_average * n + f64::from(score)) / (n + 1.0)
}

/// Request DTO for `POST /staff/apply`
#[derive(Debug, Deserialize, Validate)]
pub struct ApplyStaffRequest {
    #[validate(length(min = 1, max = 100))]
    pub company_name: String,
    #[validate(length(min = 1, max = 50))]
    pub license_number: String,
    #[serde(default)]
    #[validate(length(max = 10))]
    pub cert_files: Vec<String>,
}

/// Request DTO for `PUT /staff/location`
#[derive(Debug, Deserialize, Validate)]
pub struct SetAvailabilityRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    pub online: bool,
}

/// Request DTO for an admin verification decision
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyStaffRequest {
    pub status: VerificationStatus,
}
