use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use super::RecordState;

pub const SCORE_MIN: i16 = 1;
pub const SCORE_MAX: i16 = 5;

/// Staff performance review tied to a completed incident
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Rating {
    pub id: Uuid,
    pub incident_id: Uuid,
    pub rater_id: Uuid,
    pub staff_id: Uuid,
    pub score: i16,
    pub comment: String,
    pub is_public: bool,
    #[serde(skip)]
    pub record_state: RecordState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRating {
    pub incident_id: Uuid,
    pub rater_id: Uuid,
    pub staff_id: Uuid,
    pub score: i16,
    pub comment: String,
    pub is_public: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RatingPatch {
    pub score: Option<i16>,
    pub comment: Option<String>,
    pub is_public: Option<bool>,
}

/// Staff rating aggregate
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct StaffAverage {
    pub staff_id: Uuid,
    pub average_rating: f64,
    pub rating_count: i64,
}

fn default_public() -> bool {
    true
}

/// Request DTO for rating a completed incident
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRatingRequest {
    pub incident_id: Uuid,
    pub score: i16,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub comment: String,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

/// Request DTO for editing a rating
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRatingRequest {
    pub score: Option<i16>,
    #[validate(length(max = 500))]
    pub comment: Option<String>,
    pub is_public: Option<bool>,
}

impl From<UpdateRatingRequest> for RatingPatch {
    fn from(req: UpdateRatingRequest) -> Self {
        Self {
            score: req.score,
            comment: req.comment,
            is_public: req.is_public,
        }
    }
}
