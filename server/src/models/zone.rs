use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::error::DispatchError;
use crate::geo::Coordinate;

pub const HEAT_LEVEL_MIN: i32 = 0;
pub const HEAT_LEVEL_MAX: i32 = 5;

/// Danger levels
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "danger_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DangerLevel {
    Low,
    Medium,
    High,
}

/// Circular risk zone
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Zone {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub danger_level: DangerLevel,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub heat_level: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Zone {
    pub fn center(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Field set shared by create and (after merging) update.
#[derive(Debug, Clone)]
pub struct ZoneDraft {
    pub name: String,
    pub description: String,
    pub danger_level: DangerLevel,
    pub center: Coordinate,
    pub radius_meters: f64,
    pub active: bool,
}

impl ZoneDraft {
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.name.trim().is_empty() {
            return Err(DispatchError::Validation("zone name is required".to_string()));
        }
        self.center.validate()?;
        if !self.radius_meters.is_finite() || self.radius_meters <= 0.0 {
            return Err(DispatchError::Validation(format!(
                "radius must be greater than 0, got {}",
                self.radius_meters
            )));
        }
        Ok(())
    }
}

/// Heat level change; results are clamped into `[HEAT_LEVEL_MIN, HEAT_LEVEL_MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatAdjustment {
    Delta(i32),
    Absolute(i32),
}

impl HeatAdjustment {
    pub fn apply(self, current: i32) -> i32 {
        let target = match self {
            Self::Delta(delta) => current.saturating_add(delta),
            Self::Absolute(level) => level,
        };
        target.clamp(HEAT_LEVEL_MIN, HEAT_LEVEL_MAX)
    }
}

/// An active zone containing (or near) a queried point.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ZoneMatch {
    pub zone: Zone,
    pub distance_meters: f64,
}

/// Result of a point-in-zone query, nearest zone first.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ZoneCheck {
    pub inside: bool,
    pub zones: Vec<ZoneMatch>,
}

/// Request DTO for creating a zone
#[derive(Debug, Deserialize, Validate)]
pub struct CreateZoneRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub danger_level: DangerLevel,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = 0.0))]
    pub radius_meters: f64,
}

impl From<CreateZoneRequest> for ZoneDraft {
    fn from(req: CreateZoneRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            danger_level: req.danger_level,
            center: Coordinate {
                latitude: req.latitude,
                longitude: req.longitude,
            },
            radius_meters: req.radius_meters,
            active: true,
        }
    }
}

/// Request DTO for a partial zone update
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateZoneRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub danger_level: Option<DangerLevel>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    pub radius_meters: Option<f64>,
    pub active: Option<bool>,
}

impl UpdateZoneRequest {
    /// Overlay the provided fields on an existing zone.
    pub fn merge_into(self, zone: &Zone) -> ZoneDraft {
        ZoneDraft {
            name: self.name.unwrap_or_else(|| zone.name.clone()),
            description: self.description.unwrap_or_else(|| zone.description.clone()),
            danger_level: self.danger_level.unwrap_or(zone.danger_level),
            center: Coordinate {
                latitude: self.latitude.unwrap_or(zone.latitude),
                longitude: self.longitude.unwrap_or(zone.longitude),
            },
            radius_meters: self.radius_meters.unwrap_or(zone.radius_meters),
            active: self.active.unwrap_or(zone.active),
        }
    }
}

/// Request DTO for `PUT /danger-zones/:id/heat-level`; exactly one field.
#[derive(Debug, Deserialize, Validate)]
pub struct HeatLevelRequest {
    pub delta: Option<i32>,
    pub level: Option<i32>,
}

impl TryFrom<HeatLevelRequest> for HeatAdjustment {
    type Error = DispatchError;

    fn try_from(req: HeatLevelRequest) -> Result<Self, Self::Error> {
        match (req.delta, req.level) {
            (Some(delta), None) => Ok(Self::Delta(delta)),
            (None, Some(level)) => Ok(Self::Absolute(level)),
            _ => Err(DispatchError::Validation(
                "provide exactly one of `delta` or `level`".to_string(),
            )),
        }
    }
}

/// Query parameters for a point check
#[derive(Debug, Deserialize)]
pub struct CheckPointQuery {
    pub latitude: f64,
    pub longitude: f64,
}

/// Query parameters for a nearby search
#[derive(Debug, Deserialize)]
pub struct NearbyZonesQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heat_adjustments_clamp_instead_of_failing() {
        assert_eq!(HeatAdjustment::Delta(2).apply(1), 3);
        assert_eq!(HeatAdjustment::Delta(10).apply(4), HEAT_LEVEL_MAX);
        assert_eq!(HeatAdjustment::Delta(-3).apply(1), HEAT_LEVEL_MIN);
        assert_eq!(HeatAdjustment::Delta(i32::MAX).apply(5), HEAT_LEVEL_MAX);
        assert_eq!(HeatAdjustment::Absolute(9).apply(0), HEAT_LEVEL_MAX);
        assert_eq!(HeatAdjustment::Absolute(-1).apply(3), HEAT_LEVEL_MIN);
    }

    #[test]
    fn heat_request_requires_exactly_one_field() {
        let both = HeatLevelRequest {
            delta: Some(1),
            level: Some(2),
        };
        assert!(HeatAdjustment::try_from(both).is_err());

        let level = HeatLevelRequest {
            delta: None,
            level: Some(2),
        };
        assert_eq!(HeatAdjustment::try_from(level).unwrap(), HeatAdjustment::Absolute(2));
    }

    #[test]
    fn draft_rejects_non_positive_radius() {
        let draft = ZoneDraft {
            name: "Harbor".into(),
            description: String::new(),
            danger_level: DangerLevel::High,
            center: Coordinate {
                latitude: 0.0,
                longitude: 0.0,
            },
            radius_meters: 0.0,
            active: true,
        };
        assert!(matches!(draft.validate(), Err(DispatchError::Validation(_))));
    }
}
