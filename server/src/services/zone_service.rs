use std::cmp::Ordering;

use tracing::info;
use uuid::Uuid;

use crate::error::DispatchError;
use crate::geo::Coordinate;
use crate::models::{HeatAdjustment, UpdateZoneRequest, Zone, ZoneCheck, ZoneDraft, ZoneMatch};
use crate::store::SharedStore;

/// Maintains risk zones and answers point-in-zone queries.
#[derive(Clone)]
pub struct ZoneService {
    store: SharedStore,
}

impl ZoneService {
    /// Create new zone service instance
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Validate and persist a new zone
    pub async fn create(&self, draft: ZoneDraft) -> Result<Zone, DispatchError> {
        draft.validate()?;
        let zone = self.store.insert_zone(draft).await?;
        info!(zone_id = %zone.id, name = %zone.name, "zone created");
        Ok(zone)
    }

    pub async fn get(&self, id: Uuid) -> Result<Zone, DispatchError> {
        self.store
            .get_zone(id)
            .await?
            .ok_or_else(|| DispatchError::not_found("zone", id))
    }

    /// Overlay the provided fields and re-validate the whole zone
    pub async fn update(&self, id: Uuid, request: UpdateZoneRequest) -> Result<Zone, DispatchError> {
        let current = self.get(id).await?;
        let draft = request.merge_into(&current);
        draft.validate()?;

        let zone = self
            .store
            .update_zone(id, draft)
            .await?
            .ok_or_else(|| DispatchError::not_found("zone", id))?;

        info!(zone_id = %id, "zone updated");
        Ok(zone)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DispatchError> {
        if !self.store.delete_zone(id).await? {
            return Err(DispatchError::not_found("zone", id));
        }
        info!(zone_id = %id, "zone deleted");
        Ok(())
    }

    pub async fn list_active(&self) -> Result<Vec<Zone>, DispatchError> {
        Ok(self.store.list_active_zones().await?)
    }

    /// Active zones whose circle contains `point`, nearest center first.
    pub async fn check_point(&self, point: Coordinate) -> Result<ZoneCheck, DispatchError> {
        point.validate()?;

        let zones = self.matching(point, |zone, distance| distance <= zone.radius_meters).await?;
        Ok(ZoneCheck {
            inside: !zones.is_empty(),
            zones,
        })
    }

    /// Active zones whose circle comes within `radius_meters` of `point`.
    pub async fn nearby(
        &self,
        point: Coordinate,
        radius_meters: f64,
    ) -> Result<Vec<ZoneMatch>, DispatchError> {
        point.validate()?;
        if !radius_meters.is_finite() || radius_meters < 0.0 {
            return Err(DispatchError::Validation(format!(
                "radius must be a non-negative number of metres, got {radius_meters}"
            )));
        }

        self.matching(point, |zone, distance| {
            distance - zone.radius_meters <= radius_meters
        })
        .await
    }

    /// Shift or set the heat level, clamped into range.
    pub async fn adjust_heat(
        &self,
        id: Uuid,
        adjustment: HeatAdjustment,
    ) -> Result<Zone, DispatchError> {
        let zone = self
            .store
            .adjust_heat(id, adjustment)
            .await?
            .ok_or_else(|| DispatchError::not_found("zone", id))?;

        info!(zone_id = %id, ?adjustment, heat_level = zone.heat_level, "heat level adjusted");
        Ok(zone)
    }

    async fn matching<F>(&self, point: Coordinate, keep: F) -> Result<Vec<ZoneMatch>, DispatchError>
    where
        F: Fn(&Zone, f64) -> bool,
    {
        let mut matches: Vec<ZoneMatch> = self
            .store
            .list_active_zones()
            .await?
            .into_iter()
            .filter(|zone| zone.active)
            .filter_map(|zone| {
                let distance_meters = zone.center().distance_to(&point);
                keep(&zone, distance_meters).then_some(ZoneMatch {
                    zone,
                    distance_meters,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance_meters
                .partial_cmp(&b.distance_meters)
                .unwrap_or(Ordering::Equal)
                .then(a.zone.id.cmp(&b.zone.id))
        });
        Ok(matches)
    }
}
