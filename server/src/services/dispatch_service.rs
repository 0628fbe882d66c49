use std::cmp::Ordering;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::DispatchError;
use crate::geo::Coordinate;
use crate::models::{
    ApplyStaffRequest, Candidate, Identity, NewStaff, RatingAdjustment, StaffProfile,
    VerificationStatus, SCORE_MAX, SCORE_MIN,
};
use crate::store::SharedStore;

/// Matches staff to incidents and keeps staff aggregates in step with
/// incident outcomes.
#[derive(Clone)]
pub struct DispatchService {
    store: SharedStore,
}

impl DispatchService {
    /// Create new dispatch service instance
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Open a staff application for the calling user. The company and
    /// licence details are what an admin vets before approving.
    pub async fn apply(
        &self,
        identity: &Identity,
        request: ApplyStaffRequest,
    ) -> Result<StaffProfile, DispatchError> {
        request
            .validate()
            .map_err(|e| DispatchError::Validation(e.to_string()))?;
        let company_name = request.company_name.trim().to_string();
        let license_number = request.license_number.trim().to_string();
        if company_name.is_empty() || license_number.is_empty() {
            return Err(DispatchError::Validation(
                "company name and license number are required".into(),
            ));
        }

        let profile = self
            .store
            .insert_staff(NewStaff {
                user_id: identity.user_id,
                company_name,
                license_number,
                cert_files: request.cert_files,
            })
            .await?
            .ok_or_else(|| DispatchError::Conflict("user already holds a staff profile".into()))?;

        info!(staff_id = %profile.id, user_id = %identity.user_id, "staff application opened");
        Ok(profile)
    }

    pub async fn get(&self, staff_id: Uuid) -> Result<StaffProfile, DispatchError> {
        self.store
            .get_staff(staff_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("staff", staff_id))
    }

    /// Profile owned by `user_id`
    pub async fn profile_for_user(&self, user_id: Uuid) -> Result<StaffProfile, DispatchError> {
        self.store
            .get_staff_by_user(user_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("staff profile for user", user_id))
    }

    /// Update position and online flag; idempotent.
    pub async fn set_availability(
        &self,
        staff_id: Uuid,
        coordinate: Coordinate,
        online: bool,
    ) -> Result<StaffProfile, DispatchError> {
        coordinate.validate()?;

        let profile = self
            .store
            .set_availability(staff_id, coordinate.latitude, coordinate.longitude, online)
            .await?
            .ok_or_else(|| DispatchError::not_found("staff", staff_id))?;

        info!(%staff_id, online, "staff availability updated");
        Ok(profile)
    }

    /// Approve or reject an application
    pub async fn verify(
        &self,
        staff_id: Uuid,
        status: VerificationStatus,
    ) -> Result<StaffProfile, DispatchError> {
        if status == VerificationStatus::Pending {
            return Err(DispatchError::Validation(
                "verification must be approved or rejected".into(),
            ));
        }

        let profile = self
            .store
            .set_verification(staff_id, status)
            .await?
            .ok_or_else(|| DispatchError::not_found("staff", staff_id))?;

        info!(%staff_id, ?status, "staff verification updated");
        Ok(profile)
    }

    /// Approved, online staff within `max_radius_meters`, nearest first.
    ///
    /// Ties on distance go to the staff member with fewer completed orders,
    /// then to the lowest id.
    pub async fn find_candidates(
        &self,
        coordinate: Coordinate,
        max_radius_meters: f64,
    ) -> Result<Vec<Candidate>, DispatchError> {
        coordinate.validate()?;
        if !max_radius_meters.is_finite() || max_radius_meters < 0.0 {
            return Err(DispatchError::Validation(format!(
                "search radius must be a non-negative number of metres, got {max_radius_meters}"
            )));
        }

        let mut candidates: Vec<Candidate> = self
            .store
            .list_dispatchable()
            .await?
            .into_iter()
            .filter(StaffProfile::is_dispatchable)
            .filter_map(|staff| {
                let distance_meters = staff.current_coordinate()?.distance_to(&coordinate);
                (distance_meters <= max_radius_meters).then_some(Candidate {
                    staff,
                    distance_meters,
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.distance_meters
                .partial_cmp(&b.distance_meters)
                .unwrap_or(Ordering::Equal)
                .then(a.staff.completed_orders.cmp(&b.staff.completed_orders))
                .then(a.staff.id.cmp(&b.staff.id))
        });

        Ok(candidates)
    }

    /// Count a completed incident against the staff member's workload.
    ///
    /// `IncidentService::complete` credits the count inside its own
    /// transition instead; this is for completions recorded out of band.
    pub async fn record_completion(
        &self,
        staff_id: Uuid,
        incident_id: Uuid,
    ) -> Result<StaffProfile, DispatchError> {
        let profile = self
            .store
            .increment_completed(staff_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("staff", staff_id))?;

        info!(%staff_id, %incident_id, completed_orders = profile.completed_orders, "completion recorded");
        Ok(profile)
    }

    /// Fold a new score into the running average.
    ///
    /// Stored ratings adjust the aggregate in the same write as the rating
    /// row; this applies a score that has no rating row behind it.
    pub async fn apply_rating(&self, staff_id: Uuid, score: i16) -> Result<StaffProfile, DispatchError> {
        check_score(score)?;
        let profile = self
            .store
            .adjust_rating(staff_id, RatingAdjustment::Add(score))
            .await?
            .ok_or_else(|| DispatchError::not_found("staff", staff_id))?;

        info!(
            %staff_id,
            average_rating = profile.average_rating,
            rating_count = profile.rating_count,
            "rating aggregate updated"
        );
        Ok(profile)
    }
}

pub fn check_score(score: i16) -> Result<(), DispatchError> {
    if !(SCORE_MIN..=SCORE_MAX).contains(&score) {
        return Err(DispatchError::OutOfRange(format!(
            "score must be between {SCORE_MIN} and {SCORE_MAX}, got {score}"
        )));
    }
    Ok(())
}
