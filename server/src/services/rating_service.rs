use tracing::info;
use uuid::Uuid;

use super::dispatch_service::check_score;
use super::DispatchService;
use crate::error::DispatchError;
use crate::models::{
    CreateRatingRequest, Identity, IncidentStatus, NewRating, Rating, RatingPatch, StaffAverage,
};
use crate::store::SharedStore;

/// Reviews of staff on completed incidents
#[derive(Clone)]
pub struct RatingService {
    store: SharedStore,
    dispatch: DispatchService,
}

impl RatingService {
    /// Create new rating service instance
    pub fn new(store: SharedStore, dispatch: DispatchService) -> Self {
        Self { store, dispatch }
    }

    /// Rate the staff member who completed the caller's incident
    pub async fn create(
        &self,
        identity: &Identity,
        request: CreateRatingRequest,
    ) -> Result<Rating, DispatchError> {
        check_score(request.score)?;

        let incident = self
            .store
            .get_incident(request.incident_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("incident", request.incident_id))?;
        if incident.reporter_id != identity.user_id {
            return Err(DispatchError::Forbidden(
                "only the reporter may rate an incident".into(),
            ));
        }
        if incident.status != IncidentStatus::Completed {
            return Err(DispatchError::InvalidTransition {
                from: incident.status,
                action: "rate",
            });
        }
        let staff_id = incident
            .assigned_staff
            .ok_or_else(|| DispatchError::Conflict("completed incident has no staff".into()))?;

        let rating = self
            .store
            .insert_rating(NewRating {
                incident_id: incident.id,
                rater_id: identity.user_id,
                staff_id,
                score: request.score,
                comment: request.comment,
                is_public: request.is_public,
            })
            .await?
            .ok_or(DispatchError::DuplicateRating)?;

        info!(rating_id = %rating.id, incident_id = %incident.id, %staff_id, score = rating.score, "rating submitted");
        Ok(rating)
    }

    pub async fn get(&self, identity: &Identity, id: Uuid) -> Result<Rating, DispatchError> {
        let rating = self
            .store
            .get_rating(id)
            .await?
            .ok_or_else(|| DispatchError::not_found("rating", id))?;

        let viewer = self.viewer_staff_id(identity).await?;
        if !can_view(&rating, identity, viewer) {
            return Err(DispatchError::not_found("rating", id));
        }
        Ok(rating)
    }

    pub async fn for_incident(
        &self,
        identity: &Identity,
        incident_id: Uuid,
    ) -> Result<Rating, DispatchError> {
        let rating = self
            .store
            .rating_for_incident(incident_id)
            .await?
            .ok_or_else(|| DispatchError::not_found("rating for incident", incident_id))?;

        let viewer = self.viewer_staff_id(identity).await?;
        if !can_view(&rating, identity, viewer) {
            return Err(DispatchError::not_found("rating for incident", incident_id));
        }
        Ok(rating)
    }

    /// Newest first; private ratings only for their author, the rated staff
    /// member and admins.
    pub async fn for_staff(
        &self,
        identity: &Identity,
        staff_id: Uuid,
    ) -> Result<Vec<Rating>, DispatchError> {
        self.dispatch.get(staff_id).await?;
        let viewer = self.viewer_staff_id(identity).await?;

        Ok(self
            .store
            .ratings_for_staff(staff_id)
            .await?
            .into_iter()
            .filter(|rating| can_view(rating, identity, viewer))
            .collect())
    }

    pub async fn staff_average(&self, staff_id: Uuid) -> Result<StaffAverage, DispatchError> {
        let staff = self.dispatch.get(staff_id).await?;
        Ok(StaffAverage {
            staff_id: staff.id,
            average_rating: staff.average_rating,
            rating_count: staff.rating_count,
        })
    }

    /// Edit by the author; the store swaps a changed score in the aggregate.
    pub async fn update(
        &self,
        identity: &Identity,
        id: Uuid,
        patch: RatingPatch,
    ) -> Result<Rating, DispatchError> {
        if let Some(score) = patch.score {
            check_score(score)?;
        }
        self.owned(identity, id, false).await?;

        let updated = self
            .store
            .update_rating(id, patch)
            .await?
            .ok_or_else(|| DispatchError::not_found("rating", id))?;

        info!(rating_id = %id, "rating updated");
        Ok(updated)
    }

    /// Tombstone the rating and take its score out of the aggregate.
    pub async fn delete(&self, identity: &Identity, id: Uuid) -> Result<(), DispatchError> {
        self.owned(identity, id, true).await?;

        if !self.store.tombstone_rating(id).await? {
            return Err(DispatchError::not_found("rating", id));
        }

        info!(rating_id = %id, "rating deleted");
        Ok(())
    }

    async fn owned(
        &self,
        identity: &Identity,
        id: Uuid,
        admin_allowed: bool,
    ) -> Result<Rating, DispatchError> {
        let rating = self
            .store
            .get_rating(id)
            .await?
            .ok_or_else(|| DispatchError::not_found("rating", id))?;

        let is_author = rating.rater_id == identity.user_id;
        if !is_author && !(admin_allowed && identity.is_admin()) {
            return Err(DispatchError::Forbidden(
                "only the author may change this rating".into(),
            ));
        }
        Ok(rating)
    }

    async fn viewer_staff_id(&self, identity: &Identity) -> Result<Option<Uuid>, DispatchError> {
        Ok(self
            .store
            .get_staff_by_user(identity.user_id)
            .await?
            .map(|staff| staff.id))
    }
}

fn can_view(rating: &Rating, identity: &Identity, viewer_staff: Option<Uuid>) -> bool {
    rating.is_public
        || identity.is_admin()
        || rating.rater_id == identity.user_id
        || viewer_staff == Some(rating.staff_id)
}
