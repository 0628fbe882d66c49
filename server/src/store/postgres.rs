//! Postgres record store.
//!
//! Status transitions lock the incident row (`SELECT ... FOR UPDATE`), check
//! the guard, write the new status and append the handling record inside one
//! transaction. A staff member being assigned is read `FOR SHARE` in that
//! transaction so they cannot go offline under it. Aggregate updates
//! (ratings, heat level, completed orders) lock the row and apply the same
//! arithmetic the in-memory store uses, in the transaction of the write that
//! caused them.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{ConfigStore, IncidentStore, RatingStore, StaffStore, ZoneStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    ConfigValue, ConfigValueType, HandlingRecord, HeatAdjustment, Incident, IncidentFilter,
    IncidentStatus, NewHandlingRecord, NewIncident, NewRating, NewStaff, Rating, RatingAdjustment,
    RatingPatch, StaffProfile, SystemConfig, Transition, TransitionOutcome, VerificationStatus,
    Zone, ZoneDraft,
};

/// Partial unique index: one `processing` incident per staff member.
const ACTIVE_ASSIGNMENT_INDEX: &str = "incidents_one_active_per_staff";

const RECORD_COLUMNS: &str = "id, incident_id, actor_id, staff_id, action, note, created_at";

pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .connect(database_url)
            .await?;

        Ok(Self { pool, timeout })
    }

    pub fn from_pool(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Bound a store call by the configured deadline.
    async fn timed<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }

    async fn insert_record(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        record: NewHandlingRecord,
    ) -> StoreResult<HandlingRecord> {
        let row = sqlx::query_as::<_, HandlingRecord>(&format!(
            r#"
            INSERT INTO handling_records (id, incident_id, actor_id, staff_id, action, note)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(record.incident_id)
        .bind(record.actor_id)
        .bind(record.staff_id)
        .bind(record.action)
        .bind(record.note)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row)
    }

    async fn lock_incident(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: Uuid,
    ) -> StoreResult<Option<Incident>> {
        let incident = sqlx::query_as::<_, Incident>(
            "SELECT * FROM incidents WHERE id = $1 AND record_state = 'active' FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(incident)
    }

    async fn adjust_rating_in(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        staff_id: Uuid,
        adjustment: RatingAdjustment,
    ) -> StoreResult<Option<StaffProfile>> {
        let current = sqlx::query_as::<_, StaffProfile>(
            "SELECT * FROM staff_profiles WHERE id = $1 FOR UPDATE",
        )
        .bind(staff_id)
        .fetch_optional(&mut **tx)
        .await?;
        let Some(current) = current else {
            return Ok(None);
        };

        let (average, count) = adjustment.apply(current.average_rating, current.rating_count);
        let row = sqlx::query_as::<_, StaffProfile>(
            r#"
            UPDATE staff_profiles
            SET average_rating = $2, rating_count = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(staff_id)
        .bind(average)
        .bind(count)
        .fetch_one(&mut **tx)
        .await?;

        Ok(Some(row))
    }
}

fn is_constraint(err: &sqlx::Error, name: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.constraint() == Some(name),
        _ => false,
    }
}

fn push_incident_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &IncidentFilter) {
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }
    if let Some(reporter_id) = filter.reporter_id {
        builder.push(" AND reporter_id = ");
        builder.push_bind(reporter_id);
    }
}

#[async_trait]
impl IncidentStore for PgStore {
    async fn insert_incident(&self, incident: NewIncident) -> StoreResult<Incident> {
        self.timed(async {
            let row = sqlx::query_as::<_, Incident>(
                r#"
                INSERT INTO incidents (
                    id, reporter_id, category, description, address,
                    latitude, longitude, status, record_state
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', 'active')
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(incident.reporter_id)
            .bind(incident.category)
            .bind(incident.description)
            .bind(incident.address)
            .bind(incident.coordinate.latitude)
            .bind(incident.coordinate.longitude)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn get_incident(&self, id: Uuid) -> StoreResult<Option<Incident>> {
        self.timed(async {
            let row = sqlx::query_as::<_, Incident>(
                "SELECT * FROM incidents WHERE id = $1 AND record_state = 'active'",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn list_incidents(
        &self,
        filter: &IncidentFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<(Vec<Incident>, i64)> {
        self.timed(async {
            let mut count_query: QueryBuilder<Postgres> =
                QueryBuilder::new("SELECT COUNT(*) FROM incidents WHERE record_state = 'active'");
            push_incident_filters(&mut count_query, filter);
            let total: i64 = count_query
                .build_query_scalar::<i64>()
                .fetch_one(&self.pool)
                .await?;

            let mut query_builder: QueryBuilder<Postgres> =
                QueryBuilder::new("SELECT * FROM incidents WHERE record_state = 'active'");
            push_incident_filters(&mut query_builder, filter);
            query_builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
            query_builder.push_bind(limit);
            query_builder.push(" OFFSET ");
            query_builder.push_bind(offset);

            let incidents = query_builder
                .build_query_as::<Incident>()
                .fetch_all(&self.pool)
                .await?;

            Ok((incidents, total))
        })
        .await
    }

    async fn apply_transition(&self, transition: Transition) -> StoreResult<TransitionOutcome> {
        self.timed(async {
            let mut tx = self.pool.begin().await?;

            let Some(current) = Self::lock_incident(&mut tx, transition.incident_id).await? else {
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
                let staff = sqlx::query_as::<_, StaffProfile>(
                    "SELECT * FROM staff_profiles WHERE id = $1 FOR SHARE",
                )
                .bind(staff_id)
                .fetch_optional(&mut *tx)
                .await?;
                match staff {
                    None => return Ok(TransitionOutcome::StaffNotFound(staff_id)),
                    Some(staff) if !staff.is_dispatchable() => {
                        return Ok(TransitionOutcome::StaffUnavailable);
                    }
                    Some(_) => {}
                }

                let busy: Option<Uuid> = sqlx::query_scalar(
                    r#"
                    SELECT id FROM incidents
                    WHERE assigned_staff = $1 AND status = 'processing' AND record_state = 'active'
                    LIMIT 1
                    "#,
                )
                .bind(staff_id)
                .fetch_optional(&mut *tx)
                .await?;
                if busy.is_some() {
                    return Ok(TransitionOutcome::StaffBusy);
                }
            }

            let updated = sqlx::query_as::<_, Incident>(
                r#"
                UPDATE incidents
                SET status = $2,
                    assigned_staff = COALESCE($3, assigned_staff),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(transition.incident_id)
            .bind(transition.next)
            .bind(transition.assign_staff)
            .fetch_one(&mut *tx)
            .await;

            let updated = match updated {
                Ok(incident) => incident,
                // Two different incidents raced to the same staff member.
                Err(err) if is_constraint(&err, ACTIVE_ASSIGNMENT_INDEX) => {
                    return Ok(TransitionOutcome::StaffBusy);
                }
                Err(err) => return Err(err.into()),
            };

            if transition.credit_completion {
                sqlx::query(
                    r#"
                    UPDATE staff_profiles
                    SET completed_orders = completed_orders + 1, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(updated.assigned_staff)
                .execute(&mut *tx)
                .await?;
            }

            Self::insert_record(&mut tx, transition.record).await?;
            tx.commit().await?;

            Ok(TransitionOutcome::Applied(updated))
        })
        .await
    }

    async fn append_progress(&self, record: NewHandlingRecord) -> StoreResult<TransitionOutcome> {
        self.timed(async {
            let mut tx = self.pool.begin().await?;

            let Some(current) = Self::lock_incident(&mut tx, record.incident_id).await? else {
                return Ok(TransitionOutcome::NotFound);
            };
            if current.status != IncidentStatus::Processing {
                return Ok(TransitionOutcome::Rejected(current.status));
            }
            if record.staff_id.is_none() || current.assigned_staff != record.staff_id {
                return Ok(TransitionOutcome::NotAssignee);
            }

            Self::insert_record(&mut tx, record).await?;
            tx.commit().await?;

            Ok(TransitionOutcome::Applied(current))
        })
        .await
    }

    async fn list_records(&self, incident_id: Uuid) -> StoreResult<Vec<HandlingRecord>> {
        self.timed(async {
            let records = sqlx::query_as::<_, HandlingRecord>(&format!(
                "SELECT {RECORD_COLUMNS} FROM handling_records WHERE incident_id = $1 ORDER BY seq"
            ))
            .bind(incident_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(records)
        })
        .await
    }

    async fn tombstone_incident(&self, id: Uuid) -> StoreResult<bool> {
        self.timed(async {
            let result = sqlx::query(
                r#"
                UPDATE incidents
                SET record_state = 'tombstoned', updated_at = NOW()
                WHERE id = $1 AND record_state = 'active'
                "#,
            )
            .bind(id)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }
}

#[async_trait]
impl StaffStore for PgStore {
    async fn insert_staff(&self, staff: NewStaff) -> StoreResult<Option<StaffProfile>> {
        self.timed(async {
            let row = sqlx::query_as::<_, StaffProfile>(
                r#"
                INSERT INTO staff_profiles (
                    id, user_id, company_name, license_number, cert_files, verification
                )
                VALUES ($1, $2, $3, $4, $5, 'pending')
                ON CONFLICT (user_id) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(staff.user_id)
            .bind(staff.company_name)
            .bind(staff.license_number)
            .bind(staff.cert_files)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn get_staff(&self, id: Uuid) -> StoreResult<Option<StaffProfile>> {
        self.timed(async {
            let row = sqlx::query_as::<_, StaffProfile>("SELECT * FROM staff_profiles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        })
        .await
    }

    async fn get_staff_by_user(&self, user_id: Uuid) -> StoreResult<Option<StaffProfile>> {
        self.timed(async {
            let row =
                sqlx::query_as::<_, StaffProfile>("SELECT * FROM staff_profiles WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(row)
        })
        .await
    }

    async fn set_availability(
        &self,
        id: Uuid,
        latitude: f64,
        longitude: f64,
        online: bool,
    ) -> StoreResult<Option<StaffProfile>> {
        self.timed(async {
            let row = sqlx::query_as::<_, StaffProfile>(
                r#"
                UPDATE staff_profiles
                SET current_latitude = $2, current_longitude = $3, online = $4, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(latitude)
            .bind(longitude)
            .bind(online)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn set_verification(
        &self,
        id: Uuid,
        status: VerificationStatus,
    ) -> StoreResult<Option<StaffProfile>> {
        self.timed(async {
            let row = sqlx::query_as::<_, StaffProfile>(
                r#"
                UPDATE staff_profiles SET verification = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn list_dispatchable(&self) -> StoreResult<Vec<StaffProfile>> {
        self.timed(async {
            let rows = sqlx::query_as::<_, StaffProfile>(
                r#"
                SELECT * FROM staff_profiles
                WHERE verification = 'approved'
                  AND online
                  AND current_latitude IS NOT NULL
                  AND current_longitude IS NOT NULL
                "#,
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        })
        .await
    }

    async fn increment_completed(&self, id: Uuid) -> StoreResult<Option<StaffProfile>> {
        self.timed(async {
            let row = sqlx::query_as::<_, StaffProfile>(
                r#"
                UPDATE staff_profiles
                SET completed_orders = completed_orders + 1, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn adjust_rating(
        &self,
        id: Uuid,
        adjustment: RatingAdjustment,
    ) -> StoreResult<Option<StaffProfile>> {
        self.timed(async {
            let mut tx = self.pool.begin().await?;
            let row = Self::adjust_rating_in(&mut tx, id, adjustment).await?;
            tx.commit().await?;
            Ok(row)
        })
        .await
    }
}

#[async_trait]
impl ZoneStore for PgStore {
    async fn insert_zone(&self, draft: ZoneDraft) -> StoreResult<Zone> {
        self.timed(async {
            let row = sqlx::query_as::<_, Zone>(
                r#"
                INSERT INTO danger_zones (
                    id, name, description, danger_level, latitude, longitude,
                    radius_meters, heat_level, active
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(draft.name)
            .bind(draft.description)
            .bind(draft.danger_level)
            .bind(draft.center.latitude)
            .bind(draft.center.longitude)
            .bind(draft.radius_meters)
            .bind(draft.active)
            .fetch_one(&self.pool)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn get_zone(&self, id: Uuid) -> StoreResult<Option<Zone>> {
        self.timed(async {
            let row = sqlx::query_as::<_, Zone>("SELECT * FROM danger_zones WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        })
        .await
    }

    async fn update_zone(&self, id: Uuid, draft: ZoneDraft) -> StoreResult<Option<Zone>> {
        self.timed(async {
            let row = sqlx::query_as::<_, Zone>(
                r#"
                UPDATE danger_zones
                SET name = $2, description = $3, danger_level = $4, latitude = $5,
                    longitude = $6, radius_meters = $7, active = $8, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(draft.name)
            .bind(draft.description)
            .bind(draft.danger_level)
            .bind(draft.center.latitude)
            .bind(draft.center.longitude)
            .bind(draft.radius_meters)
            .bind(draft.active)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn delete_zone(&self, id: Uuid) -> StoreResult<bool> {
        self.timed(async {
            let result = sqlx::query("DELETE FROM danger_zones WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn list_active_zones(&self) -> StoreResult<Vec<Zone>> {
        self.timed(async {
            let rows = sqlx::query_as::<_, Zone>(
                "SELECT * FROM danger_zones WHERE active ORDER BY id",
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        })
        .await
    }

    async fn adjust_heat(&self, id: Uuid, adjustment: HeatAdjustment) -> StoreResult<Option<Zone>> {
        self.timed(async {
            let mut tx = self.pool.begin().await?;

            let current: Option<i32> =
                sqlx::query_scalar("SELECT heat_level FROM danger_zones WHERE id = $1 FOR UPDATE")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            let Some(current) = current else {
                return Ok(None);
            };

            let row = sqlx::query_as::<_, Zone>(
                r#"
                UPDATE danger_zones SET heat_level = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(adjustment.apply(current))
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok(Some(row))
        })
        .await
    }
}

#[async_trait]
impl RatingStore for PgStore {
    async fn insert_rating(&self, rating: NewRating) -> StoreResult<Option<Rating>> {
        self.timed(async {
            let mut tx = self.pool.begin().await?;

            let row = sqlx::query_as::<_, Rating>(
                r#"
                INSERT INTO ratings (
                    id, incident_id, rater_id, staff_id, score, comment, is_public, record_state
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, 'active')
                ON CONFLICT (incident_id, staff_id) WHERE record_state = 'active' DO NOTHING
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(rating.incident_id)
            .bind(rating.rater_id)
            .bind(rating.staff_id)
            .bind(rating.score)
            .bind(rating.comment)
            .bind(rating.is_public)
            .fetch_optional(&mut *tx)
            .await?;
            let Some(row) = row else {
                return Ok(None);
            };

            Self::adjust_rating_in(&mut tx, row.staff_id, RatingAdjustment::Add(row.score)).await?;
            tx.commit().await?;
            Ok(Some(row))
        })
        .await
    }

    async fn get_rating(&self, id: Uuid) -> StoreResult<Option<Rating>> {
        self.timed(async {
            let row = sqlx::query_as::<_, Rating>(
                "SELECT * FROM ratings WHERE id = $1 AND record_state = 'active'",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn rating_for_incident(&self, incident_id: Uuid) -> StoreResult<Option<Rating>> {
        self.timed(async {
            let row = sqlx::query_as::<_, Rating>(
                r#"
                SELECT * FROM ratings
                WHERE incident_id = $1 AND record_state = 'active'
                ORDER BY created_at DESC
                LIMIT 1
                "#,
            )
            .bind(incident_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        })
        .await
    }

    async fn ratings_for_staff(&self, staff_id: Uuid) -> StoreResult<Vec<Rating>> {
        self.timed(async {
            let rows = sqlx::query_as::<_, Rating>(
                r#"
                SELECT * FROM ratings
                WHERE staff_id = $1 AND record_state = 'active'
                ORDER BY created_at DESC, id DESC
                "#,
            )
            .bind(staff_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        })
        .await
    }

    async fn update_rating(&self, id: Uuid, patch: RatingPatch) -> StoreResult<Option<Rating>> {
        self.timed(async {
            let mut tx = self.pool.begin().await?;

            let old: Option<i16> = sqlx::query_scalar(
                "SELECT score FROM ratings WHERE id = $1 AND record_state = 'active' FOR UPDATE",
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
            let Some(old) = old else {
                return Ok(None);
            };

            let row = sqlx::query_as::<_, Rating>(
                r#"
                UPDATE ratings
                SET score = COALESCE($2, score),
                    comment = COALESCE($3, comment),
                    is_public = COALESCE($4, is_public),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(patch.score)
            .bind(patch.comment)
            .bind(patch.is_public)
            .fetch_one(&mut *tx)
            .await?;

            if row.score != old {
                let adjustment = RatingAdjustment::Replace {
                    old,
                    new: row.score,
                };
                Self::adjust_rating_in(&mut tx, row.staff_id, adjustment).await?;
            }
            tx.commit().await?;
            Ok(Some(row))
        })
        .await
    }

    async fn tombstone_rating(&self, id: Uuid) -> StoreResult<bool> {
        self.timed(async {
            let mut tx = self.pool.begin().await?;

            let removed: Option<(Uuid, i16)> = sqlx::query_as(
                r#"
                UPDATE ratings SET record_state = 'tombstoned', updated_at = NOW()
                WHERE id = $1 AND record_state = 'active'
                RETURNING staff_id, score
                "#,
            )
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
            let Some((staff_id, score)) = removed else {
                return Ok(false);
            };

            Self::adjust_rating_in(&mut tx, staff_id, RatingAdjustment::Remove(score)).await?;
            tx.commit().await?;
            Ok(true)
        })
        .await
    }
}

#[derive(sqlx::FromRow)]
struct ConfigRow {
    id: Uuid,
    key: String,
    value_type: ConfigValueType,
    value: String,
    remark: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ConfigRow> for SystemConfig {
    type Error = StoreError;

    fn try_from(row: ConfigRow) -> Result<Self, Self::Error> {
        let value = ConfigValue::decode(row.value_type, &row.value)
            .map_err(|e| StoreError::Constraint(format!("stored config '{}': {e}", row.key)))?;
        Ok(Self {
            id: row.id,
            key: row.key,
            value,
            remark: row.remark,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ConfigStore for PgStore {
    async fn insert_config(&self, entry: SystemConfig) -> StoreResult<Option<SystemConfig>> {
        self.timed(async {
            let row = sqlx::query_as::<_, ConfigRow>(
                r#"
                INSERT INTO system_configs (id, key, value_type, value, remark)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (key) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(entry.id)
            .bind(&entry.key)
            .bind(entry.value.value_type())
            .bind(entry.value.encode())
            .bind(&entry.remark)
            .fetch_optional(&self.pool)
            .await?;
            row.map(SystemConfig::try_from).transpose()
        })
        .await
    }

    async fn get_config(&self, key: &str) -> StoreResult<Option<SystemConfig>> {
        self.timed(async {
            let row = sqlx::query_as::<_, ConfigRow>("SELECT * FROM system_configs WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
            row.map(SystemConfig::try_from).transpose()
        })
        .await
    }

    async fn list_configs(&self) -> StoreResult<Vec<SystemConfig>> {
        self.timed(async {
            let rows = sqlx::query_as::<_, ConfigRow>("SELECT * FROM system_configs ORDER BY key")
                .fetch_all(&self.pool)
                .await?;
            rows.into_iter().map(SystemConfig::try_from).collect()
        })
        .await
    }

    async fn update_config(&self, entry: SystemConfig) -> StoreResult<Option<SystemConfig>> {
        self.timed(async {
            let row = sqlx::query_as::<_, ConfigRow>(
                r#"
                UPDATE system_configs
                SET value_type = $2, value = $3, remark = $4, updated_at = NOW()
                WHERE key = $1
                RETURNING *
                "#,
            )
            .bind(&entry.key)
            .bind(entry.value.value_type())
            .bind(entry.value.encode())
            .bind(&entry.remark)
            .fetch_optional(&self.pool)
            .await?;
            row.map(SystemConfig::try_from).transpose()
        })
        .await
    }

    async fn delete_config(&self, key: &str) -> StoreResult<bool> {
        self.timed(async {
            let result = sqlx::query("DELETE FROM system_configs WHERE key = $1")
                .bind(key)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }
}
