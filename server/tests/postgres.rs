//! Postgres store behaviour. Run with
//! `DATABASE_URL=postgres://... cargo test --features postgres-tests`;
//! each test gets a fresh database with the migrations applied.
#![cfg(feature = "postgres-tests")]

use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

use dididaren_server::geo::Coordinate;
use dididaren_server::models::{
    HandlingAction, IncidentCategory, IncidentStatus, NewHandlingRecord, NewIncident, NewRating,
    NewStaff, RatingPatch, Transition, TransitionOutcome, VerificationStatus,
};
use dididaren_server::store::{IncidentStore, PgStore, RatingStore, StaffStore};

fn store(pool: PgPool) -> PgStore {
    PgStore::from_pool(pool, Duration::from_secs(5))
}

fn report(reporter: Uuid) -> NewIncident {
    NewIncident {
        reporter_id: reporter,
        category: IncidentCategory::General,
        description: "stuck in lift".into(),
        address: Some("12 Quay Street".into()),
        coordinate: Coordinate::new(1.0, 1.0).unwrap(),
    }
}

fn application() -> NewStaff {
    NewStaff {
        user_id: Uuid::new_v4(),
        company_name: "Harbour Watch".into(),
        license_number: "SEC-001".into(),
        cert_files: vec!["certs/first-aid.pdf".into(), "certs/licence.png".into()],
    }
}

async fn on_duty(store: &PgStore) -> Uuid {
    let staff = store.insert_staff(application()).await.unwrap().unwrap();
    store
        .set_verification(staff.id, VerificationStatus::Approved)
        .await
        .unwrap();
    store
        .set_availability(staff.id, 1.0, 1.0, true)
        .await
        .unwrap();
    staff.id
}

fn move_to(
    incident_id: Uuid,
    next: IncidentStatus,
    staff_id: Uuid,
    action: HandlingAction,
) -> Transition {
    let accepting = next == IncidentStatus::Processing;
    Transition {
        incident_id,
        next,
        assign_staff: accepting.then_some(staff_id),
        require_assignee: (!accepting).then_some(staff_id),
        credit_completion: next == IncidentStatus::Completed,
        record: NewHandlingRecord {
            incident_id,
            actor_id: Uuid::new_v4(),
            staff_id: Some(staff_id),
            action,
            note: String::new(),
        },
    }
}

fn accept(incident_id: Uuid, staff_id: Uuid) -> Transition {
    move_to(incident_id, IncidentStatus::Processing, staff_id, HandlingAction::Accept)
}

#[sqlx::test(migrations = "./migrations")]
async fn application_details_round_trip(pool: PgPool) {
    let store = store(pool);
    let inserted = store.insert_staff(application()).await.unwrap().unwrap();

    let fetched = store.get_staff(inserted.id).await.unwrap().unwrap();
    assert_eq!(fetched.company_name, "Harbour Watch");
    assert_eq!(fetched.license_number, "SEC-001");
    assert_eq!(
        fetched.cert_files,
        vec!["certs/first-aid.pdf".to_string(), "certs/licence.png".to_string()]
    );
    assert_eq!(fetched.verification, VerificationStatus::Pending);

    let again = NewStaff {
        user_id: inserted.user_id,
        ..application()
    };
    assert!(store.insert_staff(again).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn transitions_check_status_then_staff(pool: PgPool) {
    let store = store(pool);
    let incident = store.insert_incident(report(Uuid::new_v4())).await.unwrap();

    let missing = store
        .apply_transition(accept(Uuid::new_v4(), Uuid::new_v4()))
        .await
        .unwrap();
    assert!(matches!(missing, TransitionOutcome::NotFound));

    let ghost = Uuid::new_v4();
    let outcome = store.apply_transition(accept(incident.id, ghost)).await.unwrap();
    assert!(matches!(outcome, TransitionOutcome::StaffNotFound(id) if id == ghost));

    let offline = on_duty(&store).await;
    store.set_availability(offline, 1.0, 1.0, false).await.unwrap();
    let outcome = store.apply_transition(accept(incident.id, offline)).await.unwrap();
    assert!(matches!(outcome, TransitionOutcome::StaffUnavailable));

    let staff = on_duty(&store).await;
    let outcome = store.apply_transition(accept(incident.id, staff)).await.unwrap();
    assert!(matches!(outcome, TransitionOutcome::Applied(ref i) if i.assigned_staff == Some(staff)));

    let outcome = store.apply_transition(accept(incident.id, offline)).await.unwrap();
    assert!(matches!(outcome, TransitionOutcome::Rejected(IncidentStatus::Processing)));

    let records = store.list_records(incident.id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, HandlingAction::Accept);
}

#[sqlx::test(migrations = "./migrations")]
async fn busy_staff_cannot_take_a_second_incident(pool: PgPool) {
    let store = store(pool);
    let staff = on_duty(&store).await;
    let first = store.insert_incident(report(Uuid::new_v4())).await.unwrap();
    let second = store.insert_incident(report(Uuid::new_v4())).await.unwrap();

    store.apply_transition(accept(first.id, staff)).await.unwrap();
    let outcome = store.apply_transition(accept(second.id, staff)).await.unwrap();
    assert!(matches!(outcome, TransitionOutcome::StaffBusy));

    let untouched = store.get_incident(second.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, IncidentStatus::Pending);
}

#[sqlx::test(migrations = "./migrations")]
async fn completion_is_credited_in_the_same_transaction(pool: PgPool) {
    let store = store(pool);
    let staff = on_duty(&store).await;
    let incident = store.insert_incident(report(Uuid::new_v4())).await.unwrap();
    store.apply_transition(accept(incident.id, staff)).await.unwrap();

    let stranger = on_duty(&store).await;
    let outcome = store
        .apply_transition(move_to(
            incident.id,
            IncidentStatus::Completed,
            stranger,
            HandlingAction::Complete,
        ))
        .await
        .unwrap();
    assert!(matches!(outcome, TransitionOutcome::NotAssignee));
    assert_eq!(store.get_staff(staff).await.unwrap().unwrap().completed_orders, 0);

    let outcome = store
        .apply_transition(move_to(
            incident.id,
            IncidentStatus::Completed,
            staff,
            HandlingAction::Complete,
        ))
        .await
        .unwrap();
    assert!(matches!(outcome, TransitionOutcome::Applied(ref i) if i.status == IncidentStatus::Completed));
    assert_eq!(store.get_staff(staff).await.unwrap().unwrap().completed_orders, 1);
    assert_eq!(store.list_records(incident.id).await.unwrap().len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn rating_writes_keep_the_aggregate_in_step(pool: PgPool) {
    let store = store(pool);
    let staff = on_duty(&store).await;
    let incident = store.insert_incident(report(Uuid::new_v4())).await.unwrap();
    let rating = |score| NewRating {
        incident_id: incident.id,
        rater_id: incident.reporter_id,
        staff_id: staff,
        score,
        comment: String::new(),
        is_public: true,
    };

    let first = store.insert_rating(rating(4)).await.unwrap().unwrap();
    assert!(store.insert_rating(rating(2)).await.unwrap().is_none());
    let profile = store.get_staff(staff).await.unwrap().unwrap();
    assert_eq!(profile.rating_count, 1);
    assert_eq!(profile.average_rating, 4.0);

    store
        .update_rating(
            first.id,
            RatingPatch {
                score: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    let profile = store.get_staff(staff).await.unwrap().unwrap();
    assert_eq!(profile.rating_count, 1);
    assert_eq!(profile.average_rating, 2.0);

    assert!(store.tombstone_rating(first.id).await.unwrap());
    assert!(!store.tombstone_rating(first.id).await.unwrap());
    let profile = store.get_staff(staff).await.unwrap().unwrap();
    assert_eq!(profile.rating_count, 0);

    store.insert_rating(rating(5)).await.unwrap().unwrap();
    let profile = store.get_staff(staff).await.unwrap().unwrap();
    assert_eq!(profile.rating_count, 1);
    assert_eq!(profile.average_rating, 5.0);
}
