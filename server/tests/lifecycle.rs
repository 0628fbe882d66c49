mod common;

use std::collections::HashSet;

use dididaren_server::error::DispatchError;
use dididaren_server::models::{
    CreateConfigRequest, CreateRatingRequest, CreateZoneRequest, ConfigValue, DangerLevel,
    HandlingAction, IncidentCategory, IncidentStatus, PaginationParams, RatingPatch,
    RecordProgressRequest,
};
use dididaren_server::services::SEARCH_RADIUS_KEY;
use uuid::Uuid;

use common::{admin, on_duty_staff, report, state, state_with_radius, user};

#[tokio::test]
async fn report_assign_complete_happy_path() {
    let state = state();
    let incidents = &state.incident_service;
    let reporter = user();
    let (staff_user, staff) = on_duty_staff(&state, 39.901, 116.4).await;

    let created = incidents
        .report(&reporter, report(IncidentCategory::Medical, 39.9, 116.4))
        .await
        .unwrap();
    let id = created.incident.id;
    assert_eq!(created.incident.status, IncidentStatus::Pending);
    assert!(created.incident.assigned_staff.is_none());
    assert_eq!(created.nearby_staff, 1);
    assert!(incidents.records(&reporter, id).await.unwrap().is_empty());

    let assigned = incidents.accept(&staff_user, id).await.unwrap();
    assert_eq!(assigned.status, IncidentStatus::Processing);
    assert_eq!(assigned.assigned_staff, Some(staff.id));
    let records = incidents.records(&reporter, id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, HandlingAction::Accept);

    let completed = incidents
        .complete(&staff_user, id, "resolved".into())
        .await
        .unwrap();
    assert_eq!(completed.status, IncidentStatus::Completed);
    assert!(completed.assignment_is_consistent());

    let records = incidents.records(&reporter, id).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].action, HandlingAction::Complete);
    assert_eq!(records[1].note, "resolved");

    let staff_after = state.dispatch_service.get(staff.id).await.unwrap();
    assert_eq!(staff_after.completed_orders, 1);
    assert_eq!(staff_after.rating_count, 0);
}

#[tokio::test]
async fn second_assign_is_an_invalid_transition() {
    let state = state();
    let incidents = &state.incident_service;
    let operator = admin();
    let (_, first) = on_duty_staff(&state, 0.0, 0.0).await;
    let (_, second) = on_duty_staff(&state, 0.0, 0.0).await;
    let id = incidents
        .report(&user(), report(IncidentCategory::General, 0.0, 0.0))
        .await
        .unwrap()
        .incident
        .id;

    incidents.assign(&operator, id, first.id).await.unwrap();
    let again = incidents.assign(&operator, id, second.id).await;
    assert!(matches!(
        again,
        Err(DispatchError::InvalidTransition {
            from: IncidentStatus::Processing,
            ..
        })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_assigns_have_exactly_one_winner() {
    let state = state();
    let id = state
        .incident_service
        .report(&user(), report(IncidentCategory::Fraud, 10.0, 10.0))
        .await
        .unwrap()
        .incident
        .id;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let (staff_user, _) = on_duty_staff(&state, 10.0, 10.0).await;
        let incidents = state.incident_service.clone();
        handles.push(tokio::spawn(async move {
            incidents.accept(&staff_user, id).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(DispatchError::InvalidTransition { from, .. }) => {
                assert_eq!(from, IncidentStatus::Processing)
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(winners, 1);

    let records = state
        .incident_service
        .records(&admin(), id)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn only_the_assignee_can_complete() {
    let state = state();
    let incidents = &state.incident_service;
    let (assignee, _) = on_duty_staff(&state, 0.0, 0.0).await;
    let (other, _) = on_duty_staff(&state, 0.0, 0.0).await;
    let id = incidents
        .report(&user(), report(IncidentCategory::General, 0.0, 0.0))
        .await
        .unwrap()
        .incident
        .id;

    assert!(matches!(
        incidents.complete(&assignee, id, String::new()).await,
        Err(DispatchError::InvalidTransition {
            from: IncidentStatus::Pending,
            ..
        })
    ));

    incidents.accept(&assignee, id).await.unwrap();
    assert!(matches!(
        incidents.complete(&other, id, String::new()).await,
        Err(DispatchError::NotAssignedStaff)
    ));
    incidents.complete(&assignee, id, String::new()).await.unwrap();
}

#[tokio::test]
async fn cancel_from_each_state() {
    let state = state();
    let incidents = &state.incident_service;
    let reporter = user();
    let (staff_user, staff) = on_duty_staff(&state, 0.0, 0.0).await;

    let pending = incidents
        .report(&reporter, report(IncidentCategory::General, 0.0, 0.0))
        .await
        .unwrap()
        .incident
        .id;
    let cancelled = incidents
        .cancel(&reporter, pending, "false alarm".into())
        .await
        .unwrap();
    assert_eq!(cancelled.status, IncidentStatus::Cancelled);
    assert!(cancelled.assigned_staff.is_none());
    assert!(matches!(
        incidents.cancel(&reporter, pending, String::new()).await,
        Err(DispatchError::InvalidTransition {
            from: IncidentStatus::Cancelled,
            ..
        })
    ));

    let processing = incidents
        .report(&reporter, report(IncidentCategory::General, 0.0, 0.0))
        .await
        .unwrap()
        .incident
        .id;
    incidents.accept(&staff_user, processing).await.unwrap();
    let aborted = incidents
        .cancel(&staff_user, processing, "could not reach".into())
        .await
        .unwrap();
    assert_eq!(aborted.status, IncidentStatus::Cancelled);
    assert_eq!(aborted.assigned_staff, Some(staff.id));
    let records = incidents.records(&reporter, processing).await.unwrap();
    assert_eq!(
        records.iter().map(|r| r.action).collect::<Vec<_>>(),
        vec![HandlingAction::Accept, HandlingAction::Cancel]
    );
    assert_eq!(records[1].staff_id, Some(staff.id));

    let done = incidents
        .report(&reporter, report(IncidentCategory::General, 0.0, 0.0))
        .await
        .unwrap()
        .incident
        .id;
    incidents.accept(&staff_user, done).await.unwrap();
    incidents.complete(&staff_user, done, String::new()).await.unwrap();
    assert!(matches!(
        incidents.cancel(&admin(), done, String::new()).await,
        Err(DispatchError::InvalidTransition {
            from: IncidentStatus::Completed,
            ..
        })
    ));
}

#[tokio::test]
async fn strangers_cannot_cancel() {
    let state = state();
    let id = state
        .incident_service
        .report(&user(), report(IncidentCategory::General, 0.0, 0.0))
        .await
        .unwrap()
        .incident
        .id;

    let stranger = user();
    assert!(matches!(
        state.incident_service.cancel(&stranger, id, String::new()).await,
        Err(DispatchError::NotFound { .. } | DispatchError::Forbidden(_))
    ));
}

#[tokio::test]
async fn busy_and_offline_staff_cannot_be_assigned() {
    let state = state();
    let incidents = &state.incident_service;
    let operator = admin();
    let (_, staff) = on_duty_staff(&state, 0.0, 0.0).await;

    let first = incidents
        .report(&user(), report(IncidentCategory::General, 0.0, 0.0))
        .await
        .unwrap()
        .incident
        .id;
    let second = incidents
        .report(&user(), report(IncidentCategory::General, 0.0, 0.0))
        .await
        .unwrap()
        .incident
        .id;

    incidents.assign(&operator, first, staff.id).await.unwrap();
    assert!(matches!(
        incidents.assign(&operator, second, staff.id).await,
        Err(DispatchError::StaffBusy)
    ));

    let (_, offline) = on_duty_staff(&state, 0.0, 0.0).await;
    state
        .dispatch_service
        .set_availability(offline.id, offline.current_coordinate().unwrap(), false)
        .await
        .unwrap();
    assert!(matches!(
        incidents.assign(&operator, second, offline.id).await,
        Err(DispatchError::StaffUnavailable)
    ));

    let still_pending = incidents.get(&operator, second).await.unwrap();
    assert_eq!(still_pending.status, IncidentStatus::Pending);
    assert!(still_pending.assignment_is_consistent());
}

#[tokio::test]
async fn second_assign_with_offline_staff_reports_the_incident_state() {
    let state = state();
    let incidents = &state.incident_service;
    let operator = admin();
    let (_, first) = on_duty_staff(&state, 0.0, 0.0).await;
    let (_, offline) = on_duty_staff(&state, 0.0, 0.0).await;
    state
        .dispatch_service
        .set_availability(offline.id, offline.current_coordinate().unwrap(), false)
        .await
        .unwrap();
    let id = incidents
        .report(&user(), report(IncidentCategory::General, 0.0, 0.0))
        .await
        .unwrap()
        .incident
        .id;

    incidents.assign(&operator, id, first.id).await.unwrap();
    assert!(matches!(
        incidents.assign(&operator, id, offline.id).await,
        Err(DispatchError::InvalidTransition {
            from: IncidentStatus::Processing,
            ..
        })
    ));
}

#[tokio::test]
async fn unknown_incident_is_reported_before_unknown_staff() {
    let state = state();
    let incidents = &state.incident_service;
    let operator = admin();

    match incidents.assign(&operator, Uuid::new_v4(), Uuid::new_v4()).await {
        Err(DispatchError::NotFound { entity, .. }) => assert_eq!(entity, "incident"),
        other => panic!("expected incident not found, got {other:?}"),
    }

    let id = incidents
        .report(&user(), report(IncidentCategory::General, 0.0, 0.0))
        .await
        .unwrap()
        .incident
        .id;
    let ghost = Uuid::new_v4();
    match incidents.assign(&operator, id, ghost).await {
        Err(DispatchError::NotFound { entity, id }) => {
            assert_eq!(entity, "staff");
            assert_eq!(id, ghost.to_string());
        }
        other => panic!("expected staff not found, got {other:?}"),
    }
    assert!(incidents.records(&operator, id).await.unwrap().is_empty());
}

#[tokio::test]
async fn progress_records_require_the_assignee_and_processing() {
    let state = state();
    let incidents = &state.incident_service;
    let (assignee, _) = on_duty_staff(&state, 0.0, 0.0).await;
    let (other, _) = on_duty_staff(&state, 0.0, 0.0).await;
    let id = incidents
        .report(&user(), report(IncidentCategory::DomesticViolence, 0.0, 0.0))
        .await
        .unwrap()
        .incident
        .id;

    let arrive = || RecordProgressRequest {
        action: HandlingAction::Arrive,
        note: "on scene".into(),
    };

    assert!(matches!(
        incidents.record_progress(&assignee, id, arrive()).await,
        Err(DispatchError::InvalidTransition { .. })
    ));

    incidents.accept(&assignee, id).await.unwrap();
    assert!(matches!(
        incidents.record_progress(&other, id, arrive()).await,
        Err(DispatchError::NotAssignedStaff)
    ));
    assert!(matches!(
        incidents
            .record_progress(
                &assignee,
                id,
                RecordProgressRequest {
                    action: HandlingAction::Complete,
                    note: String::new(),
                },
            )
            .await,
        Err(DispatchError::Validation(_))
    ));

    let unchanged = incidents.record_progress(&assignee, id, arrive()).await.unwrap();
    assert_eq!(unchanged.status, IncidentStatus::Processing);
    let records = incidents.records(&admin(), id).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].action, HandlingAction::Arrive);
}

#[tokio::test]
async fn users_only_see_their_own_incidents() {
    let state = state();
    let incidents = &state.incident_service;
    let alice = user();
    let bob = user();

    let mine = incidents
        .report(&alice, report(IncidentCategory::General, 1.0, 1.0))
        .await
        .unwrap()
        .incident
        .id;
    let theirs = incidents
        .report(&bob, report(IncidentCategory::General, 1.0, 1.0))
        .await
        .unwrap()
        .incident
        .id;

    assert!(incidents.get(&alice, mine).await.is_ok());
    assert!(matches!(
        incidents.get(&alice, theirs).await,
        Err(DispatchError::NotFound { .. })
    ));

    let everything = PaginationParams {
        page: None,
        size: None,
    };
    let alice_page = incidents.list(&alice, None, everything).await.unwrap();
    assert_eq!(alice_page.total, 1);
    assert_eq!(alice_page.items[0].id, mine);

    let admin_page = incidents.list(&admin(), None, everything).await.unwrap();
    assert_eq!(admin_page.total, 2);
    let ids: HashSet<_> = admin_page.items.iter().map(|i| i.id).collect();
    assert!(ids.contains(&mine) && ids.contains(&theirs));

    let none_processing = incidents
        .list(&admin(), Some(IncidentStatus::Processing), everything)
        .await
        .unwrap();
    assert_eq!(none_processing.total, 0);
}

#[tokio::test]
async fn tombstoned_incidents_disappear() {
    let state = state();
    let incidents = &state.incident_service;
    let operator = admin();
    let id = incidents
        .report(&user(), report(IncidentCategory::General, 0.0, 0.0))
        .await
        .unwrap()
        .incident
        .id;

    incidents.tombstone(id).await.unwrap();
    assert!(matches!(
        incidents.get(&operator, id).await,
        Err(DispatchError::NotFound { .. })
    ));
    assert!(matches!(
        incidents.tombstone(id).await,
        Err(DispatchError::NotFound { .. })
    ));
}

#[tokio::test]
async fn report_flags_risk_zones_and_honours_radius_override() {
    let state = state_with_radius(50.0);
    state
        .zone_service
        .create(
            CreateZoneRequest {
                name: "old quarter".into(),
                description: String::new(),
                danger_level: DangerLevel::High,
                latitude: 0.0,
                longitude: 0.0,
                radius_meters: 1_000.0,
            }
            .into(),
        )
        .await
        .unwrap();
    on_duty_staff(&state, 0.0, 0.01).await;

    let inside = state
        .incident_service
        .report(&user(), report(IncidentCategory::General, 0.0, 0.005))
        .await
        .unwrap();
    assert!(inside.zone_check.inside);
    assert_eq!(inside.nearby_staff, 0);

    state
        .config_service
        .create(CreateConfigRequest {
            key: SEARCH_RADIUS_KEY.into(),
            value: ConfigValue::Number(2_000.0),
            remark: String::new(),
        })
        .await
        .unwrap();

    let outside = state
        .incident_service
        .report(&user(), report(IncidentCategory::General, 0.0, 0.02))
        .await
        .unwrap();
    assert!(!outside.zone_check.inside);
    assert_eq!(outside.nearby_staff, 1);
}

#[tokio::test]
async fn unusable_radius_override_falls_back_to_the_default() {
    let state = state_with_radius(2_000.0);
    let reporter = user();
    on_duty_staff(&state, 0.0, 0.01).await;
    state
        .config_service
        .create(CreateConfigRequest {
            key: SEARCH_RADIUS_KEY.into(),
            value: ConfigValue::Number(-1.0),
            remark: String::new(),
        })
        .await
        .unwrap();

    let created = state
        .incident_service
        .report(&reporter, report(IncidentCategory::General, 0.0, 0.0))
        .await
        .unwrap();
    assert_eq!(created.nearby_staff, 1);

    let everything = PaginationParams {
        page: None,
        size: None,
    };
    let listed = state
        .incident_service
        .list(&reporter, None, everything)
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].id, created.incident.id);
}

#[tokio::test]
async fn ratings_follow_completion_and_stay_unique() {
    let state = state();
    let incidents = &state.incident_service;
    let ratings = &state.rating_service;
    let reporter = user();
    let (staff_user, staff) = on_duty_staff(&state, 0.0, 0.0).await;

    let id = incidents
        .report(&reporter, report(IncidentCategory::Medical, 0.0, 0.0))
        .await
        .unwrap()
        .incident
        .id;
    let rate = |score| CreateRatingRequest {
        incident_id: id,
        score,
        comment: String::new(),
        is_public: true,
    };

    assert!(matches!(
        ratings.create(&reporter, rate(5)).await,
        Err(DispatchError::InvalidTransition { .. })
    ));

    incidents.accept(&staff_user, id).await.unwrap();
    incidents.complete(&staff_user, id, String::new()).await.unwrap();

    assert!(matches!(
        ratings.create(&reporter, rate(6)).await,
        Err(DispatchError::OutOfRange(_))
    ));
    assert!(matches!(
        ratings.create(&user(), rate(5)).await,
        Err(DispatchError::Forbidden(_))
    ));

    let rating = ratings.create(&reporter, rate(5)).await.unwrap();
    assert_eq!(rating.staff_id, staff.id);
    assert!(matches!(
        ratings.create(&reporter, rate(4)).await,
        Err(DispatchError::DuplicateRating)
    ));

    let average = ratings.staff_average(staff.id).await.unwrap();
    assert_eq!(average.rating_count, 1);
    assert_eq!(average.average_rating, 5.0);

    ratings
        .update(
            &reporter,
            rating.id,
            RatingPatch {
                score: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let average = ratings.staff_average(staff.id).await.unwrap();
    assert_eq!(average.rating_count, 1);
    assert_eq!(average.average_rating, 3.0);

    ratings.delete(&reporter, rating.id).await.unwrap();
    let average = ratings.staff_average(staff.id).await.unwrap();
    assert_eq!(average.rating_count, 0);

    // A tombstoned rating frees the pair for a new one.
    ratings.create(&reporter, rate(4)).await.unwrap();
}

#[tokio::test]
async fn private_ratings_are_hidden_from_strangers() {
    let state = state();
    let incidents = &state.incident_service;
    let reporter = user();
    let (staff_user, staff) = on_duty_staff(&state, 0.0, 0.0).await;
    let id = incidents
        .report(&reporter, report(IncidentCategory::General, 0.0, 0.0))
        .await
        .unwrap()
        .incident
        .id;
    incidents.accept(&staff_user, id).await.unwrap();
    incidents.complete(&staff_user, id, String::new()).await.unwrap();

    state
        .rating_service
        .create(
            &reporter,
            CreateRatingRequest {
                incident_id: id,
                score: 2,
                comment: "late".into(),
                is_public: false,
            },
        )
        .await
        .unwrap();

    let ratings = &state.rating_service;
    assert!(ratings.for_staff(&user(), staff.id).await.unwrap().is_empty());
    assert_eq!(ratings.for_staff(&staff_user, staff.id).await.unwrap().len(), 1);
    assert_eq!(ratings.for_staff(&reporter, staff.id).await.unwrap().len(), 1);
    assert!(ratings.for_incident(&reporter, id).await.is_ok());
}
