use rcoach::core::issuer::TokenIssuer;
use rcoach::core::lifecycle::{CancelOutcome, EndOutcome, ScheduleOverride, SessionLifecycle};
use rcoach::core::notify::{NoopNotifier, RecordingNotifier};
use rcoach::core::window::SessionPolicy;
use rcoach::db::feedback::list_for_appointment;
use rcoach::db::pool::DbPool;
use rcoach::db::queries::require_appointment;
use rcoach::errors::{AppError, WindowMiss};
use rcoach::models::participant::Decision;
use rcoach::models::status::AppointmentStatus;
use std::sync::{Arc, Barrier};
use std::thread;

mod common;
use common::{at, book, book_confirmed, open_store};

fn lifecycle() -> SessionLifecycle<'static> {
    SessionLifecycle::new(SessionPolicy::default(), &NoopNotifier)
}

fn token_for(pool: &mut DbPool, id: i64, now: &str) -> String {
    TokenIssuer::new(SessionPolicy::default())
        .request_token(pool, id, "client-1", at(now))
        .expect("token")
        .token
        .value
}

#[test]
fn test_start_with_valid_token() {
    let (_db, mut pool) = open_store("session_start");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");
    let token = token_for(&mut pool, appt.id, "2025-10-20 09:50");

    let started = lifecycle()
        .start_session(&mut pool, appt.id, "coach-1", &token, at("2025-10-20 09:52"))
        .expect("start");

    assert_eq!(started.appointment.status, AppointmentStatus::Started);
    assert_eq!(started.appointment.actual_start_time, Some(at("2025-10-20 09:52")));
    assert_eq!(started.reminder.auto_end_at, at("2025-10-20 10:52"));
}

#[test]
fn test_start_rejects_wrong_token_and_outsider() {
    let (_db, mut pool) = open_store("session_wrong_token");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");
    let token = token_for(&mut pool, appt.id, "2025-10-20 09:50");

    let err = lifecycle()
        .start_session(&mut pool, appt.id, "coach-1", "not-the-token", at("2025-10-20 09:51"))
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidToken));

    let err = lifecycle()
        .start_session(&mut pool, appt.id, "coach-2", &token, at("2025-10-20 09:51"))
        .unwrap_err();
    assert!(matches!(err, AppError::NotEligible(_)));

    // surrounding whitespace from manual entry is tolerated
    let padded = format!(" {token}\n");
    lifecycle()
        .start_session(&mut pool, appt.id, "coach-1", &padded, at("2025-10-20 09:51"))
        .expect("start with padded token");
}

#[test]
fn test_start_with_expired_token() {
    let (_db, mut pool) = open_store("session_expired");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");
    let token = token_for(&mut pool, appt.id, "2025-10-20 09:40");

    let err = lifecycle()
        .start_session(&mut pool, appt.id, "coach-1", &token, at("2025-10-20 09:45"))
        .unwrap_err();
    assert!(matches!(err, AppError::Expired));

    let still = require_appointment(&pool.conn, appt.id).unwrap();
    assert_eq!(still.status, AppointmentStatus::Confirmed);
}

#[test]
fn test_start_outside_window_with_still_valid_token() {
    let (_db, mut pool) = open_store("session_window");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");
    let token = token_for(&mut pool, appt.id, "2025-10-20 11:12");

    let err = lifecycle()
        .start_session(&mut pool, appt.id, "coach-1", &token, at("2025-10-20 11:15"))
        .unwrap_err();
    assert!(matches!(err, AppError::OutOfWindow(WindowMiss::TooLate)));
}

#[test]
fn test_token_is_single_use() {
    let (_db, mut pool) = open_store("session_single_use");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");
    let token = token_for(&mut pool, appt.id, "2025-10-20 09:50");

    lifecycle()
        .start_session(&mut pool, appt.id, "coach-1", &token, at("2025-10-20 09:51"))
        .unwrap();
    let err = lifecycle()
        .start_session(&mut pool, appt.id, "coach-1", &token, at("2025-10-20 09:52"))
        .unwrap_err();
    assert!(matches!(err, AppError::NotConfirmed(AppointmentStatus::Started)));
}

#[test]
fn test_concurrent_scans_start_exactly_once() {
    let (db_path, mut pool) = open_store("session_race");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-a", "coach-b"], "2025-10-20 10:00");
    let token = token_for(&mut pool, appt.id, "2025-10-20 09:50");
    let id = appt.id;
    drop(pool);

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["coach-a", "coach-b"]
        .into_iter()
        .map(|coach| {
            let db_path = db_path.clone();
            let token = token.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut pool = DbPool::new(&db_path).expect("open db");
                barrier.wait();
                lifecycle().start_session(&mut pool, id, coach, &token, at("2025-10-20 09:51"))
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one scan must start the session");
    assert!(results.iter().any(|r| matches!(
        r,
        Err(AppError::NotConfirmed(AppointmentStatus::Started))
    )));
}

#[test]
fn test_end_is_idempotent_and_opens_feedback_once() {
    let (_db, mut pool) = open_store("session_end");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");
    let token = token_for(&mut pool, appt.id, "2025-10-20 09:55");
    lifecycle()
        .start_session(&mut pool, appt.id, "coach-1", &token, at("2025-10-20 10:00"))
        .unwrap();

    let first = lifecycle()
        .end_session(&mut pool, appt.id, "coach-1", at("2025-10-20 10:58"))
        .unwrap();
    match &first {
        EndOutcome::Completed {
            appointment,
            feedback_opened,
        } => {
            assert_eq!(appointment.status, AppointmentStatus::Completed);
            assert_eq!(appointment.actual_end_time, Some(at("2025-10-20 10:58")));
            assert!(appointment.presence_token.is_none());
            assert_eq!(feedback_opened.len(), 2);
        }
        other => panic!("expected Completed, got {other:?}"),
    }

    let recorder = RecordingNotifier::default();
    let second = SessionLifecycle::new(SessionPolicy::default(), &recorder)
        .end_session(&mut pool, appt.id, "coach-1", at("2025-10-20 11:05"))
        .unwrap();
    assert!(matches!(second, EndOutcome::AlreadyCompleted(_)));
    assert_eq!(
        second.appointment().actual_start_time,
        Some(at("2025-10-20 10:00"))
    );
    assert_eq!(
        second.appointment().actual_end_time,
        Some(at("2025-10-20 10:58"))
    );
    assert!(recorder.changes().is_empty());
    assert_eq!(list_for_appointment(&pool.conn, appt.id).unwrap().len(), 2);
    assert!(list_for_appointment(&pool.conn, appt.id)
        .unwrap()
        .iter()
        .all(|f| f.eligible_at == at("2025-10-20 10:58")));
}

#[test]
fn test_end_requires_started_session() {
    let (_db, mut pool) = open_store("session_end_confirmed");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");

    let err = lifecycle()
        .end_session(&mut pool, appt.id, "coach-1", at("2025-10-20 10:30"))
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidTransition {
            from: AppointmentStatus::Confirmed,
            to: AppointmentStatus::Completed
        }
    ));
}

#[test]
fn test_sweep_completes_only_overdue_sessions() {
    let (_db, mut pool) = open_store("session_sweep");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");
    let other = book_confirmed(&mut pool, "client-2", &["coach-2"], "2025-10-20 10:30");
    let token = token_for(&mut pool, appt.id, "2025-10-20 09:35");
    lifecycle()
        .start_session(&mut pool, appt.id, "coach-1", &token, at("2025-10-20 09:35"))
        .unwrap();

    let done = lifecycle()
        .sweep_expired(&mut pool, at("2025-10-20 10:34"))
        .unwrap();
    assert!(done.is_empty());

    let done = lifecycle()
        .sweep_expired(&mut pool, at("2025-10-20 10:35"))
        .unwrap();
    assert_eq!(done, vec![appt.id]);

    let swept = require_appointment(&pool.conn, appt.id).unwrap();
    assert_eq!(swept.status, AppointmentStatus::Completed);
    assert_eq!(swept.actual_end_time, Some(at("2025-10-20 10:35")));
    assert_eq!(list_for_appointment(&pool.conn, appt.id).unwrap().len(), 2);

    let untouched = require_appointment(&pool.conn, other.id).unwrap();
    assert_eq!(untouched.status, AppointmentStatus::Confirmed);

    // a late manual end after the sweep is a no-op
    let late = lifecycle()
        .end_session(&mut pool, appt.id, "coach-1", at("2025-10-20 10:40"))
        .unwrap();
    assert!(matches!(late, EndOutcome::AlreadyCompleted(_)));
}

#[test]
fn test_current_session_follows_the_store() {
    let (_db, mut pool) = open_store("session_current");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");
    assert!(SessionLifecycle::current_session(&mut pool, "coach-1").unwrap().is_none());

    let token = token_for(&mut pool, appt.id, "2025-10-20 09:55");
    lifecycle()
        .start_session(&mut pool, appt.id, "coach-1", &token, at("2025-10-20 09:56"))
        .unwrap();

    let current = SessionLifecycle::current_session(&mut pool, "coach-1").unwrap();
    assert_eq!(current.map(|a| a.id), Some(appt.id));
    assert!(SessionLifecycle::current_session(&mut pool, "client-1").unwrap().is_none());

    lifecycle()
        .end_session(&mut pool, appt.id, "coach-1", at("2025-10-20 10:50"))
        .unwrap();
    assert!(SessionLifecycle::current_session(&mut pool, "coach-1").unwrap().is_none());
}

#[test]
fn test_cancel_clears_token_and_is_idempotent() {
    let (_db, mut pool) = open_store("session_cancel");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");
    token_for(&mut pool, appt.id, "2025-10-20 09:50");

    let err = lifecycle()
        .cancel(&mut pool, appt.id, "stranger", at("2025-10-20 09:51"))
        .unwrap_err();
    assert!(matches!(err, AppError::NotEligible(_)));

    match lifecycle()
        .cancel(&mut pool, appt.id, "client-1", at("2025-10-20 09:51"))
        .unwrap()
    {
        CancelOutcome::Cancelled(a) => {
            assert_eq!(a.status, AppointmentStatus::Cancelled);
            assert!(a.presence_token.is_none());
        }
        other => panic!("expected Cancelled, got {other:?}"),
    }

    let again = lifecycle()
        .cancel(&mut pool, appt.id, "coach-1", at("2025-10-20 09:52"))
        .unwrap();
    assert!(matches!(again, CancelOutcome::AlreadyCancelled(_)));

    let err = TokenIssuer::new(SessionPolicy::default())
        .request_token(&mut pool, appt.id, "client-1", at("2025-10-20 09:53"))
        .unwrap_err();
    assert!(matches!(err, AppError::NotEligible(_)));
}

#[test]
fn test_completed_session_cannot_be_cancelled() {
    let (_db, mut pool) = open_store("session_cancel_completed");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");
    let token = token_for(&mut pool, appt.id, "2025-10-20 09:55");
    lifecycle()
        .start_session(&mut pool, appt.id, "coach-1", &token, at("2025-10-20 09:56"))
        .unwrap();
    lifecycle()
        .end_session(&mut pool, appt.id, "coach-1", at("2025-10-20 10:50"))
        .unwrap();

    let err = lifecycle()
        .cancel(&mut pool, appt.id, "client-1", at("2025-10-20 10:51"))
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
}

#[test]
fn test_group_split_vote_stays_pending() {
    let (_db, mut pool) = open_store("session_group_split");
    let appt = book(&mut pool, "client-1", &["coach-a", "coach-b"], "2025-10-20 10:00");
    let now = at("2025-10-19 12:00");

    let after_a = lifecycle()
        .confirm(&mut pool, appt.id, "coach-a", Decision::Accepted, None, now)
        .unwrap();
    assert_eq!(after_a.status, AppointmentStatus::Pending);

    let after_b = lifecycle()
        .confirm(&mut pool, appt.id, "coach-b", Decision::Refused, None, now)
        .unwrap();
    assert_eq!(after_b.status, AppointmentStatus::Pending);

    // while pending, a coach may change their mind
    let revised = lifecycle()
        .confirm(&mut pool, appt.id, "coach-b", Decision::Accepted, None, now)
        .unwrap();
    assert_eq!(revised.status, AppointmentStatus::Confirmed);

    let err = lifecycle()
        .confirm(&mut pool, appt.id, "coach-a", Decision::Refused, None, now)
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
}

#[test]
fn test_group_unanimous_refusal() {
    let (_db, mut pool) = open_store("session_group_refused");
    let appt = book(&mut pool, "client-1", &["coach-a", "coach-b"], "2025-10-20 10:00");
    let now = at("2025-10-19 12:00");

    lifecycle()
        .confirm(&mut pool, appt.id, "coach-a", Decision::Refused, None, now)
        .unwrap();
    let refused = lifecycle()
        .confirm(&mut pool, appt.id, "coach-b", Decision::Refused, None, now)
        .unwrap();
    assert_eq!(refused.status, AppointmentStatus::Refused);
}

#[test]
fn test_accept_can_reschedule() {
    let (_db, mut pool) = open_store("session_reschedule");
    let appt = book(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");

    let scheduling = ScheduleOverride {
        scheduled_at: Some(at("2025-10-20 16:00")),
        duration_minutes: Some(45),
        location: None,
    };
    let confirmed = lifecycle()
        .confirm(
            &mut pool,
            appt.id,
            "coach-1",
            Decision::Accepted,
            Some(&scheduling),
            at("2025-10-19 12:00"),
        )
        .unwrap();

    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);
    assert_eq!(confirmed.scheduled_at, at("2025-10-20 16:00"));
    assert_eq!(confirmed.duration_minutes, 45);
    assert_eq!(confirmed.location.as_deref(), Some("Gym A"));

    // the old slot no longer opens the window
    let err = TokenIssuer::new(SessionPolicy::default())
        .request_token(&mut pool, appt.id, "client-1", at("2025-10-20 09:50"))
        .unwrap_err();
    assert!(matches!(err, AppError::OutOfWindow(WindowMiss::TooEarly { .. })));
}

#[test]
fn test_refusal_cannot_reschedule_and_client_cannot_decide() {
    let (_db, mut pool) = open_store("session_refuse_override");
    let appt = book(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");
    let scheduling = ScheduleOverride {
        location: Some("Park".to_string()),
        ..ScheduleOverride::default()
    };

    let err = lifecycle()
        .confirm(
            &mut pool,
            appt.id,
            "coach-1",
            Decision::Refused,
            Some(&scheduling),
            at("2025-10-19 12:00"),
        )
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let err = lifecycle()
        .confirm(&mut pool, appt.id, "client-1", Decision::Accepted, None, at("2025-10-19 12:00"))
        .unwrap_err();
    assert!(matches!(err, AppError::NotEligible(_)));
}

#[test]
fn test_transitions_notify_other_participants() {
    let (_db, mut pool) = open_store("session_notify");
    let appt = book(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");
    let recorder = RecordingNotifier::default();
    let lifecycle = SessionLifecycle::new(SessionPolicy::default(), &recorder);

    lifecycle
        .confirm(&mut pool, appt.id, "coach-1", Decision::Accepted, None, at("2025-10-19 12:00"))
        .unwrap();
    lifecycle
        .cancel(&mut pool, appt.id, "client-1", at("2025-10-19 13:00"))
        .unwrap();

    let changes = recorder.changes();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].from, AppointmentStatus::Pending);
    assert_eq!(changes[0].to, AppointmentStatus::Confirmed);
    assert_eq!(changes[0].recipients, vec!["client-1".to_string()]);
    assert_eq!(changes[1].to, AppointmentStatus::Cancelled);
    assert_eq!(changes[1].recipients, vec!["coach-1".to_string()]);
}

#[test]
fn test_moving_the_slot_reopens_other_coaches_decisions() {
    let (_db, mut pool) = open_store("session_group_reschedule");
    let appt = book(&mut pool, "client-1", &["coach-a", "coach-b"], "2025-10-20 10:00");
    let now = at("2025-10-19 12:00");

    lifecycle()
        .confirm(&mut pool, appt.id, "coach-a", Decision::Accepted, None, now)
        .unwrap();

    let scheduling = ScheduleOverride {
        scheduled_at: Some(at("2025-10-20 17:00")),
        ..ScheduleOverride::default()
    };
    let moved = lifecycle()
        .confirm(&mut pool, appt.id, "coach-b", Decision::Accepted, Some(&scheduling), now)
        .unwrap();

    // coach-a agreed to 10:00, not 17:00
    assert_eq!(moved.status, AppointmentStatus::Pending);
    assert_eq!(moved.scheduled_at, at("2025-10-20 17:00"));
    assert_eq!(moved.participants["coach-a"].decision, Decision::Pending);
    assert_eq!(moved.participants["coach-a"].decided_at, None);
    assert_eq!(moved.participants["coach-b"].decision, Decision::Accepted);

    let confirmed = lifecycle()
        .confirm(&mut pool, appt.id, "coach-a", Decision::Accepted, None, now)
        .unwrap();
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

    // restating the current slot keeps earlier answers
    let (_db2, mut pool2) = open_store("session_group_same_slot");
    let appt = book(&mut pool2, "client-1", &["coach-a", "coach-b"], "2025-10-20 10:00");
    lifecycle()
        .confirm(&mut pool2, appt.id, "coach-a", Decision::Accepted, None, now)
        .unwrap();
    let same = ScheduleOverride {
        scheduled_at: Some(at("2025-10-20 10:00")),
        ..ScheduleOverride::default()
    };
    let unchanged = lifecycle()
        .confirm(&mut pool2, appt.id, "coach-b", Decision::Accepted, Some(&same), now)
        .unwrap();
    assert_eq!(unchanged.status, AppointmentStatus::Confirmed);
}
