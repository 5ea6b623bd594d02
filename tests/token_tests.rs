use rcoach::core::issuer::{IssueOutcome, TokenIssuer};
use rcoach::core::window::SessionPolicy;
use rcoach::db::queries::require_appointment;
use rcoach::errors::{AppError, WindowMiss};

mod common;
use common::{at, book, book_confirmed, open_store};

// Appointment at 10:00 for 60 min: window is [09:30, 11:15).

fn issuer() -> TokenIssuer {
    TokenIssuer::new(SessionPolicy::default())
}

#[test]
fn test_pending_appointment_is_not_eligible() {
    let (_db, mut pool) = open_store("token_pending");
    let appt = book(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");

    let err = issuer()
        .request_token(&mut pool, appt.id, "client-1", at("2025-10-20 09:45"))
        .unwrap_err();
    assert!(matches!(err, AppError::NotEligible(_)), "got {err:?}");
}

#[test]
fn test_unknown_appointment_and_outsider_are_not_eligible() {
    let (_db, mut pool) = open_store("token_outsider");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");

    let err = issuer()
        .request_token(&mut pool, appt.id + 100, "client-1", at("2025-10-20 09:45"))
        .unwrap_err();
    assert!(matches!(err, AppError::NotEligible(_)));

    let err = issuer()
        .request_token(&mut pool, appt.id, "stranger", at("2025-10-20 09:45"))
        .unwrap_err();
    assert!(matches!(err, AppError::NotEligible(_)));
}

#[test]
fn test_one_minute_before_window_is_too_early() {
    let (_db, mut pool) = open_store("token_too_early");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");

    let err = issuer()
        .request_token(&mut pool, appt.id, "client-1", at("2025-10-20 09:29"))
        .unwrap_err();
    match err {
        AppError::OutOfWindow(WindowMiss::TooEarly { opens_in_minutes }) => {
            assert_eq!(opens_in_minutes, 1)
        }
        other => panic!("expected TooEarly, got {other:?}"),
    }

    // countdown rounds up to whole minutes
    let err = issuer()
        .request_token(&mut pool, appt.id, "client-1", at("2025-10-20 08:29:30"))
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::OutOfWindow(WindowMiss::TooEarly { opens_in_minutes: 61 })
    ));
    assert!(err.to_string().contains("1h 01m"), "{err}");
}

#[test]
fn test_window_opening_instant_is_inside() {
    let (_db, mut pool) = open_store("token_window_open");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");

    let grant = issuer()
        .request_token(&mut pool, appt.id, "client-1", at("2025-10-20 09:30"))
        .expect("window opens exactly at T-30");
    assert_eq!(grant.outcome, IssueOutcome::Issued);
    assert_eq!(grant.token.expires_at, at("2025-10-20 09:35"));
}

#[test]
fn test_valid_token_is_reused_not_reminted() {
    let (_db, mut pool) = open_store("token_reuse");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");

    let first = issuer()
        .request_token(&mut pool, appt.id, "client-1", at("2025-10-20 09:31"))
        .unwrap();
    assert_eq!(first.outcome, IssueOutcome::Issued);

    let second = issuer()
        .request_token(&mut pool, appt.id, "client-1", at("2025-10-20 09:32"))
        .unwrap();
    assert_eq!(second.outcome, IssueOutcome::Reused);
    assert_eq!(second.token, first.token);
    assert!(second.message().contains("4 min"), "{}", second.message());

    // the coach sees the same code
    let coach_view = issuer()
        .request_token(&mut pool, appt.id, "coach-1", at("2025-10-20 09:33"))
        .unwrap();
    assert_eq!(coach_view.token.value, first.token.value);
}

#[test]
fn test_expired_token_is_replaced() {
    let (_db, mut pool) = open_store("token_refresh");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");

    let first = issuer()
        .request_token(&mut pool, appt.id, "client-1", at("2025-10-20 09:40"))
        .unwrap();

    // valid iff now < expires_at
    let refreshed = issuer()
        .request_token(&mut pool, appt.id, "client-1", at("2025-10-20 09:45"))
        .unwrap();
    assert_eq!(refreshed.outcome, IssueOutcome::Issued);
    assert_ne!(refreshed.token.value, first.token.value);
    assert_eq!(refreshed.token.expires_at, at("2025-10-20 09:50"));
}

#[test]
fn test_window_closes_after_planned_end_plus_grace() {
    let (_db, mut pool) = open_store("token_too_late");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");

    let err = issuer()
        .request_token(&mut pool, appt.id, "client-1", at("2025-10-20 14:00"))
        .unwrap_err();
    assert!(matches!(err, AppError::OutOfWindow(WindowMiss::TooLate)));

    // upper bound is exclusive
    let err = issuer()
        .request_token(&mut pool, appt.id, "client-1", at("2025-10-20 11:15"))
        .unwrap_err();
    assert!(matches!(err, AppError::OutOfWindow(WindowMiss::TooLate)));

    issuer()
        .request_token(&mut pool, appt.id, "client-1", at("2025-10-20 11:14"))
        .expect("last minute of the window");
}

#[test]
fn test_custom_policy_changes_validity() {
    let (_db, mut pool) = open_store("token_policy");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");

    let policy = SessionPolicy {
        token_validity: chrono::Duration::minutes(2),
        ..SessionPolicy::default()
    };
    let grant = TokenIssuer::new(policy)
        .request_token(&mut pool, appt.id, "client-1", at("2025-10-20 09:50"))
        .unwrap();
    assert_eq!(grant.token.expires_at, at("2025-10-20 09:52"));
}

#[test]
fn test_scan_window_bounds() {
    let (_db, mut pool) = open_store("token_window_bounds");
    let appt = book(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");
    let window = SessionPolicy::default().window_for(&appt);

    assert_eq!(window.opens_at, at("2025-10-20 09:30"));
    assert_eq!(window.closes_at, at("2025-10-20 11:15"));
    assert!(!window.is_open(at("2025-10-20 09:29:59")));
    assert!(window.is_open(at("2025-10-20 09:30")));
    assert!(window.is_open(at("2025-10-20 11:14:59")));
    assert!(!window.is_open(at("2025-10-20 11:15")));
}

#[test]
fn test_issued_token_matches_stored_token_with_subsecond_clock() {
    let (_db, mut pool) = open_store("token_subsecond");
    let appt = book_confirmed(&mut pool, "client-1", &["coach-1"], "2025-10-20 10:00");
    let now = at("2025-10-20 09:40") + chrono::Duration::milliseconds(500);

    let grant = issuer()
        .request_token(&mut pool, appt.id, "client-1", now)
        .unwrap();
    assert_eq!(grant.token.issued_at, at("2025-10-20 09:40"));
    assert_eq!(grant.token.expires_at, at("2025-10-20 09:45"));

    let stored = require_appointment(&pool.conn, appt.id).unwrap();
    assert_eq!(stored.presence_token.as_ref(), Some(&grant.token));
}
