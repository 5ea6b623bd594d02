#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::NaiveDateTime;
use rcoach::core::booking::{BookingLogic, BookingRequest};
use rcoach::core::lifecycle::SessionLifecycle;
use rcoach::core::notify::NoopNotifier;
use rcoach::core::window::SessionPolicy;
use rcoach::db::initialize::init_db;
use rcoach::db::pool::DbPool;
use rcoach::models::appointment::Appointment;
use rcoach::models::participant::Decision;
use std::env;
use std::fs;
use std::path::PathBuf;

pub fn rcoach() -> Command {
    let mut cmd = cargo_bin_cmd!("rcoach");
    // keep config lookups away from the real home directory
    cmd.env("RCOACH_HOME", env::temp_dir().join("rcoach_test_home"));
    cmd
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rcoach.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .expect("valid test datetime")
}

/// Fresh, migrated store for library-level tests.
pub fn open_store(name: &str) -> (String, DbPool) {
    let db_path = setup_test_db(name);
    let pool = DbPool::new(&db_path).expect("open db");
    init_db(&pool.conn).expect("init db");
    (db_path, pool)
}

/// Book a pending appointment, requested the day before.
pub fn book(pool: &mut DbPool, client: &str, coaches: &[&str], scheduled: &str) -> Appointment {
    let request = BookingRequest {
        client_id: client.to_string(),
        coach_ids: coaches.iter().map(|c| c.to_string()).collect(),
        scheduled_at: at(scheduled),
        duration_minutes: 60,
        location: Some("Gym A".to_string()),
    };
    BookingLogic::book(pool, &NoopNotifier, &request, at("2025-10-19 08:00")).expect("book")
}

/// Book and have every coach accept.
pub fn book_confirmed(
    pool: &mut DbPool,
    client: &str,
    coaches: &[&str],
    scheduled: &str,
) -> Appointment {
    let appt = book(pool, client, coaches, scheduled);
    let lifecycle = SessionLifecycle::new(SessionPolicy::default(), &NoopNotifier);
    let mut last = appt;
    for coach in coaches {
        last = lifecycle
            .confirm(pool, last.id, coach, Decision::Accepted, None, at("2025-10-19 09:00"))
            .expect("confirm");
    }
    last
}

/// Initialize a DB through the CLI, as a user would.
pub fn init_cli_db(db_path: &str) {
    rcoach()
        .args(["--db", db_path, "--test", "init"])
        .assert()
        .success();
}
