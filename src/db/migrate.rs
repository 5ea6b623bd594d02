use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};

/// A schema step, recorded in the `log` table once applied.
struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20251019_0001_appointments",
        description: "Created appointments and participants tables",
        sql: r#"
        CREATE TABLE IF NOT EXISTS appointments (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            scheduled_at      TEXT NOT NULL,
            duration_minutes  INTEGER NOT NULL CHECK(duration_minutes > 0),
            location          TEXT,
            status            TEXT NOT NULL DEFAULT 'pending'
                              CHECK(status IN ('pending','confirmed','refused',
                                               'started','completed','cancelled')),
            qr_token          TEXT,
            token_issued_at   TEXT,
            token_expires_at  TEXT,
            actual_start_time TEXT,
            actual_end_time   TEXT,
            auto_end_at       TEXT,
            created_at        TEXT NOT NULL,
            updated_at        TEXT NOT NULL,
            CHECK(qr_token IS NULL OR status IN ('confirmed','started'))
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_qr_token ON appointments(qr_token);
        CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments(status, auto_end_at);

        CREATE TABLE IF NOT EXISTS participants (
            appointment_id INTEGER NOT NULL REFERENCES appointments(id),
            participant_id TEXT NOT NULL,
            role           TEXT NOT NULL CHECK(role IN ('client','coach')),
            decision       TEXT NOT NULL DEFAULT 'pending'
                           CHECK(decision IN ('pending','accepted','refused')),
            decided_at     TEXT,
            PRIMARY KEY (appointment_id, participant_id)
        );

        CREATE INDEX IF NOT EXISTS idx_participants_participant
            ON participants(participant_id, role);
        "#,
    },
    Migration {
        version: "20251019_0002_feedback",
        description: "Created feedback table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS feedback (
            appointment_id INTEGER NOT NULL REFERENCES appointments(id),
            participant_id TEXT NOT NULL,
            eligible_at    TEXT NOT NULL,
            rating         INTEGER CHECK(rating IS NULL OR rating BETWEEN 1 AND 5),
            comment        TEXT,
            submitted_at   TEXT,
            PRIMARY KEY (appointment_id, participant_id)
        );
        "#,
    },
];

/// Ensure that the `log` table exists with the modern schema.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

/// Apply one migration and its marker atomically.
fn apply(conn: &Connection, m: &Migration) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(m.sql)?;
    tx.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [m.version, m.description],
    )?;
    tx.commit()?;

    success(format!("Migration applied: {} → {}", m.version, m.description));
    Ok(())
}

/// Versions already recorded as applied, in order.
pub fn applied_versions(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = 'migration_applied' ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    rows.collect()
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    ensure_log_table(conn)?;

    for m in MIGRATIONS {
        if !is_applied(conn, m.version)? {
            apply(conn, m)?;
        }
    }

    Ok(())
}
