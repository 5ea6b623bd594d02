use crate::errors::AppResult;
use chrono::Local;
use rusqlite::Connection;
use rusqlite::params;

/// Append one audit row to the `log` table.
///
/// `target` is `appointment #<id>` for lifecycle operations so that
/// `log --appointment` can filter on it; callers pass their own transaction
/// so the row commits or rolls back together with the change it describes.
pub fn ttlog(conn: &Connection, operation: &str, target: &str, message: &str) -> AppResult<()> {
    let now = Local::now().format("%FT%T%:z").to_string();

    let mut stmt = conn.prepare_cached(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    stmt.execute(params![now, operation, target, message])?;

    Ok(())
}
