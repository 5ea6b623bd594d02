use crate::errors::AppResult;
use crate::models::feedback::FeedbackEntry;
use crate::utils::time::{from_db, to_db};
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, Row, params};

fn map_row(row: &Row) -> rusqlite::Result<FeedbackEntry> {
    let eligible_raw: String = row.get("eligible_at")?;
    let submitted_raw: Option<String> = row.get("submitted_at")?;
    let rating: Option<i64> = row.get("rating")?;

    Ok(FeedbackEntry {
        appointment_id: row.get("appointment_id")?,
        participant_id: row.get("participant_id")?,
        eligible_at: from_db(&eligible_raw).unwrap_or_default(),
        rating: rating.and_then(|r| u8::try_from(r).ok()),
        comment: row.get("comment")?,
        submitted_at: submitted_raw.as_deref().and_then(from_db),
    })
}

/// Open a feedback slot; returns false if the participant already had one.
pub fn make_eligible(
    conn: &Connection,
    appointment_id: i64,
    participant_id: &str,
    now: &NaiveDateTime,
) -> AppResult<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO feedback (appointment_id, participant_id, eligible_at)
         VALUES (?1, ?2, ?3)",
        params![appointment_id, participant_id, to_db(now)],
    )?;
    Ok(changed == 1)
}

pub fn load_entry(
    conn: &Connection,
    appointment_id: i64,
    participant_id: &str,
) -> AppResult<Option<FeedbackEntry>> {
    let entry = conn
        .query_row(
            "SELECT * FROM feedback WHERE appointment_id = ?1 AND participant_id = ?2",
            params![appointment_id, participant_id],
            map_row,
        )
        .optional()?;
    Ok(entry)
}

pub fn list_for_appointment(
    conn: &Connection,
    appointment_id: i64,
) -> AppResult<Vec<FeedbackEntry>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM feedback WHERE appointment_id = ?1 ORDER BY participant_id ASC",
    )?;
    let rows = stmt.query_map([appointment_id], map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Store a rating on an open, unsubmitted slot. Returns false if nothing was updated.
pub fn submit(
    conn: &Connection,
    appointment_id: i64,
    participant_id: &str,
    rating: u8,
    comment: Option<&str>,
    now: &NaiveDateTime,
) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE feedback SET rating = ?1, comment = ?2, submitted_at = ?3
         WHERE appointment_id = ?4 AND participant_id = ?5 AND submitted_at IS NULL",
        params![rating, comment, to_db(now), appointment_id, participant_id],
    )?;
    Ok(changed == 1)
}
