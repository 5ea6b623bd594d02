use crate::errors::{AppError, AppResult};
use crate::models::appointment::{Appointment, Participants};
use crate::models::participant::{Decision, DecisionRecord, Role};
use crate::models::presence_token::PresenceToken;
use crate::models::status::AppointmentStatus;
use crate::utils::time::{from_db, to_db};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

const SELECT_APPOINTMENT: &str = "SELECT id, scheduled_at, duration_minutes, location, status,
        qr_token, token_issued_at, token_expires_at,
        actual_start_time, actual_end_time, auto_end_at,
        created_at, updated_at
 FROM appointments";

fn conversion_failure(err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(err))
}

fn get_datetime(row: &Row, col: &str) -> Result<NaiveDateTime> {
    let raw: String = row.get(col)?;
    from_db(&raw).ok_or_else(|| conversion_failure(AppError::InvalidDateTime(raw.clone())))
}

fn get_opt_datetime(row: &Row, col: &str) -> Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(col)?;
    match raw {
        None => Ok(None),
        Some(s) => from_db(&s)
            .map(Some)
            .ok_or_else(|| conversion_failure(AppError::InvalidDateTime(s.clone()))),
    }
}

/// Map an `appointments` row; participants are loaded separately.
pub fn map_row(row: &Row) -> Result<Appointment> {
    let status_str: String = row.get("status")?;
    let status = AppointmentStatus::from_db_str(&status_str).ok_or_else(|| {
        conversion_failure(AppError::InvalidInput(format!("Invalid status: {}", status_str)))
    })?;

    let token_value: Option<String> = row.get("qr_token")?;
    let presence_token = match token_value {
        Some(value) => {
            let issued_at = get_opt_datetime(row, "token_issued_at")?;
            let expires_at = get_opt_datetime(row, "token_expires_at")?;
            match (issued_at, expires_at) {
                (Some(issued_at), Some(expires_at)) => Some(PresenceToken {
                    value,
                    issued_at,
                    expires_at,
                }),
                _ => None,
            }
        }
        None => None,
    };

    Ok(Appointment {
        id: row.get("id")?,
        scheduled_at: get_datetime(row, "scheduled_at")?,
        duration_minutes: row.get("duration_minutes")?,
        location: row.get("location")?,
        status,
        participants: Participants::new(),
        presence_token,
        actual_start_time: get_opt_datetime(row, "actual_start_time")?,
        actual_end_time: get_opt_datetime(row, "actual_end_time")?,
        auto_end_at: get_opt_datetime(row, "auto_end_at")?,
        created_at: get_datetime(row, "created_at")?,
        updated_at: get_datetime(row, "updated_at")?,
    })
}

fn map_participant(row: &Row) -> Result<(String, DecisionRecord)> {
    let role_str: String = row.get("role")?;
    let role = Role::from_db_str(&role_str).ok_or_else(|| {
        conversion_failure(AppError::InvalidInput(format!("Invalid role: {}", role_str)))
    })?;
    let decision_str: String = row.get("decision")?;
    let decision = Decision::from_db_str(&decision_str).ok_or_else(|| {
        conversion_failure(AppError::InvalidInput(format!("Invalid decision: {}", decision_str)))
    })?;

    Ok((
        row.get("participant_id")?,
        DecisionRecord {
            role,
            decision,
            decided_at: get_opt_datetime(row, "decided_at")?,
        },
    ))
}

pub fn load_participants(conn: &Connection, appointment_id: i64) -> AppResult<Participants> {
    let mut stmt = conn.prepare_cached(
        "SELECT participant_id, role, decision, decided_at
         FROM participants
         WHERE appointment_id = ?1",
    )?;
    let rows = stmt.query_map([appointment_id], map_participant)?;

    let mut out = Participants::new();
    for r in rows {
        let (id, record) = r?;
        out.insert(id, record);
    }
    Ok(out)
}

pub fn load_appointment(conn: &Connection, id: i64) -> AppResult<Option<Appointment>> {
    let sql = format!("{SELECT_APPOINTMENT} WHERE id = ?1");
    let found = conn.query_row(&sql, [id], map_row).optional()?;

    match found {
        Some(mut appt) => {
            appt.participants = load_participants(conn, id)?;
            Ok(Some(appt))
        }
        None => Ok(None),
    }
}

/// Like `load_appointment`, but a missing record is an error.
pub fn require_appointment(conn: &Connection, id: i64) -> AppResult<Appointment> {
    load_appointment(conn, id)?.ok_or(AppError::NotFound(id))
}

fn load_many(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> AppResult<Vec<Appointment>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, map_row)?;

    let mut out = Vec::new();
    for r in rows {
        let mut appt = r?;
        appt.participants = load_participants(conn, appt.id)?;
        out.push(appt);
    }
    Ok(out)
}

pub fn list_all(conn: &Connection) -> AppResult<Vec<Appointment>> {
    load_many(
        conn,
        &format!("{SELECT_APPOINTMENT} ORDER BY scheduled_at ASC, id ASC"),
        [],
    )
}

/// Appointments where `participant_id` takes part in any role.
pub fn list_for_participant(
    conn: &Connection,
    participant_id: &str,
) -> AppResult<Vec<Appointment>> {
    load_many(
        conn,
        &format!(
            "{SELECT_APPOINTMENT}
             WHERE id IN (SELECT appointment_id FROM participants WHERE participant_id = ?1)
             ORDER BY scheduled_at ASC, id ASC"
        ),
        [participant_id],
    )
}

/// Appointments where `coach_id` is an invited coach.
pub fn list_for_coach(conn: &Connection, coach_id: &str) -> AppResult<Vec<Appointment>> {
    load_many(
        conn,
        &format!(
            "{SELECT_APPOINTMENT}
             WHERE id IN (SELECT appointment_id FROM participants
                          WHERE participant_id = ?1 AND role = 'coach')
             ORDER BY scheduled_at ASC, id ASC"
        ),
        [coach_id],
    )
}

/// The session a coach is currently running, if any.
pub fn find_started_for_coach(
    conn: &Connection,
    coach_id: &str,
) -> AppResult<Option<Appointment>> {
    let found = load_many(
        conn,
        &format!(
            "{SELECT_APPOINTMENT}
             WHERE status = 'started'
               AND id IN (SELECT appointment_id FROM participants
                          WHERE participant_id = ?1 AND role = 'coach')
             ORDER BY actual_start_time DESC
             LIMIT 1"
        ),
        [coach_id],
    )?;
    Ok(found.into_iter().next())
}

/// Ids of started sessions whose automatic end is due at `now`.
pub fn find_due_for_auto_end(conn: &Connection, now: &NaiveDateTime) -> AppResult<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM appointments
         WHERE status = 'started' AND auto_end_at IS NOT NULL AND auto_end_at <= ?1
         ORDER BY auto_end_at ASC",
    )?;
    let rows = stmt.query_map([to_db(now)], |row| row.get::<_, i64>(0))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn insert_appointment(
    conn: &Connection,
    scheduled_at: &NaiveDateTime,
    duration_minutes: i64,
    location: Option<&str>,
    now: &NaiveDateTime,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO appointments
             (scheduled_at, duration_minutes, location, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'pending', ?4, ?4)",
        params![to_db(scheduled_at), duration_minutes, location, to_db(now)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_participant(
    conn: &Connection,
    appointment_id: i64,
    participant_id: &str,
    record: &DecisionRecord,
) -> AppResult<()> {
    conn.execute(
        "INSERT INTO participants (appointment_id, participant_id, role, decision, decided_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            appointment_id,
            participant_id,
            record.role.to_db_str(),
            record.decision.to_db_str(),
            record.decided_at.as_ref().map(to_db),
        ],
    )?;
    Ok(())
}

pub fn update_decision(
    conn: &Connection,
    appointment_id: i64,
    participant_id: &str,
    decision: Decision,
    decided_at: &NaiveDateTime,
) -> AppResult<()> {
    conn.execute(
        "UPDATE participants SET decision = ?1, decided_at = ?2
         WHERE appointment_id = ?3 AND participant_id = ?4",
        params![
            decision.to_db_str(),
            to_db(decided_at),
            appointment_id,
            participant_id
        ],
    )?;
    Ok(())
}

/// Put every other coach back to `pending`, e.g. after the slot moved.
pub fn reset_other_decisions(
    conn: &Connection,
    appointment_id: i64,
    except_coach: &str,
) -> AppResult<usize> {
    let changed = conn.execute(
        "UPDATE participants SET decision = 'pending', decided_at = NULL
         WHERE appointment_id = ?1 AND role = 'coach' AND participant_id <> ?2",
        params![appointment_id, except_coach],
    )?;
    Ok(changed)
}

pub fn update_schedule(
    conn: &Connection,
    appointment_id: i64,
    scheduled_at: &NaiveDateTime,
    duration_minutes: i64,
    location: Option<&str>,
    now: &NaiveDateTime,
) -> AppResult<()> {
    conn.execute(
        "UPDATE appointments
         SET scheduled_at = ?1, duration_minutes = ?2, location = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            to_db(scheduled_at),
            duration_minutes,
            location,
            to_db(now),
            appointment_id
        ],
    )?;
    Ok(())
}

/// Set the status; the token slot is cleared for every status that may not hold one.
pub fn update_status(
    conn: &Connection,
    appointment_id: i64,
    status: AppointmentStatus,
    now: &NaiveDateTime,
) -> AppResult<()> {
    let sql = if status.allows_token() {
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3"
    } else {
        "UPDATE appointments
         SET status = ?1, updated_at = ?2,
             qr_token = NULL, token_issued_at = NULL, token_expires_at = NULL
         WHERE id = ?3"
    };
    conn.execute(sql, params![status.to_db_str(), to_db(now), appointment_id])?;
    Ok(())
}

pub fn save_token(
    conn: &Connection,
    appointment_id: i64,
    token: &PresenceToken,
    now: &NaiveDateTime,
) -> AppResult<()> {
    conn.execute(
        "UPDATE appointments
         SET qr_token = ?1, token_issued_at = ?2, token_expires_at = ?3, updated_at = ?4
         WHERE id = ?5 AND status IN ('confirmed','started')",
        params![
            token.value,
            to_db(&token.issued_at),
            to_db(&token.expires_at),
            to_db(now),
            appointment_id
        ],
    )?;
    Ok(())
}

/// Move `confirmed → started`. Returns false when another writer got there first.
pub fn mark_started(
    conn: &Connection,
    appointment_id: i64,
    started_at: &NaiveDateTime,
    auto_end_at: &NaiveDateTime,
) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE appointments
         SET status = 'started', actual_start_time = ?1, auto_end_at = ?2, updated_at = ?1
         WHERE id = ?3 AND status = 'confirmed'",
        params![to_db(started_at), to_db(auto_end_at), appointment_id],
    )?;
    Ok(changed == 1)
}

/// Move `started → completed` and drop the token. Returns false if not started.
pub fn mark_completed(
    conn: &Connection,
    appointment_id: i64,
    ended_at: &NaiveDateTime,
) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE appointments
         SET status = 'completed', actual_end_time = ?1, updated_at = ?1,
             qr_token = NULL, token_issued_at = NULL, token_expires_at = NULL
         WHERE id = ?2 AND status = 'started'",
        params![to_db(ended_at), appointment_id],
    )?;
    Ok(changed == 1)
}
