//! Appointment state machine:
//!
//! pending → confirmed | refused
//! confirmed → started | cancelled
//! started → completed (coach or sweep) | cancelled
//!
//! Every transition runs in one immediate transaction and either commits
//! the new status with all its fields or leaves the record untouched.

use crate::core::notify::{Notifier, StatusChange, dispatch};
use crate::core::window::SessionPolicy;
use crate::db::feedback::make_eligible;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::queries::{
    find_due_for_auto_end, find_started_for_coach, mark_completed, mark_started,
    require_appointment, reset_other_decisions, update_decision, update_schedule, update_status,
};
use crate::errors::{AppError, AppResult};
use crate::models::appointment::Appointment;
use crate::models::participant::Decision;
use crate::models::status::AppointmentStatus;
use crate::utils::time::whole_seconds;
use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};

/// New date/time, length or place a coach may set while accepting.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOverride {
    pub scheduled_at: Option<NaiveDateTime>,
    pub duration_minutes: Option<i64>,
    pub location: Option<String>,
}

impl ScheduleOverride {
    pub fn is_empty(&self) -> bool {
        self.scheduled_at.is_none() && self.duration_minutes.is_none() && self.location.is_none()
    }
}

/// Best-effort hint for the coach's device; the sweep is what actually ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReminder {
    pub auto_end_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct SessionStart {
    pub appointment: Appointment,
    pub reminder: SessionReminder,
}

#[derive(Debug, Clone)]
pub enum EndOutcome {
    Completed {
        appointment: Appointment,
        feedback_opened: Vec<String>,
    },
    AlreadyCompleted(Appointment),
}

impl EndOutcome {
    pub fn appointment(&self) -> &Appointment {
        match self {
            EndOutcome::Completed { appointment, .. } => appointment,
            EndOutcome::AlreadyCompleted(appointment) => appointment,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CancelOutcome {
    Cancelled(Appointment),
    AlreadyCancelled(Appointment),
}

fn target_of(decision: Decision) -> AppResult<AppointmentStatus> {
    match decision {
        Decision::Accepted => Ok(AppointmentStatus::Confirmed),
        Decision::Refused => Ok(AppointmentStatus::Refused),
        Decision::Pending => Err(AppError::InvalidInput(
            "a decision must be either accept or refuse".into(),
        )),
    }
}

fn audit_target(id: i64) -> String {
    format!("appointment #{}", id)
}

fn change(
    appt: &Appointment,
    to: AppointmentStatus,
    actor: &str,
    at: NaiveDateTime,
) -> StatusChange {
    StatusChange {
        appointment_id: appt.id,
        from: appt.status,
        to,
        actor: actor.to_string(),
        at,
        recipients: appt
            .participants
            .keys()
            .filter(|p| p.as_str() != actor)
            .cloned()
            .collect(),
    }
}

/// `started → completed` plus feedback slots for every participant.
/// Caller owns the transaction.
fn complete(
    conn: &Connection,
    appt: &Appointment,
    actor: &str,
    now: NaiveDateTime,
) -> AppResult<Option<Vec<String>>> {
    if !mark_completed(conn, appt.id, &now)? {
        return Ok(None);
    }

    let mut opened = Vec::new();
    for participant in appt.participants.keys() {
        if make_eligible(conn, appt.id, participant, &now)? {
            opened.push(participant.clone());
        }
    }

    ttlog(
        conn,
        "end",
        &audit_target(appt.id),
        &format!("Session completed by {}", actor),
    )?;
    Ok(Some(opened))
}

pub struct SessionLifecycle<'a> {
    policy: SessionPolicy,
    notifier: &'a dyn Notifier,
}

impl<'a> SessionLifecycle<'a> {
    pub fn new(policy: SessionPolicy, notifier: &'a dyn Notifier) -> Self {
        Self { policy, notifier }
    }

    /// Record a coach's answer to a booking request and re-aggregate the status.
    ///
    /// A coach may change their answer as long as the appointment is still pending.
    pub fn confirm(
        &self,
        pool: &mut DbPool,
        appointment_id: i64,
        coach_id: &str,
        decision: Decision,
        scheduling: Option<&ScheduleOverride>,
        now: NaiveDateTime,
    ) -> AppResult<Appointment> {
        let target = target_of(decision)?;
        let scheduling = scheduling.filter(|s| !s.is_empty());

        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let appt = require_appointment(&tx, appointment_id)?;

        if !appt.is_coach(coach_id) {
            return Err(AppError::NotEligible(format!(
                "{} is not an invited coach of appointment #{}",
                coach_id, appointment_id
            )));
        }
        if appt.status != AppointmentStatus::Pending {
            return Err(AppError::InvalidTransition {
                from: appt.status,
                to: target,
            });
        }

        if let Some(s) = scheduling {
            if decision != Decision::Accepted {
                return Err(AppError::InvalidInput(
                    "date, duration or location can only be changed when accepting".into(),
                ));
            }
            let duration = s.duration_minutes.unwrap_or(appt.duration_minutes);
            if duration <= 0 {
                return Err(AppError::InvalidInput(format!(
                    "duration must be positive, got {}",
                    duration
                )));
            }
            let scheduled_at = s.scheduled_at.unwrap_or(appt.scheduled_at);
            let location = s.location.as_deref().or(appt.location.as_deref());

            let slot_changed = scheduled_at != appt.scheduled_at
                || duration != appt.duration_minutes
                || location != appt.location.as_deref();
            if slot_changed {
                update_schedule(&tx, appointment_id, &scheduled_at, duration, location, &now)?;
                // earlier answers were given for the old slot
                reset_other_decisions(&tx, appointment_id, coach_id)?;
            }
        }

        update_decision(&tx, appointment_id, coach_id, decision, &now)?;

        let mut updated = require_appointment(&tx, appointment_id)?;
        let aggregate = updated.aggregate_decisions();

        if aggregate != appt.status {
            update_status(&tx, appointment_id, aggregate, &now)?;
            updated.status = aggregate;
        }

        ttlog(
            &tx,
            "decide",
            &audit_target(appointment_id),
            &format!(
                "{} {} (overall: {})",
                coach_id,
                decision.to_db_str(),
                aggregate
            ),
        )?;
        tx.commit()?;

        if aggregate != appt.status {
            dispatch(self.notifier, &change(&appt, aggregate, coach_id, now));
        }
        Ok(updated)
    }

    /// Validate a scanned token and move the appointment to `started`.
    ///
    /// Checks run in this order: coach, token value, status, token expiry, window.
    pub fn start_session(
        &self,
        pool: &mut DbPool,
        appointment_id: i64,
        coach_id: &str,
        presented_token: &str,
        now: NaiveDateTime,
    ) -> AppResult<SessionStart> {
        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let appt = require_appointment(&tx, appointment_id)?;

        if !appt.is_coach(coach_id) {
            return Err(AppError::NotEligible(format!(
                "{} is not a coach of appointment #{}",
                coach_id, appointment_id
            )));
        }

        let token = match &appt.presence_token {
            Some(t) if t.matches(presented_token) => t,
            _ => return Err(AppError::InvalidToken),
        };

        if appt.status != AppointmentStatus::Confirmed {
            return Err(AppError::NotConfirmed(appt.status));
        }
        if !token.is_valid_at(now) {
            return Err(AppError::Expired);
        }
        self.policy.window_for(&appt).check(now)?;

        let now = whole_seconds(now);
        let auto_end_at = now + appt.duration();
        if !mark_started(&tx, appointment_id, &now, &auto_end_at)? {
            // lost the race to another writer
            let current = require_appointment(&tx, appointment_id)?;
            return Err(AppError::NotConfirmed(current.status));
        }

        ttlog(
            &tx,
            "start",
            &audit_target(appointment_id),
            &format!("Session started by {}", coach_id),
        )?;
        let started = require_appointment(&tx, appointment_id)?;
        tx.commit()?;

        dispatch(
            self.notifier,
            &change(&appt, AppointmentStatus::Started, coach_id, now),
        );

        Ok(SessionStart {
            appointment: started,
            reminder: SessionReminder { auto_end_at },
        })
    }

    /// End a running session. Ending an already completed session is a no-op.
    pub fn end_session(
        &self,
        pool: &mut DbPool,
        appointment_id: i64,
        coach_id: &str,
        now: NaiveDateTime,
    ) -> AppResult<EndOutcome> {
        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let appt = require_appointment(&tx, appointment_id)?;

        if !appt.is_coach(coach_id) {
            return Err(AppError::NotEligible(format!(
                "{} is not a coach of appointment #{}",
                coach_id, appointment_id
            )));
        }

        match appt.status {
            AppointmentStatus::Completed => Ok(EndOutcome::AlreadyCompleted(appt)),
            AppointmentStatus::Started => {
                let opened = complete(&tx, &appt, coach_id, now)?.ok_or(
                    AppError::InvalidTransition {
                        from: appt.status,
                        to: AppointmentStatus::Completed,
                    },
                )?;
                let completed = require_appointment(&tx, appointment_id)?;
                tx.commit()?;

                dispatch(
                    self.notifier,
                    &change(&appt, AppointmentStatus::Completed, coach_id, now),
                );
                Ok(EndOutcome::Completed {
                    appointment: completed,
                    feedback_opened: opened,
                })
            }
            other => Err(AppError::InvalidTransition {
                from: other,
                to: AppointmentStatus::Completed,
            }),
        }
    }

    /// Any participant may cancel a pending, confirmed or running appointment.
    pub fn cancel(
        &self,
        pool: &mut DbPool,
        appointment_id: i64,
        actor_id: &str,
        now: NaiveDateTime,
    ) -> AppResult<CancelOutcome> {
        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let appt = require_appointment(&tx, appointment_id)?;

        if !appt.is_participant(actor_id) {
            return Err(AppError::NotEligible(format!(
                "{} is not a participant of appointment #{}",
                actor_id, appointment_id
            )));
        }

        match appt.status {
            AppointmentStatus::Cancelled => Ok(CancelOutcome::AlreadyCancelled(appt)),
            AppointmentStatus::Completed | AppointmentStatus::Refused => {
                Err(AppError::InvalidTransition {
                    from: appt.status,
                    to: AppointmentStatus::Cancelled,
                })
            }
            _ => {
                update_status(&tx, appointment_id, AppointmentStatus::Cancelled, &now)?;
                ttlog(
                    &tx,
                    "cancel",
                    &audit_target(appointment_id),
                    &format!("Cancelled by {} (was {})", actor_id, appt.status),
                )?;
                let cancelled = require_appointment(&tx, appointment_id)?;
                tx.commit()?;

                dispatch(
                    self.notifier,
                    &change(&appt, AppointmentStatus::Cancelled, actor_id, now),
                );
                Ok(CancelOutcome::Cancelled(cancelled))
            }
        }
    }

    /// Complete every started session whose planned end has passed.
    ///
    /// Each appointment is settled in its own transaction; one already ended
    /// by its coach in the meantime is skipped.
    pub fn sweep_expired(&self, pool: &mut DbPool, now: NaiveDateTime) -> AppResult<Vec<i64>> {
        let due = find_due_for_auto_end(&pool.conn, &now)?;
        let mut completed = Vec::new();

        for id in due {
            let tx = pool
                .conn
                .transaction_with_behavior(TransactionBehavior::Immediate)?;
            let appt = require_appointment(&tx, id)?;

            let still_due = appt.status == AppointmentStatus::Started
                && appt.auto_end_at.is_some_and(|at| at <= now);
            if !still_due {
                continue;
            }

            if complete(&tx, &appt, "sweep", now)?.is_some() {
                tx.commit()?;
                dispatch(
                    self.notifier,
                    &change(&appt, AppointmentStatus::Completed, "sweep", now),
                );
                completed.push(id);
            }
        }

        Ok(completed)
    }

    /// The session a coach is running right now, read from the store.
    pub fn current_session(pool: &mut DbPool, coach_id: &str) -> AppResult<Option<Appointment>> {
        find_started_for_coach(&pool.conn, coach_id)
    }
}
