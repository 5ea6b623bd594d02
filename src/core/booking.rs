use crate::core::notify::{Notifier, StatusChange, dispatch};
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::queries::{insert_appointment, insert_participant, require_appointment};
use crate::errors::{AppError, AppResult};
use crate::models::appointment::Appointment;
use crate::models::participant::DecisionRecord;
use crate::models::status::AppointmentStatus;
use chrono::NaiveDateTime;
use rusqlite::TransactionBehavior;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub client_id: String,
    pub coach_ids: Vec<String>,
    pub scheduled_at: NaiveDateTime,
    pub duration_minutes: i64,
    pub location: Option<String>,
}

impl BookingRequest {
    fn validate(&self) -> AppResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(AppError::InvalidInput("client id cannot be empty".into()));
        }
        if self.coach_ids.is_empty() {
            return Err(AppError::InvalidInput("at least one coach is required".into()));
        }
        if self.duration_minutes <= 0 {
            return Err(AppError::InvalidInput(format!(
                "duration must be positive, got {}",
                self.duration_minutes
            )));
        }

        let mut seen = BTreeSet::new();
        for coach in &self.coach_ids {
            if coach.trim().is_empty() {
                return Err(AppError::InvalidInput("coach id cannot be empty".into()));
            }
            if coach == &self.client_id {
                return Err(AppError::InvalidInput(format!(
                    "{} cannot coach their own appointment",
                    coach
                )));
            }
            if !seen.insert(coach.as_str()) {
                return Err(AppError::InvalidInput(format!("coach {} listed twice", coach)));
            }
        }
        Ok(())
    }
}

/// High-level business logic for booking requests.
pub struct BookingLogic;

impl BookingLogic {
    /// Create a `pending` appointment; every invited coach starts undecided.
    pub fn book(
        pool: &mut DbPool,
        notifier: &dyn Notifier,
        request: &BookingRequest,
        now: NaiveDateTime,
    ) -> AppResult<Appointment> {
        request.validate()?;

        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let id = insert_appointment(
            &tx,
            &request.scheduled_at,
            request.duration_minutes,
            request.location.as_deref(),
            &now,
        )?;

        insert_participant(&tx, id, &request.client_id, &DecisionRecord::client())?;
        for coach in &request.coach_ids {
            insert_participant(&tx, id, coach, &DecisionRecord::invited_coach())?;
        }

        ttlog(
            &tx,
            "book",
            &format!("appointment #{}", id),
            &format!(
                "{} requested {} with {}",
                request.client_id,
                request.scheduled_at.format("%Y-%m-%d %H:%M"),
                request.coach_ids.join(", ")
            ),
        )?;

        let appt = require_appointment(&tx, id)?;
        tx.commit()?;

        dispatch(
            notifier,
            &StatusChange {
                appointment_id: id,
                from: AppointmentStatus::Pending,
                to: AppointmentStatus::Pending,
                actor: request.client_id.clone(),
                at: now,
                recipients: request.coach_ids.clone(),
            },
        );

        Ok(appt)
    }
}
