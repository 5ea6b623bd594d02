use crate::db::feedback::{load_entry, submit};
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::feedback::FeedbackEntry;
use chrono::NaiveDateTime;
use rusqlite::TransactionBehavior;

pub struct FeedbackLogic;

impl FeedbackLogic {
    /// Rate a completed session. Each participant may do so once.
    pub fn submit(
        pool: &mut DbPool,
        appointment_id: i64,
        participant_id: &str,
        rating: u8,
        comment: Option<&str>,
        now: NaiveDateTime,
    ) -> AppResult<FeedbackEntry> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::InvalidInput(format!(
                "rating must be between 1 and 5, got {}",
                rating
            )));
        }

        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let entry = load_entry(&tx, appointment_id, participant_id)?.ok_or_else(|| {
            AppError::NotEligible(format!(
                "{} has no completed session to rate on appointment #{}",
                participant_id, appointment_id
            ))
        })?;

        if entry.is_submitted() {
            return Err(AppError::NotEligible(format!(
                "{} already left feedback for appointment #{}",
                participant_id, appointment_id
            )));
        }

        let comment = comment.map(str::trim).filter(|c| !c.is_empty());
        if !submit(&tx, appointment_id, participant_id, rating, comment, &now)? {
            return Err(AppError::Other("feedback slot changed concurrently".into()));
        }

        ttlog(
            &tx,
            "feedback",
            &format!("appointment #{}", appointment_id),
            &format!("{} rated {}/5", participant_id, rating),
        )?;

        let saved = load_entry(&tx, appointment_id, participant_id)?
            .ok_or_else(|| AppError::Other("feedback entry vanished".into()))?;
        tx.commit()?;
        Ok(saved)
    }
}
