use crate::core::window::{ScanWindow, SessionPolicy};
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::queries::{load_appointment, save_token};
use crate::errors::{AppError, AppResult};
use crate::models::presence_token::PresenceToken;
use crate::utils::time::format_countdown;
use chrono::NaiveDateTime;
use rusqlite::TransactionBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOutcome {
    Issued,
    Reused,
}

#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub token: PresenceToken,
    pub outcome: IssueOutcome,
    pub window: ScanWindow,
    pub now: NaiveDateTime,
}

impl TokenGrant {
    /// Feedback line for the client screen.
    pub fn message(&self) -> String {
        match self.outcome {
            IssueOutcome::Issued => format!(
                "New QR code issued, valid until {}",
                self.token.expires_at.format("%H:%M:%S")
            ),
            IssueOutcome::Reused => {
                let left = (self.token.expires_at - self.now).num_seconds();
                format!(
                    "Showing your current QR code, still valid for {}",
                    format_countdown((left + 59) / 60)
                )
            }
        }
    }
}

/// Decides whether a presence token may be handed out, and mints or reuses it.
pub struct TokenIssuer {
    policy: SessionPolicy,
}

impl TokenIssuer {
    pub fn new(policy: SessionPolicy) -> Self {
        Self { policy }
    }

    /// Return the appointment's valid token, or mint a new one.
    ///
    /// The check and the write happen under one immediate transaction, so
    /// two concurrent requests for the same appointment end up with the
    /// same token value.
    pub fn request_token(
        &self,
        pool: &mut DbPool,
        appointment_id: i64,
        participant_id: &str,
        now: NaiveDateTime,
    ) -> AppResult<TokenGrant> {
        let tx = pool
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let appt = load_appointment(&tx, appointment_id)?.ok_or_else(|| {
            AppError::NotEligible(format!("appointment #{} does not exist", appointment_id))
        })?;

        if !appt.is_participant(participant_id) {
            return Err(AppError::NotEligible(format!(
                "{} is not a participant of appointment #{}",
                participant_id, appointment_id
            )));
        }

        if !appt.status.allows_token() {
            return Err(AppError::NotEligible(format!(
                "appointment #{} is {}",
                appointment_id, appt.status
            )));
        }

        let window = self.policy.window_for(&appt);
        window.check(now)?;

        if let Some(existing) = appt.valid_token_at(now) {
            return Ok(TokenGrant {
                token: existing.clone(),
                outcome: IssueOutcome::Reused,
                window,
                now,
            });
        }

        let token = PresenceToken::mint(now, self.policy.token_validity);
        save_token(&tx, appointment_id, &token, &now)?;
        ttlog(
            &tx,
            "token",
            &format!("appointment #{}", appointment_id),
            &format!("Token issued to {}", participant_id),
        )?;
        tx.commit()?;

        Ok(TokenGrant {
            token,
            outcome: IssueOutcome::Issued,
            window,
            now,
        })
    }
}
