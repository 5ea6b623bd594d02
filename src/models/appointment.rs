use super::participant::{Decision, DecisionRecord, Role};
use super::presence_token::PresenceToken;
use super::status::AppointmentStatus;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

/// Participant id → role and decision.
pub type Participants = BTreeMap<String, DecisionRecord>;

#[derive(Debug, Clone, Serialize)]
pub struct Appointment {
    pub id: i64,
    pub scheduled_at: NaiveDateTime, // ⇔ appointments.scheduled_at ("YYYY-MM-DD HH:MM:SS")
    pub duration_minutes: i64,
    pub location: Option<String>,
    pub status: AppointmentStatus,
    pub participants: Participants, // ⇔ participants rows

    pub presence_token: Option<PresenceToken>, // ⇔ qr_token / token_issued_at / token_expires_at
    pub actual_start_time: Option<NaiveDateTime>,
    pub actual_end_time: Option<NaiveDateTime>,
    pub auto_end_at: Option<NaiveDateTime>,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    pub fn duration(&self) -> Duration {
        Duration::minutes(self.duration_minutes)
    }

    pub fn role_of(&self, participant_id: &str) -> Option<Role> {
        self.participants.get(participant_id).map(|p| p.role)
    }

    pub fn is_participant(&self, participant_id: &str) -> bool {
        self.participants.contains_key(participant_id)
    }

    pub fn is_coach(&self, participant_id: &str) -> bool {
        self.role_of(participant_id) == Some(Role::Coach)
    }

    pub fn client_id(&self) -> Option<&str> {
        self.participants
            .iter()
            .find(|(_, p)| p.role == Role::Client)
            .map(|(id, _)| id.as_str())
    }

    pub fn coach_ids(&self) -> impl Iterator<Item = &str> {
        self.participants
            .iter()
            .filter(|(_, p)| p.role == Role::Coach)
            .map(|(id, _)| id.as_str())
    }

    /// Aggregate the per-coach decisions into an overall booking status.
    ///
    /// All accepted → confirmed, all refused → refused, anything else
    /// (outstanding answers or a split vote) keeps the request pending.
    pub fn aggregate_decisions(&self) -> AppointmentStatus {
        let decisions: Vec<Decision> = self
            .participants
            .values()
            .filter(|p| p.role == Role::Coach)
            .map(|p| p.decision)
            .collect();

        if decisions.is_empty() {
            return AppointmentStatus::Pending;
        }
        if decisions.iter().all(|d| *d == Decision::Accepted) {
            AppointmentStatus::Confirmed
        } else if decisions.iter().all(|d| *d == Decision::Refused) {
            AppointmentStatus::Refused
        } else {
            AppointmentStatus::Pending
        }
    }

    /// The stored token, only if still valid at `now`.
    pub fn valid_token_at(&self, now: NaiveDateTime) -> Option<&PresenceToken> {
        self.presence_token.as_ref().filter(|t| t.is_valid_at(now))
    }
}
