use crate::utils::time::whole_seconds;
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

/// Opaque value rendered as a QR code by the client and scanned by the coach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceToken {
    pub value: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl PresenceToken {
    /// Mint a fresh random token valid for `validity` from `now`.
    pub fn mint(now: NaiveDateTime, validity: Duration) -> Self {
        let now = whole_seconds(now);
        Self {
            value: Uuid::new_v4().simple().to_string(),
            issued_at: now,
            expires_at: now + validity,
        }
    }

    pub fn is_valid_at(&self, now: NaiveDateTime) -> bool {
        now < self.expires_at
    }

    pub fn matches(&self, presented: &str) -> bool {
        self.value == presented.trim()
    }
}
