use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackEntry {
    pub appointment_id: i64,
    pub participant_id: String,
    pub eligible_at: NaiveDateTime,
    pub rating: Option<u8>,
    pub comment: Option<String>,
    pub submitted_at: Option<NaiveDateTime>,
}

impl FeedbackEntry {
    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }
}
