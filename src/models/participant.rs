use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Coach,
}

impl Role {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Coach => "coach",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "client" => Some(Role::Client),
            "coach" => Some(Role::Coach),
            _ => None,
        }
    }
}

/// A coach's answer to a booking request. Clients are implicitly `Accepted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Pending,
    Accepted,
    Refused,
}

impl Decision {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Decision::Pending => "pending",
            Decision::Accepted => "accepted",
            Decision::Refused => "refused",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Decision::Pending),
            "accepted" => Some(Decision::Accepted),
            "refused" => Some(Decision::Refused),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionRecord {
    pub role: Role,
    pub decision: Decision,
    pub decided_at: Option<NaiveDateTime>,
}

impl DecisionRecord {
    pub fn client() -> Self {
        Self {
            role: Role::Client,
            decision: Decision::Accepted,
            decided_at: None,
        }
    }

    pub fn invited_coach() -> Self {
        Self {
            role: Role::Coach,
            decision: Decision::Pending,
            decided_at: None,
        }
    }
}
