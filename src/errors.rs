//! Unified application error type.
//! All modules (db, core, cli, utils) return AppError to keep the error
//! handling consistent and easy to manage.

use crate::models::status::AppointmentStatus;
use rusqlite::ErrorCode;
use std::io;
use thiserror::Error;

/// Where `now` sits relative to a closed scan window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMiss {
    /// The window opens in this many minutes (rounded up).
    TooEarly { opens_in_minutes: i64 },
    TooLate,
}

impl std::fmt::Display for WindowMiss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowMiss::TooEarly { opens_in_minutes } => write!(
                f,
                "too early, token available in {}",
                crate::utils::time::format_countdown(*opens_in_minutes)
            ),
            WindowMiss::TooLate => write!(f, "too late, the session window has closed"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Store
    // ---------------------------
    #[error("Database error: {0}")]
    Db(rusqlite::Error),

    #[error("Appointment store unavailable, try again: {0}")]
    StoreUnavailable(String),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date/time format: {0}")]
    InvalidDateTime(String),

    #[error("Invalid value: {0}")]
    InvalidInput(String),

    // ---------------------------
    // Session lifecycle
    // ---------------------------
    #[error("Appointment {0} not found")]
    NotFound(i64),

    #[error("Not eligible: {0}")]
    NotEligible(String),

    #[error("Out of window: {0}")]
    OutOfWindow(WindowMiss),

    #[error("Invalid token: the scanned code does not belong to this appointment")]
    InvalidToken,

    #[error("Expired token: ask the client to refresh the QR code")]
    Expired,

    #[error("Appointment is {0}, not confirmed: it may already have been used")]
    NotConfirmed(AppointmentStatus),

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// Only transient store failures are worth retrying by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StoreUnavailable(_))
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                AppError::StoreUnavailable(e.to_string())
            }
            _ => AppError::Db(e),
        }
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(e: serde_yaml::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
