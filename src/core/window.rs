//! The scan window: the one place that decides when an appointment's
//! presence token may be issued or scanned.

use crate::config::Config;
use crate::errors::{AppError, AppResult, WindowMiss};
use crate::models::appointment::Appointment;
use chrono::{Duration, NaiveDateTime};

/// Timing rules shared by the token issuer and the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub open_before: Duration,
    pub close_after: Duration,
    pub token_validity: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            open_before: Duration::minutes(30),
            close_after: Duration::minutes(15),
            token_validity: Duration::minutes(5),
        }
    }
}

impl SessionPolicy {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            open_before: Duration::minutes(cfg.scan_open_before_minutes),
            close_after: Duration::minutes(cfg.scan_close_after_minutes),
            token_validity: Duration::minutes(cfg.token_validity_minutes),
        }
    }

    pub fn window_for(&self, appt: &Appointment) -> ScanWindow {
        ScanWindow::new(appt.scheduled_at, appt.duration(), self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    TooEarly { opens_in: Duration },
    Open,
    Closed,
}

/// `[scheduled_at - open_before, scheduled_at + duration + close_after)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub opens_at: NaiveDateTime,
    pub closes_at: NaiveDateTime,
}

impl ScanWindow {
    pub fn new(scheduled_at: NaiveDateTime, duration: Duration, policy: &SessionPolicy) -> Self {
        Self {
            opens_at: scheduled_at - policy.open_before,
            closes_at: scheduled_at + duration + policy.close_after,
        }
    }

    pub fn position(&self, now: NaiveDateTime) -> WindowPosition {
        if now < self.opens_at {
            WindowPosition::TooEarly {
                opens_in: self.opens_at - now,
            }
        } else if now < self.closes_at {
            WindowPosition::Open
        } else {
            WindowPosition::Closed
        }
    }

    pub fn is_open(&self, now: NaiveDateTime) -> bool {
        self.position(now) == WindowPosition::Open
    }

    /// `Ok` inside the window, `OutOfWindow` with a countdown otherwise.
    pub fn check(&self, now: NaiveDateTime) -> AppResult<()> {
        match self.position(now) {
            WindowPosition::Open => Ok(()),
            WindowPosition::TooEarly { opens_in } => {
                // round up so "0 min" is never shown while still closed
                let secs = opens_in.num_seconds();
                let opens_in_minutes = (secs + 59) / 60;
                Err(AppError::OutOfWindow(WindowMiss::TooEarly { opens_in_minutes }))
            }
            WindowPosition::Closed => Err(AppError::OutOfWindow(WindowMiss::TooLate)),
        }
    }
}
