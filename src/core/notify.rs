//! Fire-and-forget status change notifications.

use crate::errors::AppResult;
use crate::models::status::AppointmentStatus;
use crate::ui::messages::{info, warning};
use chrono::NaiveDateTime;
use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub appointment_id: i64,
    pub from: AppointmentStatus,
    pub to: AppointmentStatus,
    pub actor: String,
    pub at: NaiveDateTime,
    /// Everyone on the appointment except the actor.
    pub recipients: Vec<String>,
}

pub trait Notifier {
    fn notify(&self, change: &StatusChange) -> AppResult<()>;
}

/// Deliver after commit; a failed delivery never undoes the transition.
pub fn dispatch(notifier: &dyn Notifier, change: &StatusChange) {
    if let Err(e) = notifier.notify(change) {
        warning(format!(
            "Notification for appointment #{} not delivered: {}",
            change.appointment_id, e
        ));
    }
}

/// Prints the notification that would be pushed to each recipient.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, change: &StatusChange) -> AppResult<()> {
        if change.recipients.is_empty() {
            return Ok(());
        }
        info(format!(
            "Notify {}: appointment #{} is now {}",
            change.recipients.join(", "),
            change.appointment_id,
            change.to
        ));
        Ok(())
    }
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _change: &StatusChange) -> AppResult<()> {
        Ok(())
    }
}

/// Keeps every change in memory; handy for callers that batch deliveries.
#[derive(Default)]
pub struct RecordingNotifier {
    changes: RefCell<Vec<StatusChange>>,
}

impl RecordingNotifier {
    pub fn changes(&self) -> Vec<StatusChange> {
        self.changes.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, change: &StatusChange) -> AppResult<()> {
        self.changes.borrow_mut().push(change.clone());
        Ok(())
    }
}
