use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::lifecycle::{CancelOutcome, SessionLifecycle};
use crate::core::notify::ConsoleNotifier;
use crate::core::window::SessionPolicy;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use chrono::NaiveDateTime;

pub fn handle(cmd: &Commands, cfg: &Config, now: NaiveDateTime) -> AppResult<()> {
    if let Commands::Cancel { id, by } = cmd {
        let mut pool = DbPool::new(&cfg.database)?;
        let lifecycle = SessionLifecycle::new(SessionPolicy::from_config(cfg), &ConsoleNotifier);

        match lifecycle.cancel(&mut pool, *id, by.trim(), now)? {
            CancelOutcome::Cancelled(appt) => {
                success(format!("Appointment #{} cancelled", appt.id))
            }
            CancelOutcome::AlreadyCancelled(appt) => {
                info(format!("Appointment #{} was already cancelled", appt.id))
            }
        }
    }

    Ok(())
}
