use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::lifecycle::{EndOutcome, SessionLifecycle};
use crate::core::notify::ConsoleNotifier;
use crate::core::window::SessionPolicy;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use chrono::NaiveDateTime;

pub fn handle(cmd: &Commands, cfg: &Config, now: NaiveDateTime) -> AppResult<()> {
    if let Commands::End { id, coach } = cmd {
        let mut pool = DbPool::new(&cfg.database)?;
        let lifecycle = SessionLifecycle::new(SessionPolicy::from_config(cfg), &ConsoleNotifier);

        match lifecycle.end_session(&mut pool, *id, coach.trim(), now)? {
            EndOutcome::Completed {
                appointment,
                feedback_opened,
            } => {
                success(format!("Session #{} completed", appointment.id));
                if !feedback_opened.is_empty() {
                    info(format!("Feedback open for {}", feedback_opened.join(", ")));
                }
            }
            EndOutcome::AlreadyCompleted(appointment) => {
                info(format!("Session #{} was already completed", appointment.id));
            }
        }
    }

    Ok(())
}
