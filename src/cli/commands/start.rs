use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::lifecycle::SessionLifecycle;
use crate::core::notify::ConsoleNotifier;
use crate::core::window::SessionPolicy;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use chrono::NaiveDateTime;

/// Handle the `start` command (coach scanning the client's QR code)
pub fn handle(cmd: &Commands, cfg: &Config, now: NaiveDateTime) -> AppResult<()> {
    if let Commands::Start { id, coach, token } = cmd {
        let mut pool = DbPool::new(&cfg.database)?;
        let lifecycle = SessionLifecycle::new(SessionPolicy::from_config(cfg), &ConsoleNotifier);
        let started = lifecycle.start_session(&mut pool, *id, coach.trim(), token, now)?;

        success(format!(
            "Session #{} started at {}",
            started.appointment.id,
            now.format("%H:%M:%S")
        ));
        info(format!(
            "Planned end: {}",
            started.reminder.auto_end_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    Ok(())
}
