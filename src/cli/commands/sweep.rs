use crate::config::Config;
use crate::core::lifecycle::SessionLifecycle;
use crate::core::notify::ConsoleNotifier;
use crate::core::window::SessionPolicy;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use chrono::NaiveDateTime;

/// Handle the `sweep` command; meant to be run periodically (cron, systemd timer).
pub fn handle(cfg: &Config, now: NaiveDateTime) -> AppResult<()> {
    let mut pool = DbPool::new(&cfg.database)?;
    let lifecycle = SessionLifecycle::new(SessionPolicy::from_config(cfg), &ConsoleNotifier);
    let completed = lifecycle.sweep_expired(&mut pool, now)?;

    if completed.is_empty() {
        info("No sessions past their planned end.");
    } else {
        let ids: Vec<String> = completed.iter().map(|id| format!("#{}", id)).collect();
        success(format!(
            "Completed {} session(s): {}",
            completed.len(),
            ids.join(", ")
        ));
    }

    Ok(())
}
