use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::lifecycle::SessionLifecycle;
use crate::core::window::SessionPolicy;
use crate::db::feedback::list_for_appointment;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::info;
use crate::ui::render::print_appointment;
use chrono::NaiveDateTime;

pub fn handle(cmd: &Commands, cfg: &Config, now: NaiveDateTime) -> AppResult<()> {
    if let Commands::Current { coach } = cmd {
        let mut pool = DbPool::new(&cfg.database)?;

        match SessionLifecycle::current_session(&mut pool, coach.trim())? {
            Some(appt) => {
                let feedback = list_for_appointment(&pool.conn, appt.id)?;
                print_appointment(&appt, &feedback, &SessionPolicy::from_config(cfg), now);
            }
            None => info(format!("{} has no session in progress.", coach.trim())),
        }
    }

    Ok(())
}
