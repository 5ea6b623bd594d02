use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::window::SessionPolicy;
use crate::db::feedback::list_for_appointment;
use crate::db::pool::DbPool;
use crate::db::queries::require_appointment;
use crate::errors::AppResult;
use crate::ui::render::print_appointment;
use chrono::NaiveDateTime;

pub fn handle(cmd: &Commands, cfg: &Config, now: NaiveDateTime) -> AppResult<()> {
    if let Commands::Show { id } = cmd {
        let pool = DbPool::new(&cfg.database)?;
        let appt = require_appointment(&pool.conn, *id)?;
        let feedback = list_for_appointment(&pool.conn, appt.id)?;
        print_appointment(&appt, &feedback, &SessionPolicy::from_config(cfg), now);
    }

    Ok(())
}
