use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::pool::DbPool;
use crate::db::queries::{list_all, list_for_coach, list_for_participant};
use crate::errors::AppResult;
use crate::models::status::AppointmentStatus;
use crate::ui::messages::warning;
use crate::ui::render::appointments_table;

/// Handle the `list` command
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::List {
        participant,
        coach,
        status,
    } = cmd
    {
        let pool = DbPool::new(&cfg.database)?;

        let mut appointments = match (participant, coach) {
            (Some(p), _) => list_for_participant(&pool.conn, p.trim())?,
            (None, Some(c)) => list_for_coach(&pool.conn, c.trim())?,
            (None, None) => list_all(&pool.conn)?,
        };

        if let Some(s) = status {
            let wanted: AppointmentStatus = (*s).into();
            appointments.retain(|a| a.status == wanted);
        }

        if appointments.is_empty() {
            warning("No appointments found.");
            return Ok(());
        }

        print!("{}", appointments_table(&appointments).render());
    }

    Ok(())
}
