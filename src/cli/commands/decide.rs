use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::lifecycle::{ScheduleOverride, SessionLifecycle};
use crate::core::notify::ConsoleNotifier;
use crate::core::window::SessionPolicy;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::models::status::AppointmentStatus;
use crate::ui::messages::{info, success, warning};
use crate::utils::time::parse_optional_datetime;
use chrono::NaiveDateTime;

/// Handle the `decide` command (a coach accepting or refusing a request)
pub fn handle(cmd: &Commands, cfg: &Config, now: NaiveDateTime) -> AppResult<()> {
    if let Commands::Decide {
        id,
        coach,
        decision,
        at,
        duration,
        location,
    } = cmd
    {
        let scheduling = ScheduleOverride {
            scheduled_at: parse_optional_datetime(at.as_ref())?,
            duration_minutes: *duration,
            location: location.clone(),
        };

        let mut pool = DbPool::new(&cfg.database)?;
        let lifecycle = SessionLifecycle::new(SessionPolicy::from_config(cfg), &ConsoleNotifier);
        let appt = lifecycle.confirm(
            &mut pool,
            *id,
            coach.trim(),
            (*decision).into(),
            Some(&scheduling),
            now,
        )?;

        match appt.status {
            AppointmentStatus::Confirmed => success(format!(
                "Appointment #{} confirmed for {}",
                appt.id,
                appt.scheduled_at.format("%Y-%m-%d %H:%M")
            )),
            AppointmentStatus::Refused => warning(format!("Appointment #{} refused", appt.id)),
            _ => info(format!(
                "Decision recorded, appointment #{} is still {}",
                appt.id, appt.status
            )),
        }
    }

    Ok(())
}
