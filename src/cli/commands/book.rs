use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::booking::{BookingLogic, BookingRequest};
use crate::core::notify::ConsoleNotifier;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::success;
use crate::utils::time::parse_datetime;
use chrono::NaiveDateTime;

/// Handle the `book` command
pub fn handle(cmd: &Commands, cfg: &Config, now: NaiveDateTime) -> AppResult<()> {
    if let Commands::Book {
        client,
        coaches,
        at,
        duration,
        location,
    } = cmd
    {
        let request = BookingRequest {
            client_id: client.trim().to_string(),
            coach_ids: coaches.iter().map(|c| c.trim().to_string()).collect(),
            scheduled_at: parse_datetime(at)?,
            duration_minutes: *duration,
            location: location.clone(),
        };

        let mut pool = DbPool::new(&cfg.database)?;
        let appt = BookingLogic::book(&mut pool, &ConsoleNotifier, &request, now)?;

        success(format!(
            "Appointment #{} requested for {} ({} min), waiting for {}",
            appt.id,
            appt.scheduled_at.format("%Y-%m-%d %H:%M"),
            appt.duration_minutes,
            request.coach_ids.join(", ")
        ));
    }

    Ok(())
}
