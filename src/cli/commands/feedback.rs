use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::feedback::FeedbackLogic;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::success;
use chrono::NaiveDateTime;

pub fn handle(cmd: &Commands, cfg: &Config, now: NaiveDateTime) -> AppResult<()> {
    if let Commands::Feedback {
        id,
        from,
        rating,
        comment,
    } = cmd
    {
        let mut pool = DbPool::new(&cfg.database)?;
        let entry = FeedbackLogic::submit(
            &mut pool,
            *id,
            from.trim(),
            *rating,
            comment.as_deref(),
            now,
        )?;

        success(format!(
            "Thanks {}, feedback for appointment #{} saved",
            entry.participant_id, entry.appointment_id
        ));
    }

    Ok(())
}
