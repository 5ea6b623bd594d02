//! Human-readable rendering of appointments for the CLI.

use crate::core::window::{SessionPolicy, WindowPosition};
use crate::models::appointment::Appointment;
use crate::models::feedback::FeedbackEntry;
use crate::models::participant::Role;
use crate::ui::messages::header;
use crate::utils::colors::{GREY, RESET, colorize_status};
use crate::utils::table::Table;
use crate::utils::time::format_countdown;
use chrono::NaiveDateTime;

fn fmt_opt(dt: Option<&NaiveDateTime>) -> String {
    dt.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format!("{GREY}--{RESET}"))
}

/// One-line description of where `now` sits in the scan window.
pub fn describe_window(appt: &Appointment, policy: &SessionPolicy, now: NaiveDateTime) -> String {
    let window = policy.window_for(appt);
    let range = format!(
        "{} → {}",
        window.opens_at.format("%Y-%m-%d %H:%M"),
        window.closes_at.format("%Y-%m-%d %H:%M")
    );

    match window.position(now) {
        WindowPosition::TooEarly { opens_in } => {
            let mins = (opens_in.num_seconds() + 59) / 60;
            format!("{} (opens in {})", range, format_countdown(mins))
        }
        WindowPosition::Open => format!("{} (open)", range),
        WindowPosition::Closed => format!("{} (closed)", range),
    }
}

pub fn print_appointment(
    appt: &Appointment,
    feedback: &[FeedbackEntry],
    policy: &SessionPolicy,
    now: NaiveDateTime,
) {
    header(format!("Appointment #{}", appt.id));
    println!("Status      : {}", colorize_status(appt.status, 0));
    println!(
        "Scheduled   : {} ({} min)",
        appt.scheduled_at.format("%Y-%m-%d %H:%M"),
        appt.duration_minutes
    );
    println!(
        "Location    : {}",
        appt.location.as_deref().unwrap_or("--")
    );
    if !appt.status.is_terminal() {
        println!("Scan window : {}", describe_window(appt, policy, now));
    }

    println!("Participants:");
    for (id, record) in &appt.participants {
        match record.role {
            Role::Client => println!("  - {} (client)", id),
            Role::Coach => println!(
                "  - {} (coach, {}{})",
                id,
                record.decision.to_db_str(),
                record
                    .decided_at
                    .map(|d| format!(" at {}", d.format("%Y-%m-%d %H:%M")))
                    .unwrap_or_default()
            ),
        }
    }

    match &appt.presence_token {
        Some(t) if t.is_valid_at(now) => println!(
            "Token       : active until {}",
            t.expires_at.format("%H:%M:%S")
        ),
        Some(_) => println!("Token       : expired"),
        None => println!("Token       : {GREY}none{RESET}"),
    }

    println!("Started at  : {}", fmt_opt(appt.actual_start_time.as_ref()));
    println!("Auto end at : {}", fmt_opt(appt.auto_end_at.as_ref()));
    println!("Ended at    : {}", fmt_opt(appt.actual_end_time.as_ref()));

    if !feedback.is_empty() {
        println!("Feedback:");
        for f in feedback {
            match f.rating {
                Some(r) => println!(
                    "  - {}: {}/5{}",
                    f.participant_id,
                    r,
                    f.comment
                        .as_deref()
                        .map(|c| format!(" \"{}\"", c))
                        .unwrap_or_default()
                ),
                None => println!("  - {}: pending", f.participant_id),
            }
        }
    }
}

pub fn appointments_table(appointments: &[Appointment]) -> Table {
    let mut table = Table::new(["ID", "SCHEDULED", "MIN", "STATUS", "CLIENT", "COACHES"]);
    for a in appointments {
        table.add_row(vec![
            a.id.to_string(),
            a.scheduled_at.format("%Y-%m-%d %H:%M").to_string(),
            a.duration_minutes.to_string(),
            a.status.to_db_str().to_string(),
            a.client_id().unwrap_or("--").to_string(),
            a.coach_ids().collect::<Vec<_>>().join(", "),
        ]);
    }
    table
}
