/// ANSI color helper utilities for terminal output.
use crate::models::status::AppointmentStatus;

pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const CYAN: &str = "\x1b[36m";

pub fn color_for_status(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Pending => YELLOW,
        AppointmentStatus::Confirmed => BLUE,
        AppointmentStatus::Started => CYAN,
        AppointmentStatus::Completed => GREEN,
        AppointmentStatus::Refused | AppointmentStatus::Cancelled => GREY,
    }
}

/// Status word padded to `width` and wrapped in its color.
pub fn colorize_status(status: AppointmentStatus, width: usize) -> String {
    format!(
        "{}{:<width$}{}",
        color_for_status(status),
        status.to_db_str(),
        RESET,
        width = width
    )
}
