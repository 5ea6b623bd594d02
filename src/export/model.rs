// src/export/model.rs

use crate::models::appointment::Appointment;
use crate::utils::time::to_db;
use serde::Serialize;

/// Flat, one-row-per-appointment shape shared by CSV and JSON.
///
/// Token values are deliberately absent: an export must never leak a
/// still-scannable presence code.
#[derive(Serialize, Clone, Debug)]
pub struct AppointmentExport {
    pub id: i64,
    pub scheduled_at: String,
    pub duration_minutes: i64,
    pub location: String,
    pub status: String,
    pub client: String,
    pub coaches: String,
    pub actual_start_time: String,
    pub actual_end_time: String,
    pub created_at: String,
}

impl From<&Appointment> for AppointmentExport {
    fn from(a: &Appointment) -> Self {
        Self {
            id: a.id,
            scheduled_at: to_db(&a.scheduled_at),
            duration_minutes: a.duration_minutes,
            location: a.location.clone().unwrap_or_default(),
            status: a.status.to_db_str().to_string(),
            client: a.client_id().unwrap_or_default().to_string(),
            coaches: a.coach_ids().collect::<Vec<_>>().join(";"),
            actual_start_time: a.actual_start_time.as_ref().map(to_db).unwrap_or_default(),
            actual_end_time: a.actual_end_time.as_ref().map(to_db).unwrap_or_default(),
            created_at: to_db(&a.created_at),
        }
    }
}
