// src/export/logic.rs

use crate::db::pool::DbPool;
use crate::db::queries::{list_all, list_for_participant};
use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::export::model::AppointmentExport;
use crate::models::status::AppointmentStatus;
use crate::ui::messages::warning;
use std::path::Path;

/// High-level export of the appointment history.
pub struct ExportLogic;

impl ExportLogic {
    /// - `participant`: only appointments this participant takes part in
    /// - `status`: only appointments currently in this status
    pub fn export(
        pool: &mut DbPool,
        format: ExportFormat,
        file: &str,
        participant: Option<&str>,
        status: Option<AppointmentStatus>,
        force: bool,
    ) -> AppResult<usize> {
        let path = Path::new(file);

        if path.is_dir() {
            return Err(AppError::Export(format!(
                "Output path is a directory: {file}"
            )));
        }

        ensure_writable(path, force)?;

        let appointments = match participant {
            Some(p) => list_for_participant(&pool.conn, p)?,
            None => list_all(&pool.conn)?,
        };

        let rows: Vec<AppointmentExport> = appointments
            .iter()
            .filter(|a| status.is_none_or(|s| a.status == s))
            .map(AppointmentExport::from)
            .collect();

        if rows.is_empty() {
            warning("No appointments match the selected filters.");
        }

        match format {
            ExportFormat::Csv => export_csv(&rows, path)?,
            ExportFormat::Json => export_json(&rows, path)?,
        }

        Ok(rows.len())
    }
}
