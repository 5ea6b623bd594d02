use crate::db::pool::DbPool;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW, colorize_status};
use crate::models::status::AppointmentStatus;
use rusqlite::OptionalExtension;
use std::fs;

pub fn print_db_info(pool: &mut DbPool, db_path: &str) -> rusqlite::Result<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) TOTAL APPOINTMENTS
    //
    let count: i64 = pool
        .conn
        .query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?;
    println!(
        "{}• Total appointments:{} {}{}{}",
        CYAN, RESET, GREEN, count, RESET
    );

    //
    // 3) BREAKDOWN BY STATUS
    //
    let mut stmt = pool
        .conn
        .prepare("SELECT status, COUNT(*) FROM appointments GROUP BY status ORDER BY status")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    for r in rows {
        let (status, n) = r?;
        let label = AppointmentStatus::from_db_str(&status)
            .map(|s| colorize_status(s, 10))
            .unwrap_or(status);
        println!("    {} {}", label, n);
    }

    //
    // 4) SCHEDULE RANGE
    //
    let first: Option<String> = pool
        .conn
        .query_row(
            "SELECT scheduled_at FROM appointments ORDER BY scheduled_at ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let last: Option<String> = pool
        .conn
        .query_row(
            "SELECT scheduled_at FROM appointments ORDER BY scheduled_at DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    println!("{}• Schedule range:{}", CYAN, RESET);
    println!(
        "    from: {}",
        first.unwrap_or_else(|| format!("{GREY}--{RESET}"))
    );
    println!(
        "    to:   {}",
        last.unwrap_or_else(|| format!("{GREY}--{RESET}"))
    );

    println!();
    Ok(())
}
