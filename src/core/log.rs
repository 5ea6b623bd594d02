use crate::db::pool::DbPool;
use crate::errors::AppResult;
use ansi_term::Colour;
use regex::Regex;
use std::sync::OnceLock;

/// Longest "operation (target)" column before truncation.
const OP_WIDTH: usize = 60;

fn strip_ansi(s: &str) -> String {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    let re = ANSI.get_or_init(|| Regex::new(r"\x1B\[[0-9;]*[mK]").expect("valid ANSI regex"));
    re.replace_all(s, "").into_owned()
}

/// ANSI colour for each audited operation
fn color_for_operation(op: &str) -> Colour {
    match op {
        "book" => Colour::Yellow,
        "decide" => Colour::Blue,
        "token" => Colour::Cyan,
        "start" => Colour::Green,
        "end" | "sweep" => Colour::Purple,
        "cancel" => Colour::Red,
        "feedback" => Colour::RGB(255, 153, 51), // orange
        "migration_applied" | "init" | "backup" => Colour::White,
        _ => Colour::White,
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub id: i64,
    pub date: String,
    pub operation: String,
    pub target: String,
    pub message: String,
}

pub struct LogLogic;

impl LogLogic {
    /// Audit entries, oldest first; `target` narrows to one appointment.
    pub fn load(pool: &mut DbPool, appointment: Option<i64>) -> AppResult<Vec<LogEntry>> {
        let target = appointment.map(|id| format!("appointment #{}", id));

        let mut stmt = pool.conn.prepare_cached(
            "SELECT id, date, operation, target, message FROM log
             WHERE ?1 IS NULL OR target = ?1
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([target], |row| {
            let raw_date: String = row.get(1)?;
            let date = chrono::DateTime::parse_from_rfc3339(&raw_date)
                .map(|dt| dt.format("%FT%T%:z").to_string())
                .unwrap_or(raw_date);

            Ok(LogEntry {
                id: row.get(0)?,
                date,
                operation: row.get(2)?,
                target: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                message: row.get(4)?,
            })
        })?;

        let mut entries = Vec::new();
        for r in rows {
            entries.push(r?);
        }
        Ok(entries)
    }

    pub fn print_log(pool: &mut DbPool, appointment: Option<i64>) -> AppResult<()> {
        let entries = Self::load(pool, appointment)?;

        if entries.is_empty() {
            println!("📜 Internal log is empty.");
            return Ok(());
        }

        let id_w = entries
            .iter()
            .map(|e| e.id.to_string().len())
            .max()
            .unwrap_or(1);
        let date_w = entries.iter().map(|e| e.date.len()).max().unwrap_or(10);

        println!("📜 Internal log:\n");

        for e in entries {
            let color = color_for_operation(&e.operation);

            let plain = if e.target.is_empty() {
                e.operation.clone()
            } else {
                format!("{} ({})", e.operation, e.target)
            };

            let visible = if plain.chars().count() > OP_WIDTH {
                let mut s = plain.chars().take(OP_WIDTH - 3).collect::<String>();
                s.push_str("...");
                s
            } else {
                plain
            };

            // only the operation word is coloured
            let colored = match visible.split_once(' ') {
                Some((op_word, rest)) => format!("{} {}", color.paint(op_word), rest),
                None => color.paint(visible.as_str()).to_string(),
            };

            let padding = " ".repeat(OP_WIDTH.saturating_sub(strip_ansi(&colored).chars().count()));

            println!(
                "{:>id_w$}: {:<date_w$} | {}{} => {}",
                e.id,
                e.date,
                colored,
                padding,
                e.message,
                id_w = id_w,
                date_w = date_w
            );
        }

        Ok(())
    }
}
