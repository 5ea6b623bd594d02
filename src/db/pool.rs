//! SQLite connection wrapper (lightweight for CLI usage).

use crate::utils::path::expand_tilde;
use rusqlite::{Connection, Result};
use std::time::Duration;

/// How long a writer waits on the store lock before reporting it unavailable.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DbPool {
    pub conn: Connection,
}

impl DbPool {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(expand_tilde(path))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }
}
