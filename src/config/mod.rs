use crate::errors::{AppError, AppResult};
use crate::ui::messages::success;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Keys every config file is expected to carry.
const KNOWN_KEYS: [&str; 4] = [
    "database",
    "token_validity_minutes",
    "scan_open_before_minutes",
    "scan_close_after_minutes",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_token_validity")]
    pub token_validity_minutes: i64,
    #[serde(default = "default_open_before")]
    pub scan_open_before_minutes: i64,
    #[serde(default = "default_close_after")]
    pub scan_close_after_minutes: i64,
}

fn default_token_validity() -> i64 {
    5
}
fn default_open_before() -> i64 {
    30
}
fn default_close_after() -> i64 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self::with_database(Self::database_file())
    }
}

impl Config {
    fn with_database(db_path: PathBuf) -> Self {
        Self {
            database: db_path.to_string_lossy().to_string(),
            token_validity_minutes: default_token_validity(),
            scan_open_before_minutes: default_open_before(),
            scan_close_after_minutes: default_close_after(),
        }
    }

    /// Return the configuration directory (`$RCOACH_HOME`, else `~/.rcoach`)
    pub fn config_dir() -> PathBuf {
        if let Ok(dir) = env::var("RCOACH_HOME") {
            return PathBuf::from(dir);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rcoach")
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rcoach.conf")
    }

    /// Return the default path of the SQLite appointment store
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rcoach.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let cfg: Config = serde_yaml::from_str(&content)?;
            cfg.validate()?;
            Ok(cfg)
        } else {
            Ok(Config::default())
        }
    }

    /// Reject window settings that would make the lifecycle meaningless.
    pub fn validate(&self) -> AppResult<()> {
        if self.token_validity_minutes <= 0 {
            return Err(AppError::Config(
                "token_validity_minutes must be greater than 0".into(),
            ));
        }
        if self.scan_open_before_minutes < 0 || self.scan_close_after_minutes < 0 {
            return Err(AppError::Config(
                "scan window offsets cannot be negative".into(),
            ));
        }
        Ok(())
    }

    /// Keys missing from the config file on disk.
    pub fn missing_fields() -> AppResult<Vec<&'static str>> {
        let content = fs::read_to_string(Self::config_file())?;
        let yaml: serde_yaml::Value = serde_yaml::from_str(&content)?;

        let missing = KNOWN_KEYS
            .iter()
            .copied()
            .filter(|k| yaml.get(*k).is_none())
            .collect();
        Ok(missing)
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_name: Option<String>, is_test: bool) -> AppResult<Config> {
        let dir = Self::config_dir();

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_name {
            let p = crate::utils::path::expand_tilde(&name);
            if p.is_absolute() { p } else { dir.join(p) }
        } else {
            Self::database_file()
        };

        let config = Config::with_database(db_path.clone());

        // Write config file
        if !is_test {
            fs::create_dir_all(&dir)?;
            let yaml = serde_yaml::to_string(&config)?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
            success(format!("Config file: {}", Self::config_file().display()));
        }

        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(config)
    }
}
