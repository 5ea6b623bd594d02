//! rcoach library root.
//! Exposes the CLI parser, the high-level run() function, and the
//! appointment / presence-token lifecycle modules.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod export;
pub mod models;
pub mod ui;
pub mod utils;

use chrono::NaiveDateTime;
use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config, now: NaiveDateTime) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Db { .. } => cli::commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
        Commands::Book { .. } => cli::commands::book::handle(&cli.command, cfg, now),
        Commands::Decide { .. } => cli::commands::decide::handle(&cli.command, cfg, now),
        Commands::Token { .. } => cli::commands::token::handle(&cli.command, cfg, now),
        Commands::Start { .. } => cli::commands::start::handle(&cli.command, cfg, now),
        Commands::End { .. } => cli::commands::end::handle(&cli.command, cfg, now),
        Commands::Cancel { .. } => cli::commands::cancel::handle(&cli.command, cfg, now),
        Commands::Sweep => cli::commands::sweep::handle(cfg, now),
        Commands::Current { .. } => cli::commands::current::handle(&cli.command, cfg, now),
        Commands::Show { .. } => cli::commands::show::handle(&cli.command, cfg, now),
        Commands::List { .. } => cli::commands::list::handle(&cli.command, cfg),
        Commands::Feedback { .. } => cli::commands::feedback::handle(&cli.command, cfg, now),
        Commands::Backup { .. } => cli::commands::backup::handle(&cli.command, cfg),
        Commands::Export { .. } => cli::commands::export::handle(&cli.command, cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    // 1️⃣ parse CLI
    let cli = Cli::parse();

    // 2️⃣ load config once
    let mut cfg = Config::load()?;

    // 3️⃣ command-line DB override
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    // 4️⃣ resolve the clock (overridable for scripted runs)
    let now = utils::time::parse_optional_datetime(cli.now.as_ref())?
        .unwrap_or_else(utils::time::now);

    dispatch(&cli, &cfg, now)
}
