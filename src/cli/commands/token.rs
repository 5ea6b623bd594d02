use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::issuer::TokenIssuer;
use crate::core::window::SessionPolicy;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::success;
use chrono::NaiveDateTime;

/// Handle the `token` command: hand the participant the value to encode as a QR code.
pub fn handle(cmd: &Commands, cfg: &Config, now: NaiveDateTime) -> AppResult<()> {
    if let Commands::Token { id, participant } = cmd {
        let mut pool = DbPool::new(&cfg.database)?;
        let issuer = TokenIssuer::new(SessionPolicy::from_config(cfg));
        let grant = issuer.request_token(&mut pool, *id, participant.trim(), now)?;

        success(grant.message());
        println!("Token: {}", grant.token.value);
    }

    Ok(())
}
