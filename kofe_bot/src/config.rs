//! Bot configuration, read from the environment.
use std::env;

use kofe_common::Secret;
use log::*;

const DEFAULT_BASE_URL: &str = "http://localhost:8010";

/// Everything the bot needs to talk to Telegram: the token, the two privileged chat ids and the
/// public base URL the board webapp button points at.
#[derive(Clone, Debug, Default)]
pub struct BotConfig {
    pub token: Secret<String>,
    /// The admin's private chat. Receives lifecycle messages, error reports and purchase leads.
    pub admin_chat_id: i64,
    /// The barista's chat. Receives new-order and customer-arrived cards.
    pub barista_id: i64,
    /// Public URL of the accompanying web server, e.g. `https://kofe.example.com`.
    pub base_url: String,
}

impl BotConfig {
    pub fn from_env_or_default() -> Self {
        let token = env::var("TELEGRAM_BOT_TOKEN").ok().map(Secret::new).unwrap_or_else(|| {
            error!("🚨️ TELEGRAM_BOT_TOKEN is not set. The bot will not be able to talk to Telegram.");
            Secret::default()
        });
        let admin_chat_id = Self::get_chat_id("ADMIN_CHAT_ID");
        let barista_id = Self::get_chat_id("BARISTA_ID");
        let base_url = env::var("BASE_WEBHOOK_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ BASE_WEBHOOK_URL is not set. Using the default, {DEFAULT_BASE_URL}, instead.");
            DEFAULT_BASE_URL.to_string()
        });
        Self { token, admin_chat_id, barista_id, base_url }
    }

    fn get_chat_id(var: &str) -> i64 {
        env::var(var)
            .ok()
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ {s} is not a valid chat id for {var}. {e}. Using 0 instead."))
                    .ok()
            })
            .unwrap_or_default()
    }
}
