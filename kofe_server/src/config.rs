//! Server configuration, read from the environment.
use std::env;

use chrono::Duration;
use kofe_bot::{config::BotConfig, epay::EpayConfig};
use log::*;

const DEFAULT_KOFE_HOST: &str = "127.0.0.1";
const DEFAULT_KOFE_PORT: u16 = 8010;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/kofe.db";
const DEFAULT_STATIC_DIR: &str = "./static";
const DEFAULT_PAYMENT_TIMEOUT_HOURS: i64 = 24;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Where the kanban board page and its assets live.
    pub static_dir: String,
    /// Pending payments older than this are expired by the sweeper. Should match the gateway's
    /// invoice expiry (1 day for Epay).
    pub payment_timeout: Duration,
    pub bot: BotConfig,
    pub epay: EpayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_KOFE_HOST.to_string(),
            port: DEFAULT_KOFE_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            payment_timeout: Duration::hours(DEFAULT_PAYMENT_TIMEOUT_HOURS),
            bot: BotConfig::default(),
            epay: EpayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("KOFE_HOST").ok().unwrap_or_else(|| DEFAULT_KOFE_HOST.into());
        let port = env::var("KOFE_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for KOFE_PORT. {e} Using the default, {DEFAULT_KOFE_PORT}, \
                         instead."
                    );
                    DEFAULT_KOFE_PORT
                })
            })
            .unwrap_or(DEFAULT_KOFE_PORT);
        let database_url = env::var("KOFE_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ KOFE_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}, instead.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let static_dir = env::var("KOFE_STATIC_DIR").ok().unwrap_or_else(|| {
            warn!("🪛️ KOFE_STATIC_DIR is not set. Using the default, {DEFAULT_STATIC_DIR}, instead.");
            DEFAULT_STATIC_DIR.to_string()
        });
        let timeout_hours = env::var("KOFE_PAYMENT_TIMEOUT_HOURS")
            .map(|s| {
                s.parse::<i64>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid number of hours for KOFE_PAYMENT_TIMEOUT_HOURS. {e} Using the \
                         default, {DEFAULT_PAYMENT_TIMEOUT_HOURS}, instead."
                    );
                    DEFAULT_PAYMENT_TIMEOUT_HOURS
                })
            })
            .unwrap_or(DEFAULT_PAYMENT_TIMEOUT_HOURS);
        let bot = BotConfig::from_env_or_default();
        let epay = EpayConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            static_dir,
            payment_timeout: Duration::hours(timeout_hours),
            bot,
            epay,
        }
    }

    /// The URL the gateway posts payment results back to.
    pub fn webhook_post_link(&self) -> String {
        format!("{}/webhooks/epay", self.bot.base_url)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8010);
        assert_eq!(config.payment_timeout, Duration::hours(24));
    }

    #[test]
    fn post_link_is_anchored_at_the_base_url() {
        let mut config = ServerConfig::default();
        config.bot.base_url = "https://kofe.example.com".to_string();
        assert_eq!(config.webhook_post_link(), "https://kofe.example.com/webhooks/epay");
    }
}
