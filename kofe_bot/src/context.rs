//! Shared dependencies handed to every handler through the dispatcher's dependency map.
use std::fmt::Debug;

use kofe_engine::{OrderFlowApi, SqliteDatabase};

use crate::{config::BotConfig, epay::EpayClient, notifier::TelegramNotifier};

/// One bundle with everything a handler can need. Wrapped in an `Arc` by the dispatcher, so
/// cloning is cheap and the Epay token cache is shared.
pub struct BotContext {
    pub db: SqliteDatabase,
    pub api: OrderFlowApi<SqliteDatabase>,
    pub epay: EpayClient,
    pub notifier: TelegramNotifier,
    pub config: BotConfig,
    /// The bot's own @handle, resolved at startup. Used for referral deep links and the payment
    /// back link.
    pub bot_username: String,
}

impl Debug for BotContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BotContext (@{})", self.bot_username)
    }
}

impl BotContext {
    pub fn new(
        db: SqliteDatabase,
        api: OrderFlowApi<SqliteDatabase>,
        epay: EpayClient,
        notifier: TelegramNotifier,
        config: BotConfig,
        bot_username: String,
    ) -> Self {
        Self { db, api, epay, notifier, config, bot_username }
    }

    /// The deep link a customer shares to earn free coffees.
    pub fn referral_link(&self, user_id: i64) -> String {
        format!("https://t.me/{}?start=ref_{user_id}", self.bot_username)
    }

    /// Where the gateway sends the customer back after paying.
    pub fn payment_back_link(&self) -> String {
        format!("https://t.me/{}", self.bot_username)
    }

    /// The kanban board page served by the web server.
    pub fn board_url(&self) -> &str {
        self.config.base_url.as_str()
    }
}
