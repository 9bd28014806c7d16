use thiserror::Error;

use crate::db_types::{Customer, LoyaltyAccount, ProfileUpdate};

#[derive(Debug, Clone, Error)]
pub enum CustomerApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CustomerApiError {
    fn from(e: sqlx::Error) -> Self {
        CustomerApiError::DatabaseError(e.to_string())
    }
}

/// Maintains the customer register: Telegram profiles, referral links between customers and the
/// free-coffee balances the referral program hands out.
#[allow(async_fn_in_trait)]
pub trait CustomerManagement {
    /// Inserts the customer, or refreshes the stored username / first name if the row exists.
    /// Reactivation is deliberate: a customer who comes back after blocking the bot becomes
    /// reachable for broadcasts again.
    async fn upsert_customer(&self, profile: &ProfileUpdate) -> Result<Customer, CustomerApiError>;

    async fn fetch_customer(&self, telegram_id: i64) -> Result<Option<Customer>, CustomerApiError>;

    /// Records that `referred_id` arrived via `referrer_id`'s invite link. Returns `false` when
    /// the link is a no-op: self-referrals and customers that were already referred by someone.
    async fn link_referral(&self, referrer_id: i64, referred_id: i64) -> Result<bool, CustomerApiError>;

    /// Fetches the loyalty account, creating an empty one if the customer has none yet.
    async fn ensure_loyalty_account(&self, user_id: i64) -> Result<LoyaltyAccount, CustomerApiError>;

    async fn fetch_loyalty_account(&self, user_id: i64) -> Result<Option<LoyaltyAccount>, CustomerApiError>;

    /// Every customer that has not blocked the bot, for broadcast fan-out.
    async fn active_customer_ids(&self) -> Result<Vec<i64>, CustomerApiError>;

    /// Marks a customer unreachable. Called when a broadcast delivery bounces.
    async fn deactivate_customer(&self, telegram_id: i64) -> Result<(), CustomerApiError>;
}
