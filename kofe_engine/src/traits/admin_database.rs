use thiserror::Error;

use crate::db_types::{BroadcastMessage, DailyOrderCount, DrinkCount, ExportPeriod, Order};

#[derive(Debug, Clone, Error)]
pub enum AdminApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for AdminApiError {
    fn from(e: sqlx::Error) -> Self {
        AdminApiError::DatabaseError(e.to_string())
    }
}

/// Read-mostly queries behind the admin panel: counters, analytics aggregates, report exports and
/// the saved broadcast draft.
#[allow(async_fn_in_trait)]
pub trait AdminDatabase {
    async fn count_orders(&self) -> Result<i64, AdminApiError>;

    /// Orders settled with a loyalty coffee.
    async fn count_free_orders(&self) -> Result<i64, AdminApiError>;

    /// Order counts per calendar day, oldest day first.
    async fn orders_per_day(&self) -> Result<Vec<DailyOrderCount>, AdminApiError>;

    /// The most ordered drinks, busiest first.
    async fn top_drinks(&self, limit: i64) -> Result<Vec<DrinkCount>, AdminApiError>;

    /// Orders inside the export window, newest first.
    async fn orders_for_export(&self, period: ExportPeriod) -> Result<Vec<Order>, AdminApiError>;

    async fn count_active_customers(&self) -> Result<i64, AdminApiError>;

    async fn broadcast_message(&self) -> Result<BroadcastMessage, AdminApiError>;

    async fn set_broadcast_message(
        &self,
        message_text: Option<String>,
        photo_id: Option<String>,
    ) -> Result<(), AdminApiError>;
}
