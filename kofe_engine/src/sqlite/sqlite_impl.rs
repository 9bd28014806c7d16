//! `SqliteDatabase` is a concrete implementation of a Kofe ordering engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::SqlitePool;

use super::db::{broadcast, customers, db_url, loyalty, new_pool, orders, payments};
use crate::{
    db_types::{
        BroadcastMessage,
        CancelOutcome,
        Customer,
        DailyOrderCount,
        DrinkCount,
        ExportPeriod,
        LoyaltyAccount,
        NewOrder,
        NewPayment,
        Order,
        OrderId,
        OrderStatus,
        Payment,
        PaymentState,
        PaymentStatus,
        ProfileUpdate,
    },
    traits::{
        AdminApiError,
        AdminDatabase,
        CustomerApiError,
        CustomerManagement,
        OrderFlowDatabase,
        OrderFlowError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl CustomerManagement for SqliteDatabase {
    async fn upsert_customer(&self, profile: &ProfileUpdate) -> Result<Customer, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::upsert_customer(profile, &mut conn).await?;
        debug!("🗃️ Customer {} is on record", customer.telegram_id);
        Ok(customer)
    }

    async fn fetch_customer(&self, telegram_id: i64) -> Result<Option<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::fetch_customer(telegram_id, &mut conn).await?;
        Ok(customer)
    }

    async fn link_referral(&self, referrer_id: i64, referred_id: i64) -> Result<bool, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let linked = customers::link_referral(referrer_id, referred_id, &mut conn).await?;
        if linked {
            debug!("🗃️ Referral link recorded: {referrer_id} invited {referred_id}");
        }
        Ok(linked)
    }

    async fn ensure_loyalty_account(&self, user_id: i64) -> Result<LoyaltyAccount, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let account = loyalty::ensure_account(user_id, &mut conn).await?;
        Ok(account)
    }

    async fn fetch_loyalty_account(&self, user_id: i64) -> Result<Option<LoyaltyAccount>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let account = loyalty::fetch_account(user_id, &mut conn).await?;
        Ok(account)
    }

    async fn active_customer_ids(&self) -> Result<Vec<i64>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        let ids = customers::active_customer_ids(&mut conn).await?;
        Ok(ids)
    }

    async fn deactivate_customer(&self, telegram_id: i64) -> Result<(), CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        customers::deactivate_customer(telegram_id, &mut conn).await?;
        debug!("🗃️ Customer {telegram_id} deactivated");
        Ok(())
    }
}

impl OrderFlowDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, Option<i64>), OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        customers::upsert_customer(&order.customer, &mut tx).await?;
        if order.is_free {
            loyalty::spend_free_coffee(order.customer.telegram_id, &mut tx).await?;
        }
        let saved = orders::insert_order(&order, &mut tx).await?;
        let rewarded_referrer = loyalty::reward_pending_referral(order.customer.telegram_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} has been saved in the DB", saved.order_id);
        Ok((saved, rewarded_referrer))
    }

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn active_orders(&self) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::active_orders(&mut conn).await?;
        Ok(orders)
    }

    async fn set_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(Order, OrderStatus), OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let before = orders::fetch_order(order_id, &mut tx)
            .await?
            .ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let order = orders::set_order_status(order_id, status, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} status set to '{status}' (was '{}')", before.status);
        Ok((order, before.status))
    }

    async fn cancel_order_with_refund(
        &self,
        order_id: OrderId,
        grace: Duration,
    ) -> Result<CancelOutcome, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::fetch_order(order_id, &mut tx).await? else {
            return Ok(CancelOutcome::NotFound);
        };
        // Once the barista has picked the order up (or it is already cancelled), the window is
        // closed regardless of age.
        if order.status != OrderStatus::New || !orders::within_grace_window(&order, grace) {
            debug!("🗃️ Order #{order_id} is past its cancellation window");
            return Ok(CancelOutcome::TooLate);
        }
        let cancelled = orders::set_order_status(order_id, OrderStatus::Cancelled, &mut tx).await?;
        if cancelled.payment_status == PaymentStatus::Bonus {
            loyalty::refund_free_coffee(cancelled.user_id, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} cancelled by the customer");
        Ok(CancelOutcome::Cancelled(cancelled))
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::insert_payment(&payment, &mut conn).await?;
        debug!("🗃️ Payment {} recorded as pending", payment.payment_id);
        Ok(payment)
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<Payment>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment(payment_id, &mut conn).await?;
        Ok(payment)
    }

    async fn claim_pending_payment(&self, payment_id: &str) -> Result<Option<Payment>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::claim_pending_payment(payment_id, &mut conn).await?;
        Ok(payment)
    }

    async fn attach_order_to_payment(&self, payment_id: &str, order_id: OrderId) -> Result<(), OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        payments::attach_order(payment_id, order_id, &mut conn).await?;
        Ok(())
    }

    async fn mark_payment_state(&self, payment_id: &str, state: PaymentState) -> Result<Option<i64>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let user_id = payments::mark_payment_state(payment_id, state, &mut conn).await?;
        Ok(user_id)
    }

    async fn expire_stale_payments(&self, older_than: Duration) -> Result<u64, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let swept = payments::expire_stale_payments(older_than, &mut conn).await?;
        if swept > 0 {
            info!("🗃️ {swept} stale pending payment(s) expired");
        }
        Ok(swept)
    }
}

impl AdminDatabase for SqliteDatabase {
    async fn count_orders(&self) -> Result<i64, AdminApiError> {
        let mut conn = self.pool.acquire().await?;
        let count = orders::count_orders(&mut conn).await?;
        Ok(count)
    }

    async fn count_free_orders(&self) -> Result<i64, AdminApiError> {
        let mut conn = self.pool.acquire().await?;
        let count = orders::count_free_orders(&mut conn).await?;
        Ok(count)
    }

    async fn orders_per_day(&self) -> Result<Vec<DailyOrderCount>, AdminApiError> {
        let mut conn = self.pool.acquire().await?;
        let counts = orders::orders_per_day(&mut conn).await?;
        Ok(counts)
    }

    async fn top_drinks(&self, limit: i64) -> Result<Vec<DrinkCount>, AdminApiError> {
        let mut conn = self.pool.acquire().await?;
        let counts = orders::top_drinks(limit, &mut conn).await?;
        Ok(counts)
    }

    async fn orders_for_export(&self, period: ExportPeriod) -> Result<Vec<Order>, AdminApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::orders_for_export(period, &mut conn).await?;
        debug!("🗃️ Export query for '{period}' returned {} order(s)", orders.len());
        Ok(orders)
    }

    async fn count_active_customers(&self) -> Result<i64, AdminApiError> {
        let mut conn = self.pool.acquire().await?;
        let count = customers::count_active_customers(&mut conn).await?;
        Ok(count)
    }

    async fn broadcast_message(&self) -> Result<BroadcastMessage, AdminApiError> {
        let mut conn = self.pool.acquire().await?;
        let message = broadcast::fetch_message(&mut conn).await?;
        Ok(message)
    }

    async fn set_broadcast_message(
        &self,
        message_text: Option<String>,
        photo_id: Option<String>,
    ) -> Result<(), AdminApiError> {
        let mut conn = self.pool.acquire().await?;
        broadcast::set_message(message_text, photo_id, &mut conn).await?;
        debug!("🗃️ Broadcast draft updated");
        Ok(())
    }
}

impl SqliteDatabase {
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
