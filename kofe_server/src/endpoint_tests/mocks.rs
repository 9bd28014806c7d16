use chrono::Duration;
use kofe_engine::{
    db_types::{
        CancelOutcome,
        Customer,
        LoyaltyAccount,
        NewOrder,
        NewPayment,
        Order,
        OrderId,
        OrderStatus,
        Payment,
        PaymentState,
        ProfileUpdate,
    },
    traits::{CustomerApiError, CustomerManagement, OrderFlowDatabase, OrderFlowError},
};
use mockall::mock;

mock! {
    pub OrderFlowDb {}

    impl Clone for OrderFlowDb {
        fn clone(&self) -> Self;
    }

    impl CustomerManagement for OrderFlowDb {
        async fn upsert_customer(&self, profile: &ProfileUpdate) -> Result<Customer, CustomerApiError>;
        async fn fetch_customer(&self, telegram_id: i64) -> Result<Option<Customer>, CustomerApiError>;
        async fn link_referral(&self, referrer_id: i64, referred_id: i64) -> Result<bool, CustomerApiError>;
        async fn ensure_loyalty_account(&self, user_id: i64) -> Result<LoyaltyAccount, CustomerApiError>;
        async fn fetch_loyalty_account(&self, user_id: i64) -> Result<Option<LoyaltyAccount>, CustomerApiError>;
        async fn active_customer_ids(&self) -> Result<Vec<i64>, CustomerApiError>;
        async fn deactivate_customer(&self, telegram_id: i64) -> Result<(), CustomerApiError>;
    }

    impl OrderFlowDatabase for OrderFlowDb {
        fn url(&self) -> &str;
        async fn insert_order(&self, order: NewOrder) -> Result<(Order, Option<i64>), OrderFlowError>;
        async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderFlowError>;
        async fn active_orders(&self) -> Result<Vec<Order>, OrderFlowError>;
        async fn set_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<(Order, OrderStatus), OrderFlowError>;
        async fn cancel_order_with_refund(&self, order_id: OrderId, grace: Duration) -> Result<CancelOutcome, OrderFlowError>;
        async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, OrderFlowError>;
        async fn fetch_payment(&self, payment_id: &str) -> Result<Option<Payment>, OrderFlowError>;
        async fn claim_pending_payment(&self, payment_id: &str) -> Result<Option<Payment>, OrderFlowError>;
        async fn attach_order_to_payment(&self, payment_id: &str, order_id: OrderId) -> Result<(), OrderFlowError>;
        async fn mark_payment_state(&self, payment_id: &str, state: PaymentState) -> Result<Option<i64>, OrderFlowError>;
        async fn expire_stale_payments(&self, older_than: Duration) -> Result<u64, OrderFlowError>;
    }
}
