use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{CancelOutcome, NewOrder, NewPayment, Order, OrderId, OrderStatus, Payment, PaymentState},
    traits::{CustomerApiError, CustomerManagement},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order #{0} was not found")]
    OrderNotFound(OrderId),
    #[error("User {0} has no free coffees to spend")]
    NoFreeCoffees(i64),
    #[error("No profile is stored for user {0}")]
    ProfileMissing(i64),
    #[error("The stored cart for payment {0} could not be read: {1}")]
    CorruptCartSnapshot(String, String),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

impl From<CustomerApiError> for OrderFlowError {
    fn from(e: CustomerApiError) -> Self {
        match e {
            CustomerApiError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
        }
    }
}

/// This trait defines the highest level of behaviour a backend must support to drive the ordering
/// service.
///
/// This behaviour includes:
/// * The order lifecycle: placement, the kitchen status ladder and the customer grace-window
///   cancellation.
/// * The gateway payment lifecycle: invoice records, the atomic webhook claim, and expiring
///   invoices the gateway will never confirm.
#[allow(async_fn_in_trait)]
pub trait OrderFlowDatabase: Clone + CustomerManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order in a single atomic transaction. Alongside the insert, the transaction
    /// * refreshes the customer profile,
    /// * deducts one free coffee when the order is a loyalty redemption, failing the whole
    ///   transaction with [`OrderFlowError::NoFreeCoffees`] if the balance is zero, and
    /// * rewards a pending referral: if this is the customer's first order and they arrived via an
    ///   invite link, the referrer is credited one free coffee.
    ///
    /// Returns the stored order and the rewarded referrer's id, if any.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, Option<i64>), OrderFlowError>;

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderFlowError>;

    /// Every order the barista still cares about (anything not `completed`), oldest first.
    async fn active_orders(&self) -> Result<Vec<Order>, OrderFlowError>;

    /// Sets the status unconditionally. Returns the updated order together with the status it
    /// replaced, read in the same transaction so concurrent updates cannot make the pair lie.
    async fn set_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(Order, OrderStatus), OrderFlowError>;

    /// Customer-initiated cancellation. Only succeeds within `grace` of the order being placed;
    /// a refunded loyalty coffee goes back onto the balance in the same transaction.
    async fn cancel_order_with_refund(&self, order_id: OrderId, grace: Duration)
        -> Result<CancelOutcome, OrderFlowError>;

    /// Records a freshly issued gateway invoice in the `pending` state.
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, OrderFlowError>;

    async fn fetch_payment(&self, payment_id: &str) -> Result<Option<Payment>, OrderFlowError>;

    /// Atomically flips the payment from `pending` to `paid` and returns it. Returns `None` when
    /// the payment does not exist or is no longer pending, which makes duplicate webhook
    /// deliveries harmless: exactly one caller wins the claim.
    async fn claim_pending_payment(&self, payment_id: &str) -> Result<Option<Payment>, OrderFlowError>;

    /// Links the order created from a claimed payment back to the payment row.
    async fn attach_order_to_payment(&self, payment_id: &str, order_id: OrderId) -> Result<(), OrderFlowError>;

    /// Sets the payment state unconditionally. Returns the paying user's id when a row was
    /// updated, so callers can notify them.
    async fn mark_payment_state(&self, payment_id: &str, state: PaymentState) -> Result<Option<i64>, OrderFlowError>;

    /// Flips `pending` payments older than `older_than` to `expired`. Returns how many rows were
    /// swept.
    async fn expire_stale_payments(&self, older_than: Duration) -> Result<u64, OrderFlowError>;
}
