use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;

use crate::{
    db_types::{CancelOutcome, NewOrder, NewPayment, Order, OrderId, OrderStatus, Payment, PaymentState},
    events::{BonusEarnedEvent, EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    menu::OrderItems,
    traits::{OrderFlowDatabase, OrderFlowError},
};

/// How long a customer has to change their mind after placing an order.
pub fn cancel_grace() -> Duration {
    Duration::seconds(180)
}

/// The outcome of a confirmed gateway payment: the order it produced, the settled payment record
/// and the referrer who earned a coffee off the back of it, if any.
#[derive(Debug, Clone)]
pub struct PaidOrderOutcome {
    pub order: Order,
    pub payment: Payment,
    pub rewarded_referrer: Option<i64>,
}

/// `OrderFlowApi` is the primary API for handling order and payment flows in response to customer
/// actions in the chat, barista actions on the board, and payment gateway events.
///
/// Events fire only after the underlying transaction has committed, so a subscriber never sees an
/// order that could still be rolled back.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

/// Payment ids are the issuing instant as decimal UTC milliseconds. They double as the gateway
/// invoice id, which only needs uniqueness per shop.
pub fn new_payment_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

impl<B> OrderFlowApi<B>
where B: OrderFlowDatabase
{
    /// Submit a new order. The insert is atomic: the customer profile refresh, the loyalty
    /// deduction for free orders and a pending referral reward all commit together with the order
    /// row, or not at all.
    pub async fn place_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        let (order, rewarded_referrer) = self.db.insert_order(order).await?;
        debug!("🔄️📦️ Order #{} placed by customer {}", order.order_id, order.user_id);
        self.call_order_created_hook(&order).await;
        if let Some(referrer_id) = rewarded_referrer {
            self.call_bonus_earned_hook(referrer_id).await;
        }
        Ok(order)
    }

    /// Move an order along the kitchen ladder. Returns the updated order.
    pub async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order, OrderFlowError> {
        let (order, old_status) = self.db.set_order_status(order_id, status).await?;
        debug!("🔄️📦️ Order #{order_id} moved '{old_status}' -> '{status}'");
        self.call_order_status_changed_hook(&order, old_status).await;
        Ok(order)
    }

    /// Customer-initiated cancellation, honoured only within [`cancel_grace`] of placement.
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<CancelOutcome, OrderFlowError> {
        let outcome = self.db.cancel_order_with_refund(order_id, cancel_grace()).await?;
        if let CancelOutcome::Cancelled(order) = &outcome {
            debug!("🔄️📦️ Order #{order_id} cancelled within the grace window");
            self.call_order_status_changed_hook(order, OrderStatus::New).await;
        }
        Ok(outcome)
    }

    pub async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderFlowError> {
        self.db.fetch_order(order_id).await
    }

    pub async fn active_orders(&self) -> Result<Vec<Order>, OrderFlowError> {
        self.db.active_orders().await
    }

    /// Open a payment for the given cart: snapshots the cart as JSON against a fresh payment id.
    /// The order row is only created once the gateway confirms, so an abandoned invoice leaves no
    /// order behind.
    pub async fn begin_payment(
        &self,
        user_id: i64,
        items: &OrderItems,
        description: String,
    ) -> Result<Payment, OrderFlowError> {
        let order_data = serde_json::to_string(items)
            .map_err(|e| OrderFlowError::DatabaseError(format!("Cart snapshot could not be serialized: {e}")))?;
        let payment = NewPayment {
            payment_id: new_payment_id(),
            user_id,
            amount: items.total(),
            description,
            order_data,
        };
        let payment = self.db.insert_payment(payment).await?;
        debug!("🔄️💳️ Payment {} opened for customer {user_id} ({})", payment.payment_id, payment.amount);
        Ok(payment)
    }

    /// Settle a confirmed gateway payment. The payment is claimed atomically (`pending` ->
    /// `paid`), so replayed webhook deliveries return `Ok(None)` and cause no duplicate order.
    ///
    /// A claim that cannot be turned into an order (corrupt cart snapshot, missing profile) parks
    /// the payment in the `error` state for manual follow-up rather than losing the money
    /// silently.
    pub async fn complete_payment(&self, payment_id: &str) -> Result<Option<PaidOrderOutcome>, OrderFlowError> {
        let Some(payment) = self.db.claim_pending_payment(payment_id).await? else {
            debug!("🔄️💳️ Payment {payment_id} was not pending; nothing to do");
            return Ok(None);
        };
        let items: OrderItems = match serde_json::from_str(&payment.order_data) {
            Ok(items) => items,
            Err(e) => {
                error!("🔄️💳️ Cart snapshot for payment {payment_id} is unreadable: {e}");
                self.db.mark_payment_state(payment_id, PaymentState::Error).await?;
                return Err(OrderFlowError::CorruptCartSnapshot(payment_id.to_string(), e.to_string()));
            },
        };
        let Some(customer) = self.db.fetch_customer(payment.user_id).await? else {
            error!("🔄️💳️ Payment {payment_id} belongs to user {} with no stored profile", payment.user_id);
            self.db.mark_payment_state(payment_id, PaymentState::Error).await?;
            return Err(OrderFlowError::ProfileMissing(payment.user_id));
        };
        let new_order = NewOrder::new(customer.profile(), items).with_payment(payment_id);
        let (order, rewarded_referrer) = self.db.insert_order(new_order).await?;
        self.db.attach_order_to_payment(payment_id, order.order_id).await?;
        info!("🔄️💳️ Payment {payment_id} settled as order #{}", order.order_id);
        self.call_order_created_hook(&order).await;
        if let Some(referrer_id) = rewarded_referrer {
            self.call_bonus_earned_hook(referrer_id).await;
        }
        Ok(Some(PaidOrderOutcome { order, payment, rewarded_referrer }))
    }

    /// Record a gateway-side failure. Returns the paying user's id so they can be told.
    pub async fn fail_payment(&self, payment_id: &str) -> Result<Option<i64>, OrderFlowError> {
        let user_id = self.db.mark_payment_state(payment_id, PaymentState::Failed).await?;
        if user_id.is_some() {
            debug!("🔄️💳️ Payment {payment_id} marked as failed");
        }
        Ok(user_id)
    }

    pub async fn fetch_payment(&self, payment_id: &str) -> Result<Option<Payment>, OrderFlowError> {
        self.db.fetch_payment(payment_id).await
    }

    /// Expire `pending` payments the gateway will never confirm. Returns the number swept.
    pub async fn expire_stale_payments(&self, older_than: Duration) -> Result<u64, OrderFlowError> {
        self.db.expire_stale_payments(older_than).await
    }

    async fn call_order_created_hook(&self, order: &Order) {
        for emitter in &self.producers.order_created_producer {
            debug!("🔄️📦️ Notifying order created hook subscribers");
            let event = OrderCreatedEvent::new(order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_status_changed_hook(&self, order: &Order, old_status: OrderStatus) {
        for emitter in &self.producers.order_status_changed_producer {
            debug!("🔄️📦️ Notifying status changed hook subscribers");
            let event = OrderStatusChangedEvent::new(order.clone(), old_status);
            emitter.publish_event(event).await;
        }
    }

    async fn call_bonus_earned_hook(&self, referrer_id: i64) {
        for emitter in &self.producers.bonus_earned_producer {
            debug!("🔄️🎁️ Notifying bonus earned hook subscribers");
            emitter.publish_event(BonusEarnedEvent::new(referrer_id)).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
