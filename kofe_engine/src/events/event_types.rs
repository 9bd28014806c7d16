use crate::db_types::{Order, OrderStatus};

/// Fired once a new order has been committed to the database, whichever settlement path it took
/// (unpaid walk-in, gateway invoice, or a loyalty coffee).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired after an order moves along the kitchen ladder (or gets cancelled).
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub old_status: OrderStatus,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, old_status: OrderStatus) -> Self {
        Self { order, old_status }
    }
}

/// Fired when a referral pays out and the referrer has a fresh free coffee on their balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusEarnedEvent {
    pub referrer_id: i64,
}

impl BonusEarnedEvent {
    pub fn new(referrer_id: i64) -> Self {
        Self { referrer_id }
    }
}
