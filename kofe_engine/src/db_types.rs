use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use kofe_common::Tenge;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::menu::{Croissant, CupSize, Drink, OrderItems, PickupTime, Syrup};

//--------------------------------------      OrderId        ---------------------------------------------------------
/// The autoincrement id of an order row. Rendered as `#27` in chat messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub i64);

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(OrderId)
    }
}

impl From<i64> for OrderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

//--------------------------------------    OrderStatus      ---------------------------------------------------------
/// Kitchen-side lifecycle of an order. The lowercase forms are both the storage format and the
/// board wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    InProgress,
    Ready,
    Completed,
    Cancelled,
    Arrived,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::New => "new",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Arrived => "arrived",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Error)]
#[error("'{0}' is not a valid order status")]
pub struct InvalidOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = InvalidOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(OrderStatus::New),
            "in_progress" => Ok(OrderStatus::InProgress),
            "ready" => Ok(OrderStatus::Ready),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "arrived" => Ok(OrderStatus::Arrived),
            other => Err(InvalidOrderStatus(other.to_string())),
        }
    }
}

//--------------------------------------   PaymentStatus     ---------------------------------------------------------
/// How an order was settled. `Bonus` marks an order paid with a free loyalty coffee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Bonus,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Bonus => "bonus",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------    PaymentState     ---------------------------------------------------------
/// Gateway-side lifecycle of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Paid,
    Failed,
    Error,
    Expired,
}

impl Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentState::Pending => "pending",
            PaymentState::Paid => "paid",
            PaymentState::Failed => "failed",
            PaymentState::Error => "error",
            PaymentState::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------       Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub drink: Drink,
    pub syrup: Syrup,
    pub cup: CupSize,
    pub croissant: Croissant,
    pub pickup_minutes: PickupTime,
    pub is_free: bool,
    pub total_price: Tenge,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn items(&self) -> OrderItems {
        OrderItems {
            drink: self.drink,
            syrup: self.syrup,
            cup: self.cup,
            croissant: self.croissant,
            pickup: self.pickup_minutes,
        }
    }
}

//--------------------------------------    ProfileUpdate    ---------------------------------------------------------
/// The identity fields Telegram hands us with every interaction. Upserted on each contact so the
/// stored names never go stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer: ProfileUpdate,
    pub items: OrderItems,
    pub is_free: bool,
    pub payment_id: Option<String>,
}

impl NewOrder {
    pub fn new(customer: ProfileUpdate, items: OrderItems) -> Self {
        Self { customer, items, is_free: false, payment_id: None }
    }

    /// Marks the order as settled with a loyalty coffee. The insert will deduct the credit.
    pub fn free(mut self) -> Self {
        self.is_free = true;
        self
    }

    /// Ties the order to a settled gateway invoice.
    pub fn with_payment<S: Into<String>>(mut self, payment_id: S) -> Self {
        self.payment_id = Some(payment_id.into());
        self
    }

    pub fn payment_status(&self) -> PaymentStatus {
        if self.is_free {
            PaymentStatus::Bonus
        } else if self.payment_id.is_some() {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Unpaid
        }
    }

    /// Free orders do not charge for the drink, only paid extras would apply; the original shop
    /// gives the whole cart away, so the stored price is zero.
    pub fn total_price(&self) -> Tenge {
        if self.is_free {
            Tenge::from_i64(0)
        } else {
            self.items.total()
        }
    }
}

//--------------------------------------      Payment        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Payment {
    pub payment_id: String,
    pub user_id: i64,
    pub amount: Tenge,
    pub description: String,
    /// JSON snapshot of the [`OrderItems`] the invoice was issued for.
    pub order_data: String,
    #[sqlx(rename = "status")]
    pub state: PaymentState,
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub payment_id: String,
    pub user_id: i64,
    pub amount: Tenge,
    pub description: String,
    pub order_data: String,
}

//--------------------------------------      Customer       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Customer {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn profile(&self) -> ProfileUpdate {
        ProfileUpdate {
            telegram_id: self.telegram_id,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
        }
    }
}

//--------------------------------------   LoyaltyAccount    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct LoyaltyAccount {
    pub user_id: i64,
    pub free_coffees: i64,
    pub referred_count: i64,
}

//--------------------------------------  BroadcastMessage   ---------------------------------------------------------
/// The single draft the admin panel keeps for the next broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct BroadcastMessage {
    pub message_text: Option<String>,
    pub photo_id: Option<String>,
}

impl BroadcastMessage {
    pub fn is_empty(&self) -> bool {
        self.message_text.is_none() && self.photo_id.is_none()
    }
}

//--------------------------------------     analytics       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DailyOrderCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DrinkCount {
    pub drink: Drink,
    pub count: i64,
}

//--------------------------------------    ExportPeriod     ---------------------------------------------------------
/// The time window for a CSV export. Weeks start on Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPeriod {
    Today,
    ThisWeek,
    ThisMonth,
    All,
    On(NaiveDate),
}

/// Renders the filename fragment of the exported report.
impl Display for ExportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportPeriod::Today => write!(f, "today"),
            ExportPeriod::ThisWeek => write!(f, "week"),
            ExportPeriod::ThisMonth => write!(f, "month"),
            ExportPeriod::All => write!(f, "all"),
            ExportPeriod::On(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

//--------------------------------------    CancelOutcome    ---------------------------------------------------------
/// Result of a customer cancellation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    /// The order was cancelled inside the grace window. A spent loyalty coffee has been refunded.
    Cancelled(Order),
    /// The grace window has passed, the order stands.
    TooLate,
    NotFound,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::menu::{Croissant, CupSize, Drink, PickupTime, Syrup};

    fn cart() -> OrderItems {
        OrderItems {
            drink: Drink::Latte,
            syrup: Syrup::NoSyrup,
            cup: CupSize::Medium,
            croissant: Croissant::NoCroissant,
            pickup: PickupTime::In15,
        }
    }

    #[test]
    fn payment_status_is_derived_from_the_builder() {
        let customer = ProfileUpdate { telegram_id: 1, username: None, first_name: None };
        let order = NewOrder::new(customer.clone(), cart());
        assert_eq!(order.payment_status(), PaymentStatus::Unpaid);
        let order = NewOrder::new(customer.clone(), cart()).with_payment("1717171717000");
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        let order = NewOrder::new(customer, cart()).free();
        assert_eq!(order.payment_status(), PaymentStatus::Bonus);
        assert!(order.total_price().is_zero());
    }

    #[test]
    fn statuses_round_trip_through_their_wire_form() {
        for status in
            [OrderStatus::New, OrderStatus::InProgress, OrderStatus::Ready, OrderStatus::Completed, OrderStatus::Cancelled, OrderStatus::Arrived]
        {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("paid".parse::<OrderStatus>().is_err());
    }
}
