//! Wire formats for the board API and its WebSocket feed.
//!
//! The field names match what the board page already consumes: `type` for the drink and `time`
//! for the pickup minutes.
use chrono::{DateTime, Utc};
use kofe_engine::db_types::Order;
use serde::{Deserialize, Serialize};

/// One card on the kanban board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardOrder {
    pub order_id: i64,
    #[serde(rename = "type")]
    pub drink: String,
    pub cup: i64,
    pub time: i64,
    pub status: String,
    pub syrup: String,
    pub croissant: String,
    pub is_free: bool,
    pub timestamp: DateTime<Utc>,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub payment_status: String,
}

impl From<&Order> for BoardOrder {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id.0,
            drink: order.drink.to_string(),
            cup: order.cup.millilitres(),
            time: order.pickup_minutes.minutes(),
            status: order.status.to_string(),
            syrup: order.syrup.to_string(),
            croissant: order.croissant.to_string(),
            is_free: order.is_free,
            timestamp: order.timestamp,
            total_price: order.total_price.value(),
            created_at: order.created_at,
            payment_status: order.payment_status.to_string(),
        }
    }
}

/// A push frame on the board WebSocket. Serializes with a `type`/`payload` envelope, e.g.
/// `{"type":"status_update","payload":{"order_id":5,"new_status":"ready"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum BoardEvent {
    NewOrder(BoardOrder),
    StatusUpdate { order_id: i64, new_status: String },
}

impl BoardEvent {
    pub fn new_order(order: &Order) -> Self {
        Self::NewOrder(BoardOrder::from(order))
    }

    pub fn status_update(order: &Order) -> Self {
        Self::StatusUpdate { order_id: order.order_id.0, new_status: order.status.to_string() }
    }
}

/// `?status=…` on the board's status update endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateQuery {
    pub status: String,
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use kofe_common::Tenge;
    use kofe_engine::{
        db_types::{OrderId, OrderStatus, PaymentStatus},
        menu::{Croissant, CupSize, Drink, PickupTime, Syrup},
    };

    use super::*;

    fn order() -> Order {
        Order {
            order_id: OrderId(5),
            user_id: 77,
            username: Some("aidana".to_string()),
            first_name: Some("Айдана".to_string()),
            drink: Drink::Americano,
            syrup: Syrup::NoSyrup,
            cup: CupSize::Small,
            croissant: Croissant::NoCroissant,
            pickup_minutes: PickupTime::In5,
            is_free: false,
            total_price: Tenge::from_i64(900),
            status: OrderStatus::Ready,
            payment_status: PaymentStatus::Unpaid,
            payment_id: None,
            timestamp: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn board_orders_use_the_original_field_names() {
        let json = serde_json::to_value(BoardOrder::from(&order())).unwrap();
        assert_eq!(json["order_id"], 5);
        assert_eq!(json["type"], "Американо");
        assert_eq!(json["cup"], 250);
        assert_eq!(json["time"], 5);
        assert_eq!(json["status"], "ready");
        assert_eq!(json["total_price"], 900);
        assert_eq!(json["payment_status"], "unpaid");
    }

    #[test]
    fn events_carry_the_type_payload_envelope() {
        let json = serde_json::to_value(BoardEvent::status_update(&order())).unwrap();
        assert_eq!(json["type"], "status_update");
        assert_eq!(json["payload"]["order_id"], 5);
        assert_eq!(json["payload"]["new_status"], "ready");

        let json = serde_json::to_value(BoardEvent::new_order(&order())).unwrap();
        assert_eq!(json["type"], "new_order");
        assert_eq!(json["payload"]["type"], "Американо");
    }
}
