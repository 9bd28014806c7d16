use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use kofe_common::Tenge;
use kofe_engine::{
    db_types::{Order, OrderId, OrderStatus, PaymentStatus},
    events::EventProducers,
    menu::{Croissant, CupSize, Drink, PickupTime, Syrup},
    traits::OrderFlowError,
    OrderFlowApi,
};
use serde_json::Value;

use super::{
    helpers::{get_request, put_request},
    mocks::MockOrderFlowDb,
};
use crate::routes::{ActiveOrdersRoute, UpdateOrderStatusRoute};

#[actix_web::test]
async fn fetch_active_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/api/orders", configure_board).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    let cards = json.as_array().unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0]["order_id"], 41);
    assert_eq!(cards[0]["type"], "Капучино");
    assert_eq!(cards[0]["cup"], 330);
    assert_eq!(cards[0]["time"], 10);
    assert_eq!(cards[0]["status"], "new");
    assert_eq!(cards[0]["syrup"], "Карамельный");
    assert_eq!(cards[0]["payment_status"], "paid");
    assert_eq!(cards[1]["order_id"], 42);
    assert_eq!(cards[1]["is_free"], true);
    assert_eq!(cards[1]["total_price"], 0);
}

#[actix_web::test]
async fn advance_an_order_along_the_ladder() {
    let _ = env_logger::try_init().ok();
    let (status, body) = put_request("/api/orders/41/status?status=ready", configure_board).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["order_id"], 41);
    assert_eq!(json["new_status"], "ready");
}

#[actix_web::test]
async fn the_board_may_not_set_customer_statuses() {
    let _ = env_logger::try_init().ok();
    for bad in ["arrived", "cancelled", "new", "paid", "nonsense"] {
        let (status, body) = put_request(&format!("/api/orders/41/status?status={bad}"), configure_untouched).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "'{bad}' should have been rejected");
        assert!(body.contains("not a status the board may set"), "unexpected body: {body}");
    }
}

#[actix_web::test]
async fn updating_a_missing_order_is_a_404() {
    let _ = env_logger::try_init().ok();
    let (status, body) = put_request("/api/orders/999/status?status=in_progress", configure_missing).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Order #999"), "unexpected body: {body}");
}

fn configure_board(cfg: &mut ServiceConfig) {
    let mut db = MockOrderFlowDb::new();
    db.expect_active_orders().returning(|| Ok(vec![order(41, OrderStatus::New), free_order(42)]));
    db.expect_set_order_status().returning(|id, status| Ok((order(id.0, status), OrderStatus::New)));
    install(cfg, db);
}

// No expectations: the request must be rejected before the database is touched.
fn configure_untouched(cfg: &mut ServiceConfig) {
    install(cfg, MockOrderFlowDb::new());
}

fn configure_missing(cfg: &mut ServiceConfig) {
    let mut db = MockOrderFlowDb::new();
    db.expect_set_order_status().returning(|id, _| Err(OrderFlowError::OrderNotFound(id)));
    install(cfg, db);
}

fn install(cfg: &mut ServiceConfig, db: MockOrderFlowDb) {
    let api = OrderFlowApi::new(db, EventProducers::default());
    cfg.service(ActiveOrdersRoute::<MockOrderFlowDb>::new())
        .service(UpdateOrderStatusRoute::<MockOrderFlowDb>::new())
        .app_data(web::Data::new(api));
}

fn order(id: i64, status: OrderStatus) -> Order {
    Order {
        order_id: OrderId(id),
        user_id: 77,
        username: Some("aidana".to_string()),
        first_name: Some("Айдана".to_string()),
        drink: Drink::Cappuccino,
        syrup: Syrup::Caramel,
        cup: CupSize::Medium,
        croissant: Croissant::NoCroissant,
        pickup_minutes: PickupTime::In10,
        is_free: false,
        total_price: Tenge::from_i64(1400),
        status,
        payment_status: PaymentStatus::Paid,
        payment_id: Some("1709212200000".to_string()),
        timestamp: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
    }
}

fn free_order(id: i64) -> Order {
    Order {
        order_id: OrderId(id),
        drink: Drink::Espresso,
        syrup: Syrup::NoSyrup,
        cup: CupSize::Small,
        is_free: true,
        total_price: Tenge::from_i64(0),
        payment_status: PaymentStatus::Bonus,
        payment_id: None,
        ..order(id, OrderStatus::New)
    }
}
