use std::sync::{Arc, Mutex};

use kofe_engine::{
    db_types::*,
    events::{EventHandlers, EventHooks, EventProducers},
    menu::{Croissant, CupSize, Drink, OrderItems, PickupTime, Syrup},
    test_utils::prepare_env::prepare_test_env,
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;
use tokio::runtime::Runtime;

fn profile(id: i64) -> ProfileUpdate {
    ProfileUpdate { telegram_id: id, username: Some(format!("user{id}")), first_name: Some("Аружан".to_string()) }
}

fn cappuccino() -> OrderItems {
    OrderItems {
        drink: Drink::Cappuccino,
        syrup: Syrup::Caramel,
        cup: CupSize::Medium,
        croissant: Croissant::NoCroissant,
        pickup: PickupTime::In10,
    }
}

#[test]
fn order_lifecycle() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = "sqlite://../data/test_order_lifecycle.db";
        prepare_test_env(url).await;
        let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");
        let api = OrderFlowApi::new(db, EventProducers::default());

        let order = api.place_order(NewOrder::new(profile(100), cappuccino())).await.expect("place failed");
        info!("🚀️ Order #{} placed", order.order_id);
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.total_price.value(), 1400 + 300);
        assert_eq!(order.drink, Drink::Cappuccino);

        // A second order from another customer lands behind the first on the board
        let second = api.place_order(NewOrder::new(profile(101), cappuccino())).await.unwrap();
        let active = api.active_orders().await.unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].order_id, order.order_id);
        assert_eq!(active[1].order_id, second.order_id);

        // Walk the first order down the kitchen ladder
        let updated = api.update_status(order.order_id, OrderStatus::InProgress).await.unwrap();
        assert_eq!(updated.status, OrderStatus::InProgress);
        let updated = api.update_status(order.order_id, OrderStatus::Ready).await.unwrap();
        assert_eq!(updated.status, OrderStatus::Ready);
        let updated = api.update_status(order.order_id, OrderStatus::Completed).await.unwrap();
        assert_eq!(updated.status, OrderStatus::Completed);

        // Completed orders leave the board
        let active = api.active_orders().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].order_id, second.order_id);

        // Unknown orders are a typed error, not a panic
        let err = api.update_status(OrderId(99_999), OrderStatus::Ready).await.unwrap_err();
        assert!(matches!(err, kofe_engine::traits::OrderFlowError::OrderNotFound(_)));
    });
}

#[test]
fn status_events_carry_the_prior_status() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = "sqlite://../data/test_status_events.db";
        prepare_test_env(url).await;
        let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");

        let seen: Arc<Mutex<Vec<(OrderStatus, OrderStatus)>>> = Arc::new(Mutex::new(Vec::new()));
        let transitions = seen.clone();
        let mut hooks = EventHooks::default();
        hooks.on_order_status_changed(move |ev| {
            let transitions = transitions.clone();
            Box::pin(async move {
                transitions.lock().unwrap().push((ev.old_status, ev.order.status));
            })
        });
        let handlers = EventHandlers::new(8, hooks);
        let producers = handlers.producers();
        handlers.start_handlers().await;
        let api = OrderFlowApi::new(db, producers);

        let order = api.place_order(NewOrder::new(profile(300), cappuccino())).await.unwrap();
        api.update_status(order.order_id, OrderStatus::InProgress).await.unwrap();
        api.update_status(order.order_id, OrderStatus::Ready).await.unwrap();
        api.update_status(order.order_id, OrderStatus::Completed).await.unwrap();

        // Hook delivery is asynchronous; give the pump a moment to drain
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 3);
        assert!(seen.contains(&(OrderStatus::New, OrderStatus::InProgress)));
        assert!(seen.contains(&(OrderStatus::InProgress, OrderStatus::Ready)));
        assert!(seen.contains(&(OrderStatus::Ready, OrderStatus::Completed)));
    });
}

#[test]
fn cancellation_within_grace_window() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = "sqlite://../data/test_cancel_grace.db";
        prepare_test_env(url).await;
        let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");
        let api = OrderFlowApi::new(db, EventProducers::default());

        let order = api.place_order(NewOrder::new(profile(200), cappuccino())).await.unwrap();
        // Fresh order: the customer can still back out
        match api.cancel_order(order.order_id).await.unwrap() {
            CancelOutcome::Cancelled(cancelled) => assert_eq!(cancelled.status, OrderStatus::Cancelled),
            other => panic!("expected cancellation, got {other:?}"),
        }

        // A cancelled order cannot be cancelled twice, and a missing order is NotFound
        assert_eq!(api.cancel_order(order.order_id).await.unwrap(), CancelOutcome::TooLate);
        assert_eq!(api.cancel_order(OrderId(4242)).await.unwrap(), CancelOutcome::NotFound);
    });
}
