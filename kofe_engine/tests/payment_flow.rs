use chrono::Duration;
use kofe_engine::{
    db_types::*,
    events::EventProducers,
    menu::{Croissant, CupSize, Drink, OrderItems, PickupTime, Syrup},
    test_utils::prepare_env::prepare_test_env,
    traits::CustomerManagement,
    OrderFlowApi,
    SqliteDatabase,
};
use tokio::runtime::Runtime;

fn profile(id: i64) -> ProfileUpdate {
    ProfileUpdate { telegram_id: id, username: Some(format!("user{id}")), first_name: Some("Диас".to_string()) }
}

fn latte() -> OrderItems {
    OrderItems {
        drink: Drink::Latte,
        syrup: Syrup::NoSyrup,
        cup: CupSize::Large,
        croissant: Croissant::Almond,
        pickup: PickupTime::In15,
    }
}

#[test]
fn gateway_payment_settles_exactly_once() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = "sqlite://../data/test_payment_flow.db";
        prepare_test_env(url).await;
        let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");
        db.upsert_customer(&profile(300)).await.unwrap();
        let api = OrderFlowApi::new(db, EventProducers::default());

        let payment = api.begin_payment(300, &latte(), "Заказ кофе".to_string()).await.unwrap();
        assert_eq!(payment.state, PaymentState::Pending);
        assert_eq!(payment.amount.value(), 1600 + 700);
        assert!(payment.order_id.is_none());

        // No order exists while the invoice is outstanding
        assert!(api.active_orders().await.unwrap().is_empty());

        // The webhook confirms: exactly one claim succeeds
        let outcome = api.complete_payment(&payment.payment_id).await.unwrap().expect("first claim must win");
        assert_eq!(outcome.order.payment_status, PaymentStatus::Paid);
        assert_eq!(outcome.order.payment_id.as_deref(), Some(payment.payment_id.as_str()));

        // A replayed delivery is a no-op
        assert!(api.complete_payment(&payment.payment_id).await.unwrap().is_none());

        // The payment row now points at the order
        let settled = api.fetch_payment(&payment.payment_id).await.unwrap().unwrap();
        assert_eq!(settled.state, PaymentState::Paid);
        assert_eq!(settled.order_id, Some(outcome.order.order_id));

        // And the board shows exactly one order
        assert_eq!(api.active_orders().await.unwrap().len(), 1);
    });
}

#[test]
fn failed_and_stale_payments() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = "sqlite://../data/test_payment_failures.db";
        prepare_test_env(url).await;
        let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");
        db.upsert_customer(&profile(301)).await.unwrap();
        let api = OrderFlowApi::new(db, EventProducers::default());

        let payment = api.begin_payment(301, &latte(), "Заказ кофе".to_string()).await.unwrap();

        // The gateway reports a failure; we learn who to apologise to
        let user_id = api.fail_payment(&payment.payment_id).await.unwrap();
        assert_eq!(user_id, Some(301));
        let failed = api.fetch_payment(&payment.payment_id).await.unwrap().unwrap();
        assert_eq!(failed.state, PaymentState::Failed);

        // A failed payment cannot be claimed any more
        assert!(api.complete_payment(&payment.payment_id).await.unwrap().is_none());

        // Unknown payment ids report nobody to notify
        assert_eq!(api.fail_payment("does-not-exist").await.unwrap(), None);

        // The sweeper only touches pending rows older than the cutoff. Payment ids are
        // millisecond timestamps, so space the invoices out.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let fresh = api.begin_payment(301, &latte(), "Заказ кофе".to_string()).await.unwrap();
        let swept = api.expire_stale_payments(Duration::hours(24)).await.unwrap();
        assert_eq!(swept, 0);
        let swept = api.expire_stale_payments(Duration::seconds(-1)).await.unwrap();
        assert_eq!(swept, 1);
        let expired = api.fetch_payment(&fresh.payment_id).await.unwrap().unwrap();
        assert_eq!(expired.state, PaymentState::Expired);
    });
}
