use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use kofe_engine::{
    db_types::*,
    events::{EventHandlers, EventHooks},
    menu::{Croissant, CupSize, Drink, OrderItems, PickupTime, Syrup},
    test_utils::prepare_env::prepare_test_env,
    traits::{CustomerManagement, OrderFlowError},
    OrderFlowApi,
    SqliteDatabase,
};
use tokio::runtime::Runtime;

fn profile(id: i64) -> ProfileUpdate {
    ProfileUpdate { telegram_id: id, username: None, first_name: Some("Алия".to_string()) }
}

fn espresso() -> OrderItems {
    OrderItems {
        drink: Drink::Espresso,
        syrup: Syrup::NoSyrup,
        cup: CupSize::Small,
        croissant: Croissant::NoCroissant,
        pickup: PickupTime::In5,
    }
}

#[test]
fn referral_rewards_on_first_order() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = "sqlite://../data/test_referrals.db";
        prepare_test_env(url).await;
        let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");

        // A bonus hook so we can observe the reward firing
        let rewarded = Arc::new(AtomicI64::new(0));
        let seen = rewarded.clone();
        let mut hooks = EventHooks::default();
        hooks.on_bonus_earned(move |ev| {
            let seen = seen.clone();
            Box::pin(async move {
                seen.store(ev.referrer_id, Ordering::SeqCst);
            })
        });
        let handlers = EventHandlers::new(10, hooks);
        let producers = handlers.producers();
        handlers.start_handlers().await;

        let api = OrderFlowApi::new(db.clone(), producers);

        db.upsert_customer(&profile(1)).await.unwrap();
        db.upsert_customer(&profile(2)).await.unwrap();

        // Self-referrals and duplicate links are rejected
        assert!(!db.link_referral(2, 2).await.unwrap());
        assert!(db.link_referral(1, 2).await.unwrap());
        assert!(!db.link_referral(3, 2).await.unwrap());

        // The referred customer's first order pays the referrer one coffee
        api.place_order(NewOrder::new(profile(2), espresso())).await.unwrap();
        let account = db.fetch_loyalty_account(1).await.unwrap().expect("referrer should have an account");
        assert_eq!(account.free_coffees, 1);
        assert_eq!(account.referred_count, 1);

        // The reward only fires once
        api.place_order(NewOrder::new(profile(2), espresso())).await.unwrap();
        let account = db.fetch_loyalty_account(1).await.unwrap().unwrap();
        assert_eq!(account.free_coffees, 1);

        // The hook saw the referrer (the handler runs async, give it a beat)
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        assert_eq!(rewarded.load(Ordering::SeqCst), 1);
    });
}

#[test]
fn free_coffee_spend_and_refund() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = "sqlite://../data/test_free_coffee.db";
        prepare_test_env(url).await;
        let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");
        let api = OrderFlowApi::new(db.clone(), Default::default());

        db.upsert_customer(&profile(10)).await.unwrap();
        db.upsert_customer(&profile(11)).await.unwrap();
        db.link_referral(10, 11).await.unwrap();
        // customer 11 orders, customer 10 earns a coffee
        api.place_order(NewOrder::new(profile(11), espresso())).await.unwrap();
        assert_eq!(db.fetch_loyalty_account(10).await.unwrap().unwrap().free_coffees, 1);

        // Spending it: the order is free and the balance drops to zero
        let order = api.place_order(NewOrder::new(profile(10), espresso()).free()).await.unwrap();
        assert!(order.is_free);
        assert_eq!(order.payment_status, PaymentStatus::Bonus);
        assert!(order.total_price.is_zero());
        assert_eq!(db.fetch_loyalty_account(10).await.unwrap().unwrap().free_coffees, 0);

        // A second redemption fails atomically: no order row appears
        let orders_before = api.active_orders().await.unwrap().len();
        let err = api.place_order(NewOrder::new(profile(10), espresso()).free()).await.unwrap_err();
        assert!(matches!(err, OrderFlowError::NoFreeCoffees(10)));
        assert_eq!(api.active_orders().await.unwrap().len(), orders_before);

        // Cancelling the bonus order inside the grace window puts the coffee back
        match api.cancel_order(order.order_id).await.unwrap() {
            CancelOutcome::Cancelled(_) => {},
            other => panic!("expected cancellation, got {other:?}"),
        }
        assert_eq!(db.fetch_loyalty_account(10).await.unwrap().unwrap().free_coffees, 1);
    });
}

#[test]
fn customer_register_roundtrip() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = "sqlite://../data/test_customers.db";
        prepare_test_env(url).await;
        let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");

        assert!(db.fetch_customer(500).await.unwrap().is_none());
        let created = db.upsert_customer(&profile(500)).await.unwrap();
        assert!(created.is_active);

        // Names refresh on re-contact
        let renamed = ProfileUpdate {
            telegram_id: 500,
            username: Some("new_handle".to_string()),
            first_name: Some("Алия".to_string()),
        };
        let updated = db.upsert_customer(&renamed).await.unwrap();
        assert_eq!(updated.username.as_deref(), Some("new_handle"));

        // Deactivation removes the customer from broadcast fan-out, re-contact restores them
        db.deactivate_customer(500).await.unwrap();
        assert!(db.active_customer_ids().await.unwrap().is_empty());
        db.upsert_customer(&renamed).await.unwrap();
        assert_eq!(db.active_customer_ids().await.unwrap(), vec![500]);

        // Loyalty accounts are created on demand and are idempotent
        let account = db.ensure_loyalty_account(500).await.unwrap();
        assert_eq!(account.free_coffees, 0);
        let account = db.ensure_loyalty_account(500).await.unwrap();
        assert_eq!(account.referred_count, 0);
    });
}
