use chrono::Utc;
use kofe_engine::{
    db_types::*,
    events::EventProducers,
    menu::{Croissant, CupSize, Drink, OrderItems, PickupTime, Syrup},
    test_utils::prepare_env::prepare_test_env,
    traits::AdminDatabase,
    OrderFlowApi,
    SqliteDatabase,
};
use tokio::runtime::Runtime;

fn profile(id: i64) -> ProfileUpdate {
    ProfileUpdate { telegram_id: id, username: Some(format!("user{id}")), first_name: None }
}

fn order_of(drink: Drink) -> OrderItems {
    OrderItems {
        drink,
        syrup: Syrup::NoSyrup,
        cup: CupSize::Small,
        croissant: Croissant::NoCroissant,
        pickup: PickupTime::In5,
    }
}

#[test]
fn analytics_and_exports() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = "sqlite://../data/test_admin_reports.db";
        prepare_test_env(url).await;
        let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");
        let api = OrderFlowApi::new(db.clone(), EventProducers::default());

        for _ in 0..3 {
            api.place_order(NewOrder::new(profile(1), order_of(Drink::Cappuccino))).await.unwrap();
        }
        for _ in 0..2 {
            api.place_order(NewOrder::new(profile(2), order_of(Drink::Americano))).await.unwrap();
        }
        api.place_order(NewOrder::new(profile(3), order_of(Drink::Espresso))).await.unwrap();

        assert_eq!(db.count_orders().await.unwrap(), 6);
        assert_eq!(db.count_free_orders().await.unwrap(), 0);
        assert_eq!(db.count_active_customers().await.unwrap(), 3);

        // Everything was placed just now, so a single day carries all six orders
        let per_day = db.orders_per_day().await.unwrap();
        assert_eq!(per_day.len(), 1);
        assert_eq!(per_day[0].count, 6);

        let top = db.top_drinks(5).await.unwrap();
        assert_eq!(top[0].drink, Drink::Cappuccino);
        assert_eq!(top[0].count, 3);
        assert_eq!(top[1].drink, Drink::Americano);
        assert_eq!(top[1].count, 2);

        // Export windows: everything here is from today, newest first
        let today = db.orders_for_export(ExportPeriod::Today).await.unwrap();
        assert_eq!(today.len(), 6);
        assert!(today.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(db.orders_for_export(ExportPeriod::ThisWeek).await.unwrap().len(), 6);
        assert_eq!(db.orders_for_export(ExportPeriod::ThisMonth).await.unwrap().len(), 6);
        assert_eq!(db.orders_for_export(ExportPeriod::All).await.unwrap().len(), 6);
        assert_eq!(db.orders_for_export(ExportPeriod::On(Utc::now().date_naive())).await.unwrap().len(), 6);

        // A day with no trade exports nothing
        let quiet_day = Utc::now().date_naive().pred_opt().unwrap();
        assert!(db.orders_for_export(ExportPeriod::On(quiet_day)).await.unwrap().is_empty());
    });
}

#[test]
fn broadcast_draft_roundtrip() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = "sqlite://../data/test_broadcast.db";
        prepare_test_env(url).await;
        let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");

        // Seeded empty
        let draft = db.broadcast_message().await.unwrap();
        assert!(draft.is_empty());

        db.set_broadcast_message(Some("Скидка 20% на все лате!".to_string()), Some("AgACAgIAA".to_string()))
            .await
            .unwrap();
        let draft = db.broadcast_message().await.unwrap();
        assert_eq!(draft.message_text.as_deref(), Some("Скидка 20% на все лате!"));
        assert_eq!(draft.photo_id.as_deref(), Some("AgACAgIAA"));

        // Clearing the draft
        db.set_broadcast_message(None, None).await.unwrap();
        assert!(db.broadcast_message().await.unwrap().is_empty());
    });
}
