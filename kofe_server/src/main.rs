use std::sync::Arc;

use dotenvy::dotenv;
use kofe_bot::{
    commands::register_bot_commands,
    context::BotContext,
    epay::EpayClient,
    handlers,
    notifier::TelegramNotifier,
};
use kofe_engine::{
    events::{EventHandlers, EventHooks},
    OrderFlowApi,
    SqliteDatabase,
};
use kofe_server::{
    config::ServerConfig,
    data_objects::BoardEvent,
    errors::ServerError,
    server::create_server_instance,
    sweeper::start_payment_sweeper,
    ws::OrdersWsRegistry,
};
use log::*;
use teloxide::prelude::*;

const SWEEP_PERIOD: std::time::Duration = std::time::Duration::from_secs(600);

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let config = ServerConfig::from_env_or_default();
    info!("🚀️ Starting the Kofe server on {}:{}", config.host, config.port);
    match run(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}

async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    sqlx::migrate!("../kofe_engine/src/sqlite/migrations")
        .run(db.pool())
        .await
        .map_err(|e| ServerError::InitializeError(format!("Database migrations failed: {e}")))?;
    info!("🚀️ Database ready at {}", config.database_url);

    let bot = Bot::new(config.bot.token.reveal().clone());
    let me = bot
        .get_me()
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not reach Telegram: {e}")))?;
    let bot_username = me.username().to_string();
    info!("🚀️ Authenticated with Telegram as @{bot_username}");
    if let Err(e) = register_bot_commands(&bot).await {
        warn!("🚀️ Could not register the bot command menu: {e}");
    }

    let notifier = TelegramNotifier::new(bot.clone(), &config.bot);
    let registry = OrdersWsRegistry::new();
    let handlers = wire_event_handlers(registry.clone(), notifier.clone());
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let epay = EpayClient::new(config.epay.clone(), config.webhook_post_link());
    let bot_api = OrderFlowApi::new(db.clone(), producers.clone());
    let ctx = Arc::new(BotContext::new(
        db.clone(),
        bot_api,
        epay,
        notifier.clone(),
        config.bot.clone(),
        bot_username,
    ));
    tokio::spawn(handlers::dispatch(bot.clone(), ctx));
    start_payment_sweeper(db.clone(), producers.clone(), SWEEP_PERIOD, config.payment_timeout);

    notifier.startup().await;
    let srv = create_server_instance(config, db, producers, notifier.clone(), registry)?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    notifier.shutdown().await;
    result
}

/// Engine events drive everything that must happen regardless of which flow triggered the change:
/// board fan-out for new orders and status moves, and the referral bonus message.
fn wire_event_handlers(registry: OrdersWsRegistry, notifier: TelegramNotifier) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let reg = registry.clone();
    hooks.on_order_created(move |ev| {
        let reg = reg.clone();
        Box::pin(async move {
            reg.broadcast(&BoardEvent::new_order(&ev.order)).await;
        })
    });
    hooks.on_order_status_changed(move |ev| {
        let reg = registry.clone();
        Box::pin(async move {
            reg.broadcast(&BoardEvent::status_update(&ev.order)).await;
        })
    });
    hooks.on_bonus_earned(move |ev| {
        let notifier = notifier.clone();
        Box::pin(async move {
            notifier.notify_bonus_awarded(ev.referrer_id).await;
        })
    });
    EventHandlers::new(32, hooks)
}
