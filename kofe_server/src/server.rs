use std::time::Duration;

use actix_files::Files;
use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use kofe_bot::notifier::TelegramNotifier;
use kofe_engine::{events::EventProducers, OrderFlowApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{health, ActiveOrdersRoute, EpayWebhookRoute, UpdateOrderStatusRoute},
    ws::{board_ws, OrdersWsRegistry},
};

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
    notifier: TelegramNotifier,
    registry: OrdersWsRegistry,
) -> Result<Server, ServerError> {
    let static_dir = config.static_dir.clone();
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("kofe::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(notifier.clone()))
            .app_data(web::Data::new(registry.clone()))
            .service(health)
            .service(ActiveOrdersRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(EpayWebhookRoute::new())
            .service(board_ws)
            // The kanban page and its assets. Registered last so it never shadows the API.
            .service(Files::new("/", static_dir.clone()).index_file("index.html"))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
