//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. Any long, non-cpu-bound operation (I/O, database calls,
//! Telegram sends) must therefore be awaited, never blocked on.
use std::str::FromStr;

use actix_web::{get, web, HttpResponse, Responder};
use kofe_bot::{epay::EpayWebhookEvent, notifier::TelegramNotifier};
use kofe_engine::{
    db_types::{OrderId, OrderStatus},
    traits::OrderFlowDatabase,
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;
use serde_json::json;

use crate::{
    data_objects::{BoardOrder, StatusUpdateQuery},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Board   ----------------------------------------------------

route!(active_orders => Get "/api/orders" impl OrderFlowDatabase);
/// Every order the barista still cares about (status != completed), oldest first, in the board's
/// wire format.
pub async fn active_orders<B: OrderFlowDatabase>(
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET active orders");
    let orders = api.active_orders().await?;
    let board = orders.iter().map(BoardOrder::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(board))
}

route!(update_order_status => Put "/api/orders/{order_id}/status" impl OrderFlowDatabase);
/// The board advancing a card. Only the kitchen-ladder statuses may be set from here; everything
/// else (`arrived`, `cancelled`, `new`) belongs to the bot flows.
pub async fn update_order_status<B: OrderFlowDatabase>(
    path: web::Path<i64>,
    query: web::Query<StatusUpdateQuery>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId(path.into_inner());
    let requested = query.into_inner().status;
    let status =
        OrderStatus::from_str(&requested).map_err(|_| ServerError::UnsupportedStatus(requested.clone()))?;
    if !matches!(status, OrderStatus::InProgress | OrderStatus::Ready | OrderStatus::Completed) {
        return Err(ServerError::UnsupportedStatus(requested));
    }
    debug!("💻️ PUT order #{order_id} -> '{status}'");
    let order = api.update_status(order_id, status).await?;
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "order_id": order.order_id.0,
        "new_status": order.status.to_string(),
    })))
}

//----------------------------------------------   Epay webhook   ----------------------------------------------

route!(epay_webhook => Post "/webhooks/epay");
/// The gateway's payment result callback.
///
/// Processing happens on a background task and the endpoint always acknowledges with 200, so the
/// gateway never retries into an error loop. Settlement is idempotent on the engine side (the
/// pending payment is claimed atomically), which makes replayed deliveries harmless.
pub async fn epay_webhook(
    payload: web::Json<EpayWebhookEvent>,
    api: web::Data<OrderFlowApi<SqliteDatabase>>,
    notifier: web::Data<TelegramNotifier>,
) -> HttpResponse {
    let event = payload.into_inner();
    info!("💻️ Epay webhook for invoice {} (code '{}')", event.invoice_id, event.code);
    tokio::spawn(process_epay_event(event, api.clone(), notifier.clone()));
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn process_epay_event(
    event: EpayWebhookEvent,
    api: web::Data<OrderFlowApi<SqliteDatabase>>,
    notifier: web::Data<TelegramNotifier>,
) {
    let invoice_id = event.invoice_id.clone();
    if event.is_success() {
        match api.complete_payment(&invoice_id).await {
            Ok(Some(outcome)) => {
                notifier.notify_new_order(&outcome.order).await;
                notifier.notify_payment_success(outcome.payment.user_id, &outcome.order).await;
            },
            Ok(None) => {
                warn!("💻️ Webhook for invoice {invoice_id} matched no pending payment (replay or unknown)");
            },
            Err(e) => {
                error!("💻️ Could not settle payment {invoice_id}: {e}");
                // The money moved but the order did not land. Tell the customer to reach out.
                match api.fetch_payment(&invoice_id).await {
                    Ok(Some(payment)) => notifier.notify_payment_error(payment.user_id).await,
                    Ok(None) => {},
                    Err(e) => error!("💻️ Could not look up payment {invoice_id} for error reporting: {e}"),
                }
            },
        }
    } else {
        match api.fail_payment(&invoice_id).await {
            Ok(Some(user_id)) => notifier.notify_payment_failed(user_id, event.reason.as_deref()).await,
            Ok(None) => warn!("💻️ Failure webhook for invoice {invoice_id} matched no payment"),
            Err(e) => error!("💻️ Could not mark payment {invoice_id} as failed: {e}"),
        }
    }
}
