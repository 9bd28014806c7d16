//! The live order board feed.
//!
//! Browsers open `GET /ws/orders`; every connected session receives each [`BoardEvent`] as a JSON
//! text frame. The feed is push-only: frames from the client are drained and ignored (pings get
//! their pong) and there is no delivery guarantee — a session whose send fails is dropped.
use std::sync::Arc;

use actix_web::{get, web, HttpRequest, HttpResponse};
use actix_ws::{Message, Session};
use futures::StreamExt;
use log::*;
use tokio::sync::Mutex;

use crate::data_objects::BoardEvent;

/// The set of live board sessions. Cheap to clone; all clones share the session list.
#[derive(Clone, Default)]
pub struct OrdersWsRegistry {
    sessions: Arc<Mutex<Vec<Session>>>,
}

impl OrdersWsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, session: Session) {
        let mut sessions = self.sessions.lock().await;
        sessions.push(session);
        debug!("🔌️ Board session joined ({} live)", sessions.len());
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Pushes the event to every live session. The event is serialized once; sessions whose send
    /// fails have disconnected and are dropped from the registry.
    pub async fn broadcast(&self, event: &BoardEvent) {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                error!("🔌️ Could not serialize a board event: {e}");
                return;
            },
        };
        let mut sessions = self.sessions.lock().await;
        let mut live = Vec::with_capacity(sessions.len());
        let before = sessions.len();
        for mut session in sessions.drain(..) {
            if session.text(frame.clone()).await.is_ok() {
                live.push(session);
            }
        }
        if live.len() < before {
            debug!("🔌️ Dropped {} dead board sessions", before - live.len());
        }
        *sessions = live;
    }
}

/// Upgrades the request and parks the session in the registry. The read side only exists to keep
/// the connection healthy and to notice the close.
#[get("/ws/orders")]
pub async fn board_ws(
    req: HttpRequest,
    body: web::Payload,
    registry: web::Data<OrdersWsRegistry>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, session, mut stream) = actix_ws::handle(&req, body)?;
    registry.register(session.clone()).await;
    actix_web::rt::spawn(async move {
        let mut session = session;
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Ping(bytes) => {
                    if session.pong(&bytes).await.is_err() {
                        break;
                    }
                },
                Message::Close(_) => break,
                // Text and binary frames from the board are ignored
                _ => {},
            }
        }
        let _ = session.close(None).await;
        debug!("🔌️ Board session closed");
    });
    Ok(response)
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use kofe_common::Tenge;
    use kofe_engine::{
        db_types::{Order, OrderId, OrderStatus, PaymentStatus},
        menu::{Croissant, CupSize, Drink, PickupTime, Syrup},
    };

    use super::*;

    #[tokio::test]
    async fn broadcasting_to_an_empty_registry_is_a_no_op() {
        let registry = OrdersWsRegistry::new();
        let order = Order {
            order_id: OrderId(1),
            user_id: 1,
            username: None,
            first_name: None,
            drink: Drink::Espresso,
            syrup: Syrup::NoSyrup,
            cup: CupSize::Small,
            croissant: Croissant::NoCroissant,
            pickup_minutes: PickupTime::In5,
            is_free: false,
            total_price: Tenge::from_i64(800),
            status: OrderStatus::New,
            payment_status: PaymentStatus::Unpaid,
            payment_id: None,
            timestamp: Utc::now(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        registry.broadcast(&BoardEvent::new_order(&order)).await;
        assert_eq!(registry.session_count().await, 0);
    }
}
