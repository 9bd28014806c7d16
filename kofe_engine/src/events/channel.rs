//! The channel plumbing underneath the event hooks.
//!
//! Each event family gets one [`EventHandler`]: an mpsc inbox, any number of cloned
//! [`EventProducer`]s feeding it, and a single hook function that runs (spawned, so a slow hook
//! never blocks the pump) for every event received. Hooks only see the event payload; they carry
//! no handle back into the engine.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    inbox: mpsc::Receiver<E>,
    tx: mpsc::Sender<E>,
    hook: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, hook: Handler<E>) -> Self {
        let (tx, inbox) = mpsc::channel(buffer_size);
        Self { inbox, tx, hook }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer { tx: self.tx.clone() }
    }

    /// Runs the pump until every producer has been dropped, then drains the in-flight hook calls
    /// before returning.
    pub async fn start_handler(mut self) {
        debug!("📬️ Event pump started");
        // The pump holds the last non-producer sender. Dropping it here means the inbox closes
        // the moment the final producer goes away.
        drop(self.tx);
        let mut in_flight = JoinSet::new();
        while let Some(event) = self.inbox.recv().await {
            trace!("📬️ Dispatching an event to the hook");
            let hook = Arc::clone(&self.hook);
            in_flight.spawn(async move { (hook)(event).await });
            // Reap whatever has already finished so the set does not grow unbounded
            while let Some(done) = in_flight.try_join_next() {
                if let Err(e) = done {
                    warn!("📬️ An event hook call failed: {e}");
                }
            }
        }
        while let Some(done) = in_flight.join_next().await {
            if let Err(e) = done {
                warn!("📬️ An event hook call failed: {e}");
            }
        }
        debug!("📬️ Event pump drained and stopped");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    tx: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.tx.send(event).await {
            error!("📬️ Event dropped, the pump is gone: {e}");
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::*;
    use crate::events::BonusEarnedEvent;

    #[tokio::test]
    async fn every_published_event_reaches_the_hook() {
        let _ = env_logger::try_init();
        let total = Arc::new(AtomicI64::new(0));
        let tally = total.clone();
        let hook: Handler<BonusEarnedEvent> = Arc::new(move |ev: BonusEarnedEvent| {
            let tally = tally.clone();
            Box::pin(async move {
                debug!("Crediting referrer {}", ev.referrer_id);
                tally.fetch_add(ev.referrer_id, Ordering::SeqCst);
                tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
            })
        });
        let pump = EventHandler::new(2, hook);
        let chat_side = pump.subscribe();
        let webhook_side = pump.subscribe();
        tokio::spawn(async move {
            for referrer_id in [3, 5, 7] {
                chat_side.publish_event(BonusEarnedEvent::new(referrer_id)).await;
            }
        });
        tokio::spawn(async move {
            for referrer_id in [11, 13] {
                webhook_side.publish_event(BonusEarnedEvent::new(referrer_id)).await;
            }
        });

        // Both producers are dropped by their tasks, so the pump drains and returns
        pump.start_handler().await;
        assert_eq!(total.load(Ordering::SeqCst), 3 + 5 + 7 + 11 + 13);
    }
}
