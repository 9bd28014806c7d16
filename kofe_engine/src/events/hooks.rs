use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    BonusEarnedEvent,
    EventHandler,
    EventProducer,
    Handler,
    OrderCreatedEvent,
    OrderStatusChangedEvent,
};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub order_status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
    pub bonus_earned_producer: Vec<EventProducer<BonusEarnedEvent>>,
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_order_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
    pub on_bonus_earned: Option<EventHandler<BonusEarnedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_created = hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f));
        let on_order_status_changed = hooks.on_order_status_changed.map(|f| EventHandler::new(buffer_size, f));
        let on_bonus_earned = hooks.on_bonus_earned.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_created, on_order_status_changed, on_bonus_earned }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_status_changed {
            result.order_status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_bonus_earned {
            result.bonus_earned_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_created {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_order_status_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_bonus_earned {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_order_status_changed: Option<Handler<OrderStatusChangedEvent>>,
    pub on_bonus_earned: Option<Handler<BonusEarnedEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    // Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>
    where F: (Fn(OrderCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_order_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_bonus_earned<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(BonusEarnedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_bonus_earned = Some(Arc::new(f));
        self
    }
}
