//! Kofe ordering engine
//!
//! The engine holds the core logic for the coffee-to-go ordering service: the menu and its price
//! list, the customer register with its referral program, the order lifecycle and the payment
//! gateway bookkeeping. It is frontend-agnostic; the Telegram bot and the barista board are just
//! two clients of this crate.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@sqlite`]). You should rarely need to access the
//!    database directly. Instead, use the public API provided by the engine. The exception is the
//!    data types used in the database, defined in [`mod@db_types`], which are public.
//! 2. The engine public API ([`mod@api`]). Specific backends need to implement the traits in
//!    [`mod@traits`] in order to act as a backend for the ordering service.
//! 3. An event system ([`mod@events`]). Events are emitted when certain actions occur within the
//!    engine, e.g. an `OrderCreatedEvent` when a new order lands. A simple actor framework lets
//!    you hook into these events and perform custom actions.

pub mod api;
pub mod db_types;
pub mod events;
pub mod menu;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use api::order_flow_api::{cancel_grace, new_payment_id, OrderFlowApi, PaidOrderOutcome};
