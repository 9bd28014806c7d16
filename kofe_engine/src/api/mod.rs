//! # Ordering engine public API
//!
//! The `api` module exposes the programmatic API for the ordering engine.
//!
//! * [`order_flow_api`] is the primary API for handling order and payment flows in response to
//!   customer actions in the chat, barista actions on the board, and payment gateway events.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits
//! required by the API:
//!
//! ```rust,ignore
//! use kofe_engine::{EventProducers, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/kofe.db", 5).await?;
//! // SqliteDatabase implements OrderFlowDatabase
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let (order, _) = api.place_order(new_order).await?;
//! ```

pub mod order_flow_api;
