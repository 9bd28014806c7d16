//! # Database management and control.
//!
//! This module defines the interface contracts that a storage backend must expose to drive the
//! ordering service.
//!
//! ## Traits
//! * [`CustomerManagement`] maintains the customer register: profiles, referral links and loyalty
//!   balances.
//! * [`OrderFlowDatabase`] is the highest level of behaviour a backend must support. It covers the
//!   order lifecycle and the gateway payment lifecycle, including the transactional pieces (free
//!   coffee deduction, referral rewards, webhook claims).
//! * [`AdminDatabase`] serves the admin panel: analytics aggregates, exports and the broadcast
//!   draft.

mod admin_database;
mod customer_management;
mod order_flow_database;

pub use admin_database::{AdminApiError, AdminDatabase};
pub use customer_management::{CustomerApiError, CustomerManagement};
pub use order_flow_database::{OrderFlowDatabase, OrderFlowError};
