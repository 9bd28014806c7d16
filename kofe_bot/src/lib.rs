//! The Telegram front end for the coffee-to-go ordering service.
//!
//! The bot runs the ordering conversation (drink, syrup, cup, pickup time, extras, confirmation),
//! the referral programme screens and the admin panel, and it owns the Epay gateway client used to
//! issue invoices for online payments. All business rules live in `kofe_engine`; this crate only
//! translates between Telegram updates and engine calls.
pub mod commands;
pub mod config;
pub mod context;
pub mod epay;
pub mod errors;
pub mod export;
pub mod handlers;
pub mod keyboards;
pub mod notifier;
pub mod state;
