//! # Kofe server
//! This module hosts the HTTP side of the coffee shop. It is responsible for:
//! Serving the barista's live order board (the kanban page, its JSON API and its WebSocket feed).
//! Listening for payment result webhooks from the Epay gateway.
//! Sweeping gateway invoices that will never be confirmed.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/orders`: The board's order list (GET) and status updates (PUT on `/api/orders/{id}/status`).
//! * `/ws/orders`: The board's live event feed.
//! * `/webhooks/epay`: The payment result callback from the Epay gateway.
//! * `/`: The bundled board page and its static assets.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;
pub mod sweeper;
pub mod ws;

#[cfg(test)]
mod endpoint_tests;
