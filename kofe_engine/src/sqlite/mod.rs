//! SQLite database module for the Kofe ordering engine.

//!
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
