//! SQLite storage backend for the MegaCart engine.
//!
//! [`SqliteDatabase`] implements every storage trait. The free functions in [`db`] do the actual queries and can be
//! composed inside a single transaction.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
