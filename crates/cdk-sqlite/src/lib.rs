//! SQLite-backed [`cdk::WalletDatabase`]
//!
//! A single [`tokio::sync::Mutex`]-guarded [`rusqlite::Connection`], matching
//! this wallet's single-writer design: no connection pool, no generic SQL
//! builder, just plain `rusqlite` calls behind the lock.

#![warn(missing_docs)]

mod error;
mod store;

pub use error::Error;
pub use store::WalletSqliteDatabase;
