//! Storage-backend error kind
// Grounded on crates/cdk-sqlite/src/wallet/error.rs's shape: a small
// thiserror enum wrapping the underlying driver's error plus a way back into
// the wallet engine's own `Error`, so the two directions required by
// `WalletDatabase::Err: Into<Error> + From<Error>` both hold.

use thiserror::Error;

/// Failures specific to the SQLite-backed store
#[derive(Debug, Error)]
pub enum Error {
    /// A `rusqlite` call failed
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    /// A stored JSON column failed to (de)serialize
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    /// Propagated from the wallet engine (e.g. an address failed to parse)
    #[error(transparent)]
    Wallet(#[from] cdk::Error),
}

impl From<Error> for cdk::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Wallet(inner) => inner,
            other => cdk::Error::StoreFailure(Box::new(other)),
        }
    }
}
