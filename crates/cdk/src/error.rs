//! Wallet-level error kinds
// Grounded on crates/cdk/src/wallet/error.rs's shape (one flat `thiserror`
// enum, `#[from]` for each collaborator's error type); variants trimmed down
// to exactly the error kinds named in the core's error handling design.

use thiserror::Error;

/// Errors surfaced by the silent-payment wallet engine
#[derive(Debug, Error)]
pub enum Error {
    /// Ill-formed address or keys
    #[error("invalid address: {0}")]
    AddressParse(String),
    /// Target mint differs from the wallet's configured mint
    #[error("address targets a different mint than this wallet is configured for")]
    CrossMint,
    /// Not enough proofs in the local store for the requested amount
    #[error("insufficient balance")]
    InsufficientBalance,
    /// Network/HTTP failure or non-2xx response from the mint
    #[error("mint unavailable: {0}")]
    MintUnavailable(String),
    /// Mint quote not paid within the caller-bounded polling window
    #[error("mint quote {0} timed out waiting for payment")]
    MintQuoteTimeout(String),
    /// The mint returned outputs for `B_` values that were never submitted
    #[error("mint restore response does not match submitted outputs")]
    RestoreMismatch,
    /// Local persistence error. Boxed so that any backend (sqlite, an
    /// in-memory fake for tests, ...) can report its own failure type without
    /// this crate depending on it.
    #[error("store failure: {0}")]
    StoreFailure(#[from] Box<dyn std::error::Error + Send + Sync>),
    /// Curve/derivation primitive failure
    #[error(transparent)]
    Cashu(#[from] cashu::Error),
    /// JSON (de)serialization failure
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}
