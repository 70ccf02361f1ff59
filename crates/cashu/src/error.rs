//! Crate-wide error type for curve primitives, derivation and core models

use thiserror::Error;

/// Errors produced by the `cashu` crate
#[derive(Debug, Error)]
pub enum Error {
    /// A 32-byte scalar reduced to zero modulo the curve order
    #[error("scalar is zero after reduction")]
    ZeroScalar,
    /// `hash_to_curve` exceeded its counter bound without finding a point
    #[error("hash_to_curve exceeded counter bound")]
    HashToCurveExhausted,
    /// Hex decoding failure
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    /// Public/secret key of the wrong length or otherwise malformed
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// A `Secret` was not valid UTF-8 / not the expected encoding
    #[error("invalid secret: {0}")]
    InvalidSecret(String),
    /// Address string did not match `mintUrl:scanHex:spendHex`
    #[error("invalid cashu address: {0}")]
    AddressParse(String),
    /// Amount arithmetic overflowed or underflowed
    #[error("amount overflow")]
    AmountOverflow,
    /// Serde (de)serialization failure
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}
