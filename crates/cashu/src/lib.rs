//! Curve primitives, silent-payment derivation and core Cashu wire types
//!
//! This crate has no network or storage awareness. It is the "hard core":
//! everything in here is a pure function of its inputs, safe to unit test in
//! isolation and to call from both the pay and scan engines in `cdk`.

#![forbid(unsafe_code)]

pub mod address;
pub mod amount;
pub mod error;
pub mod id;
pub mod identity;
pub mod keys;
pub mod primitives;
pub mod proof;
pub mod secret;
pub mod silent;

pub use address::CashuAddress;
pub use amount::Amount;
pub use error::Error;
pub use id::Id;
pub use identity::SilentKeys;
pub use keys::{PublicKey, SecretKey};
pub use proof::{BlindedMessage, BlindedSignature, OutputData, Proof, Proofs};
pub use secret::Secret;
