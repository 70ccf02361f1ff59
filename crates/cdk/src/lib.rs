//! Silent Cashu payment wallet engine
//!
//! Glues the curve-level primitives in [`cashu`] to an external mint over
//! HTTP and a local proof store: sending a silent payment ([`pay`]),
//! discovering one as the receiver ([`scan`]), and the [`wallet`] façade that
//! wires both to a concrete [`database::WalletDatabase`] and [`client::MintClient`].

#![warn(missing_docs)]

pub mod client;
pub mod database;
pub mod error;
pub mod pay;
pub mod scan;
pub mod wallet;

pub use client::{HttpClient, MintClient};
pub use database::WalletDatabase;
pub use error::Error;
pub use pay::PaymentOutcome;
pub use scan::ScanOutcome;
pub use wallet::Wallet;
