//! Persistent store contract (§4.C Proof Store)
// Modeled on examples/cashubtc-cdk/crates/cdk-common/src/database/wallet/mod.rs's `Database` trait
// shape: `#[async_trait]`, an associated `Err: Into<Error> + From<Error>`, one
// method per operation. Trimmed to exactly the operations §4.C names plus the
// keyset/key/mint-quote caching the pay and scan engines need to function —
// no transactions, no KV store, no per-unit/per-mint filtering, since this
// core is single-mint and single-writer by design.

use async_trait::async_trait;
use cashu::{Proof, SecretKey};
use serde::{Deserialize, Serialize};

use crate::client::{Keyset, KeysetInfo};
use crate::error::Error;

/// Bookkeeping for an outstanding Lightning mint quote. Quote *payment* is an
/// external collaborator (§1 Out of scope), but the wallet still needs to
/// remember which quotes it has asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintQuote {
    /// Quote id assigned by the mint
    pub id: String,
    /// Requested amount
    pub amount: cashu::Amount,
    /// Whether the mint has confirmed payment
    pub paid: bool,
    /// Unix timestamp the quote expires at
    pub expiry: u64,
}

/// Cached per-mint metadata (§3 `CachedMintMetadata`), TTL-gated on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedMintMetadata {
    /// `GET /v1/keysets` response
    pub keysets: Vec<KeysetInfo>,
    /// `GET /v1/keys/{id}` responses, one per keyset
    pub keys: Vec<Keyset>,
    /// `GET /v1/info` response
    pub info: serde_json::Value,
    /// Unix timestamp this snapshot was cached at
    pub cached_at: u64,
}

/// How long a cached mint metadata snapshot stays valid before a read must
/// refetch it (§3: "TTL = 1 hour").
pub const MINT_METADATA_TTL_SECS: u64 = 3600;

/// What the pay and scan engines, and the wallet façade, need from local
/// persistence (§4.C). Expressed as a trait so tests can run against a
/// `:memory:` SQLite database without a filesystem.
#[async_trait]
pub trait WalletDatabase: std::fmt::Debug + Send + Sync {
    /// Store-specific error, convertible to the façade's [`Error`]
    type Err: Into<Error> + From<Error> + std::fmt::Debug;

    /// Sum of `amount` over all stored proofs; zero if empty
    async fn get_balance(&self) -> Result<cashu::Amount, Self::Err>;
    /// Upsert proofs by `secret`; duplicates replace
    async fn add_proofs(&self, proofs: &[Proof]) -> Result<(), Self::Err>;
    /// Delete proofs by secret; silent if none match
    async fn remove_proofs(&self, secrets: &[cashu::Secret]) -> Result<(), Self::Err>;
    /// All stored proofs, order unspecified but stable within a call
    async fn list_proofs(&self) -> Result<Vec<Proof>, Self::Err>;

    /// Bob's persisted silent-payment identity, if generated yet
    async fn get_silent_keys(&self) -> Result<Option<(SecretKey, SecretKey)>, Self::Err>;
    /// Upsert Bob's silent-payment identity (`scan_priv`, `spend_priv`)
    async fn save_silent_keys(&self, scan_priv: &SecretKey, spend_priv: &SecretKey) -> Result<(), Self::Err>;

    /// Cached mint metadata for `mint_url`, iff `now - cached_at < 1h`
    async fn get_cached_mint_meta(&self, mint_url: &str) -> Result<Option<CachedMintMetadata>, Self::Err>;
    /// Replace the cached keysets/keys/info for `mint_url`
    async fn cache_mint_meta(&self, mint_url: &str, meta: CachedMintMetadata) -> Result<(), Self::Err>;

    /// Record an outstanding mint quote
    async fn add_mint_quote(&self, quote: &MintQuote) -> Result<(), Self::Err>;
    /// Look up a previously recorded mint quote
    async fn get_mint_quote(&self, id: &str) -> Result<Option<MintQuote>, Self::Err>;
}
