//! Adapter over the external Cashu mint HTTP API
// `join_url` and the one-method-per-endpoint shape are ported verbatim from
// crates/cdk/src/client.rs; that file's dozen Lightning/melt/mint endpoints
// are dropped since this core never touches quote payment, leaving exactly
// the NUT endpoints §4.D/§6 name plus the non-standard spent-secret feed.

use std::collections::BTreeMap;

use async_trait::async_trait;
use cashu::{BlindedMessage, BlindedSignature, Id, Proof, PublicKey};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::error::Error;

/// A mint's published keyset summary (NUT-02)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysetInfo {
    /// Keyset id
    pub id: Id,
    /// Currency unit this keyset is denominated in
    pub unit: String,
    /// Whether the mint is still issuing signatures under this keyset
    pub active: bool,
    /// Per-thousand input fee, if the mint charges one
    #[serde(default)]
    pub input_fee_ppk: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct KeysetsResponse {
    keysets: Vec<KeysetInfo>,
}

/// A keyset's amount-indexed public keys (NUT-01)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyset {
    /// Keyset id
    pub id: Id,
    /// Currency unit
    pub unit: String,
    /// `amount -> mint public key for that denomination`. Plain `u64` keys,
    /// not `Amount`, because JSON object keys must serialize as strings and
    /// `u64` round-trips that way for free.
    pub keys: BTreeMap<u64, PublicKey>,
}

impl Keyset {
    /// Look up the mint's public key for a denomination
    pub fn amount_key(&self, amount: cashu::Amount) -> Option<PublicKey> {
        self.keys.get(&amount.to_u64()).copied()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct KeysResponse {
    keysets: Vec<Keyset>,
}

/// Opaque mint metadata (NUT-06); this core only caches and forwards it
pub type MintInfo = serde_json::Value;

/// Body of `POST /v1/restore`
#[derive(Debug, Clone, Serialize)]
pub struct RestoreRequest {
    /// Candidate outputs to probe
    pub outputs: Vec<BlindedMessage>,
}

/// Response to `POST /v1/restore`: only outputs the mint recognises
#[derive(Debug, Clone, Deserialize)]
pub struct RestoreResponse {
    /// The subset of submitted outputs the mint has a signature for
    pub outputs: Vec<BlindedMessage>,
    /// Signatures, paired with `outputs` by identical `B_`
    pub signatures: Vec<BlindedSignature>,
}

/// Spendability state of a proof (NUT-07)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProofState {
    /// Never spent
    Unspent,
    /// Already redeemed
    Spent,
    /// Reserved by an in-flight transaction
    Pending,
}

#[derive(Debug, Clone, Serialize)]
struct CheckStateRequest {
    #[serde(rename = "Ys")]
    ys: Vec<PublicKey>,
}

/// One entry of a `POST /v1/checkstate` response
#[derive(Debug, Clone, Deserialize)]
pub struct CheckStateEntry {
    /// `Y = hash_to_curve(secret)`
    #[serde(rename = "Y")]
    pub y: PublicKey,
    /// Current state
    pub state: ProofState,
}

#[derive(Debug, Clone, Deserialize)]
struct CheckStateResponse {
    states: Vec<CheckStateEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct SpentSecretsResponse {
    secrets: Vec<String>,
}

/// Body and response of `POST /v1/swap`
#[derive(Debug, Clone, Serialize)]
pub struct SwapRequest {
    /// Proofs being spent
    pub inputs: Vec<Proof>,
    /// Requested new outputs
    pub outputs: Vec<BlindedMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwapResponse {
    /// Signatures on `outputs`, in the same order
    pub signatures: Vec<BlindedSignature>,
}

/// What the pay and scan engines need from an external Cashu mint.
///
/// Expressed as a trait so `pay`/`scan` can be exercised against a fake in
/// unit tests instead of a live `reqwest` client.
#[async_trait]
pub trait MintClient: Send + Sync {
    /// `GET /v1/keysets`
    async fn get_keysets(&self, mint_url: &str) -> Result<Vec<KeysetInfo>, Error>;
    /// `GET /v1/keys/{id}`
    async fn get_keys(&self, mint_url: &str, id: Id) -> Result<Keyset, Error>;
    /// `GET /v1/info`
    async fn get_info(&self, mint_url: &str) -> Result<MintInfo, Error>;
    /// `POST /v1/restore`
    async fn restore(&self, mint_url: &str, outputs: Vec<BlindedMessage>) -> Result<RestoreResponse, Error>;
    /// `POST /v1/checkstate`
    async fn check_states(&self, mint_url: &str, ys: Vec<PublicKey>) -> Result<Vec<CheckStateEntry>, Error>;
    /// `POST /v1/swap`
    async fn swap(
        &self,
        mint_url: &str,
        inputs: Vec<Proof>,
        outputs: Vec<BlindedMessage>,
    ) -> Result<Vec<BlindedSignature>, Error>;
    /// `GET /v1/spent-secrets` — non-standard; the privacy-critical feed scan
    /// discovery depends on.
    async fn fetch_spent_secrets(&self, mint_url: &str) -> Result<Vec<String>, Error>;
}

fn join_url(mint_url: &str, paths: &[&str]) -> Result<Url, Error> {
    let mut url = Url::parse(mint_url).map_err(|e| Error::MintUnavailable(e.to_string()))?;
    for path in paths {
        if !url.path().ends_with('/') {
            url.path_segments_mut()
                .map_err(|_| Error::MintUnavailable("mint url cannot be a base".into()))?
                .push(path);
        } else {
            url.path_segments_mut()
                .map_err(|_| Error::MintUnavailable("mint url cannot be a base".into()))?
                .pop()
                .push(path);
        }
    }
    Ok(url)
}

/// `reqwest`-backed implementation of [`MintClient`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Construct a client with `reqwest`'s default configuration
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl MintClient for HttpClient {
    #[instrument(skip(self), fields(mint_url = %mint_url))]
    async fn get_keysets(&self, mint_url: &str) -> Result<Vec<KeysetInfo>, Error> {
        let url = join_url(mint_url, &["v1", "keysets"])?;
        let res: KeysetsResponse = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| Error::MintUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::MintUnavailable(e.to_string()))?;
        Ok(res.keysets)
    }

    #[instrument(skip(self), fields(mint_url = %mint_url))]
    async fn get_keys(&self, mint_url: &str, id: Id) -> Result<Keyset, Error> {
        let url = join_url(mint_url, &["v1", "keys", &id.to_string()])?;
        let mut res: KeysResponse = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| Error::MintUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::MintUnavailable(e.to_string()))?;
        res.keysets
            .pop()
            .ok_or_else(|| Error::MintUnavailable("mint returned no keyset".into()))
    }

    #[instrument(skip(self), fields(mint_url = %mint_url))]
    async fn get_info(&self, mint_url: &str) -> Result<MintInfo, Error> {
        let url = join_url(mint_url, &["v1", "info"])?;
        self.inner
            .get(url)
            .send()
            .await
            .map_err(|e| Error::MintUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::MintUnavailable(e.to_string()))
    }

    #[instrument(skip(self, outputs), fields(mint_url = %mint_url))]
    async fn restore(&self, mint_url: &str, outputs: Vec<BlindedMessage>) -> Result<RestoreResponse, Error> {
        let url = join_url(mint_url, &["v1", "restore"])?;
        let request = RestoreRequest { outputs };
        self.inner
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::MintUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::MintUnavailable(e.to_string()))
    }

    #[instrument(skip(self, ys), fields(mint_url = %mint_url))]
    async fn check_states(&self, mint_url: &str, ys: Vec<PublicKey>) -> Result<Vec<CheckStateEntry>, Error> {
        let url = join_url(mint_url, &["v1", "checkstate"])?;
        let request = CheckStateRequest { ys };
        let res: CheckStateResponse = self
            .inner
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::MintUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::MintUnavailable(e.to_string()))?;
        Ok(res.states)
    }

    #[instrument(skip(self, inputs, outputs), fields(mint_url = %mint_url))]
    async fn swap(
        &self,
        mint_url: &str,
        inputs: Vec<Proof>,
        outputs: Vec<BlindedMessage>,
    ) -> Result<Vec<BlindedSignature>, Error> {
        let url = join_url(mint_url, &["v1", "swap"])?;
        let request = SwapRequest { inputs, outputs };
        let res: SwapResponse = self
            .inner
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::MintUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::MintUnavailable(e.to_string()))?;
        Ok(res.signatures)
    }

    #[instrument(skip(self), fields(mint_url = %mint_url))]
    async fn fetch_spent_secrets(&self, mint_url: &str) -> Result<Vec<String>, Error> {
        let url = join_url(mint_url, &["v1", "spent-secrets"])?;
        let res: SpentSecretsResponse = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| Error::MintUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::MintUnavailable(e.to_string()))?;
        Ok(res.secrets)
    }
}
