//! Silent-payment discovery by scanning the mint's spent-secret feed (§4.F)
// New to this core; the restore-then-checkstate shape mirrors
// `examples/cashubtc-cdk/crates/cdk/src/wallet.rs`'s own `restore`/`check_all_pending_proofs`
// pair, generalized to probe deterministically-derived candidates instead of
// a locally-known counter range.

use std::collections::HashMap;

use cashu::{Amount, BlindedMessage, Id, OutputData, Proof, Proofs, PublicKey, SilentKeys};
use tracing::instrument;

use crate::client::{MintClient, ProofState};
use crate::error::Error;
use crate::pay::random_outputs_for_amount;

const HEX_KEY_LEN: usize = 66;

/// The outcome of one scan pass.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Proofs claimed this pass, re-blinded so their secrets no longer link
    /// to the sender
    pub claimed_proofs: Proofs,
    /// How many ephemeral candidates in the input list were valid, on-curve
    /// public keys (diagnostic only — most will belong to other wallets)
    pub candidates_probed: usize,
}

/// §4.F step 1-2: keep only spent-secret-feed entries that look like a
/// compressed secp256k1 public key. Malformed or off-curve entries are
/// silently ignored (`InvalidCandidate`, per §7, is never propagated).
fn filter_candidates(spent_secrets: &[String]) -> Vec<PublicKey> {
    spent_secrets
        .iter()
        .filter(|s| s.len() == HEX_KEY_LEN)
        .filter_map(|s| PublicKey::from_hex(s).ok())
        .collect()
}

/// §4.F step 4: candidate `OutputData` for one ephemeral key, `k = 0..K`,
/// with the currently active keyset id and a placeholder amount.
fn enumerate_candidates(
    keyset_id: Id,
    shared_secret: &[u8; 33],
    spend_pub: &PublicKey,
) -> Result<Vec<OutputData>, Error> {
    Ok(cashu::silent::candidate_outputs(
        keyset_id,
        shared_secret,
        spend_pub,
    )?)
}

/// §4.F steps 5-6: restore whatever the mint recognises out of `candidates`,
/// unblind against the active keyset, then keep only proofs still `UNSPENT`.
async fn restore_and_verify(
    client: &dyn MintClient,
    mint_url: &str,
    keyset_id: Id,
    candidates: Vec<OutputData>,
) -> Result<Proofs, Error> {
    let by_blinded_secret: HashMap<PublicKey, &OutputData> = candidates
        .iter()
        .map(|c| (c.blinded_message.blinded_secret, c))
        .collect();

    let requested: Vec<BlindedMessage> = candidates.iter().map(|c| c.blinded_message.clone()).collect();
    let response = client.restore(mint_url, requested).await?;
    if response.outputs.is_empty() {
        return Ok(vec![]);
    }

    let keyset = client.get_keys(mint_url, keyset_id).await?;

    let restored: Proofs = response
        .outputs
        .iter()
        .zip(response.signatures.iter())
        .filter_map(|(output, signature)| by_blinded_secret.get(&output.blinded_secret).map(|od| (*od, signature)))
        .map(|(output_data, signature)| {
            let mint_pubkey = keyset
                .amount_key(signature.amount)
                .ok_or(Error::RestoreMismatch)?;
            Ok(output_data.unblind(signature, &mint_pubkey)?)
        })
        .collect::<Result<Proofs, Error>>()?;

    if restored.is_empty() {
        return Ok(vec![]);
    }

    let ys: Vec<PublicKey> = restored
        .iter()
        .map(|p| p.y())
        .collect::<Result<_, cashu::Error>>()?;
    let states = client.check_states(mint_url, ys.clone()).await?;
    let unspent: std::collections::HashSet<PublicKey> = states
        .iter()
        .filter(|s| s.state == ProofState::Unspent)
        .map(|s| s.y)
        .collect();

    Ok(restored
        .into_iter()
        .zip(ys)
        .filter(|(_, y)| unspent.contains(y))
        .map(|(proof, _)| proof)
        .collect())
}

/// Claim phase: swap all restored proofs to fresh, randomly-blinded outputs
/// so their secrets no longer deterministically link to the sender.
async fn claim(
    client: &dyn MintClient,
    mint_url: &str,
    keyset_id: Id,
    restored: Proofs,
) -> Result<Proofs, Error> {
    if restored.is_empty() {
        return Ok(vec![]);
    }

    let total = cashu::proof::total_amount(&restored)?;
    let outputs = random_outputs_for_amount(total, keyset_id)?;
    let blinded_messages: Vec<BlindedMessage> = outputs.iter().map(|o| o.blinded_message.clone()).collect();

    let signatures = client.swap(mint_url, restored, blinded_messages).await?;
    let keyset = client.get_keys(mint_url, keyset_id).await?;

    outputs
        .iter()
        .zip(signatures.iter())
        .map(|(output, signature)| {
            let mint_pubkey = keyset
                .amount_key(signature.amount)
                .ok_or(Error::RestoreMismatch)?;
            Ok(output.unblind(signature, &mint_pubkey)?)
        })
        .collect()
}

/// Run one scan pass: for every candidate ephemeral key in `spent_secrets`,
/// derive the shared secret via `scan_priv`, probe `K` candidate outputs, and
/// restore+verify whatever the mint recognises (§4.F). Discovered proofs are
/// then claimed (re-blinded) in one batch swap.
///
/// Idempotent: a second scan over the same feed restores the same candidates,
/// but since their secrets were already swapped away by the previous claim,
/// `check_states` now reports them `SPENT` and they are filtered out (§4.F
/// Idempotency; Invariant 5).
#[instrument(skip(client, silent_keys, spent_secrets), fields(mint_url = %mint_url))]
pub async fn run_scan(
    client: &dyn MintClient,
    mint_url: &str,
    keyset_id: Id,
    silent_keys: &SilentKeys,
    spent_secrets: Vec<String>,
) -> Result<ScanOutcome, Error> {
    let candidates = filter_candidates(&spent_secrets);
    let mut restored_total: Proofs = Vec::new();

    for ephemeral_pub in &candidates {
        let shared_secret = cashu::primitives::ecdh(&silent_keys.scan_priv, ephemeral_pub)?;
        let candidate_outputs =
            enumerate_candidates(keyset_id, &shared_secret, &silent_keys.spend_pub())?;
        let mut restored =
            restore_and_verify(client, mint_url, keyset_id, candidate_outputs).await?;
        restored_total.append(&mut restored);
    }

    let claimed_proofs = claim(client, mint_url, keyset_id, restored_total).await?;

    Ok(ScanOutcome {
        claimed_proofs,
        candidates_probed: candidates.len(),
    })
}
