//! Silent-payment output derivation (BIP-352-style tweak, adapted to Cashu)
// The tweak/blinder formulas are new — Cashu proofs have no prior precedent
// for this — but are built entirely out of `crate::primitives`' domain-hash
// and ECDH primitives, grounded on `dhke.rs`, generalizing the BIP-352-style
// shared-secret-then-per-index-tweak shape also seen in the silent-payments
// reference material in the example pack.

use k256::Scalar;

use crate::amount::Amount;
use crate::error::Error;
use crate::id::Id;
use crate::keys::{PublicKey, SecretKey};
use crate::primitives::{compress, domain_hash, hash_to_curve, point_add, point_from_scalar, scalar_from_bytes};
use crate::proof::{BlindedMessage, OutputData};
use crate::secret::Secret;

/// Maximum number of silent outputs a scanner will probe for per candidate.
/// A sender emitting more denominations than this produces undiscoverable
/// outputs past the cutoff — a privacy/cost tradeoff, not a protocol error.
pub const MAX_SILENT_OUTPUTS: u8 = 8;

/// `tweak_k = sha256("silent_output" || s || [k])`, reduced mod n
pub fn tweak_k(shared_secret: &[u8; 33], k: u8) -> Result<Scalar, Error> {
    let digest = domain_hash("silent_output", &[shared_secret.as_slice(), &[k][..]]);
    scalar_from_bytes(&digest)
}

/// `tweak_point_k = tweak_k · G`
pub fn tweak_point_k(shared_secret: &[u8; 33], k: u8) -> Result<PublicKey, Error> {
    point_from_scalar(&tweak_k(shared_secret, k)?)
}

/// `output_point_k = spend_pub + tweak_point_k`
pub fn output_point_k(spend_pub: &PublicKey, shared_secret: &[u8; 33], k: u8) -> Result<PublicKey, Error> {
    point_add(spend_pub, &tweak_point_k(shared_secret, k)?)
}

/// `sha256("output" || compress(output_point_k))`, the raw digest backing
/// both the hex-string secret and the blinding factor
fn output_secret_bytes_k(spend_pub: &PublicKey, shared_secret: &[u8; 33], k: u8) -> Result<[u8; 32], Error> {
    let point = output_point_k(spend_pub, shared_secret, k)?;
    Ok(domain_hash("output", &[&compress(&point)[..]]))
}

/// The output secret stored by the mint: a 64-char ASCII hex string, not the
/// raw digest — the client's secret field is string-typed on the wire.
pub fn output_secret_k(spend_pub: &PublicKey, shared_secret: &[u8; 33], k: u8) -> Result<Secret, Error> {
    let bytes = output_secret_bytes_k(spend_pub, shared_secret, k)?;
    Ok(Secret::from(hex::encode(bytes)))
}

/// `blinding_factor_k = int(sha256("blinder" || output_secret_bytes_k || [k])) mod n`
pub fn blinding_factor_k(spend_pub: &PublicKey, shared_secret: &[u8; 33], k: u8) -> Result<SecretKey, Error> {
    let output_secret_bytes = output_secret_bytes_k(spend_pub, shared_secret, k)?;
    let digest = domain_hash("blinder", &[&output_secret_bytes[..], &[k][..]]);
    let scalar = scalar_from_bytes(&digest)?;
    SecretKey::from_slice(scalar.to_bytes().as_slice())
}

/// Deterministically derive the `k`-th silent output. Given only
/// `(shared_secret, spend_pub, k, keyset_id)`, sender and scanner compute
/// bitwise-identical `OutputData` — the property restore-based discovery
/// depends on.
pub fn create_silent_output(
    amount: Amount,
    keyset_id: Id,
    shared_secret: &[u8; 33],
    spend_pub: &PublicKey,
    k: u8,
) -> Result<OutputData, Error> {
    let secret = output_secret_k(spend_pub, shared_secret, k)?;
    let r = blinding_factor_k(spend_pub, shared_secret, k)?;
    let y = hash_to_curve(secret.as_bytes())?;
    let blinded_secret = point_add(&y, &r.public_key())?;

    Ok(OutputData {
        blinded_message: BlindedMessage::new(amount, keyset_id, blinded_secret),
        blinding_factor: r,
        secret,
    })
}

/// Candidate outputs a scanner probes for one ephemeral key, `k = 0..K`,
/// with a placeholder amount (the mint fills the real amount on restore).
pub fn candidate_outputs(
    keyset_id: Id,
    shared_secret: &[u8; 33],
    spend_pub: &PublicKey,
) -> Result<Vec<OutputData>, Error> {
    (0..MAX_SILENT_OUTPUTS)
        .map(|k| create_silent_output(Amount::ZERO, keyset_id, shared_secret, spend_pub, k))
        .collect()
}
