//! Wire records exchanged with the mint: blinded messages/signatures and proofs
// Trimmed from crates/cashu/src/nuts/nut00/mod.rs's `BlindedMessage`,
// `BlindedSignature` and `Proof`: this core never touches P2PK witnesses or
// DLEQ proofs, so those fields are dropped rather than carried as dead
// `Option`s.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::error::Error;
use crate::id::Id;
use crate::keys::{PublicKey, SecretKey};
use crate::primitives::hash_to_curve;
use crate::secret::Secret;

/// A blinded message sent to the mint to request a signature (NUT-00)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindedMessage {
    /// Requested denomination
    pub amount: Amount,
    /// Keyset id the signature should be issued under
    #[serde(rename = "id")]
    pub keyset_id: Id,
    /// The blinded secret message (`B_`)
    #[serde(rename = "B_")]
    pub blinded_secret: PublicKey,
}

impl BlindedMessage {
    /// Construct a new blinded message
    pub fn new(amount: Amount, keyset_id: Id, blinded_secret: PublicKey) -> Self {
        Self {
            amount,
            keyset_id,
            blinded_secret,
        }
    }
}

/// The mint's blind signature on a `BlindedMessage` (NUT-00)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindedSignature {
    /// Denomination signed
    pub amount: Amount,
    /// Keyset id the signature was issued under
    #[serde(rename = "id")]
    pub keyset_id: Id,
    /// The blinded signature (`C_`)
    #[serde(rename = "C_")]
    pub c: PublicKey,
}

/// An unblinded proof of value, spendable at the mint that issued it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Denomination
    pub amount: Amount,
    /// Keyset id
    #[serde(rename = "id")]
    pub keyset_id: Id,
    /// Secret message bound by the mint's signature
    pub secret: Secret,
    /// Unblinded signature
    #[serde(rename = "C")]
    pub c: PublicKey,
}

impl Proof {
    /// Construct a new proof
    pub fn new(amount: Amount, keyset_id: Id, secret: Secret, c: PublicKey) -> Self {
        Self {
            amount,
            keyset_id,
            secret,
            c,
        }
    }

    /// `Y = hash_to_curve(secret)`, the canonical point identifying this
    /// proof for mint state queries
    pub fn y(&self) -> Result<PublicKey, Error> {
        hash_to_curve(self.secret.as_bytes())
    }
}

/// A set of proofs, as exchanged with the mint and stored locally
pub type Proofs = Vec<Proof>;

/// Sum the amounts of a proof set
pub fn total_amount(proofs: &Proofs) -> Result<Amount, Error> {
    Amount::try_sum(proofs.iter().map(|p| p.amount))
}

/// The client-side construction record behind a single requested output.
/// Deterministic for silent outputs, random otherwise; retaining it lets a
/// wallet reconstruct (and therefore restore) a proof it has not yet received
/// a signature for.
#[derive(Debug, Clone)]
pub struct OutputData {
    /// The message sent to the mint
    pub blinded_message: BlindedMessage,
    /// The blinding factor used, needed to unblind the mint's signature
    pub blinding_factor: SecretKey,
    /// The secret bound into the eventual proof
    pub secret: Secret,
}

impl OutputData {
    /// Unblind a signature returned by the mint into a spendable proof
    pub fn unblind(&self, signature: &BlindedSignature, mint_pubkey: &PublicKey) -> Result<Proof, Error> {
        let c = crate::primitives::unblind_message(&signature.c, &self.blinding_factor, mint_pubkey)?;
        Ok(Proof::new(
            signature.amount,
            signature.keyset_id,
            self.secret.clone(),
            c,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_amount_sums_proofs() {
        let keyset_id = Id::from_base64("AQIDBAUGBwgJ").expect("valid id");
        let sk = SecretKey::generate();
        let proofs = vec![
            Proof::new(Amount::from(4), keyset_id, Secret::generate(), sk.public_key()),
            Proof::new(Amount::from(8), keyset_id, Secret::generate(), sk.public_key()),
        ];
        assert_eq!(total_amount(&proofs).expect("sums"), Amount::from(12));
    }
}
