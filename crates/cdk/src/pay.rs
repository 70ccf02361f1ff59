//! Two-phase silent payment send (§4.E)
// New to this core (the teacher has no silent-payment concept), but the
// swap-then-unblind shape is lifted from `examples/cashubtc-cdk/crates/cdk/src/wallet.rs`'s
// `send`/`swap` pair: build `BlindedMessage`s, call the mint, unblind the
// returned signatures against the `OutputData` that produced each request.

use cashu::{
    Amount, BlindedMessage, CashuAddress, Id, OutputData, Proof, Proofs, Secret, SecretKey,
};
use tracing::instrument;

use crate::client::MintClient;
use crate::error::Error;

/// The result of a completed silent payment send.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    /// Proofs Bob can discover by scanning, derived from his silent-payment
    /// address
    pub bob_proofs: Proofs,
    /// Alice's change, from ordinary random blinding
    pub alice_change: Proofs,
    /// The secret of the signal proof — Alice's ephemeral public key, hex
    /// encoded. Its appearance in the mint's spent-secret feed is how Bob
    /// discovers this payment.
    pub spent_secret: String,
    /// The exact input proofs that were consumed, for the caller to remove
    /// from local storage
    pub spent_inputs: Proofs,
}

/// Request the mint's standard denomination split for `amount`, tagged with
/// the ordinary random-blinding `OutputData` the wallet already uses for
/// change.
pub(crate) fn random_outputs_for_amount(amount: Amount, keyset_id: Id) -> Result<Vec<OutputData>, Error> {
    amount
        .split()
        .into_iter()
        .map(|denomination| {
            let secret = Secret::generate();
            let (blinded_secret, r) = cashu::primitives::blind_message(secret.as_bytes(), None)?;
            Ok(OutputData {
                blinded_message: BlindedMessage::new(denomination, keyset_id, blinded_secret),
                blinding_factor: r,
                secret,
            })
        })
        .collect()
}

async fn unblind_all(
    client: &dyn MintClient,
    mint_url: &str,
    keyset_id: Id,
    outputs: &[OutputData],
    signatures: Vec<cashu::BlindedSignature>,
) -> Result<Proofs, Error> {
    if outputs.len() != signatures.len() {
        return Err(Error::RestoreMismatch);
    }
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

/// Step 1: publish a one-time ephemeral public key as the secret of a
/// "signal" proof. The blinding factor is fresh random, not derived — Alice
/// does not need to rediscover it (§9 Design Notes, Open Question).
async fn emit_signal_proof(
    client: &dyn MintClient,
    mint_url: &str,
    keyset_id: Id,
    inputs: Proofs,
    total: Amount,
    ephemeral_pub_hex: &str,
) -> Result<Proof, Error> {
    let secret = Secret::from(ephemeral_pub_hex.to_string());
    let (blinded_secret, r) = cashu::primitives::blind_message(secret.as_bytes(), None)?;
    let output = OutputData {
        blinded_message: BlindedMessage::new(total, keyset_id, blinded_secret),
        blinding_factor: r,
        secret,
    };

    let signatures = client
        .swap(mint_url, inputs, vec![output.blinded_message.clone()])
        .await?;
    let mut proofs = unblind_all(client, mint_url, keyset_id, &[output], signatures).await?;
    proofs.pop().ok_or(Error::RestoreMismatch)
}

/// Step 2: consume the signal proof to emit Bob's silent outputs (ascending
/// denomination order, `k = 0, 1, 2, …`) plus Alice's change (ordinary random
/// blinding).
async fn emit_silent_outputs(
    client: &dyn MintClient,
    mint_url: &str,
    keyset_id: Id,
    signal_proof: Proof,
    shared_secret: &[u8; 33],
    spend_pub: &cashu::PublicKey,
    bob_amount: Amount,
    change_amount: Amount,
) -> Result<(Proofs, Proofs), Error> {
    let bob_outputs: Vec<OutputData> = bob_amount
        .split()
        .into_iter()
        .enumerate()
        .map(|(k, denomination)| {
            let k: u8 = k.try_into().map_err(|_| Error::RestoreMismatch)?;
            Ok(cashu::silent::create_silent_output(
                denomination,
                keyset_id,
                shared_secret,
                spend_pub,
                k,
            )?)
        })
        .collect::<Result<_, Error>>()?;

    let change_outputs = random_outputs_for_amount(change_amount, keyset_id)?;

    let mut blinded_messages: Vec<BlindedMessage> = bob_outputs
        .iter()
        .chain(change_outputs.iter())
        .map(|o| o.blinded_message.clone())
        .collect();
    blinded_messages.sort_by_key(|m| m.amount);

    // the mint signs in submission order; reorder our outputs to match so
    // `unblind_all`'s positional zip lines up with the returned signatures
    let mut all_outputs = bob_outputs.clone();
    all_outputs.extend(change_outputs.clone());
    all_outputs.sort_by_key(|o| o.blinded_message.amount);

    let signatures = client
        .swap(mint_url, vec![signal_proof], blinded_messages)
        .await?;
    let all_proofs = unblind_all(client, mint_url, keyset_id, &all_outputs, signatures).await?;

    let bob_secrets: std::collections::HashSet<_> =
        bob_outputs.iter().map(|o| o.secret.clone()).collect();
    let (bob_proofs, alice_change): (Proofs, Proofs) = all_proofs
        .into_iter()
        .partition(|p| bob_secrets.contains(&p.secret));

    Ok((bob_proofs, alice_change))
}

/// Send a silent payment of `amount` to `address`, spending `input_proofs`
/// (whose sum must be `>= amount`).
///
/// Ordering: (signal swap) then (silent swap). If the silent swap fails after
/// the signal swap has already committed, the signal proof is orphaned but
/// recoverable — its secret is `spent_secret`, known to the caller, so a
/// later re-swap is possible. This edge case is surfaced, not auto-recovered
/// (§4.E Failures).
#[instrument(skip(client, input_proofs, ephemeral_priv), fields(mint_url = %mint_url, amount = %amount))]
pub async fn send_silent_payment(
    client: &dyn MintClient,
    mint_url: &str,
    keyset_id: Id,
    input_proofs: Proofs,
    address: &CashuAddress,
    amount: Amount,
    ephemeral_priv: SecretKey,
) -> Result<PaymentOutcome, Error> {
    if address.mint_url != mint_url {
        return Err(Error::CrossMint);
    }

    let total = cashu::proof::total_amount(&input_proofs)?;
    if total < amount {
        return Err(Error::InsufficientBalance);
    }

    let ephemeral_pub = ephemeral_priv.public_key();
    let ephemeral_pub_hex = ephemeral_pub.to_hex();

    let signal_proof = emit_signal_proof(
        client,
        mint_url,
        keyset_id,
        input_proofs.clone(),
        total,
        &ephemeral_pub_hex,
    )
    .await?;

    let shared_secret = cashu::primitives::ecdh(&ephemeral_priv, &address.scan_pub)?;
    let change_amount = total.checked_sub(amount)?;

    let (bob_proofs, alice_change) = emit_silent_outputs(
        client,
        mint_url,
        keyset_id,
        signal_proof,
        &shared_secret,
        &address.spend_pub,
        amount,
        change_amount,
    )
    .await?;

    Ok(PaymentOutcome {
        bob_proofs,
        alice_change,
        spent_secret: ephemeral_pub_hex,
        spent_inputs: input_proofs,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use cashu::{BlindedSignature, PublicKey};

    use super::*;
    use crate::client::{CheckStateEntry, Keyset, KeysetInfo, MintInfo, RestoreResponse};

    struct FakeMint {
        secret_key: cashu::SecretKey,
        keyset_id: Id,
    }

    impl FakeMint {
        fn new() -> Self {
            Self {
                secret_key: cashu::SecretKey::generate(),
                keyset_id: Id::from_base64("AQIDBAUGBwgJ").expect("valid id"),
            }
        }

        fn sign(&self, outputs: &[BlindedMessage]) -> Vec<BlindedSignature> {
            outputs
                .iter()
                .map(|o| BlindedSignature {
                    amount: o.amount,
                    keyset_id: o.keyset_id,
                    c: cashu::primitives::point_mul(&o.blinded_secret, &self.secret_key.to_scalar())
                        .expect("mint sign"),
                })
                .collect()
        }
    }

    #[async_trait]
    impl MintClient for FakeMint {
        async fn get_keysets(&self, _mint_url: &str) -> Result<Vec<KeysetInfo>, Error> {
            Ok(vec![])
        }

        async fn get_keys(&self, _mint_url: &str, _id: Id) -> Result<Keyset, Error> {
            let mut keys = HashMap::new();
            for bit in 0..32 {
                keys.insert(1_u64 << bit, self.secret_key.public_key());
            }
            Ok(Keyset {
                id: self.keyset_id,
                unit: "sat".into(),
                keys,
            })
        }

        async fn get_info(&self, _mint_url: &str) -> Result<MintInfo, Error> {
            Ok(serde_json::json!({}))
        }

        async fn restore(
            &self,
            _mint_url: &str,
            _outputs: Vec<BlindedMessage>,
        ) -> Result<RestoreResponse, Error> {
            Ok(RestoreResponse {
                outputs: vec![],
                signatures: vec![],
            })
        }

        async fn check_states(
            &self,
            _mint_url: &str,
            _ys: Vec<PublicKey>,
        ) -> Result<Vec<CheckStateEntry>, Error> {
            Ok(vec![])
        }

        async fn swap(
            &self,
            _mint_url: &str,
            _inputs: Proofs,
            outputs: Vec<BlindedMessage>,
        ) -> Result<Vec<BlindedSignature>, Error> {
            Ok(self.sign(&outputs))
        }

        async fn fetch_spent_secrets(&self, _mint_url: &str) -> Result<Vec<String>, Error> {
            Ok(vec![])
        }
    }

    fn fake_input(keyset_id: Id, amount: Amount) -> Proof {
        Proof::new(
            amount,
            keyset_id,
            Secret::generate(),
            cashu::SecretKey::generate().public_key(),
        )
    }

    #[tokio::test]
    async fn full_payment_round_trip_sums_to_requested_amount() {
        let mint = FakeMint::new();
        let mint_url = "http://mint.example";
        let bob_keys = cashu::identity::SilentKeys::generate();
        let address = bob_keys.address(mint_url);

        let inputs = vec![fake_input(mint.keyset_id, Amount::from(1000))];
        let ephemeral = cashu::SecretKey::generate();

        let outcome = send_silent_payment(
            &mint,
            mint_url,
            mint.keyset_id,
            inputs,
            &address,
            Amount::from(100),
            ephemeral,
        )
        .await
        .expect("payment succeeds");

        let bob_total = cashu::proof::total_amount(&outcome.bob_proofs).expect("sum");
        let change_total = cashu::proof::total_amount(&outcome.alice_change).expect("sum");
        assert_eq!(bob_total, Amount::from(100));
        assert_eq!(change_total, Amount::from(900));
    }

    #[tokio::test]
    async fn cross_mint_is_rejected() {
        let mint = FakeMint::new();
        let bob_keys = cashu::identity::SilentKeys::generate();
        let address = bob_keys.address("http://other.example");

        let inputs = vec![fake_input(mint.keyset_id, Amount::from(1000))];
        let ephemeral = cashu::SecretKey::generate();

        let result = send_silent_payment(
            &mint,
            "http://mint.example",
            mint.keyset_id,
            inputs,
            &address,
            Amount::from(50),
            ephemeral,
        )
        .await;

        assert!(matches!(result, Err(Error::CrossMint)));
    }

    #[tokio::test]
    async fn insufficient_balance_is_rejected() {
        let mint = FakeMint::new();
        let mint_url = "http://mint.example";
        let bob_keys = cashu::identity::SilentKeys::generate();
        let address = bob_keys.address(mint_url);

        let inputs = vec![fake_input(mint.keyset_id, Amount::from(10))];
        let ephemeral = cashu::SecretKey::generate();

        let result = send_silent_payment(
            &mint,
            mint_url,
            mint.keyset_id,
            inputs,
            &address,
            Amount::from(100),
            ephemeral,
        )
        .await;

        assert!(matches!(result, Err(Error::InsufficientBalance)));
    }
}
