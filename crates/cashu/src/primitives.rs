//! Curve and hash primitives shared by blinding and silent-output derivation
// `hash_to_curve` and `blind_message` are grounded byte-for-byte on
// crates/cashu/src/dhke.rs, which already reaches for `k256` for this exact
// class of scalar/point arithmetic (`k256::Scalar`, `k256::ProjectivePoint`).
// `scalar_from_bytes` uses `k256::Scalar`'s `Reduce<U256>` impl for genuine
// modular reduction, rather than rejection sampling, per the mod-n reduction
// the derivation formulas require.

use bitcoin::hashes::{sha256, Hash};
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::Field;
use k256::{ProjectivePoint, Scalar, U256};

use crate::error::Error;
use crate::keys::{PublicKey, SecretKey};

const DOMAIN_SEPARATOR: &[u8; 28] = b"Secp256k1_HashToCurve_Cashu_";

/// `hash_to_curve`'s outer retry bound. SHA-256 over a curve-valid x-coordinate
/// succeeds within a handful of iterations with overwhelming probability; a
/// run past this bound means something is structurally wrong with the input.
const HASH_TO_CURVE_MAX_COUNTER: u32 = 1 << 16;

/// SHA-256 of `data`
pub fn sha256_hash(data: &[u8]) -> [u8; 32] {
    sha256::Hash::hash(data).to_byte_array()
}

/// `sha256(utf8(tag) || parts[0] || parts[1] || …)`, the domain-separated
/// hash every derivation formula in `crate::silent` is built from.
pub fn domain_hash(tag: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut buf = Vec::with_capacity(tag.len() + parts.iter().map(|p| p.len()).sum::<usize>());
    buf.extend_from_slice(tag.as_bytes());
    for part in parts {
        buf.extend_from_slice(part);
    }
    sha256_hash(&buf)
}

/// Reduce 32 bytes modulo the secp256k1 group order, rejecting the all-zero
/// scalar (never a valid tweak or blinding factor).
pub fn scalar_from_bytes(bytes: &[u8; 32]) -> Result<Scalar, Error> {
    let scalar = Scalar::reduce(U256::from_be_slice(bytes));
    if scalar == Scalar::ZERO {
        return Err(Error::ZeroScalar);
    }
    Ok(scalar)
}

/// `scalar · G`, as a compressed public key
pub fn point_from_scalar(scalar: &Scalar) -> Result<PublicKey, Error> {
    let nonzero: Option<k256::NonZeroScalar> = k256::NonZeroScalar::new(*scalar).into();
    let nonzero = nonzero.ok_or(Error::ZeroScalar)?;
    Ok(k256::PublicKey::from_secret_scalar(&nonzero).into())
}

/// `point_a + point_b`
pub fn point_add(a: &PublicKey, b: &PublicKey) -> Result<PublicKey, Error> {
    let sum = ProjectivePoint::from(k256::PublicKey::from(*a))
        + ProjectivePoint::from(k256::PublicKey::from(*b));
    compress_point(&sum)
}

/// `scalar · point`
pub fn point_mul(point: &PublicKey, scalar: &Scalar) -> Result<PublicKey, Error> {
    let product = ProjectivePoint::from(k256::PublicKey::from(*point)) * scalar;
    compress_point(&product)
}

fn compress_point(point: &ProjectivePoint) -> Result<PublicKey, Error> {
    let affine = point.to_affine();
    let encoded = affine.to_encoded_point(true);
    PublicKey::from_slice(encoded.as_bytes())
}

/// 33-byte SEC1 compressed form of a point
pub fn compress(point: &PublicKey) -> [u8; 33] {
    point.to_bytes()
}

/// Parse a 33-byte SEC1 compressed point
pub fn decompress(bytes: &[u8]) -> Result<PublicKey, Error> {
    PublicKey::from_slice(bytes)
}

/// ECDH shared secret as the 33-byte compressed form of `priv · pub`, not the
/// x-only serialization — sender and scanner must agree on compressed form
/// for the domain-separated hashes downstream to match.
pub fn ecdh(priv_key: &SecretKey, pub_key: &PublicKey) -> Result<[u8; 33], Error> {
    let shared = ProjectivePoint::from(k256::PublicKey::from(*pub_key)) * priv_key.to_scalar();
    Ok(compress(&compress_point(&shared)?))
}

/// Hash an arbitrary secret to a curve point, matching the mint's own
/// Y-coordinate derivation bit-for-bit: `02 || sha256(DOMAIN || secret || n)`
/// is retried with the previous digest (and no secret) on decompression
/// failure, where `n` is the ASCII decimal counter.
pub fn hash_to_curve(secret: &[u8]) -> Result<PublicKey, Error> {
    let mut msg_to_hash = [DOMAIN_SEPARATOR.as_slice(), secret].concat();
    let mut counter: u32 = 0;

    loop {
        let hash = sha256::Hash::hash(&[msg_to_hash, counter.to_string().into_bytes()].concat());
        let candidate = [&[0x02u8][..], hash.as_ref()].concat();
        if let Ok(point) = PublicKey::from_slice(&candidate) {
            return Ok(point);
        }
        counter += 1;
        if counter >= HASH_TO_CURVE_MAX_COUNTER {
            return Err(Error::HashToCurveExhausted);
        }
        msg_to_hash = hash.to_byte_array().to_vec();
    }
}

/// Blind a message: `B_ = hash_to_curve(secret) + r·G`. `r` is supplied
/// deterministically for silent outputs, or drawn at random for ordinary
/// wallet-side blinding.
pub fn blind_message(
    secret: &[u8],
    blinding_factor: Option<SecretKey>,
) -> Result<(PublicKey, SecretKey), Error> {
    let y = hash_to_curve(secret)?;
    let r = blinding_factor.unwrap_or_else(SecretKey::generate);
    let b = point_add(&y, &r.public_key())?;
    Ok((b, r))
}

/// Undo blinding given the mint's signature and the mint's keyset public key:
/// `C = C_ - r·A`.
pub fn unblind_message(
    blinded_key: &PublicKey,
    r: &SecretKey,
    mint_pubkey: &PublicKey,
) -> Result<PublicKey, Error> {
    let neg_r_a = point_mul(mint_pubkey, &(-r.to_scalar()))?;
    point_add(blinded_key, &neg_r_a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_to_curve_is_deterministic() {
        let a = hash_to_curve(b"test-secret").expect("derives");
        let b = hash_to_curve(b"test-secret").expect("derives");
        assert_eq!(a, b);
    }

    #[test]
    fn scalar_from_bytes_rejects_zero() {
        assert!(matches!(
            scalar_from_bytes(&[0u8; 32]),
            Err(Error::ZeroScalar)
        ));
    }

    #[test]
    fn ecdh_is_commutative() {
        let alice = SecretKey::generate();
        let bob = SecretKey::generate();

        let shared_from_alice = ecdh(&alice, &bob.public_key()).expect("ecdh");
        let shared_from_bob = ecdh(&bob, &alice.public_key()).expect("ecdh");

        assert_eq!(shared_from_alice, shared_from_bob);
    }

    #[test]
    fn blind_sign_unblind_recovers_mint_signed_point() {
        let secret = b"roundtrip-secret";
        let mint_key = SecretKey::generate();

        let (blinded, r) = blind_message(secret, None).expect("blind");
        // mint signs the blinded point: C_ = a·B_
        let signed = point_mul(&blinded, &mint_key.to_scalar()).expect("sign");
        // Alice unblinds: C = C_ - r·A = a·hash_to_curve(secret)
        let unblinded = unblind_message(&signed, &r, &mint_key.public_key()).expect("unblind");

        let y = hash_to_curve(secret).expect("hash to curve");
        let expected = point_mul(&y, &mint_key.to_scalar()).expect("a*Y");
        assert_eq!(unblinded, expected);
    }
}
