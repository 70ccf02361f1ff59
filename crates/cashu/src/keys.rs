//! Compressed secp256k1 public/secret key wrappers
// Grounded on crates/cashu/src/nuts/nut01/{public_key,secret_key}.rs, ported from
// bitcoin::secp256k1 to k256 so the same key types flow straight into the
// scalar/point arithmetic in `crate::primitives` without a conversion hop.

use core::fmt;
use core::ops::Deref;
use core::str::FromStr;

use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

/// A compressed secp256k1 public key
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey {
    inner: k256::PublicKey,
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl Deref for PublicKey {
    type Target = k256::PublicKey;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<k256::PublicKey> for PublicKey {
    fn from(inner: k256::PublicKey) -> Self {
        Self { inner }
    }
}

impl From<PublicKey> for k256::PublicKey {
    fn from(key: PublicKey) -> Self {
        key.inner
    }
}

impl PublicKey {
    /// Parse from a 33-byte SEC1 compressed point
    pub fn from_slice(slice: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            inner: k256::PublicKey::from_sec1_bytes(slice)
                .map_err(|e| Error::InvalidKey(e.to_string()))?,
        })
    }

    /// Parse from a hex-encoded 33-byte SEC1 compressed point
    pub fn from_hex<S: AsRef<str>>(hex: S) -> Result<Self, Error> {
        let hex = hex.as_ref();
        if hex.len() != 33 * 2 {
            return Err(Error::InvalidKey(format!(
                "expected {} hex chars, found {}",
                33 * 2,
                hex.len()
            )));
        }
        let bytes = hex::decode(hex)?;
        Self::from_slice(&bytes)
    }

    /// Serialize to 33 compressed bytes
    pub fn to_bytes(&self) -> [u8; 33] {
        let encoded = self.inner.to_encoded_point(true);
        let mut out = [0u8; 33];
        out.copy_from_slice(encoded.as_bytes());
        out
    }

    /// Serialize to a hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(hex: &str) -> Result<Self, Self::Err> {
        Self::from_hex(hex)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(hex).map_err(serde::de::Error::custom)
    }
}

/// A secp256k1 secret key. `Debug`/`Display` never print the scalar.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey {
    inner: k256::SecretKey,
}

impl Deref for SecretKey {
    type Target = k256::SecretKey;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<k256::SecretKey> for SecretKey {
    fn from(inner: k256::SecretKey) -> Self {
        Self { inner }
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKey")
            .field("inner", &"[REDACTED]")
            .finish()
    }
}

impl SecretKey {
    /// Parse from 32 raw bytes
    pub fn from_slice(slice: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            inner: k256::SecretKey::from_slice(slice)
                .map_err(|e| Error::InvalidKey(e.to_string()))?,
        })
    }

    /// Parse from a hex-encoded 32-byte scalar
    pub fn from_hex<S: AsRef<str>>(hex: S) -> Result<Self, Error> {
        let bytes = hex::decode(hex.as_ref())?;
        Self::from_slice(&bytes)
    }

    /// Generate a random secret key
    pub fn generate() -> Self {
        Self {
            inner: k256::SecretKey::random(&mut rand::thread_rng()),
        }
    }

    /// Secret scalar as 32 bytes
    pub fn to_secret_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes().into()
    }

    /// Secret scalar as hex, for storage at rest only
    pub fn to_secret_hex(&self) -> String {
        hex::encode(self.to_secret_bytes())
    }

    /// Derive the corresponding public key
    pub fn public_key(&self) -> PublicKey {
        self.inner.public_key().into()
    }

    /// View as a `k256` scalar
    pub fn to_scalar(&self) -> k256::Scalar {
        *self.inner.to_nonzero_scalar()
    }
}

impl FromStr for SecretKey {
    type Err = Error;

    fn from_str(hex: &str) -> Result<Self, Self::Err> {
        Self::from_hex(hex)
    }
}

impl Serialize for SecretKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_secret_hex())
    }
}

impl<'de> Deserialize<'de> for SecretKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        SecretKey::from_hex(hex).map_err(serde::de::Error::custom)
    }
}
