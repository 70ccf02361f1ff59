//! The secret string bound into a `Proof`, hashed to a curve point by `hash_to_curve`
// Grounded on crates/cashu/src/secret.rs verbatim (128-bit random, base64 URL_SAFE).

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// The secret string that gates spending of a proof
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Default for Secret {
    fn default() -> Self {
        Self::generate()
    }
}

impl Secret {
    const BIT_LENGTH: usize = 128;

    /// Generate a fresh random secret
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut random_bytes = [0u8; Self::BIT_LENGTH / 8];
        rng.fill_bytes(&mut random_bytes);
        Self(URL_SAFE.encode(random_bytes))
    }

    /// Bytes hashed by `hash_to_curve`
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secrets_are_unique() {
        assert_ne!(Secret::generate(), Secret::generate());
    }
}
