//! Bob's long-lived silent-payment identity
// New to this core: the teacher has no silent-payment concept, so this type
// is built from scratch in the style of its key wrappers (`keys.rs`) — plain
// hex-serde newtypes, generated once and persisted immutably.

use serde::{Deserialize, Serialize};

use crate::address::CashuAddress;
use crate::keys::{PublicKey, SecretKey};

/// Bob's scan and spend keypairs. `scan_priv` lets Bob derive the ECDH shared
/// secret with every ephemeral sender key; `spend_priv` anchors ownership of
/// every output derived from it. Generated lazily on first address request
/// and persisted immutably thereafter — never rotated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SilentKeys {
    /// Used to derive the ECDH shared secret with senders' ephemeral keys
    pub scan_priv: SecretKey,
    /// Anchors ownership of every output derived from this identity
    pub spend_priv: SecretKey,
}

impl SilentKeys {
    /// Generate a fresh identity
    pub fn generate() -> Self {
        Self {
            scan_priv: SecretKey::generate(),
            spend_priv: SecretKey::generate(),
        }
    }

    /// Bob's public scan key, handed out as part of his address
    pub fn scan_pub(&self) -> PublicKey {
        self.scan_priv.public_key()
    }

    /// Bob's public spend key, handed out as part of his address
    pub fn spend_pub(&self) -> PublicKey {
        self.spend_priv.public_key()
    }

    /// This identity's receiving address at `mint_url`
    pub fn address(&self, mint_url: &str) -> CashuAddress {
        CashuAddress {
            mint_url: mint_url.to_string(),
            scan_pub: self.scan_pub(),
            spend_pub: self.spend_pub(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_carries_both_public_keys() {
        let keys = SilentKeys::generate();
        let address = keys.address("http://mint.example");
        assert_eq!(address.scan_pub, keys.scan_pub());
        assert_eq!(address.spend_pub, keys.spend_pub());
    }
}
