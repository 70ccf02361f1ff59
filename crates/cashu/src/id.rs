//! Opaque keyset identifier (NUT-02 `Id`)
// Grounded on crates/cashu/src/nuts/nut02.rs::Id. We keep the wire format
// (9 raw bytes, base64-STANDARD encoded to a 12-character string) but drop
// the teacher's `Id::from(&Keys)` derivation: this wallet never mints its own
// keyset, it only stores and compares the ids a mint hands back from
// `/v1/keysets`, so there is nothing here to derive from.

use std::convert::TryFrom;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// A mint keyset identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id([u8; Id::BYTES]);

impl Id {
    const BYTES: usize = 9;
    const STRLEN: usize = 12;

    /// Parse from the mint's base64 keyset id string
    pub fn from_base64(b64: &str) -> Result<Self, Error> {
        if b64.len() != Self::STRLEN {
            return Err(Error::InvalidKey(format!(
                "keyset id must be {} chars, found {}",
                Self::STRLEN,
                b64.len()
            )));
        }

        let bytes = STANDARD
            .decode(b64)
            .map_err(|e| Error::InvalidKey(e.to_string()))?;

        let bytes: [u8; Self::BYTES] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidKey("keyset id decoded to wrong length".into()))?;

        Ok(Self(bytes))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(Self::STRLEN);
        STANDARD.encode_string(self.0.as_slice(), &mut out);
        f.write_str(&out)
    }
}

impl TryFrom<String> for Id {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Id::from_base64(&value)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Id::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_display() {
        let id = Id([1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let printed = id.to_string();
        assert_eq!(Id::from_base64(&printed).expect("valid"), id);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Id::from_base64("short").is_err());
    }
}
