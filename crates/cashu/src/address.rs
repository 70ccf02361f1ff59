//! `mintUrl:scanPubkey:spendPubkey` silent-payment addresses
// New to this core (the teacher has no address-format type of its own), built
// in the style of crates/cashu/src/mint_url.rs: a thin string-backed newtype
// with fallible `FromStr`/`Display` and a crate `Error` variant of its own.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::keys::PublicKey;

const HEX_KEY_LEN: usize = 66;

/// A parsed `mintUrl:scanPubkey:spendPubkey` silent-payment address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashuAddress {
    /// The mint this address's proofs must be redeemed at
    pub mint_url: String,
    /// Bob's scan public key (used by senders for ECDH)
    pub scan_pub: PublicKey,
    /// Bob's spend public key (anchors every derived output)
    pub spend_pub: PublicKey,
}

impl CashuAddress {
    /// Format back to `mintUrl:scanHex:spendHex`
    pub fn format(mint_url: &str, scan_pub: &PublicKey, spend_pub: &PublicKey) -> String {
        format!("{mint_url}:{}:{}", scan_pub.to_hex(), spend_pub.to_hex())
    }

    /// Parse `mintUrl:scanHex:spendHex`. The mint URL may itself contain
    /// colons (e.g. a port), so splitting takes the *last* two colons as
    /// separators rather than splitting on every colon.
    pub fn parse(address: &str) -> Result<Self, Error> {
        let spend_sep = address
            .rfind(':')
            .ok_or_else(|| Error::AddressParse("missing separator".into()))?;
        let (rest, spend_hex) = address.split_at(spend_sep);
        let spend_hex = &spend_hex[1..];

        let scan_sep = rest
            .rfind(':')
            .ok_or_else(|| Error::AddressParse("missing separator".into()))?;
        let (mint_url, scan_hex) = rest.split_at(scan_sep);
        let scan_hex = &scan_hex[1..];

        if mint_url.is_empty() {
            return Err(Error::AddressParse("missing mint url".into()));
        }

        let scan_pub = Self::parse_key(scan_hex)?;
        let spend_pub = Self::parse_key(spend_hex)?;

        Ok(Self {
            mint_url: mint_url.to_string(),
            scan_pub,
            spend_pub,
        })
    }

    fn parse_key(hex: &str) -> Result<PublicKey, Error> {
        if hex.len() != HEX_KEY_LEN {
            return Err(Error::AddressParse(format!(
                "expected {HEX_KEY_LEN} hex chars, found {}",
                hex.len()
            )));
        }
        if !hex.starts_with("02") && !hex.starts_with("03") {
            return Err(Error::AddressParse(
                "compressed key must start with 02 or 03".into(),
            ));
        }
        PublicKey::from_hex(hex).map_err(|e| Error::AddressParse(e.to_string()))
    }
}

impl FromStr for CashuAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CashuAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            Self::format(&self.mint_url, &self.scan_pub, &self.spend_pub)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::SecretKey;

    #[test]
    fn roundtrips_through_format_and_parse() {
        let scan_pub = SecretKey::generate().public_key();
        let spend_pub = SecretKey::generate().public_key();
        let formatted = CashuAddress::format("http://mint.example:3338", &scan_pub, &spend_pub);

        let parsed = CashuAddress::parse(&formatted).expect("valid address");
        assert_eq!(parsed.mint_url, "http://mint.example:3338");
        assert_eq!(parsed.scan_pub, scan_pub);
        assert_eq!(parsed.spend_pub, spend_pub);
    }

    #[test]
    fn mint_url_containing_colons_is_preserved() {
        let scan_pub = SecretKey::generate().public_key();
        let spend_pub = SecretKey::generate().public_key();
        let address = format!(
            "http://m:8085:{}:{}",
            scan_pub.to_hex(),
            spend_pub.to_hex()
        );

        let parsed = CashuAddress::parse(&address).expect("valid address");
        assert_eq!(parsed.mint_url, "http://m:8085");
    }

    #[test]
    fn rejects_wrong_length_hex() {
        let err = CashuAddress::parse("http://m:8085:02ab:03cd").unwrap_err();
        assert!(matches!(err, Error::AddressParse(_)));
    }

    #[test]
    fn rejects_missing_separators() {
        assert!(CashuAddress::parse("not-an-address").is_err());
    }
}
