//! Identifiers shared by the registry and the pool

use std::fmt;
use std::str::FromStr;

use ark_bn254::Fr;
use rand::Rng;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use zk_lending_arkworks::Uint256;

fn keccak256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// 20-byte account address
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Deterministic address from a label: the last 20 bytes of its Keccak256.
    pub fn from_label(label: &str) -> Self {
        let digest = keccak256(&[label.as_bytes()]);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Public digest of a hidden amount or position
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Commitment(pub Uint256);

impl Commitment {
    pub fn from_field(value: Fr) -> Self {
        Self(Uint256::from_field(value))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn word(&self) -> Uint256 {
        self.0
    }
}

impl From<Fr> for Commitment {
    fn from(value: Fr) -> Self {
        Self::from_field(value)
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One-time token authorizing the retirement of a commitment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nullifier(pub Uint256);

impl Nullifier {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill(&mut bytes);
        Self(Uint256(bytes))
    }

    /// `Keccak256(self ‖ domain)`, for operations that retire several
    /// commitments with one caller-supplied nullifier.
    pub fn derive(&self, domain: &str) -> Self {
        Self(Uint256(keccak256(&[self.0 .0.as_slice(), domain.as_bytes()])))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_address_hex() {
        let addr = Address::from_label("alice");
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);
        assert_ne!(addr, Address::from_label("bob"));
        assert!("0x1234".parse::<Address>().is_err());
    }

    #[test]
    fn test_derived_nullifiers_are_domain_separated() {
        let mut rng = StdRng::seed_from_u64(1);
        let n = Nullifier::random(&mut rng);
        assert_ne!(n.derive("debt"), n.derive("position"));
        assert_eq!(n.derive("debt"), n.derive("debt"));
        assert_ne!(n.derive("debt"), n);
    }

    #[test]
    fn test_commitment_serde_is_hex_word() {
        let c = Commitment::from_field(Fr::from(5u64));
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(
            json,
            "\"0x0000000000000000000000000000000000000000000000000000000000000005\""
        );
    }
}
