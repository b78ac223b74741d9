//! Field elements and addresses

use std::fmt;
use std::str::FromStr;

use ark_ff::{BigInteger, PrimeField};
use ark_std::UniformRand;
use ark_std::rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{PrimitiveError, decode_hex};

/// Backing arithmetic field (BN254 scalar field)
pub type Field = ark_bn254::Fr;

/// A canonical field element, stored big-endian
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Fr([u8; 32]);

impl Fr {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn from_u64(value: u64) -> Self {
        Self::from_u128(u128::from(value))
    }

    pub fn from_u128(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Build from big-endian bytes, rejecting values at or above the modulus
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, PrimitiveError> {
        let reduced = Self::from_field(Field::from_be_bytes_mod_order(&bytes));
        if reduced.0 != bytes {
            return Err(PrimitiveError::NotInField(format!(
                "0x{}",
                hex::encode(bytes)
            )));
        }
        Ok(reduced)
    }

    /// Parse `0x`-prefixed (or bare) hex. Short values are left-padded.
    pub fn from_hex(s: &str) -> Result<Self, PrimitiveError> {
        let raw = decode_hex(s)?;
        if raw.len() > 32 {
            return Err(PrimitiveError::TooLong(raw.len()));
        }
        let mut bytes = [0u8; 32];
        bytes[32 - raw.len()..].copy_from_slice(&raw);
        Self::from_bytes(bytes)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_field(f: Field) -> Self {
        let be = f.into_bigint().to_bytes_be();
        let mut bytes = [0u8; 32];
        bytes[32 - be.len()..].copy_from_slice(&be);
        Self(bytes)
    }

    pub fn to_field(&self) -> Field {
        Field::from_be_bytes_mod_order(&self.0)
    }

    /// Uniformly random field element
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_field(Field::rand(rng))
    }

    /// Interpret as an unsigned integer; fails above `u128::MAX`
    pub fn to_u128(&self) -> Result<u128, PrimitiveError> {
        if self.0[..16].iter().any(|b| *b != 0) {
            return Err(PrimitiveError::Overflow(self.to_hex()));
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&self.0[16..]);
        Ok(u128::from_be_bytes(low))
    }
}

impl From<u64> for Fr {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<u128> for Fr {
    fn from(value: u128) -> Self {
        Self::from_u128(value)
    }
}

impl FromStr for Fr {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fr({})", self.to_hex())
    }
}

impl Serialize for Fr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Address of an account or a deployed contract
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AztecAddress(pub Fr);

impl AztecAddress {
    pub const ZERO: Self = Self(Fr::ZERO);

    pub fn to_fr(self) -> Fr {
        self.0
    }
}

impl From<Fr> for AztecAddress {
    fn from(value: Fr) -> Self {
        Self(value)
    }
}

impl FromStr for AztecAddress {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fr::from_hex(s).map(Self)
    }
}

impl fmt::Display for AztecAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for AztecAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AztecAddress({})", self.0.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    const MODULUS_HEX: &str = "0x30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001";

    #[test]
    fn test_short_hex_is_left_padded() {
        let f = Fr::from_hex("0x2a").unwrap();
        assert_eq!(f, Fr::from_u64(42));
        assert_eq!(
            f.to_hex(),
            "0x000000000000000000000000000000000000000000000000000000000000002a"
        );

        // odd nibble count and missing prefix
        assert_eq!(Fr::from_hex("abc").unwrap(), Fr::from_u64(0xabc));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            Fr::from_hex("0xzz"),
            Err(PrimitiveError::InvalidHex(_))
        ));
        assert!(matches!(Fr::from_hex("0x"), Err(PrimitiveError::InvalidHex(_))));
        assert!(matches!(
            Fr::from_hex(&format!("0x{}", "11".repeat(33))),
            Err(PrimitiveError::TooLong(33))
        ));
        assert!(matches!(
            Fr::from_hex(MODULUS_HEX),
            Err(PrimitiveError::NotInField(_))
        ));
    }

    #[test]
    fn test_u128_conversion() {
        let f = Fr::from_u128(u128::MAX);
        assert_eq!(f.to_u128().unwrap(), u128::MAX);

        let mut big = [0u8; 32];
        big[15] = 1;
        let too_big = Fr::from_bytes(big).unwrap();
        assert!(matches!(
            too_big.to_u128(),
            Err(PrimitiveError::Overflow(_))
        ));
    }

    #[test]
    fn test_random_is_canonical() {
        let mut rng = OsRng;
        for _ in 0..16 {
            let f = Fr::random(&mut rng);
            assert_eq!(Fr::from_bytes(*f.as_bytes()).unwrap(), f);
            assert_eq!(Fr::from_field(f.to_field()), f);
        }
    }

    #[test]
    fn test_serde_uses_hex_strings() {
        let addr = AztecAddress(Fr::from_u64(7));
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(
            json,
            "\"0x0000000000000000000000000000000000000000000000000000000000000007\""
        );

        let parsed: AztecAddress = serde_json::from_str("\"0x07\"").unwrap();
        assert_eq!(parsed, addr);

        let bad: Result<Fr, _> = serde_json::from_str(&format!("\"{MODULUS_HEX}\""));
        assert!(bad.is_err());
    }
}
