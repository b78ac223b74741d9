//! Transaction, receipt and node records

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{AztecAddress, Fr, PrimitiveError, decode_hex};

/// Hash identifying a submitted transaction
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for TxHash {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = decode_hex(s)?;
        let bytes: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| PrimitiveError::TxHashLength(raw.len()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.to_hex())
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusion status reported by the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Pending,
    Success,
    Dropped,
    #[serde(
        alias = "app_logic_reverted",
        alias = "teardown_reverted",
        alias = "both_reverted"
    )]
    Reverted,
}

impl TxStatus {
    /// Whether the node will never change this status again
    pub fn is_final(self) -> bool {
        !matches!(self, TxStatus::Pending)
    }
}

/// Inclusion result of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub status: TxStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

impl TxReceipt {
    pub fn pending(tx_hash: TxHash) -> Self {
        Self {
            tx_hash,
            status: TxStatus::Pending,
            error: None,
            block_number: None,
        }
    }

    /// Included in a block and executed successfully
    pub fn is_mined(&self) -> bool {
        self.status == TxStatus::Success && self.block_number.is_some()
    }
}

/// Identity of the network the PXE is attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    #[serde(default)]
    pub node_version: String,
    pub chain_id: u64,
    #[serde(default)]
    pub protocol_version: u64,
}

/// Entry of the PXE account registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteAddress {
    pub address: AztecAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_address: Option<Fr>,
}

impl CompleteAddress {
    pub fn new(address: AztecAddress) -> Self {
        Self {
            address,
            partial_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_hash_length_checked() {
        let ok: TxHash = format!("0x{}", "ab".repeat(32)).parse().unwrap();
        assert_eq!(ok.0, [0xab; 32]);

        let short: Result<TxHash, _> = "0xabcd".parse();
        assert_eq!(short, Err(PrimitiveError::TxHashLength(2)));
    }

    #[test]
    fn test_receipt_from_node_json() {
        let json = format!(
            r#"{{"txHash":"0x{}","status":"app_logic_reverted","error":"assertion failed"}}"#,
            "01".repeat(32)
        );
        let receipt: TxReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(receipt.status, TxStatus::Reverted);
        assert_eq!(receipt.error.as_deref(), Some("assertion failed"));
        assert_eq!(receipt.block_number, None);
        assert!(!receipt.is_mined());
    }

    #[test]
    fn test_status_finality() {
        assert!(!TxStatus::Pending.is_final());
        assert!(TxStatus::Success.is_final());
        assert!(TxStatus::Dropped.is_final());
        assert!(TxStatus::Reverted.is_final());
    }

    #[test]
    fn test_node_info_defaults() {
        let info: NodeInfo = serde_json::from_str(r#"{"chainId":31337}"#).unwrap();
        assert_eq!(info.chain_id, 31337);
        assert_eq!(info.protocol_version, 0);
        assert!(info.node_version.is_empty());
    }
}
