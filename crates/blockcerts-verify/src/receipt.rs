//! Merkle receipts and the decoding of proof values into them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::VerificationError;

/// One sibling hash along the Merkle path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePathNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
}

/// Where the Merkle root was anchored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Anchor {
    /// `blink:<ledger>:<network>:<transaction id>`
    Blink(String),
    Source {
        #[serde(rename = "sourceId")]
        source_id: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        anchor_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chain: Option<String>,
    },
}

impl Anchor {
    pub fn transaction_id(&self) -> Option<&str> {
        match self {
            Anchor::Blink(blink) => blink.rsplit(':').next().filter(|id| !id.is_empty()),
            Anchor::Source { source_id, .. } => Some(source_id.as_str()),
        }
    }
}

/// Decoded proof payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Receipt format, e.g. `["MerkleProof2017", "Extension"]` for v2 signatures
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub receipt_type: Option<Value>,
    pub target_hash: String,
    pub merkle_root: String,
    #[serde(default, alias = "proof")]
    pub path: Vec<MerklePathNode>,
    #[serde(default)]
    pub anchors: Vec<Anchor>,
}

impl Receipt {
    /// Identifier of the anchoring transaction, read from the first anchor
    pub fn transaction_id(&self) -> Result<&str, VerificationError> {
        self.anchors
            .first()
            .and_then(Anchor::transaction_id)
            .ok_or_else(|| VerificationError::Decode("receipt has no anchor".to_string()))
    }
}

/// Decode an opaque proof value into a receipt
#[cfg_attr(test, mockall::automock)]
pub trait ReceiptDecoder: Send + Sync {
    fn decode(&self, proof_value: &str) -> Result<Receipt, VerificationError>;
}

/// Multibase prefix of base58btc encoded values
pub const BASE58BTC_PREFIX: char = 'z';

/// Decoder for multibase base58btc proof values carrying a JSON receipt
#[derive(Debug, Clone, Copy, Default)]
pub struct MultibaseReceiptDecoder;

impl ReceiptDecoder for MultibaseReceiptDecoder {
    fn decode(&self, proof_value: &str) -> Result<Receipt, VerificationError> {
        let encoded = proof_value.strip_prefix(BASE58BTC_PREFIX).ok_or_else(|| {
            VerificationError::Decode(format!(
                "unsupported multibase prefix in proof value {proof_value:.8}"
            ))
        })?;
        let bytes = bitcoin::base58::decode(encoded)
            .map_err(|e| VerificationError::Decode(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| VerificationError::Decode(e.to_string()))
    }
}

/// Encode a receipt the way [`MultibaseReceiptDecoder`] expects it
pub fn encode_receipt(receipt: &Receipt) -> Result<String, VerificationError> {
    let bytes =
        serde_json::to_vec(receipt).map_err(|e| VerificationError::Decode(e.to_string()))?;
    Ok(format!("{BASE58BTC_PREFIX}{}", bitcoin::base58::encode(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_fixture() {
        let payload = json!({
            "path": [
                {"right": "51b4e7e5c2e4ce8cd6a1b6ab1d31e1a1b61e6ecb1a1a5bd8e1cfd4e7a4c5c1d9"},
                {"left": "8cb5e3a2c0f0e64e4c07b0f1d3d8ea3a4a1f2c6b1f05ea1e9a7ad44e6dc1c5e0"}
            ],
            "merkleRoot": "3a29ea7f1c0b0f1dbde4f3c2cf2a8e0c7a3d7e3d6c9c0c1b1d3f1f7e2a9d8c4b",
            "targetHash": "b2ceea1d52627b6ed8d919ad1039eda4d6f2bf71f7e4bd4f2ccf5d2c3adcbe26",
            "anchors": ["blink:btc:testnet:1e956a31736ad3bddf6302ba56050a3a36983610afeb9919256fd4d82e5dc175"]
        });
        let proof_value = format!(
            "z{}",
            bitcoin::base58::encode(&serde_json::to_vec(&payload).unwrap())
        );

        let receipt = MultibaseReceiptDecoder.decode(&proof_value).unwrap();
        assert_eq!(
            receipt.transaction_id().unwrap(),
            "1e956a31736ad3bddf6302ba56050a3a36983610afeb9919256fd4d82e5dc175"
        );
        assert_eq!(receipt.path.len(), 2);
        assert!(receipt.path[0].right.is_some());
        assert!(receipt.path[1].left.is_some());
    }

    #[test]
    fn test_decode_rejects_malformed_values() {
        assert!(matches!(
            MultibaseReceiptDecoder.decode("uABC"),
            Err(VerificationError::Decode(_))
        ));
        assert!(matches!(
            MultibaseReceiptDecoder.decode("z0OIl"),
            Err(VerificationError::Decode(_))
        ));
        let not_json = format!("z{}", bitcoin::base58::encode(b"not json"));
        assert!(matches!(
            MultibaseReceiptDecoder.decode(&not_json),
            Err(VerificationError::Decode(_))
        ));
    }

    #[test]
    fn test_source_anchor_transaction_id() {
        let receipt: Receipt = serde_json::from_value(json!({
            "type": ["MerkleProof2017", "Extension"],
            "targetHash": "aa",
            "merkleRoot": "aa",
            "proof": [],
            "anchors": [{"sourceId": "abcd", "type": "BTCOpReturn", "chain": "bitcoinMainnet"}]
        }))
        .unwrap();
        assert_eq!(receipt.transaction_id().unwrap(), "abcd");
        assert!(Receipt::default().transaction_id().is_err());
    }
}
