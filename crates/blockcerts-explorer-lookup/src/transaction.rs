//! Transaction data returned by explorers and the networks they are queried on.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Data extracted from an anchoring transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    /// Hash anchored in the transaction (OP_RETURN payload or input data), lowercase hex
    pub remote_hash: String,
    /// Address that issued the transaction
    pub issuing_address: String,
    /// Time of the block containing the transaction
    pub time: DateTime<Utc>,
    /// Addresses revoked through spent outputs (legacy v1 revocation)
    pub revoked_addresses: Vec<String>,
}

/// Network on which a transaction is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LookupNetwork {
    BitcoinMainnet,
    BitcoinTestnet,
    EthereumMainnet,
    EthereumRopsten,
    EthereumRinkeby,
    EthereumGoerli,
    EthereumSepolia,
}

impl LookupNetwork {
    pub fn is_bitcoin(&self) -> bool {
        matches!(self, Self::BitcoinMainnet | Self::BitcoinTestnet)
    }

    pub fn is_ethereum(&self) -> bool {
        !self.is_bitcoin()
    }
}

impl fmt::Display for LookupNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BitcoinMainnet => "bitcoinMainnet",
            Self::BitcoinTestnet => "bitcoinTestnet",
            Self::EthereumMainnet => "ethereumMainnet",
            Self::EthereumRopsten => "ethereumRopsten",
            Self::EthereumRinkeby => "ethereumRinkeby",
            Self::EthereumGoerli => "ethereumGoerli",
            Self::EthereumSepolia => "ethereumSepolia",
        };
        f.write_str(name)
    }
}

/// Strip the first matching prefix (e.g. `6a20` for an OP_RETURN push) and lowercase the hash
pub fn strip_hash_prefix(remote_hash: &str, prefixes: &[&str]) -> String {
    let stripped = prefixes
        .iter()
        .find_map(|prefix| remote_hash.strip_prefix(prefix))
        .unwrap_or(remote_hash);
    stripped.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_hash_prefix() {
        assert_eq!(strip_hash_prefix("6a20ABCD", &["6a20", "0x"]), "abcd");
        assert_eq!(strip_hash_prefix("0xabcd", &["6a20", "0x"]), "abcd");
        assert_eq!(strip_hash_prefix("abcd", &["6a20"]), "abcd");
    }

    #[test]
    fn test_network_family() {
        assert!(LookupNetwork::BitcoinTestnet.is_bitcoin());
        assert!(LookupNetwork::EthereumSepolia.is_ethereum());
        assert_eq!(LookupNetwork::EthereumGoerli.to_string(), "ethereumGoerli");
    }
}
