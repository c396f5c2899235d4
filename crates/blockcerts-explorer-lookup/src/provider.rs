//! Explorer provider records: recognized services, caller overrides and the default
//! provider set of each chain family.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExplorerError;

/// Priority assigned to default providers
pub const DEFAULT_PRIORITY: u8 = 1;

/// Recognized transaction lookup services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionService {
    Blockcypher,
    Blockstream,
    Mempool,
    Etherscan,
}

impl TransactionService {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blockcypher => "blockcypher",
            Self::Blockstream => "blockstream",
            Self::Mempool => "mempool",
            Self::Etherscan => "etherscan",
        }
    }
}

impl fmt::Display for TransactionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionService {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blockcypher" => Ok(Self::Blockcypher),
            "blockstream" => Ok(Self::Blockstream),
            "mempool" => Ok(Self::Mempool),
            "etherscan" => Ok(Self::Etherscan),
            other => Err(ExplorerError::UnknownService(other.to_string())),
        }
    }
}

/// Explorer entry supplied by the caller to override a default provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerApi {
    /// Name of the service to override
    pub service_name: Option<String>,
    /// Custom endpoint (base URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// API token
    #[serde(default, alias = "key", skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Lower values are queried first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
}

impl ExplorerApi {
    /// Recognized service targeted by this entry, if any
    pub fn service(&self) -> Option<TransactionService> {
        self.service_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .and_then(|name| name.parse().ok())
    }
}

/// A resolved explorer provider, identified by its service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerProvider {
    pub service: TransactionService,
    /// Base URL overriding the service's built-in endpoints
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub priority: u8,
}

impl ExplorerProvider {
    pub fn new(service: TransactionService) -> Self {
        Self {
            service,
            endpoint: None,
            token: None,
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Shallow merge: fields set by the caller win, the rest is kept
    pub fn with_override(&self, api: &ExplorerApi) -> Self {
        Self {
            service: self.service,
            endpoint: api.endpoint.clone().or_else(|| self.endpoint.clone()),
            token: api.token.clone().or_else(|| self.token.clone()),
            priority: api.priority.unwrap_or(self.priority),
        }
    }
}

/// Chain families owning a separate default provider set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplorerFamily {
    Bitcoin,
    Ethereum,
    /// Legacy v1 certificates, which need spent output information for revocation
    V1,
}

pub static BITCOIN_EXPLORERS: &[TransactionService] = &[
    TransactionService::Blockcypher,
    TransactionService::Blockstream,
    TransactionService::Mempool,
];

pub static ETHEREUM_EXPLORERS: &[TransactionService] = &[TransactionService::Etherscan];

pub static EXPLORERS_WITH_SPENT_OUTPUT_INFO: &[TransactionService] =
    &[TransactionService::Blockcypher];

/// Default providers of a chain family, in query order
pub fn default_providers(family: ExplorerFamily) -> Vec<ExplorerProvider> {
    let services = match family {
        ExplorerFamily::Bitcoin => BITCOIN_EXPLORERS,
        ExplorerFamily::Ethereum => ETHEREUM_EXPLORERS,
        ExplorerFamily::V1 => EXPLORERS_WITH_SPENT_OUTPUT_INFO,
    };
    services.iter().copied().map(ExplorerProvider::new).collect()
}
