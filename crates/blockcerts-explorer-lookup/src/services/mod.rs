//! Concrete explorer services and their response parsers.

use std::sync::Arc;

use serde_json::Value;

use crate::error::ExplorerError;
use crate::lookup::TransactionProvider;
use crate::provider::{ExplorerProvider, TransactionService};
use crate::request::JsonFetcher;

pub mod blockcypher;
pub mod esplora;
pub mod etherscan;

pub use blockcypher::BlockcypherExplorer;
pub use esplora::EsploraExplorer;
pub use etherscan::EtherscanExplorer;

/// Push of a 32-byte payload after OP_RETURN
pub const BITCOIN_OP_RETURN_PREFIX: &str = "6a20";

/// Hex prefix of ethereum transaction input data
pub const ETHEREUM_HEX_PREFIX: &str = "0x";

/// Instantiate the explorer implementing a provider record
pub fn provider_for(
    provider: &ExplorerProvider,
    fetcher: Arc<dyn JsonFetcher>,
) -> Arc<dyn TransactionProvider> {
    match provider.service {
        TransactionService::Blockcypher => {
            Arc::new(BlockcypherExplorer::new(provider.clone(), fetcher))
        }
        TransactionService::Blockstream | TransactionService::Mempool => {
            Arc::new(EsploraExplorer::new(provider.clone(), fetcher))
        }
        TransactionService::Etherscan => Arc::new(EtherscanExplorer::new(provider.clone(), fetcher)),
    }
}

/// Read a string field at a JSON pointer
pub(crate) fn str_at<'a>(
    value: &'a Value,
    pointer: &str,
    service: TransactionService,
) -> Result<&'a str, ExplorerError> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .ok_or_else(|| ExplorerError::parse(service.as_str(), format!("missing {pointer}")))
}

/// Endpoint override or the service's built-in base URL
pub(crate) fn base_url(provider: &ExplorerProvider, default: &str) -> String {
    provider
        .endpoint
        .as_deref()
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}
