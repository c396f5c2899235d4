//! Etherscan proxy API: transaction by hash, then its block for the timestamp.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;
use url::Url;

use super::{base_url, str_at, ETHEREUM_HEX_PREFIX};
use crate::error::ExplorerError;
use crate::lookup::TransactionProvider;
use crate::provider::{ExplorerProvider, TransactionService};
use crate::request::JsonFetcher;
use crate::transaction::{strip_hash_prefix, LookupNetwork, TransactionData};

const SERVICE: TransactionService = TransactionService::Etherscan;

pub struct EtherscanExplorer {
    provider: ExplorerProvider,
    fetcher: Arc<dyn JsonFetcher>,
}

impl EtherscanExplorer {
    pub fn new(provider: ExplorerProvider, fetcher: Arc<dyn JsonFetcher>) -> Self {
        Self { provider, fetcher }
    }

    fn api_url(
        &self,
        network: LookupNetwork,
        params: &[(&str, &str)],
    ) -> Result<String, ExplorerError> {
        let default = match network {
            LookupNetwork::EthereumMainnet => "https://api.etherscan.io/api",
            LookupNetwork::EthereumRopsten => "https://api-ropsten.etherscan.io/api",
            LookupNetwork::EthereumRinkeby => "https://api-rinkeby.etherscan.io/api",
            LookupNetwork::EthereumGoerli => "https://api-goerli.etherscan.io/api",
            LookupNetwork::EthereumSepolia => "https://api-sepolia.etherscan.io/api",
            other => {
                return Err(ExplorerError::UnsupportedNetwork {
                    service: SERVICE.to_string(),
                    network: other.to_string(),
                })
            }
        };
        let mut url = Url::parse_with_params(&base_url(&self.provider, default), params)?;
        if let Some(token) = &self.provider.token {
            url.query_pairs_mut().append_pair("apikey", token);
        }
        Ok(url.to_string())
    }

    pub fn transaction_url(
        &self,
        transaction_id: &str,
        network: LookupNetwork,
    ) -> Result<String, ExplorerError> {
        self.api_url(
            network,
            &[
                ("module", "proxy"),
                ("action", "eth_getTransactionByHash"),
                ("txhash", transaction_id),
            ],
        )
    }

    pub fn block_url(&self, block_number: &str, network: LookupNetwork) -> Result<String, ExplorerError> {
        self.api_url(
            network,
            &[
                ("module", "proxy"),
                ("action", "eth_getBlockByNumber"),
                ("tag", block_number),
                ("boolean", "false"),
            ],
        )
    }
}

#[async_trait]
impl TransactionProvider for EtherscanExplorer {
    fn name(&self) -> String {
        SERVICE.to_string()
    }

    async fn get_transaction_data(
        &self,
        transaction_id: &str,
        network: LookupNetwork,
    ) -> Result<TransactionData, ExplorerError> {
        let transaction = self
            .fetcher
            .get_json(&self.transaction_url(transaction_id, network)?)
            .await?;
        let block_number = match transaction.pointer("/result/blockNumber").and_then(Value::as_str) {
            Some(number) => number.to_string(),
            None => return Err(ExplorerError::Unconfirmed(transaction_id.to_string())),
        };
        let block = self
            .fetcher
            .get_json(&self.block_url(&block_number, network)?)
            .await?;
        parse_etherscan_transaction(&transaction, &block)
    }
}

/// Parse the `eth_getTransactionByHash` and `eth_getBlockByNumber` proxy responses
pub fn parse_etherscan_transaction(
    transaction: &Value,
    block: &Value,
) -> Result<TransactionData, ExplorerError> {
    let input = str_at(transaction, "/result/input", SERVICE)?;
    let from = str_at(transaction, "/result/from", SERVICE)?;
    let timestamp = str_at(block, "/result/timestamp", SERVICE)?;

    let seconds = i64::from_str_radix(timestamp.trim_start_matches(ETHEREUM_HEX_PREFIX), 16)
        .map_err(|e| ExplorerError::parse(SERVICE.as_str(), e.to_string()))?;
    let time = DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| ExplorerError::parse(SERVICE.as_str(), "block timestamp out of range"))?;

    Ok(TransactionData {
        remote_hash: strip_hash_prefix(input, &[ETHEREUM_HEX_PREFIX]),
        issuing_address: from.to_lowercase(),
        time,
        revoked_addresses: vec![],
    })
}
