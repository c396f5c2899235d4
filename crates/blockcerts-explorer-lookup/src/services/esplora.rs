//! Esplora-compatible explorers (blockstream.info and mempool.space).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::Value;

use super::{base_url, str_at, BITCOIN_OP_RETURN_PREFIX};
use crate::error::ExplorerError;
use crate::lookup::TransactionProvider;
use crate::provider::{ExplorerProvider, TransactionService};
use crate::request::JsonFetcher;
use crate::transaction::{strip_hash_prefix, LookupNetwork, TransactionData};

pub struct EsploraExplorer {
    provider: ExplorerProvider,
    fetcher: Arc<dyn JsonFetcher>,
}

impl EsploraExplorer {
    pub fn new(provider: ExplorerProvider, fetcher: Arc<dyn JsonFetcher>) -> Self {
        Self { provider, fetcher }
    }

    fn default_base(&self, network: LookupNetwork) -> Result<&'static str, ExplorerError> {
        match (self.provider.service, network) {
            (TransactionService::Blockstream, LookupNetwork::BitcoinMainnet) => {
                Ok("https://blockstream.info/api")
            }
            (TransactionService::Blockstream, LookupNetwork::BitcoinTestnet) => {
                Ok("https://blockstream.info/testnet/api")
            }
            (TransactionService::Mempool, LookupNetwork::BitcoinMainnet) => {
                Ok("https://mempool.space/api")
            }
            (TransactionService::Mempool, LookupNetwork::BitcoinTestnet) => {
                Ok("https://mempool.space/testnet/api")
            }
            (service, network) => Err(ExplorerError::UnsupportedNetwork {
                service: service.to_string(),
                network: network.to_string(),
            }),
        }
    }

    pub fn transaction_url(
        &self,
        transaction_id: &str,
        network: LookupNetwork,
    ) -> Result<String, ExplorerError> {
        if !network.is_bitcoin() {
            return Err(ExplorerError::UnsupportedNetwork {
                service: self.provider.service.to_string(),
                network: network.to_string(),
            });
        }
        let base = match self.provider.endpoint {
            Some(_) => base_url(&self.provider, ""),
            None => self.default_base(network)?.to_string(),
        };
        Ok(format!("{base}/tx/{transaction_id}"))
    }
}

#[async_trait]
impl TransactionProvider for EsploraExplorer {
    fn name(&self) -> String {
        self.provider.service.to_string()
    }

    async fn get_transaction_data(
        &self,
        transaction_id: &str,
        network: LookupNetwork,
    ) -> Result<TransactionData, ExplorerError> {
        let url = self.transaction_url(transaction_id, network)?;
        let response = self.fetcher.get_json(&url).await?;
        parse_esplora_transaction(self.provider.service, transaction_id, &response)
    }
}

/// Parse an esplora `/tx/:txid` response
pub fn parse_esplora_transaction(
    service: TransactionService,
    transaction_id: &str,
    response: &Value,
) -> Result<TransactionData, ExplorerError> {
    let confirmed = response
        .pointer("/status/confirmed")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !confirmed {
        return Err(ExplorerError::Unconfirmed(transaction_id.to_string()));
    }

    let block_time = response
        .pointer("/status/block_time")
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| ExplorerError::parse(service.as_str(), "missing block time"))?;

    let issuing_address = str_at(response, "/vin/0/prevout/scriptpubkey_address", service)?;

    let op_return = response
        .get("vout")
        .and_then(Value::as_array)
        .and_then(|outputs| {
            outputs.iter().find(|output| {
                output.get("scriptpubkey_type").and_then(Value::as_str) == Some("op_return")
            })
        })
        .and_then(|output| output.get("scriptpubkey").and_then(Value::as_str))
        .ok_or_else(|| ExplorerError::parse(service.as_str(), "no OP_RETURN output"))?;

    Ok(TransactionData {
        remote_hash: strip_hash_prefix(op_return, &[BITCOIN_OP_RETURN_PREFIX]),
        issuing_address: issuing_address.to_string(),
        time: block_time,
        revoked_addresses: vec![],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::request::MockJsonFetcher;

    #[test]
    fn test_parse_confirmed_transaction() {
        let response = json!({
            "txid": "1e95",
            "vin": [{"prevout": {"scriptpubkey_address": "mgdWjvq4RYAAP5goUNagTRMx7Xw534S5am"}}],
            "vout": [
                {"scriptpubkey": "0014aa", "scriptpubkey_type": "v0_p2wpkh"},
                {"scriptpubkey": "6a2068F3EDE17FDB67FFD4A5164B5687A71F9FBB68DA803B803935720F2AA38F7728", "scriptpubkey_type": "op_return"}
            ],
            "status": {"confirmed": true, "block_time": 1649166190}
        });
        let data = parse_esplora_transaction(TransactionService::Blockstream, "1e95", &response)
            .unwrap();
        assert_eq!(
            data.remote_hash,
            "68f3ede17fdb67ffd4a5164b5687a71f9fbb68da803b803935720f2aa38f7728"
        );
        assert_eq!(data.issuing_address, "mgdWjvq4RYAAP5goUNagTRMx7Xw534S5am");
        assert_eq!(data.time.timestamp(), 1649166190);
    }

    #[test]
    fn test_unconfirmed_transaction_fails() {
        let response = json!({"status": {"confirmed": false}, "vin": [], "vout": []});
        let err = parse_esplora_transaction(TransactionService::Mempool, "ff", &response)
            .unwrap_err();
        assert!(matches!(err, ExplorerError::Unconfirmed(_)));
    }

    #[test]
    fn test_transaction_urls() {
        let fetcher = Arc::new(MockJsonFetcher::new());
        let mempool = EsploraExplorer::new(
            ExplorerProvider::new(TransactionService::Mempool),
            fetcher.clone(),
        );
        assert_eq!(
            mempool
                .transaction_url("ab", LookupNetwork::BitcoinTestnet)
                .unwrap(),
            "https://mempool.space/testnet/api/tx/ab"
        );
        assert!(mempool
            .transaction_url("ab", LookupNetwork::EthereumMainnet)
            .is_err());

        let custom = EsploraExplorer::new(
            ExplorerProvider {
                endpoint: Some("http://localhost:3002/".into()),
                ..ExplorerProvider::new(TransactionService::Blockstream)
            },
            fetcher,
        );
        assert_eq!(
            custom
                .transaction_url("ab", LookupNetwork::BitcoinMainnet)
                .unwrap(),
            "http://localhost:3002/tx/ab"
        );
    }
}
