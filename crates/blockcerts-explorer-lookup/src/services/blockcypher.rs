//! Blockcypher explorer, which also reports spent outputs used by v1 revocation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use url::Url;

use super::{base_url, str_at};
use crate::error::ExplorerError;
use crate::lookup::TransactionProvider;
use crate::provider::{ExplorerProvider, TransactionService};
use crate::request::JsonFetcher;
use crate::transaction::{LookupNetwork, TransactionData};

const SERVICE: TransactionService = TransactionService::Blockcypher;

pub struct BlockcypherExplorer {
    provider: ExplorerProvider,
    fetcher: Arc<dyn JsonFetcher>,
}

impl BlockcypherExplorer {
    pub fn new(provider: ExplorerProvider, fetcher: Arc<dyn JsonFetcher>) -> Self {
        Self { provider, fetcher }
    }

    pub fn transaction_url(
        &self,
        transaction_id: &str,
        network: LookupNetwork,
    ) -> Result<String, ExplorerError> {
        let default = match network {
            LookupNetwork::BitcoinMainnet => "https://api.blockcypher.com/v1/btc/main",
            LookupNetwork::BitcoinTestnet => "https://api.blockcypher.com/v1/btc/test3",
            other => {
                return Err(ExplorerError::UnsupportedNetwork {
                    service: SERVICE.to_string(),
                    network: other.to_string(),
                })
            }
        };
        let mut url = Url::parse(&format!(
            "{}/txs/{}",
            base_url(&self.provider, default),
            transaction_id
        ))?;
        url.query_pairs_mut().append_pair("limit", "500");
        if let Some(token) = &self.provider.token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url.to_string())
    }
}

#[async_trait]
impl TransactionProvider for BlockcypherExplorer {
    fn name(&self) -> String {
        SERVICE.to_string()
    }

    async fn get_transaction_data(
        &self,
        transaction_id: &str,
        network: LookupNetwork,
    ) -> Result<TransactionData, ExplorerError> {
        let url = self.transaction_url(transaction_id, network)?;
        let response = self.fetcher.get_json(&url).await?;
        parse_blockcypher_transaction(transaction_id, &response)
    }
}

/// Parse a blockcypher `/txs/:txid` response
pub fn parse_blockcypher_transaction(
    transaction_id: &str,
    response: &Value,
) -> Result<TransactionData, ExplorerError> {
    let confirmations = response
        .get("confirmations")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    if confirmations == 0 {
        return Err(ExplorerError::Unconfirmed(transaction_id.to_string()));
    }

    let time = DateTime::parse_from_rfc3339(str_at(response, "/confirmed", SERVICE)?)
        .map_err(|e| ExplorerError::parse(SERVICE.as_str(), e.to_string()))?
        .with_timezone(&Utc);

    let issuing_address = str_at(response, "/inputs/0/addresses/0", SERVICE)?;

    let outputs = response
        .get("outputs")
        .and_then(Value::as_array)
        .ok_or_else(|| ExplorerError::parse(SERVICE.as_str(), "missing outputs"))?;

    let remote_hash = outputs
        .iter()
        .find(|output| output.get("script_type").and_then(Value::as_str) == Some("null-data"))
        .and_then(|output| output.get("data_hex").and_then(Value::as_str))
        .ok_or_else(|| ExplorerError::parse(SERVICE.as_str(), "no null-data output"))?;

    let revoked_addresses = outputs
        .iter()
        .filter(|output| output.get("spent_by").is_some())
        .filter_map(|output| output.get("addresses").and_then(Value::as_array))
        .flatten()
        .filter_map(|address| address.as_str().map(String::from))
        .collect();

    Ok(TransactionData {
        remote_hash: remote_hash.to_lowercase(),
        issuing_address: issuing_address.to_string(),
        time,
        revoked_addresses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::request::MockJsonFetcher;

    #[test]
    fn test_parse_with_spent_outputs() {
        let response = json!({
            "confirmations": 12,
            "confirmed": "2017-06-29T22:10:29Z",
            "inputs": [{"addresses": ["1AwdUWQzJgfDDjeKtpPzMfYMHejFBrxZfo"]}],
            "outputs": [
                {"script_type": "pay-to-pubkey-hash", "addresses": ["1Q3P94rdNyftFBEKiN1fxmt2HnQgSCB619"], "spent_by": "aa"},
                {"script_type": "pay-to-pubkey-hash", "addresses": ["1AwdUWQzJgfDDjeKtpPzMfYMHejFBrxZfo"]},
                {"script_type": "null-data", "data_hex": "B2CEEA1D52627B6ED8D919AD1039EDA4D6F2BF71F7E4BD4F2CCF5D2C3ADCBE26"}
            ]
        });
        let data = parse_blockcypher_transaction("ab", &response).unwrap();
        assert_eq!(
            data.remote_hash,
            "b2ceea1d52627b6ed8d919ad1039eda4d6f2bf71f7e4bd4f2ccf5d2c3adcbe26"
        );
        assert_eq!(data.issuing_address, "1AwdUWQzJgfDDjeKtpPzMfYMHejFBrxZfo");
        assert_eq!(data.revoked_addresses, vec!["1Q3P94rdNyftFBEKiN1fxmt2HnQgSCB619"]);
        assert_eq!(data.time.timestamp(), 1498774229);
    }

    #[test]
    fn test_unconfirmed() {
        let response = json!({"confirmations": 0});
        assert!(matches!(
            parse_blockcypher_transaction("ab", &response),
            Err(ExplorerError::Unconfirmed(_))
        ));
    }

    #[test]
    fn test_token_is_appended() {
        let explorer = BlockcypherExplorer::new(
            ExplorerProvider {
                token: Some("t0k".into()),
                ..ExplorerProvider::new(SERVICE)
            },
            Arc::new(MockJsonFetcher::new()),
        );
        assert_eq!(
            explorer
                .transaction_url("ab", LookupNetwork::BitcoinTestnet)
                .unwrap(),
            "https://api.blockcypher.com/v1/btc/test3/txs/ab?limit=500&token=t0k"
        );
    }
}
