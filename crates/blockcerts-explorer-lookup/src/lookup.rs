//! Fallback lookup across an ordered list of transaction providers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{ExplorerError, ProviderFailure};
use crate::merge::default_explorers;
use crate::provider::{ExplorerApi, ExplorerFamily, ExplorerProvider};
use crate::request::JsonFetcher;
use crate::services::provider_for;
use crate::transaction::{LookupNetwork, TransactionData};

/// A single named transaction lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionProvider: Send + Sync {
    fn name(&self) -> String;

    async fn get_transaction_data(
        &self,
        transaction_id: &str,
        network: LookupNetwork,
    ) -> Result<TransactionData, ExplorerError>;
}

/// Resilient lookup: providers are tried in order and the first success wins
#[derive(Clone, Default)]
pub struct ExplorerLookup {
    providers: Vec<Arc<dyn TransactionProvider>>,
}

impl ExplorerLookup {
    pub fn new(providers: Vec<Arc<dyn TransactionProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Look up a transaction, falling back to the next provider on failure.
    ///
    /// Fails with [`ExplorerError::LookupExhausted`] once every provider has failed.
    pub async fn lookup(
        &self,
        transaction_id: &str,
        network: LookupNetwork,
    ) -> Result<TransactionData, ExplorerError> {
        let mut failures = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let name = provider.name();
            debug!("Looking up transaction {} on {} via {}", transaction_id, network, name);
            match provider.get_transaction_data(transaction_id, network).await {
                Ok(data) => {
                    info!("Transaction {} retrieved from {}", transaction_id, name);
                    return Ok(data);
                }
                Err(err) => {
                    warn!("Explorer {} failed for {}: {}", name, transaction_id, err);
                    failures.push(ProviderFailure {
                        service: name,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Err(ExplorerError::LookupExhausted(failures))
    }
}

/// Build the lookup for a merged provider list.
///
/// Providers are ordered by ascending priority; equal priorities keep list order.
pub fn build_lookup(providers: &[ExplorerProvider], fetcher: Arc<dyn JsonFetcher>) -> ExplorerLookup {
    let mut ordered = providers.to_vec();
    ordered.sort_by_key(|provider| provider.priority);
    ExplorerLookup::new(
        ordered
            .iter()
            .map(|provider| provider_for(provider, fetcher.clone()))
            .collect(),
    )
}

/// One lookup per chain family
#[derive(Clone, Default)]
pub struct ExplorerLookups {
    pub bitcoin: ExplorerLookup,
    pub ethereum: ExplorerLookup,
    pub v1: ExplorerLookup,
}

impl ExplorerLookups {
    /// Merge the caller overrides into the defaults and build every family's lookup
    pub fn from_overrides(overrides: &[ExplorerApi], fetcher: Arc<dyn JsonFetcher>) -> Self {
        let explorers = default_explorers(overrides);
        Self {
            bitcoin: build_lookup(&explorers.bitcoin, fetcher.clone()),
            ethereum: build_lookup(&explorers.ethereum, fetcher.clone()),
            v1: build_lookup(&explorers.v1, fetcher),
        }
    }

    pub fn get(&self, family: ExplorerFamily) -> &ExplorerLookup {
        match family {
            ExplorerFamily::Bitcoin => &self.bitcoin,
            ExplorerFamily::Ethereum => &self.ethereum,
            ExplorerFamily::V1 => &self.v1,
        }
    }
}
