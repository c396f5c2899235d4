use std::time::Duration;

use blockcerts_explorer_lookup::ExplorerApi;
use serde::{Deserialize, Serialize};

use crate::issuer::DEFAULT_DID_RESOLVER_URL;

/// Verifier configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifierConfig {
    /// Overrides of the default explorers (custom endpoints, tokens, priorities)
    pub explorer_apis: Vec<ExplorerApi>,
    /// Base URL the DID is appended to when resolving DID issuers
    pub did_resolver_url: String,
    /// Timeout of every HTTP request, in seconds
    pub request_timeout_secs: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            explorer_apis: Vec::new(),
            did_resolver_url: DEFAULT_DID_RESOLVER_URL.to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl VerifierConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
