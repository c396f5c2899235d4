//! Merging of caller-supplied explorer overrides into the default provider sets.

use std::collections::BTreeSet;

use crate::provider::{default_providers, ExplorerApi, ExplorerFamily, ExplorerProvider, TransactionService};

/// Outcome of merging overrides into one default list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedExplorers {
    pub providers: Vec<ExplorerProvider>,
    /// Services whose override has been applied so far, this merge included
    pub consumed: BTreeSet<TransactionService>,
}

/// Merged provider lists of every chain family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultExplorersPerChain {
    pub bitcoin: Vec<ExplorerProvider>,
    pub ethereum: Vec<ExplorerProvider>,
    pub v1: Vec<ExplorerProvider>,
}

impl DefaultExplorersPerChain {
    pub fn get(&self, family: ExplorerFamily) -> &[ExplorerProvider] {
        match family {
            ExplorerFamily::Bitcoin => &self.bitcoin,
            ExplorerFamily::Ethereum => &self.ethereum,
            ExplorerFamily::V1 => &self.v1,
        }
    }
}

/// Apply caller overrides to a default provider list.
///
/// Defaults keep their order. A default whose service is named by a caller entry is
/// replaced by the shallow merge of both records; other defaults pass through unchanged.
/// Caller entries with unrecognized names are ignored.
pub fn merge_overrides(
    overrides: &[ExplorerApi],
    defaults: &[ExplorerProvider],
) -> Vec<ExplorerProvider> {
    merge_overrides_with(overrides, defaults, &BTreeSet::new()).providers
}

/// Same as [`merge_overrides`], skipping overrides already consumed by a previous merge.
pub fn merge_overrides_with(
    overrides: &[ExplorerApi],
    defaults: &[ExplorerProvider],
    consumed: &BTreeSet<TransactionService>,
) -> MergedExplorers {
    let available: Vec<(TransactionService, &ExplorerApi)> = overrides
        .iter()
        .filter_map(|api| api.service().map(|service| (service, api)))
        .filter(|(service, _)| !consumed.contains(service))
        .collect();

    let mut consumed = consumed.clone();
    if available.is_empty() {
        return MergedExplorers {
            providers: defaults.to_vec(),
            consumed,
        };
    }

    let providers = defaults
        .iter()
        .map(|default| {
            match available
                .iter()
                .find(|(service, _)| *service == default.service)
            {
                Some((service, api)) => {
                    consumed.insert(*service);
                    default.with_override(api)
                }
                None => default.clone(),
            }
        })
        .collect();

    MergedExplorers {
        providers,
        consumed,
    }
}

/// Merge overrides into the bitcoin, ethereum and v1 defaults, in that order.
///
/// An override is applied to the first family that contains its service only.
pub fn default_explorers(overrides: &[ExplorerApi]) -> DefaultExplorersPerChain {
    let bitcoin = merge_overrides_with(
        overrides,
        &default_providers(ExplorerFamily::Bitcoin),
        &BTreeSet::new(),
    );
    let ethereum = merge_overrides_with(
        overrides,
        &default_providers(ExplorerFamily::Ethereum),
        &bitcoin.consumed,
    );
    let v1 = merge_overrides_with(
        overrides,
        &default_providers(ExplorerFamily::V1),
        &ethereum.consumed,
    );

    DefaultExplorersPerChain {
        bitcoin: bitcoin.providers,
        ethereum: ethereum.providers,
        v1: v1.providers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(name: &str, endpoint: Option<&str>, token: Option<&str>) -> ExplorerApi {
        ExplorerApi {
            service_name: Some(name.to_string()),
            endpoint: endpoint.map(String::from),
            token: token.map(String::from),
            priority: None,
        }
    }

    #[test]
    fn test_no_recognized_overrides_returns_defaults() {
        let defaults = default_providers(ExplorerFamily::Bitcoin);
        let overrides = vec![api("infura", Some("https://x"), None), ExplorerApi::default()];
        assert_eq!(merge_overrides(&overrides, &defaults), defaults);
        assert_eq!(merge_overrides(&[], &defaults), defaults);
    }

    #[test]
    fn test_matching_override_replaces_default_in_place() {
        let defaults = default_providers(ExplorerFamily::Bitcoin);
        let overrides = vec![api("blockstream", Some("https://my-esplora"), None)];
        let merged = merge_overrides(&overrides, &defaults);

        assert_eq!(merged.len(), defaults.len());
        assert_eq!(merged[0], defaults[0]);
        assert_eq!(merged[1].service, TransactionService::Blockstream);
        assert_eq!(merged[1].endpoint.as_deref(), Some("https://my-esplora"));
        assert_eq!(merged[1].priority, defaults[1].priority);
        assert_eq!(merged[2], defaults[2]);
    }

    #[test]
    fn test_recognized_override_absent_from_defaults_is_ignored() {
        let defaults = default_providers(ExplorerFamily::Bitcoin);
        let merged = merge_overrides_with(
            &[api("etherscan", None, Some("key"))],
            &defaults,
            &BTreeSet::new(),
        );
        assert_eq!(merged.providers, defaults);
        assert!(merged.consumed.is_empty());
    }

    #[test]
    fn test_override_is_consumed_by_first_family() {
        let overrides = vec![
            api("blockcypher", None, Some("cypher-token")),
            api("etherscan", None, Some("scan-token")),
        ];
        let explorers = default_explorers(&overrides);

        assert_eq!(explorers.bitcoin[0].token.as_deref(), Some("cypher-token"));
        assert_eq!(explorers.ethereum[0].token.as_deref(), Some("scan-token"));
        // blockcypher override was already used by the bitcoin family
        assert_eq!(explorers.v1, default_providers(ExplorerFamily::V1));
        // caller input is untouched
        assert_eq!(overrides[0].token.as_deref(), Some("cypher-token"));
    }
}
