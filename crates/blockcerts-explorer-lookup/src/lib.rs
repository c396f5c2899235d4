//! Blockchain explorer lookup for anchored certificates
//!
//! This crate turns a list of transaction-lookup providers (built-in defaults per chain
//! family, possibly overridden by caller configuration) into a single lookup operation
//! that falls back from one provider to the next until one of them returns usable
//! transaction data.

pub mod error;
pub mod lookup;
pub mod merge;
pub mod provider;
pub mod request;
pub mod services;
pub mod transaction;

pub use error::{ExplorerError, ProviderFailure};
pub use lookup::{build_lookup, ExplorerLookup, ExplorerLookups, TransactionProvider};
pub use merge::{default_explorers, merge_overrides, merge_overrides_with, DefaultExplorersPerChain};
pub use provider::{ExplorerApi, ExplorerFamily, ExplorerProvider, TransactionService};
pub use request::{HttpJsonClient, JsonFetcher};
pub use transaction::{LookupNetwork, TransactionData};
