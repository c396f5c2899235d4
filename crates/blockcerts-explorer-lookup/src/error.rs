use thiserror::Error;

/// A single failed provider attempt, kept to report an exhausted lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// Name of the provider that failed
    pub service: String,
    /// Rendered failure cause
    pub reason: String,
}

/// Error types for explorer lookups and the underlying HTTP requests
#[derive(Error, Debug)]
pub enum ExplorerError {
    /// HTTP transport or status errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    /// Invalid endpoint URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The explorer answered with a document we could not interpret
    #[error("Failed to parse {service} response: {reason}")]
    Parse { service: String, reason: String },
    /// The transaction exists but is not confirmed yet
    #[error("Transaction {0} is not confirmed yet")]
    Unconfirmed(String),
    /// The explorer has no endpoint for the requested network
    #[error("{service} does not support network {network}")]
    UnsupportedNetwork { service: String, network: String },
    /// Service name is not one of the recognized explorers
    #[error("Unknown explorer service: {0}")]
    UnknownService(String),
    /// Every configured provider failed
    #[error(
        "Could not confirm the transaction. No blockchain apis returned a response ({})",
        format_failures(.0)
    )]
    LookupExhausted(Vec<ProviderFailure>),
}

impl ExplorerError {
    pub(crate) fn parse(service: impl Into<String>, reason: impl Into<String>) -> Self {
        ExplorerError::Parse {
            service: service.into(),
            reason: reason.into(),
        }
    }
}

fn format_failures(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return "no explorer configured".to_string();
    }
    failures
        .iter()
        .map(|failure| format!("{}: {}", failure.service, failure.reason))
        .collect::<Vec<_>>()
        .join("; ")
}
