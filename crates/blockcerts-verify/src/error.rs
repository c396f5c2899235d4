use blockcerts_explorer_lookup::ExplorerError;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::steps::SubStep;

/// Reasons an issuer profile could not be obtained
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssuerProfileError {
    /// The credential does not reference an issuer profile, or the reference is not a URL
    #[error("Unable to get issuer profile - no issuer address given")]
    MissingAddress,
    /// The profile (or the DID document leading to it) could not be fetched
    #[error("Unable to get issuer profile")]
    Unreachable { url: String, reason: String },
    /// The fetched document is not an issuer profile
    #[error("Unable to get issuer profile - retrieved file does not seem to be a valid profile")]
    InvalidProfile,
}

/// Error types for certificate verification
#[derive(Error, Debug)]
pub enum VerificationError {
    /// The proof is not handled by the selected suite
    #[error("Incompatible proof type passed. Expected: {expected}, Got: {actual}")]
    IncompatibleProofType { expected: String, actual: String },
    /// The proof value could not be decoded into a receipt
    #[error("Failed to decode proof value: {0}")]
    Decode(String),
    /// The credential itself is malformed
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),
    #[error(transparent)]
    IssuerProfile(#[from] IssuerProfileError),
    /// Transaction lookup failure, including exhaustion of every explorer
    #[error(transparent)]
    Explorer(#[from] ExplorerError),
    /// Local document hash differs from the receipt target hash
    #[error("Computed hash does not match remote hash")]
    HashMismatch { local: String, target: String },
    /// Walking the receipt path does not lead to the Merkle root
    #[error("Invalid Merkle Receipt. Proof hash did not match Merkle root")]
    InvalidMerkleReceipt,
    /// Merkle root differs from the hash anchored in the transaction
    #[error("Merkle root does not match remote hash")]
    MerkleRootMismatch { merkle_root: String, remote: String },
    /// The issuing key is unknown to the issuer or was not valid at issuance time
    #[error("Transaction occurred at time when issuing address was not considered valid")]
    Authenticity,
    /// The issuer profile carries no usable key list
    #[error("Unable to parse JSON out of issuer identification data: {0}")]
    IssuerKeys(String),
    /// No address derivation rule exists for this chain
    #[error("Unsupported chain for issuing address derivation: {0}")]
    UnsupportedChain(String),
    /// Verification method or public key could not be resolved from the DID document
    #[error("Unable to retrieve verification method public key: {0}")]
    VerificationMethod(String),
    /// Derived issuing address differs from the anchoring address
    #[error("Issuing address mismatch: expected {claimed}, derived {derived}")]
    IdentityMismatch { claimed: String, derived: String },
    /// A step was requested from a component that has no handler for it
    #[error("Verification step {0} is not implemented")]
    NotImplemented(SubStep),
    /// A step ran before the state it reads was produced
    #[error("Verification state unavailable: {0}")]
    MissingState(&'static str),
    #[error("This certificate has expired on {0}")]
    Expired(DateTime<Utc>),
    #[error("This certificate has been revoked by the issuer{}", .reason.as_deref().map(|r| format!(". Reason given: {r}")).unwrap_or_default())]
    Revoked { reason: Option<String> },
    #[error("One or more images embedded in the certificate are corrupted: {0}")]
    InvalidImage(String),
}
