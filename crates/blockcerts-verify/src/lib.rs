//! Blockcerts verification library
//!
//! This crate verifies blockchain-anchored credentials: it plans the verification steps
//! for a chain and certificate version, decodes MerkleProof2019 receipts, checks them
//! against the anchoring transaction, and correlates DID signers with the address that
//! anchored the credential.

pub mod chain;
pub mod config;
pub mod did;
pub mod error;
pub mod executor;
pub mod hasher;
pub mod identity;
pub mod inspectors;
pub mod issuer;
pub mod planner;
pub mod proof;
pub mod receipt;
pub mod steps;
pub mod suite;
pub mod text;
pub mod verifier;
pub mod version;

#[cfg(test)]
mod test_utils;

pub use chain::{get_chain, get_transaction_link, Chain, ChainCode, TransactionLinks};
pub use config::VerifierConfig;
pub use error::{IssuerProfileError, VerificationError};
pub use executor::{ReportingStepExecutor, StepAction, StepExecutor, StepReport, StepStatus};
pub use identity::{compare_issuing_address, derive_issuing_address};
pub use issuer::{HttpIssuerProfileRetriever, Issuer, IssuerProfileRetriever};
pub use planner::plan;
pub use receipt::{MultibaseReceiptDecoder, Receipt, ReceiptDecoder};
pub use steps::{SubStep, VerificationMapItem, VerificationStep, VerificationSubstep};
pub use suite::{MerkleProof2019, ProofSuite, SuiteContext, SuiteState};
pub use text::{EnglishText, TextCategory, TextLookup};
pub use verifier::{VerificationResult, Verifier, VerifierDependencies};
pub use version::CertificateVersion;
