//! Proof suites, selected by the declared type of the credential proof.

pub mod anchor;
pub mod merkle_proof_2019;

use std::sync::Arc;

use blockcerts_explorer_lookup::ExplorerLookups;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::chain::{Chain, TransactionLinks};
use crate::error::VerificationError;
use crate::executor::StepExecutor;
use crate::hasher::DocumentHasher;
use crate::issuer::{Issuer, IssuerProfileRetriever};
use crate::proof::VcProof;
use crate::receipt::{Receipt, ReceiptDecoder};
use crate::steps::{SubStep, VerificationStep};
use crate::version::CertificateVersion;

pub use merkle_proof_2019::{MerkleProof2019, SuiteState, MERKLE_PROOF_2019};

/// Everything a suite needs for one verification run
pub struct SuiteContext {
    pub document: Value,
    pub proof: VcProof,
    pub issuer: Issuer,
    pub version: CertificateVersion,
    pub explorers: Arc<ExplorerLookups>,
    pub executor: Arc<dyn StepExecutor>,
    pub issuer_profiles: Arc<dyn IssuerProfileRetriever>,
    pub decoder: Arc<dyn ReceiptDecoder>,
    pub hasher: Arc<dyn DocumentHasher>,
}

/// Supported proof suites
pub enum ProofSuite {
    MerkleProof2019(Box<MerkleProof2019>),
}

impl ProofSuite {
    /// Select the suite handling the proof's declared type
    pub fn new(context: SuiteContext) -> Result<Self, VerificationError> {
        let declared = context.proof.declared_type().to_string();
        match declared.as_str() {
            MERKLE_PROOF_2019 => Ok(Self::MerkleProof2019(Box::new(MerkleProof2019::new(
                context,
            )?))),
            _ => Err(VerificationError::IncompatibleProofType {
                expected: MERKLE_PROOF_2019.to_string(),
                actual: declared.clone(),
            }),
        }
    }

    pub fn suite_type(&self) -> &'static str {
        match self {
            Self::MerkleProof2019(suite) => suite.suite_type(),
        }
    }

    pub fn state(&self) -> &SuiteState {
        match self {
            Self::MerkleProof2019(suite) => suite.state(),
        }
    }

    pub fn has_did(&self) -> bool {
        match self {
            Self::MerkleProof2019(suite) => suite.has_did(),
        }
    }

    pub async fn verify_proof(&mut self) -> Result<(), VerificationError> {
        match self {
            Self::MerkleProof2019(suite) => suite.verify_proof().await,
        }
    }

    pub async fn verify_identity(&mut self) -> Result<(), VerificationError> {
        match self {
            Self::MerkleProof2019(suite) => suite.verify_identity().await,
        }
    }

    pub fn complete(&mut self) -> Result<(), VerificationError> {
        match self {
            Self::MerkleProof2019(suite) => suite.complete(),
        }
    }

    pub fn proof_verification_steps(&self, parent: VerificationStep) -> Vec<SubStep> {
        match self {
            Self::MerkleProof2019(suite) => suite.proof_verification_steps(parent),
        }
    }

    pub fn identity_verification_steps(&self) -> Vec<SubStep> {
        match self {
            Self::MerkleProof2019(suite) => suite.identity_verification_steps(),
        }
    }

    pub fn issuer(&self) -> &Issuer {
        match self {
            Self::MerkleProof2019(suite) => suite.issuer(),
        }
    }

    pub fn issuer_name(&self) -> &str {
        match self {
            Self::MerkleProof2019(suite) => suite.issuer_name(),
        }
    }

    pub fn issuer_profile_url(&self) -> &str {
        match self {
            Self::MerkleProof2019(suite) => suite.issuer_profile_url(),
        }
    }

    pub fn issuer_profile_domain(&self) -> Option<String> {
        match self {
            Self::MerkleProof2019(suite) => suite.issuer_profile_domain(),
        }
    }

    pub fn signing_date(&self) -> Option<&str> {
        match self {
            Self::MerkleProof2019(suite) => suite.signing_date(),
        }
    }

    pub fn chain(&self) -> &'static Chain {
        match self {
            Self::MerkleProof2019(suite) => suite.chain(),
        }
    }

    pub fn receipt(&self) -> &Receipt {
        match self {
            Self::MerkleProof2019(suite) => suite.receipt(),
        }
    }

    pub fn transaction_id(&self) -> &str {
        match self {
            Self::MerkleProof2019(suite) => suite.transaction_id(),
        }
    }

    pub fn transaction_links(&self) -> TransactionLinks {
        match self {
            Self::MerkleProof2019(suite) => suite.transaction_links(),
        }
    }

    pub fn issuer_public_key(&self) -> Option<&str> {
        match self {
            Self::MerkleProof2019(suite) => suite.issuer_public_key(),
        }
    }

    pub fn issuance_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::MerkleProof2019(suite) => suite.issuance_time(),
        }
    }

    pub fn revoked_addresses(&self) -> &[String] {
        match self {
            Self::MerkleProof2019(suite) => suite.revoked_addresses(),
        }
    }
}
