//! Verification of the blockchain anchor of a Merkle receipt.
//!
//! Recomputes the credential hash, looks the anchoring transaction up through the
//! explorers and checks that the receipt links both together.

use std::sync::Arc;

use blockcerts_explorer_lookup::{ExplorerLookup, TransactionData};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::chain::Chain;
use crate::error::VerificationError;
use crate::executor::StepExecutor;
use crate::hasher::DocumentHasher;
use crate::inspectors::{ensure_hashes_equal, ensure_merkle_root_equal, ensure_valid_receipt};
use crate::receipt::Receipt;
use crate::steps::SubStep;

/// Anchor checks, in execution order
pub static ANCHOR_VERIFICATION_PROCESS: &[SubStep] = &[
    SubStep::GetTransactionId,
    SubStep::ComputeLocalHash,
    SubStep::FetchRemoteHash,
    SubStep::CompareHashes,
    SubStep::CheckMerkleRoot,
    SubStep::CheckReceipt,
];

pub struct AnchorVerifier {
    document: Value,
    receipt: Receipt,
    chain: &'static Chain,
    transaction_id: String,
    lookup: ExplorerLookup,
    hasher: Arc<dyn DocumentHasher>,
    local_hash: Option<String>,
    transaction: Option<TransactionData>,
    current_step: Option<SubStep>,
}

impl AnchorVerifier {
    pub fn new(
        document: Value,
        receipt: Receipt,
        chain: &'static Chain,
        lookup: ExplorerLookup,
        hasher: Arc<dyn DocumentHasher>,
    ) -> Result<Self, VerificationError> {
        let transaction_id = receipt.transaction_id()?.to_string();
        Ok(Self {
            document,
            receipt,
            chain,
            transaction_id,
            lookup,
            hasher,
            local_hash: None,
            transaction: None,
            current_step: None,
        })
    }

    /// Mock chains have no transaction to check
    pub fn process(&self) -> &'static [SubStep] {
        if self.chain.is_mock() {
            &[]
        } else {
            ANCHOR_VERIFICATION_PROCESS
        }
    }

    pub fn receipt(&self) -> &Receipt {
        &self.receipt
    }

    pub fn chain(&self) -> &'static Chain {
        self.chain
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn local_hash(&self) -> Option<&str> {
        self.local_hash.as_deref()
    }

    pub fn transaction(&self) -> Option<&TransactionData> {
        self.transaction.as_ref()
    }

    /// Address that signed the anchoring transaction, known once it was fetched
    pub fn issuer_public_key(&self) -> Option<&str> {
        self.transaction
            .as_ref()
            .map(|transaction| transaction.issuing_address.as_str())
    }

    pub fn issuance_time(&self) -> Option<DateTime<Utc>> {
        self.transaction.as_ref().map(|transaction| transaction.time)
    }

    /// Last step started, kept to report failures
    pub fn current_step(&self) -> Option<SubStep> {
        self.current_step
    }

    pub async fn verify_proof(
        &mut self,
        executor: &dyn StepExecutor,
        suite: &str,
    ) -> Result<(), VerificationError> {
        for step in self.process() {
            self.current_step = Some(*step);
            self.execute(*step, executor, suite).await?;
        }
        Ok(())
    }

    async fn execute(
        &mut self,
        step: SubStep,
        executor: &dyn StepExecutor,
        suite: &str,
    ) -> Result<(), VerificationError> {
        match step {
            SubStep::GetTransactionId => self.get_transaction_id(executor, suite).await,
            SubStep::ComputeLocalHash => self.compute_local_hash(executor, suite).await,
            SubStep::FetchRemoteHash => self.fetch_remote_hash(executor, suite).await,
            SubStep::CompareHashes => self.compare_hashes(executor, suite).await,
            SubStep::CheckMerkleRoot => self.check_merkle_root(executor, suite).await,
            SubStep::CheckReceipt => self.check_receipt(executor, suite).await,
            SubStep::GetIssuerProfile
            | SubStep::ParseIssuerKeys
            | SubStep::CheckImagesIntegrity
            | SubStep::CheckRevokedStatus
            | SubStep::CheckAuthenticity
            | SubStep::CheckExpiresDate
            | SubStep::RetrieveVerificationMethodPublicKey
            | SubStep::DeriveIssuingAddressFromPublicKey
            | SubStep::CompareIssuingAddress => Err(VerificationError::NotImplemented(step)),
        }
    }

    async fn get_transaction_id(
        &mut self,
        executor: &dyn StepExecutor,
        suite: &str,
    ) -> Result<(), VerificationError> {
        let transaction_id = self.transaction_id.as_str();
        executor
            .execute_step(
                SubStep::GetTransactionId,
                suite,
                Box::pin(async move {
                    if transaction_id.is_empty() {
                        return Err(VerificationError::Decode(
                            "receipt anchor carries no transaction id".to_string(),
                        ));
                    }
                    debug!("Anchoring transaction {}", transaction_id);
                    Ok(())
                }),
            )
            .await
    }

    async fn compute_local_hash(
        &mut self,
        executor: &dyn StepExecutor,
        suite: &str,
    ) -> Result<(), VerificationError> {
        let hasher = self.hasher.clone();
        let document = &self.document;
        let mut local_hash = None;
        executor
            .execute_step(
                SubStep::ComputeLocalHash,
                suite,
                Box::pin(async {
                    local_hash = Some(hasher.hash(document)?);
                    Ok::<_, VerificationError>(())
                }),
            )
            .await?;
        self.local_hash = local_hash;
        Ok(())
    }

    async fn fetch_remote_hash(
        &mut self,
        executor: &dyn StepExecutor,
        suite: &str,
    ) -> Result<(), VerificationError> {
        let lookup = &self.lookup;
        let chain = self.chain;
        let transaction_id = self.transaction_id.as_str();
        let mut transaction = None;
        executor
            .execute_step(
                SubStep::FetchRemoteHash,
                suite,
                Box::pin(async {
                    let network = chain
                        .lookup_network()
                        .ok_or_else(|| VerificationError::UnsupportedChain(chain.name.to_string()))?;
                    transaction = Some(lookup.lookup(transaction_id, network).await?);
                    Ok::<_, VerificationError>(())
                }),
            )
            .await?;
        self.transaction = transaction;
        Ok(())
    }

    async fn compare_hashes(
        &mut self,
        executor: &dyn StepExecutor,
        suite: &str,
    ) -> Result<(), VerificationError> {
        let local_hash = self.local_hash.as_deref();
        let target_hash = self.receipt.target_hash.as_str();
        executor
            .execute_step(
                SubStep::CompareHashes,
                suite,
                Box::pin(async move {
                    let local_hash =
                        local_hash.ok_or(VerificationError::MissingState("local hash"))?;
                    ensure_hashes_equal(local_hash, target_hash)
                }),
            )
            .await
    }

    async fn check_merkle_root(
        &mut self,
        executor: &dyn StepExecutor,
        suite: &str,
    ) -> Result<(), VerificationError> {
        let merkle_root = self.receipt.merkle_root.as_str();
        let remote_hash = self
            .transaction
            .as_ref()
            .map(|transaction| transaction.remote_hash.as_str());
        executor
            .execute_step(
                SubStep::CheckMerkleRoot,
                suite,
                Box::pin(async move {
                    let remote_hash =
                        remote_hash.ok_or(VerificationError::MissingState("remote hash"))?;
                    ensure_merkle_root_equal(merkle_root, remote_hash)
                }),
            )
            .await
    }

    async fn check_receipt(
        &mut self,
        executor: &dyn StepExecutor,
        suite: &str,
    ) -> Result<(), VerificationError> {
        let receipt = &self.receipt;
        executor
            .execute_step(
                SubStep::CheckReceipt,
                suite,
                Box::pin(async move { ensure_valid_receipt(receipt) }),
            )
            .await
    }
}
