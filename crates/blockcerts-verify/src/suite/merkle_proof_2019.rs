//! MerkleProof2019 proof suite.
//!
//! ```text
//! Constructed -> ProofVerified -> IdentityVerified -> Done
//!      \______________\__________________\___________-> Failed
//! ```
//!
//! The identity stage only runs for credentials signed by a DID.

use std::sync::Arc;

use blockcerts_explorer_lookup::ExplorerFamily;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info};
use url::Url;

use crate::chain::{get_chain, get_transaction_link, Chain, TransactionLinks};
use crate::did::{retrieve_verification_method_public_key, PublicKeyJwk};
use crate::error::VerificationError;
use crate::executor::StepExecutor;
use crate::identity::{derive_issuing_address, ensure_issuing_address_matches};
use crate::inspectors::ensure_valid_issuing_key;
use crate::issuer::{parse_issuer_keys, Issuer, IssuerProfileRetriever, IssuerPublicKeyList};
use crate::proof::VcProof;
use crate::receipt::Receipt;
use crate::steps::{SubStep, VerificationStep};
use crate::suite::anchor::AnchorVerifier;
use crate::suite::SuiteContext;

pub const MERKLE_PROOF_2019: &str = "MerkleProof2019";

/// Suite checks following the anchor checks
pub static PROOF_VERIFICATION_PROCESS: &[SubStep] =
    &[SubStep::ParseIssuerKeys, SubStep::CheckAuthenticity];

pub static IDENTITY_VERIFICATION_PROCESS: &[SubStep] = &[
    SubStep::RetrieveVerificationMethodPublicKey,
    SubStep::DeriveIssuingAddressFromPublicKey,
    SubStep::CompareIssuingAddress,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuiteState {
    Constructed,
    ProofVerified,
    IdentityVerified,
    Done,
    Failed {
        step: Option<SubStep>,
        cause: String,
    },
}

pub struct MerkleProof2019 {
    proof: VcProof,
    issuer: Issuer,
    anchor: AnchorVerifier,
    executor: Arc<dyn StepExecutor>,
    issuer_profiles: Arc<dyn IssuerProfileRetriever>,
    state: SuiteState,
    current_step: Option<SubStep>,
    issuer_public_key_list: Option<IssuerPublicKeyList>,
    verification_method_public_key: Option<PublicKeyJwk>,
    derived_issuing_address: Option<String>,
}

/// Fail construction unless the proof, or the proof it chains, is a MerkleProof2019
pub fn validate_proof_type(proof: &VcProof) -> Result<(), VerificationError> {
    let declared = proof.declared_type();
    if declared != MERKLE_PROOF_2019 {
        return Err(VerificationError::IncompatibleProofType {
            expected: MERKLE_PROOF_2019.to_string(),
            actual: declared.to_string(),
        });
    }
    Ok(())
}

impl MerkleProof2019 {
    /// Validate the proof type, then decode the receipt and select the chain
    pub fn new(context: SuiteContext) -> Result<Self, VerificationError> {
        validate_proof_type(&context.proof)?;

        let receipt = context.decoder.decode(&context.proof.proof_value)?;
        let chain = get_chain(&receipt);
        let family = if context.version.is_v1() {
            Some(ExplorerFamily::V1)
        } else {
            chain.explorer_family()
        };
        let lookup = family
            .map(|family| context.explorers.get(family).clone())
            .unwrap_or_default();
        let anchor = AnchorVerifier::new(
            context.document,
            receipt,
            chain,
            lookup,
            context.hasher,
        )?;
        info!(
            "{} proof anchored on {} in transaction {}",
            MERKLE_PROOF_2019,
            chain.name,
            anchor.transaction_id()
        );

        Ok(Self {
            proof: context.proof,
            issuer: context.issuer,
            anchor,
            executor: context.executor,
            issuer_profiles: context.issuer_profiles,
            state: SuiteState::Constructed,
            current_step: None,
            issuer_public_key_list: None,
            verification_method_public_key: None,
            derived_issuing_address: None,
        })
    }

    pub fn suite_type(&self) -> &'static str {
        MERKLE_PROOF_2019
    }

    pub fn state(&self) -> &SuiteState {
        &self.state
    }

    /// Whether the proof's signer is a DID and the identity stage applies
    pub fn has_did(&self) -> bool {
        if self.proof.is_chained() {
            self.proof.signed_by_did()
        } else {
            self.proof.signed_by_did() || self.issuer.did_document.is_some()
        }
    }

    fn proof_process(&self) -> &'static [SubStep] {
        if self.anchor.chain().is_mock() {
            &[]
        } else {
            PROOF_VERIFICATION_PROCESS
        }
    }

    fn identity_process(&self) -> &'static [SubStep] {
        if self.has_did() {
            IDENTITY_VERIFICATION_PROCESS
        } else {
            &[]
        }
    }

    /// Sub-steps this suite runs for a parent step, in execution order
    pub fn proof_verification_steps(&self, parent: VerificationStep) -> Vec<SubStep> {
        self.anchor
            .process()
            .iter()
            .chain(self.proof_process())
            .copied()
            .filter(|step| step.parent() == parent)
            .collect()
    }

    pub fn identity_verification_steps(&self) -> Vec<SubStep> {
        self.identity_process().to_vec()
    }

    fn fail(&mut self, step: Option<SubStep>, err: &VerificationError) {
        error!("{} failed at {:?}: {}", MERKLE_PROOF_2019, step, err);
        self.state = SuiteState::Failed {
            step,
            cause: err.to_string(),
        };
    }

    /// Verify the anchor, then the issuer keys and authenticity of the signing key
    pub async fn verify_proof(&mut self) -> Result<(), VerificationError> {
        if self.state != SuiteState::Constructed {
            return Err(VerificationError::MissingState(
                "proof verification already ran",
            ));
        }
        self.current_step = None;
        match self.verify_proof_process().await {
            Ok(()) => {
                self.state = SuiteState::ProofVerified;
                Ok(())
            }
            Err(err) => {
                let step = self.current_step.or(self.anchor.current_step());
                self.fail(step, &err);
                Err(err)
            }
        }
    }

    async fn verify_proof_process(&mut self) -> Result<(), VerificationError> {
        self.set_issuer_from_proof_verification_method().await?;
        let executor = self.executor.clone();
        self.anchor
            .verify_proof(executor.as_ref(), MERKLE_PROOF_2019)
            .await?;
        self.verify_process(self.proof_process()).await
    }

    /// Verify that the DID signing the proof controls the anchoring address.
    ///
    /// Completes immediately when the proof is not signed by a DID.
    pub async fn verify_identity(&mut self) -> Result<(), VerificationError> {
        if self.state != SuiteState::ProofVerified {
            return Err(VerificationError::MissingState(
                "identity is verified after the proof",
            ));
        }
        if !self.has_did() {
            debug!("No DID signer, skipping identity verification");
            return Ok(());
        }
        self.current_step = None;
        match self.verify_process(IDENTITY_VERIFICATION_PROCESS).await {
            Ok(()) => {
                self.state = SuiteState::IdentityVerified;
                Ok(())
            }
            Err(err) => {
                self.fail(self.current_step, &err);
                Err(err)
            }
        }
    }

    /// Close the run once the caller is done with the suite
    pub fn complete(&mut self) -> Result<(), VerificationError> {
        match self.state {
            SuiteState::ProofVerified | SuiteState::IdentityVerified => {
                self.state = SuiteState::Done;
                Ok(())
            }
            _ => Err(VerificationError::MissingState(
                "suite completes after proof verification",
            )),
        }
    }

    /// Chained proofs, and DID signers unknown to the current issuer record, designate
    /// the issuer through the verification method
    async fn set_issuer_from_proof_verification_method(&mut self) -> Result<(), VerificationError> {
        let needs_resolution = self.proof.is_chained()
            || (self.proof.signed_by_did() && self.issuer.did_document.is_none());
        if !needs_resolution {
            return Ok(());
        }
        let address = self.proof.verification_method_base().to_string();
        info!("Resolving issuer from verification method {}", address);
        self.issuer = self
            .issuer_profiles
            .get_issuer_profile(Some(&address))
            .await?;
        Ok(())
    }

    async fn verify_process(&mut self, process: &[SubStep]) -> Result<(), VerificationError> {
        for step in process {
            self.current_step = Some(*step);
            self.execute(*step).await?;
        }
        Ok(())
    }

    async fn execute(&mut self, step: SubStep) -> Result<(), VerificationError> {
        match step {
            SubStep::ParseIssuerKeys => self.parse_issuer_keys().await,
            SubStep::CheckAuthenticity => self.check_authenticity().await,
            SubStep::RetrieveVerificationMethodPublicKey => {
                self.retrieve_verification_method_public_key().await
            }
            SubStep::DeriveIssuingAddressFromPublicKey => {
                self.derive_issuing_address_from_public_key().await
            }
            SubStep::CompareIssuingAddress => self.compare_issuing_address().await,
            SubStep::GetTransactionId
            | SubStep::ComputeLocalHash
            | SubStep::FetchRemoteHash
            | SubStep::GetIssuerProfile
            | SubStep::CompareHashes
            | SubStep::CheckImagesIntegrity
            | SubStep::CheckMerkleRoot
            | SubStep::CheckReceipt
            | SubStep::CheckRevokedStatus
            | SubStep::CheckExpiresDate => {
                error!("{} has no handler for {}", MERKLE_PROOF_2019, step);
                Err(VerificationError::NotImplemented(step))
            }
        }
    }

    async fn parse_issuer_keys(&mut self) -> Result<(), VerificationError> {
        let executor = self.executor.clone();
        let issuer = &self.issuer;
        let mut keys = None;
        executor
            .execute_step(
                SubStep::ParseIssuerKeys,
                MERKLE_PROOF_2019,
                Box::pin(async {
                    keys = Some(parse_issuer_keys(issuer)?);
                    Ok::<_, VerificationError>(())
                }),
            )
            .await?;
        self.issuer_public_key_list = keys;
        Ok(())
    }

    async fn check_authenticity(&mut self) -> Result<(), VerificationError> {
        let executor = self.executor.clone();
        let keys = self.issuer_public_key_list.as_ref();
        let issuing_address = self.anchor.issuer_public_key();
        let time = self.issuance_time();
        executor
            .execute_step(
                SubStep::CheckAuthenticity,
                MERKLE_PROOF_2019,
                Box::pin(async move {
                    let keys = keys.ok_or(VerificationError::MissingState("issuer keys"))?;
                    let issuing_address = issuing_address
                        .ok_or(VerificationError::MissingState("issuing address"))?;
                    let time = time.ok_or(VerificationError::MissingState("issuance time"))?;
                    ensure_valid_issuing_key(keys, issuing_address, time)
                }),
            )
            .await
    }

    async fn retrieve_verification_method_public_key(&mut self) -> Result<(), VerificationError> {
        let executor = self.executor.clone();
        let did_document = self.issuer.did_document.as_ref();
        let verification_method = self.proof.verification_method.as_str();
        let mut public_key = None;
        executor
            .execute_step(
                SubStep::RetrieveVerificationMethodPublicKey,
                MERKLE_PROOF_2019,
                Box::pin(async {
                    public_key = Some(retrieve_verification_method_public_key(
                        did_document,
                        verification_method,
                    )?);
                    Ok::<_, VerificationError>(())
                }),
            )
            .await?;
        self.verification_method_public_key = public_key;
        Ok(())
    }

    async fn derive_issuing_address_from_public_key(&mut self) -> Result<(), VerificationError> {
        let executor = self.executor.clone();
        let public_key = self.verification_method_public_key.as_ref();
        let chain = self.anchor.chain();
        let mut derived = None;
        executor
            .execute_step(
                SubStep::DeriveIssuingAddressFromPublicKey,
                MERKLE_PROOF_2019,
                Box::pin(async {
                    let public_key = public_key
                        .ok_or(VerificationError::MissingState("verification method key"))?;
                    derived = Some(derive_issuing_address(public_key, chain)?);
                    Ok::<_, VerificationError>(())
                }),
            )
            .await?;
        self.derived_issuing_address = derived;
        Ok(())
    }

    async fn compare_issuing_address(&mut self) -> Result<(), VerificationError> {
        let executor = self.executor.clone();
        let claimed = self.anchor.issuer_public_key();
        let derived = self.derived_issuing_address.as_deref();
        executor
            .execute_step(
                SubStep::CompareIssuingAddress,
                MERKLE_PROOF_2019,
                Box::pin(async move {
                    let claimed =
                        claimed.ok_or(VerificationError::MissingState("issuing address"))?;
                    let derived =
                        derived.ok_or(VerificationError::MissingState("derived address"))?;
                    ensure_issuing_address_matches(claimed, derived)
                }),
            )
            .await
    }

    pub fn proof(&self) -> &VcProof {
        &self.proof
    }

    pub fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    pub fn issuer_name(&self) -> &str {
        &self.issuer.name
    }

    pub fn issuer_profile_url(&self) -> &str {
        &self.issuer.id
    }

    pub fn issuer_profile_domain(&self) -> Option<String> {
        Url::parse(&self.issuer.id)
            .ok()
            .and_then(|url| url.host_str().map(String::from))
    }

    pub fn signing_date(&self) -> Option<&str> {
        self.proof.created.as_deref()
    }

    pub fn chain(&self) -> &'static Chain {
        self.anchor.chain()
    }

    pub fn receipt(&self) -> &Receipt {
        self.anchor.receipt()
    }

    pub fn transaction_id(&self) -> &str {
        self.anchor.transaction_id()
    }

    pub fn transaction_links(&self) -> TransactionLinks {
        get_transaction_link(self.anchor.transaction_id(), self.anchor.chain())
    }

    /// Anchoring address, known after the transaction lookup
    pub fn issuer_public_key(&self) -> Option<&str> {
        self.anchor.issuer_public_key()
    }

    /// Transaction time, or the proof creation date when no transaction was fetched
    pub fn issuance_time(&self) -> Option<DateTime<Utc>> {
        self.anchor
            .issuance_time()
            .or_else(|| self.proof.created_at())
    }

    pub fn issuer_public_key_list(&self) -> Option<&IssuerPublicKeyList> {
        self.issuer_public_key_list.as_ref()
    }

    /// Addresses the anchoring transaction reports as revoked
    pub fn revoked_addresses(&self) -> &[String] {
        self.anchor
            .transaction()
            .map(|transaction| transaction.revoked_addresses.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use blockcerts_explorer_lookup::ExplorerLookups;
    use serde_json::{json, Value};

    use crate::did::DidDocument;
    use crate::error::IssuerProfileError;
    use crate::executor::ReportingStepExecutor;
    use crate::hasher::MockDocumentHasher;
    use crate::receipt::{Anchor, MockReceiptDecoder};
    use crate::version::CertificateVersion;

    struct NoIssuers;

    #[async_trait]
    impl IssuerProfileRetriever for NoIssuers {
        async fn get_issuer_profile(
            &self,
            _address: Option<&str>,
        ) -> Result<Issuer, IssuerProfileError> {
            Err(IssuerProfileError::MissingAddress)
        }
    }

    fn proof(value: Value) -> VcProof {
        serde_json::from_value(value).unwrap()
    }

    fn context(
        proof: VcProof,
        issuer: Issuer,
        decoder: MockReceiptDecoder,
        hasher: MockDocumentHasher,
    ) -> SuiteContext {
        SuiteContext {
            document: json!({"id": "urn:uuid:1"}),
            proof,
            issuer,
            version: CertificateVersion::V3_0,
            explorers: Arc::new(ExplorerLookups::default()),
            executor: Arc::new(ReportingStepExecutor::new()),
            issuer_profiles: Arc::new(NoIssuers),
            decoder: Arc::new(decoder),
            hasher: Arc::new(hasher),
        }
    }

    fn testnet_receipt() -> Receipt {
        Receipt {
            target_hash: "aa".repeat(32),
            merkle_root: "aa".repeat(32),
            anchors: vec![Anchor::Blink(format!("blink:btc:testnet:{}", "1f".repeat(32)))],
            ..Receipt::default()
        }
    }

    fn merkle_proof(verification_method: &str) -> VcProof {
        proof(json!({
            "type": "MerkleProof2019",
            "proofValue": "z1",
            "verificationMethod": verification_method
        }))
    }

    #[test]
    fn test_mismatching_type_is_rejected_before_decoding() {
        let mut decoder = MockReceiptDecoder::new();
        decoder.expect_decode().never();
        let proof = proof(json!({"type": "Ed25519Signature2020", "proofValue": "z1"}));

        let result = MerkleProof2019::new(context(
            proof,
            Issuer::default(),
            decoder,
            MockDocumentHasher::new(),
        ));
        assert!(matches!(
            result,
            Err(VerificationError::IncompatibleProofType { .. })
        ));
    }

    #[test]
    fn test_decode_failure_is_fatal() {
        let mut decoder = MockReceiptDecoder::new();
        decoder
            .expect_decode()
            .times(1)
            .returning(|_| Err(VerificationError::Decode("not base58".to_string())));

        let result = MerkleProof2019::new(context(
            merkle_proof("https://issuer.example/profile.json#key-1"),
            Issuer::default(),
            decoder,
            MockDocumentHasher::new(),
        ));
        assert!(matches!(result, Err(VerificationError::Decode(_))));
    }

    #[test]
    fn test_signer_detection() {
        let did_document: DidDocument =
            serde_json::from_value(json!({"id": "did:example:issuer"})).unwrap();
        let issuer_with_did = Issuer {
            did_document: Some(did_document),
            ..Issuer::default()
        };
        let suite = |proof: VcProof, issuer: Issuer| {
            let mut decoder = MockReceiptDecoder::new();
            decoder.expect_decode().returning(|_| Ok(testnet_receipt()));
            MerkleProof2019::new(context(proof, issuer, decoder, MockDocumentHasher::new()))
                .unwrap()
        };

        let profile_method = "https://issuer.example/profile.json#key-1";
        assert!(!suite(merkle_proof(profile_method), Issuer::default()).has_did());
        assert!(suite(merkle_proof(profile_method), issuer_with_did.clone()).has_did());
        assert!(suite(merkle_proof("did:example:issuer#key-1"), Issuer::default()).has_did());

        let chained = proof(json!({
            "type": "ChainedProof2021",
            "chainedProofType": "MerkleProof2019",
            "proofValue": "z1",
            "verificationMethod": profile_method
        }));
        assert!(!suite(chained, issuer_with_did).has_did());
    }

    #[tokio::test]
    async fn test_hasher_failure_stops_at_local_hash() {
        let mut decoder = MockReceiptDecoder::new();
        decoder.expect_decode().returning(|_| Ok(testnet_receipt()));
        let mut hasher = MockDocumentHasher::new();
        hasher.expect_hash().times(1).returning(|_| {
            Err(VerificationError::InvalidCertificate(
                "credential is not a JSON object".to_string(),
            ))
        });

        let mut suite = MerkleProof2019::new(context(
            merkle_proof("https://issuer.example/profile.json#key-1"),
            Issuer::default(),
            decoder,
            hasher,
        ))
        .unwrap();
        assert_eq!(suite.transaction_id(), "1f".repeat(32));

        assert!(suite.verify_proof().await.is_err());
        assert!(matches!(
            suite.state(),
            SuiteState::Failed {
                step: Some(SubStep::ComputeLocalHash),
                ..
            }
        ));
        assert!(suite.verify_proof().await.is_err());
    }

    #[tokio::test]
    async fn test_identity_is_skipped_without_did_signer() {
        let mut decoder = MockReceiptDecoder::new();
        decoder.expect_decode().returning(|_| {
            Ok(Receipt {
                anchors: vec![Anchor::Blink("blink:mocknet:abc".to_string())],
                ..testnet_receipt()
            })
        });

        let mut suite = MerkleProof2019::new(context(
            merkle_proof("https://issuer.example/profile.json#key-1"),
            Issuer::default(),
            decoder,
            MockDocumentHasher::new(),
        ))
        .unwrap();
        assert!(suite.identity_verification_steps().is_empty());
        suite.verify_proof().await.unwrap();
        suite.verify_identity().await.unwrap();
        assert_eq!(suite.state(), &SuiteState::ProofVerified);
        suite.complete().unwrap();
        assert_eq!(suite.state(), &SuiteState::Done);
        assert!(suite.transaction_links().transaction_link.is_empty());
    }
}
