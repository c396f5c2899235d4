//! Verification of a whole credential: plans the steps, builds the proof suite and
//! runs every planned step through the step executor.

use std::sync::Arc;

use blockcerts_explorer_lookup::{ExplorerLookups, HttpJsonClient, JsonFetcher};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::VerifierConfig;
use crate::error::{IssuerProfileError, VerificationError};
use crate::executor::{ReportingStepExecutor, StepExecutor, StepStatus};
use crate::hasher::{DocumentHasher, Sha256JsonHasher};
use crate::inspectors::{
    ensure_not_expired, ensure_not_revoked, ensure_revocation_keys_unspent, ensure_valid_images,
};
use crate::issuer::{HttpIssuerProfileRetriever, Issuer, IssuerProfileRetriever};
use crate::planner::plan;
use crate::proof::VcProof;
use crate::receipt::{MultibaseReceiptDecoder, ReceiptDecoder};
use crate::steps::{SubStep, VerificationMapItem};
use crate::suite::merkle_proof_2019::validate_proof_type;
use crate::suite::{ProofSuite, SuiteContext, MERKLE_PROOF_2019};
use crate::text::{EnglishText, TextLookup};
use crate::version::CertificateVersion;

/// Name reported to the step executor for checks that do not belong to a proof suite
pub const CERTIFICATE_CHECKS: &str = "Certificate";

static REVOCATION_LIST_STATUS_TYPES: &[&str] = &["RevocationList", "BlockcertsRevocationList"];

static REVOCATION_KEY_POINTERS: &[&str] =
    &["/recipient/revocationKey", "/document/recipient/revocationKey"];

static EXPIRATION_POINTERS: &[&str] = &["/expirationDate", "/expires", "/badge/expires"];

/// Collaborators of a verification run
#[derive(Clone)]
pub struct VerifierDependencies {
    pub fetcher: Arc<dyn JsonFetcher>,
    pub executor: Arc<dyn StepExecutor>,
    pub issuer_profiles: Arc<dyn IssuerProfileRetriever>,
    pub decoder: Arc<dyn ReceiptDecoder>,
    pub hasher: Arc<dyn DocumentHasher>,
    pub text: Arc<dyn TextLookup>,
}

impl VerifierDependencies {
    /// HTTP backed collaborators built from the configuration
    pub fn http(
        config: &VerifierConfig,
        executor: Arc<dyn StepExecutor>,
    ) -> Result<Self, VerificationError> {
        let fetcher: Arc<dyn JsonFetcher> =
            Arc::new(HttpJsonClient::with_timeout(config.request_timeout())?);
        Ok(Self {
            issuer_profiles: Arc::new(HttpIssuerProfileRetriever::new(
                fetcher.clone(),
                config.did_resolver_url.clone(),
            )),
            fetcher,
            executor,
            decoder: Arc::new(MultibaseReceiptDecoder),
            hasher: Arc::new(Sha256JsonHasher),
            text: Arc::new(EnglishText),
        })
    }

    /// HTTP collaborators with a [`ReportingStepExecutor`]
    pub fn with_defaults(config: &VerifierConfig) -> Result<Self, VerificationError> {
        Self::http(config, Arc::new(ReportingStepExecutor::new()))
    }
}

/// Final outcome of a verification run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl VerificationResult {
    pub fn success() -> Self {
        Self {
            status: StepStatus::Success,
            message: None,
        }
    }

    pub fn failure(err: &VerificationError) -> Self {
        Self {
            status: StepStatus::Failure,
            message: Some(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

pub struct Verifier {
    document: Value,
    version: CertificateVersion,
    suite: ProofSuite,
    executor: Arc<dyn StepExecutor>,
    fetcher: Arc<dyn JsonFetcher>,
    verification_steps: Vec<VerificationMapItem>,
}

impl Verifier {
    /// Prepare the verification of a credential.
    ///
    /// Fails before any step runs when the proof type is not supported, when the
    /// issuer profile cannot be retrieved or when the proof value cannot be decoded.
    pub async fn new(
        document: Value,
        config: &VerifierConfig,
        dependencies: VerifierDependencies,
    ) -> Result<Self, VerificationError> {
        let version = CertificateVersion::detect(&document).ok_or_else(|| {
            VerificationError::InvalidCertificate("unknown certificate version".to_string())
        })?;
        let proof = VcProof::from_document(&document, MERKLE_PROOF_2019)?;
        validate_proof_type(&proof)?;

        let issuer = dependencies
            .issuer_profiles
            .get_issuer_profile(Issuer::reference(&document))
            .await?;
        info!("Verifying {:?} certificate issued by {}", version, issuer.name);

        let explorers = Arc::new(ExplorerLookups::from_overrides(
            &config.explorer_apis,
            dependencies.fetcher.clone(),
        ));
        let suite = ProofSuite::new(SuiteContext {
            document: document.clone(),
            proof,
            issuer,
            version,
            explorers,
            executor: dependencies.executor.clone(),
            issuer_profiles: dependencies.issuer_profiles.clone(),
            decoder: dependencies.decoder.clone(),
            hasher: dependencies.hasher.clone(),
        })?;
        let verification_steps = plan(
            Some(suite.chain()),
            version,
            suite.has_did(),
            dependencies.text.as_ref(),
        );

        Ok(Self {
            document,
            version,
            suite,
            executor: dependencies.executor,
            fetcher: dependencies.fetcher,
            verification_steps,
        })
    }

    pub fn version(&self) -> CertificateVersion {
        self.version
    }

    pub fn suite(&self) -> &ProofSuite {
        &self.suite
    }

    /// Planned step tree
    pub fn verification_steps(&self) -> &[VerificationMapItem] {
        &self.verification_steps
    }

    fn is_planned(&self, step: SubStep) -> bool {
        self.verification_steps
            .iter()
            .any(|parent| parent.contains(step))
    }

    /// Run every planned step, stopping at the first failure
    pub async fn verify(&mut self) -> VerificationResult {
        match self.run().await {
            Ok(()) => {
                info!("Certificate verified");
                VerificationResult::success()
            }
            Err(err) => {
                warn!("Certificate verification failed: {}", err);
                VerificationResult::failure(&err)
            }
        }
    }

    async fn run(&mut self) -> Result<(), VerificationError> {
        if self.is_planned(SubStep::GetIssuerProfile) {
            self.check_issuer_profile().await?;
        }
        if self.is_planned(SubStep::CheckImagesIntegrity) {
            self.check_images_integrity().await?;
        }
        self.suite.verify_proof().await?;
        self.suite.verify_identity().await?;
        if self.is_planned(SubStep::CheckRevokedStatus) {
            self.check_revoked_status().await?;
        }
        if self.is_planned(SubStep::CheckExpiresDate) {
            self.check_expires_date().await?;
        }
        self.suite.complete()
    }

    async fn check_issuer_profile(&self) -> Result<(), VerificationError> {
        let issuer = self.suite.issuer();
        self.executor
            .execute_step(
                SubStep::GetIssuerProfile,
                CERTIFICATE_CHECKS,
                Box::pin(async move {
                    if issuer.public_key.is_none() && issuer.issuer_keys.is_none() {
                        return Err(VerificationError::IssuerProfile(
                            IssuerProfileError::InvalidProfile,
                        ));
                    }
                    Ok(())
                }),
            )
            .await
    }

    async fn check_images_integrity(&self) -> Result<(), VerificationError> {
        let document = &self.document;
        self.executor
            .execute_step(
                SubStep::CheckImagesIntegrity,
                CERTIFICATE_CHECKS,
                Box::pin(async move { ensure_valid_images(document) }),
            )
            .await
    }

    /// Revocation list declared by the credential status, or else by the issuer
    fn revocation_list_url(&self) -> Option<&str> {
        let status = self.document.get("credentialStatus");
        let declared_by_status = status
            .filter(|status| {
                status
                    .get("type")
                    .and_then(Value::as_str)
                    .is_some_and(|t| REVOCATION_LIST_STATUS_TYPES.contains(&t))
            })
            .and_then(|status| status.get("id"))
            .and_then(Value::as_str);
        declared_by_status.or(self.suite.issuer().revocation_list.as_deref())
    }

    async fn check_revoked_status(&self) -> Result<(), VerificationError> {
        let fetcher = &self.fetcher;
        let url = self.revocation_list_url();
        let credential_id = self.document.get("id").and_then(Value::as_str);
        let revocation_keys: Vec<&str> = REVOCATION_KEY_POINTERS
            .iter()
            .filter_map(|pointer| self.document.pointer(pointer).and_then(Value::as_str))
            .collect();
        let revoked_addresses = self.suite.revoked_addresses();
        self.executor
            .execute_step(
                SubStep::CheckRevokedStatus,
                CERTIFICATE_CHECKS,
                Box::pin(async move {
                    let list = match url {
                        Some(url) => Some(fetcher.get_json(url).await?),
                        None => None,
                    };
                    ensure_not_revoked(list.as_ref(), credential_id)?;
                    ensure_revocation_keys_unspent(&revocation_keys, revoked_addresses)
                }),
            )
            .await
    }

    fn expiration_date(&self) -> Result<Option<DateTime<Utc>>, VerificationError> {
        let Some(raw) = EXPIRATION_POINTERS
            .iter()
            .find_map(|pointer| self.document.pointer(pointer).and_then(Value::as_str))
        else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(raw)
            .map(|date| Some(date.with_timezone(&Utc)))
            .map_err(|e| {
                VerificationError::InvalidCertificate(format!("invalid expiration date {raw}: {e}"))
            })
    }

    async fn check_expires_date(&self) -> Result<(), VerificationError> {
        let expires = self.expiration_date();
        self.executor
            .execute_step(
                SubStep::CheckExpiresDate,
                CERTIFICATE_CHECKS,
                Box::pin(async move { ensure_not_expired(expires?, Utc::now()) }),
            )
            .await
    }
}
