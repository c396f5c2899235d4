//! Verification step codes and the step tree handed to callers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Parent steps, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerificationStep {
    FormatValidation,
    SignatureVerification,
    IdentityVerification,
    StatusCheck,
}

impl VerificationStep {
    pub const ALL: [VerificationStep; 4] = [
        Self::FormatValidation,
        Self::SignatureVerification,
        Self::IdentityVerification,
        Self::StatusCheck,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::FormatValidation => "formatValidation",
            Self::SignatureVerification => "signatureVerification",
            Self::IdentityVerification => "identityVerification",
            Self::StatusCheck => "statusCheck",
        }
    }

    /// Sub-steps grouped under this parent, in execution order
    pub fn sub_steps(&self) -> &'static [SubStep] {
        match self {
            Self::FormatValidation => &[
                SubStep::GetIssuerProfile,
                SubStep::ParseIssuerKeys,
                SubStep::CheckImagesIntegrity,
            ],
            Self::SignatureVerification => &[
                SubStep::GetTransactionId,
                SubStep::ComputeLocalHash,
                SubStep::FetchRemoteHash,
                SubStep::CompareHashes,
                SubStep::CheckMerkleRoot,
                SubStep::CheckReceipt,
            ],
            Self::IdentityVerification => &[
                SubStep::RetrieveVerificationMethodPublicKey,
                SubStep::DeriveIssuingAddressFromPublicKey,
                SubStep::CompareIssuingAddress,
            ],
            Self::StatusCheck => &[
                SubStep::CheckRevokedStatus,
                SubStep::CheckAuthenticity,
                SubStep::CheckExpiresDate,
            ],
        }
    }
}

impl fmt::Display for VerificationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single verification check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubStep {
    GetTransactionId,
    ComputeLocalHash,
    FetchRemoteHash,
    GetIssuerProfile,
    ParseIssuerKeys,
    CompareHashes,
    CheckImagesIntegrity,
    CheckMerkleRoot,
    CheckReceipt,
    CheckRevokedStatus,
    CheckAuthenticity,
    CheckExpiresDate,
    RetrieveVerificationMethodPublicKey,
    DeriveIssuingAddressFromPublicKey,
    CompareIssuingAddress,
}

impl SubStep {
    /// Canonical set of sub-steps
    pub const ALL: [SubStep; 15] = [
        Self::GetTransactionId,
        Self::ComputeLocalHash,
        Self::FetchRemoteHash,
        Self::GetIssuerProfile,
        Self::ParseIssuerKeys,
        Self::CompareHashes,
        Self::CheckImagesIntegrity,
        Self::CheckMerkleRoot,
        Self::CheckReceipt,
        Self::CheckRevokedStatus,
        Self::CheckAuthenticity,
        Self::CheckExpiresDate,
        Self::RetrieveVerificationMethodPublicKey,
        Self::DeriveIssuingAddressFromPublicKey,
        Self::CompareIssuingAddress,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::GetTransactionId => "getTransactionId",
            Self::ComputeLocalHash => "computeLocalHash",
            Self::FetchRemoteHash => "fetchRemoteHash",
            Self::GetIssuerProfile => "getIssuerProfile",
            Self::ParseIssuerKeys => "parseIssuerKeys",
            Self::CompareHashes => "compareHashes",
            Self::CheckImagesIntegrity => "checkImagesIntegrity",
            Self::CheckMerkleRoot => "checkMerkleRoot",
            Self::CheckReceipt => "checkReceipt",
            Self::CheckRevokedStatus => "checkRevokedStatus",
            Self::CheckAuthenticity => "checkAuthenticity",
            Self::CheckExpiresDate => "checkExpiresDate",
            Self::RetrieveVerificationMethodPublicKey => "retrieveVerificationMethodPublicKey",
            Self::DeriveIssuingAddressFromPublicKey => "deriveIssuingAddressFromPublicKey",
            Self::CompareIssuingAddress => "compareIssuingAddress",
        }
    }

    pub fn parent(&self) -> VerificationStep {
        VerificationStep::ALL
            .into_iter()
            .find(|parent| parent.sub_steps().contains(self))
            .unwrap_or(VerificationStep::FormatValidation)
    }
}

impl fmt::Display for SubStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Planned sub-step with its labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSubstep {
    pub code: SubStep,
    pub label: String,
    pub label_pending: String,
    pub parent_step: VerificationStep,
}

/// Planned parent step with its labelled children
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMapItem {
    pub code: VerificationStep,
    pub label: String,
    pub label_pending: String,
    pub sub_steps: Vec<VerificationSubstep>,
}

impl VerificationMapItem {
    pub fn contains(&self, step: SubStep) -> bool {
        self.sub_steps.iter().any(|sub_step| sub_step.code == step)
    }
}
