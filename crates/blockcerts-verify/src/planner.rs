//! Verification step planning.
//!
//! The plan is built directly from immutable inputs: the canonical sub-step list is
//! filtered for the chain and version, then grouped under the fixed parent steps.

use crate::chain::Chain;
use crate::steps::{SubStep, VerificationMapItem, VerificationStep, VerificationSubstep};
use crate::text::{TextCategory, TextLookup};
use crate::version::CertificateVersion;

/// Sub-steps that need a real ledger or an issuer profile
pub static MOCK_CHAIN_EXCLUDED_STEPS: &[SubStep] = &[
    SubStep::GetTransactionId,
    SubStep::ComputeLocalHash,
    SubStep::FetchRemoteHash,
    SubStep::GetIssuerProfile,
    SubStep::ParseIssuerKeys,
    SubStep::CompareHashes,
    SubStep::CheckMerkleRoot,
    SubStep::CheckReceipt,
    SubStep::CheckRevokedStatus,
    SubStep::CheckAuthenticity,
];

/// v3 credentials resolve their issuer during signature verification
pub static V3_EXCLUDED_STEPS: &[SubStep] = &[SubStep::GetIssuerProfile];

/// Sub-steps applicable to a chain and version, in canonical order
pub fn applicable_sub_steps(chain: &Chain, version: CertificateVersion) -> Vec<SubStep> {
    SubStep::ALL
        .into_iter()
        .filter(|step| !(chain.is_mock() && MOCK_CHAIN_EXCLUDED_STEPS.contains(step)))
        .filter(|step| !(version.is_v3() && V3_EXCLUDED_STEPS.contains(step)))
        .collect()
}

fn label(text: &dyn TextLookup, category: TextCategory, code: &str) -> (String, String) {
    (
        text.get_text(category, &format!("{code}Label")),
        text.get_text(category, &format!("{code}LabelPending")),
    )
}

/// Build the ordered step tree for a verification run.
///
/// Every parent step is present, possibly without children. Identity verification
/// children are only planned for credentials signed by a DID. No chain yields an
/// empty plan.
pub fn plan(
    chain: Option<&Chain>,
    version: CertificateVersion,
    has_identity_signer: bool,
    text: &dyn TextLookup,
) -> Vec<VerificationMapItem> {
    let Some(chain) = chain else {
        return Vec::new();
    };
    let applicable = applicable_sub_steps(chain, version);

    VerificationStep::ALL
        .into_iter()
        .map(|parent| {
            let sub_steps = if parent == VerificationStep::IdentityVerification
                && !has_identity_signer
            {
                Vec::new()
            } else {
                parent
                    .sub_steps()
                    .iter()
                    .filter(|step| applicable.contains(*step))
                    .map(|step| {
                        let (label, label_pending) =
                            label(text, TextCategory::SubSteps, step.code());
                        VerificationSubstep {
                            code: *step,
                            label,
                            label_pending,
                            parent_step: parent,
                        }
                    })
                    .collect()
            };
            let (label, label_pending) = label(text, TextCategory::Steps, parent.code());
            VerificationMapItem {
                code: parent,
                label,
                label_pending,
                sub_steps,
            }
        })
        .collect()
}
