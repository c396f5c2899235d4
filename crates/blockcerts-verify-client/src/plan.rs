//! CLI wrapper planning the verification steps of a credential

use std::path::PathBuf;

use anyhow::anyhow;
use blockcerts_verify::proof::VcProof;
use blockcerts_verify::suite::merkle_proof_2019::validate_proof_type;
use blockcerts_verify::suite::MERKLE_PROOF_2019;
use blockcerts_verify::{
    get_chain, plan, CertificateVersion, EnglishText, MultibaseReceiptDecoder, ReceiptDecoder,
    VerificationMapItem,
};
use clap::Args;
use serde_json::Value;
use tracing::info;

use crate::config::read_credential;
use crate::format::format_plan;

/// CLI arguments for the `plan` subcommand
#[derive(Clone, Debug, Args)]
pub struct PlanArgs {
    /// Path to the credential (JSON)
    #[arg(long)]
    credential: PathBuf,
    /// Draw the step tree instead of printing it as JSON
    #[arg(long, default_value = "false")]
    tree: bool,
}

/// Plan the steps of a credential without network access.
///
/// The signer is only known from the proof, so identity steps are planned for
/// credentials whose proof is signed by a DID.
pub fn plan_offline(document: &Value) -> Result<Vec<VerificationMapItem>, anyhow::Error> {
    let version = CertificateVersion::detect(document)
        .ok_or_else(|| anyhow!("Unknown certificate version"))?;
    let proof = VcProof::from_document(document, MERKLE_PROOF_2019)?;
    validate_proof_type(&proof)?;
    let receipt = MultibaseReceiptDecoder.decode(&proof.proof_value)?;
    let chain = get_chain(&receipt);
    info!("Planning {:?} credential anchored on {}", version, chain.name);
    Ok(plan(Some(chain), version, proof.signed_by_did(), &EnglishText))
}

/// Run the `plan` subcommand: print the planned step tree as JSON
pub async fn run(args: PlanArgs) -> Result<(), anyhow::Error> {
    let document = read_credential(&args.credential)?;
    let steps = plan_offline(&document)?;
    if args.tree {
        println!("{}", format_plan(&steps));
    } else {
        println!("{}", serde_json::to_string_pretty(&steps)?);
    }
    Ok(())
}
