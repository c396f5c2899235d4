//! CLI wrapper for the verify functionality

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use blockcerts_explorer_lookup::ExplorerApi;
use blockcerts_verify::{
    EnglishText, ReportingStepExecutor, StepReport, VerificationResult, Verifier,
    VerifierDependencies,
};
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::config::{load_config, parse_explorer_api, read_credential, with_token};
use crate::format::{format_plan, format_report, format_result};

/// CLI arguments for the `verify` subcommand
#[derive(Clone, Debug, Args)]
pub struct VerifyArgs {
    /// Path to the credential (JSON)
    #[arg(long)]
    credential: PathBuf,
    /// Verifier configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Explorer override as `name[,endpoint][,token]`, may be repeated
    #[arg(long = "explorer-api", value_parser = parse_explorer_api)]
    explorer_apis: Vec<ExplorerApi>,
    /// Etherscan API key
    #[arg(long, env = "ETHERSCAN_API_KEY")]
    etherscan_api_key: Option<String>,
    /// Blockcypher token
    #[arg(long, env = "BLOCKCYPHER_TOKEN")]
    blockcypher_token: Option<String>,
    /// Print the step outcomes and the result as JSON
    #[arg(long, default_value = "false")]
    json: bool,
}

#[derive(Serialize)]
struct VerificationOutput {
    steps: Vec<StepReport>,
    result: VerificationResult,
}

/// Run the `verify` subcommand: verify a credential read from disk
///
/// Returns an error if the verifier cannot be set up or if any step fails.
pub async fn run(args: VerifyArgs) -> Result<(), anyhow::Error> {
    let document = read_credential(&args.credential)?;
    let mut config = load_config(args.config.as_deref())?;
    config.explorer_apis.extend(args.explorer_apis);
    with_token(&mut config, "etherscan", args.etherscan_api_key);
    with_token(&mut config, "blockcypher", args.blockcypher_token);

    let json = args.json;
    let executor = Arc::new(ReportingStepExecutor::with_callback(move |report| {
        if !json {
            println!("{}", format_report(report, &EnglishText));
        }
    }));
    let dependencies = VerifierDependencies::http(&config, executor.clone())?;
    let mut verifier = Verifier::new(document, &config, dependencies).await?;
    info!(
        "Verifying credential anchored in transaction {}",
        verifier.suite().transaction_id()
    );

    if !json {
        println!("{}", format_plan(verifier.verification_steps()));
    }
    let result = verifier.verify().await;

    if json {
        let output = VerificationOutput {
            steps: executor.reports(),
            result: result.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", format_result(&result, verifier.suite()));
    }

    if !result.is_success() {
        bail!(
            "Verification failed: {}",
            result.message.unwrap_or_default()
        );
    }
    Ok(())
}
