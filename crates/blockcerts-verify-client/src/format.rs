//! Terminal rendering of verification plans, step outcomes and results.

use blockcerts_verify::{
    ProofSuite, StepReport, StepStatus, TextCategory, TextLookup, VerificationMapItem,
    VerificationResult,
};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Render the planned step tree
pub fn format_plan(steps: &[VerificationMapItem]) -> String {
    let mut output = String::new();
    output.push_str("┌─ Verification steps\n");
    for parent in steps {
        output.push_str(&format!("│ {YELLOW}{}{RESET}\n", parent.label));
        if parent.sub_steps.is_empty() {
            output.push_str("│   (nothing to check)\n");
        }
        for (index, step) in parent.sub_steps.iter().enumerate() {
            let branch = if index + 1 == parent.sub_steps.len() {
                "└─"
            } else {
                "├─"
            };
            output.push_str(&format!("│   {branch} {} ({})\n", step.label, step.code));
        }
    }
    output.push_str("└─\n");
    output
}

/// Render a single step outcome
pub fn format_report(report: &StepReport, text: &dyn TextLookup) -> String {
    let label = text.get_text(TextCategory::SubSteps, &format!("{}Label", report.code));
    match report.status {
        StepStatus::Success => format!("  {GREEN}✔{RESET} {label}"),
        StepStatus::Failure => format!(
            "  {RED}✘{RESET} {label}: {}",
            report.error_message.as_deref().unwrap_or("failed")
        ),
    }
}

/// Render the final outcome with what is known of the issuer and the anchor
pub fn format_result(result: &VerificationResult, suite: &ProofSuite) -> String {
    let mut output = String::new();
    output.push_str("┌─ Credential ──────────────────────────────────────────────\n");
    output.push_str(&format!("│ Issuer:      {}\n", suite.issuer_name()));
    if let Some(domain) = suite.issuer_profile_domain() {
        output.push_str(&format!("│ Domain:      {domain}\n"));
    }
    output.push_str(&format!("│ Chain:       {}\n", suite.chain().name));
    output.push_str(&format!("│ Transaction: {}\n", suite.transaction_id()));
    let links = suite.transaction_links();
    if !links.transaction_link.is_empty() {
        output.push_str(&format!("│ Explorer:    {}\n", links.transaction_link));
    }
    if let Some(time) = suite.issuance_time() {
        output.push_str(&format!(
            "│ Issued:      {}\n",
            time.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    output.push_str("├───────────────────────────────────────────────────────────\n");
    match (&result.status, &result.message) {
        (StepStatus::Success, _) => {
            output.push_str(&format!("│ {GREEN}Verified{RESET}\n"));
        }
        (StepStatus::Failure, message) => {
            output.push_str(&format!(
                "│ {RED}Failed{RESET}: {}\n",
                message.as_deref().unwrap_or("unknown error")
            ));
        }
    }
    output.push_str("└───────────────────────────────────────────────────────────\n");
    output
}
