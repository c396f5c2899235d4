//! Boundary through which every verification sub-step is executed.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{error, info};

use crate::error::VerificationError;
use crate::steps::SubStep;

/// Work of a single sub-step
pub type StepAction<'a> = BoxFuture<'a, Result<(), VerificationError>>;

/// Runs a sub-step's action on behalf of a proof suite.
///
/// Implementations own telemetry, retry and timeout policies. The action result is
/// returned to the suite unchanged unless the executor decides otherwise.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute_step(
        &self,
        step: SubStep,
        suite: &str,
        action: StepAction<'_>,
    ) -> Result<(), VerificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Failure,
}

/// Outcome of an executed sub-step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub code: SubStep,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

type ReportCallback = Arc<dyn Fn(&StepReport) + Send + Sync>;

/// Executor that logs and records every step outcome
#[derive(Default)]
pub struct ReportingStepExecutor {
    reports: Mutex<Vec<StepReport>>,
    on_report: Option<ReportCallback>,
}

impl ReportingStepExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also notify `callback` as soon as a step completes
    pub fn with_callback(callback: impl Fn(&StepReport) + Send + Sync + 'static) -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            on_report: Some(Arc::new(callback)),
        }
    }

    /// Outcomes recorded so far, in execution order
    pub fn reports(&self) -> Vec<StepReport> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }

    fn record(&self, report: StepReport) {
        if let Some(callback) = &self.on_report {
            callback(&report);
        }
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(report);
        }
    }
}

#[async_trait]
impl StepExecutor for ReportingStepExecutor {
    async fn execute_step(
        &self,
        step: SubStep,
        suite: &str,
        action: StepAction<'_>,
    ) -> Result<(), VerificationError> {
        info!("[{}] {}", suite, step);
        let result = action.await;
        let report = match &result {
            Ok(()) => StepReport {
                code: step,
                status: StepStatus::Success,
                error_message: None,
            },
            Err(err) => {
                error!("[{}] {} failed: {}", suite, step, err);
                StepReport {
                    code: step,
                    status: StepStatus::Failure,
                    error_message: Some(err.to_string()),
                }
            }
        };
        self.record(report);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_reports_are_recorded_in_order() {
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        let executor = ReportingStepExecutor::with_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        executor
            .execute_step(SubStep::ComputeLocalHash, "test", Box::pin(async { Ok(()) }))
            .await
            .unwrap();
        let err = executor
            .execute_step(
                SubStep::CompareHashes,
                "test",
                Box::pin(async { Err(VerificationError::InvalidMerkleReceipt) }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VerificationError::InvalidMerkleReceipt));

        let reports = executor.reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].status, StepStatus::Success);
        assert_eq!(reports[1].code, SubStep::CompareHashes);
        assert_eq!(reports[1].status, StepStatus::Failure);
        assert_eq!(notified.load(Ordering::SeqCst), 2);
    }
}
