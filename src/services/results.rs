//! Result recording against the runs of a synchronized plan.
//!
//! The recorder owns the set of cases that failed at least once during the
//! pass. Callers record each scenario outcome as it happens and invoke
//! [`ResultRecorder::finalize`] exactly once at the end of the run to mark
//! the accumulated cases failed, instead of relying on process shutdown.

use std::collections::BTreeSet;

use serde_json::json;
use tracing::{info, warn};

use crate::error::SyncResult;
use crate::gateway::Gateway;
use crate::models::{CaseId, CaseResult, RunId, ScenarioOutcome, StatusId, STATUS_FAILED};

/// Records scenario results into the first run of the plan that accepts them.
#[derive(Debug)]
pub struct ResultRecorder {
    run_ids: Vec<RunId>,
    failed_once: BTreeSet<CaseId>,
}

impl ResultRecorder {
    /// A recorder for the given plan runs.
    pub fn new(run_ids: Vec<RunId>) -> Self {
        Self {
            run_ids,
            failed_once: BTreeSet::new(),
        }
    }

    /// Cases that have failed at least once so far, in ascending order.
    pub fn failed_cases(&self) -> impl Iterator<Item = CaseId> + '_ {
        self.failed_once.iter().copied()
    }

    /// Record one scenario outcome for every case it covers.
    ///
    /// Each case is tried against the plan's runs in order; the first run
    /// that accepts the result wins. A run that rejects it (the case is not
    /// part of that run) is logged and the next run is tried. A failed
    /// outcome, or a prior failed result found in any run, puts the case into
    /// the failed-once set.
    pub async fn record(&mut self, gateway: &dyn Gateway, outcome: &ScenarioOutcome) {
        let status_id = outcome.status_id();
        let comment = outcome.comment();

        if status_id == STATUS_FAILED {
            self.failed_once.extend(outcome.case_ids.iter().copied());
        }

        let run_ids = self.run_ids.clone();
        for &case_id in &outcome.case_ids {
            for &run_id in &run_ids {
                match self
                    .add_result_for_case(gateway, run_id, case_id, status_id, &comment)
                    .await
                {
                    Ok(()) => break,
                    Err(e) => {
                        warn!("Recording case {} in run {} failed: {}", case_id, run_id, e);
                    }
                }
            }
        }
    }

    /// Post one result, first folding any previously recorded failure of the
    /// case into the failed-once set.
    async fn add_result_for_case(
        &mut self,
        gateway: &dyn Gateway,
        run_id: RunId,
        case_id: CaseId,
        status_id: StatusId,
        comment: &str,
    ) -> SyncResult<()> {
        let value = gateway
            .get(&format!("get_results_for_case/{}/{}", run_id, case_id))
            .await?;
        let results: Vec<CaseResult> = serde_json::from_value(value)?;
        if results.iter().any(|r| r.status_id == STATUS_FAILED) {
            self.failed_once.insert(case_id);
        }

        let body = json!({
            "status_id": status_id,
            "comment": comment,
        });
        gateway
            .post(&format!("add_result_for_case/{}/{}", run_id, case_id), &body)
            .await?;
        Ok(())
    }

    /// Mark every accumulated case failed and return the marked ids.
    ///
    /// Invoke once, after the last scenario has been recorded. Consumes the
    /// recorder so a pass cannot finalize twice.
    pub async fn finalize(self, gateway: &dyn Gateway) -> SyncResult<Vec<CaseId>> {
        let failed: Vec<CaseId> = self.failed_once.iter().copied().collect();
        if failed.is_empty() {
            info!("No case failed during this pass");
            return Ok(failed);
        }

        let body = json!({
            "status_id": STATUS_FAILED,
            "comment": "Test case failed at least once during execution",
        });
        for &case_id in &failed {
            for &run_id in &self.run_ids {
                match gateway
                    .post(&format!("add_result_for_case/{}/{}", run_id, case_id), &body)
                    .await
                {
                    Ok(_) => break,
                    Err(e) => {
                        warn!("Marking case {} in run {} failed: {}", case_id, run_id, e);
                    }
                }
            }
        }
        info!("Marked {} case(s) as failed at least once", failed.len());
        Ok(failed)
    }
}
