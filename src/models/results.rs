//! Result records and per-scenario outcomes.

use serde::Deserialize;

use crate::models::{CaseId, StatusId};

/// Status id TestRail assigns to a passed result.
pub const STATUS_PASSED: StatusId = 1;

/// Status id TestRail assigns to a failed result.
pub const STATUS_FAILED: StatusId = 5;

/// Every result status id, including the custom ones (1-12). Used when a run
/// query must see cases regardless of how they were marked.
/// See https://support.testrail.com/hc/en-us/articles/7077935129364-Statuses
pub const ALL_RESULT_STATUSES: [StatusId; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

/// One row of `get_tests`: a case instantiated inside a run.
#[derive(Debug, Clone, Deserialize)]
pub struct TestInstance {
    pub id: i64,
    pub case_id: CaseId,
    pub status_id: StatusId,
}

/// One row of `get_results_for_case`.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseResult {
    pub status_id: StatusId,
}

/// Outcome of one executed scenario, carried to the recorder by the harness.
///
/// Case ids are attached as a typed list when the outcome is built; the
/// recorder never parses them out of tags or labels.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    /// Scenario name, used as the leading part of the result comment
    pub name: String,
    /// Whether every step of the scenario passed
    pub passed: bool,
    /// Failure detail appended to the comment, if any
    pub detail: Option<String>,
    /// TestRail cases this scenario covers
    pub case_ids: Vec<CaseId>,
}

impl ScenarioOutcome {
    /// Status id to record for this outcome.
    pub fn status_id(&self) -> StatusId {
        if self.passed {
            STATUS_PASSED
        } else {
            STATUS_FAILED
        }
    }

    /// Comment to attach to the recorded result.
    pub fn comment(&self) -> String {
        if self.passed {
            format!("{}: Test has passed", self.name)
        } else {
            match &self.detail {
                Some(detail) => format!("{}: Test has failed! -- {}", self.name, detail),
                None => format!("{}: Test has failed!", self.name),
            }
        }
    }
}

/// Render the all-statuses catalog as the comma-separated filter value the
/// `get_tests` path expects.
pub fn all_statuses_filter() -> String {
    ALL_RESULT_STATUSES
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
