//! Plan, entry and run records.

use serde::{Deserialize, Serialize};

use crate::models::{CaseId, PlanId, ProjectId, RunId, SuiteId};

/// One row of a plan listing. Listings omit `entries`; fetch the detail
/// record when entries are needed.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanSummary {
    pub id: PlanId,
    pub name: String,
}

/// Full plan detail as returned by `get_plan`.
#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub project_id: ProjectId,
    #[serde(default)]
    pub entries: Vec<PlanEntry>,
}

/// A plan entry wrapping the runs executed against one suite.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanEntry {
    pub suite_id: SuiteId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub runs: Vec<Run>,
}

/// A concrete run nested in a plan entry. Results are recorded against it.
#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    pub id: RunId,
    #[serde(default)]
    pub name: Option<String>,
}

/// Write-side body for one entry of `add_plan`.
///
/// `include_all` is always false here: the case list is narrowed to the cases
/// that had any recorded result in the source run.
#[derive(Debug, Clone, Serialize)]
pub struct NewPlanEntry {
    pub suite_id: SuiteId,
    pub name: String,
    pub include_all: bool,
    pub case_ids: Vec<CaseId>,
}

/// Write-side body for `add_plan`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPlan {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub entries: Vec<NewPlanEntry>,
}

impl PlanEntry {
    /// The first nested run, which TestRail populates for every entry.
    pub fn first_run(&self) -> Option<&Run> {
        self.runs.first()
    }
}
