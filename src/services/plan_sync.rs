//! Plan synchronizer.
//!
//! Ensures a named plan exists in a project, reusing it when a plan with
//! that exact title was already created by the configured account, otherwise
//! cloning a base plan, and returns the ids of the runs nested under it.
//!
//! Cloning narrows each entry deliberately: the new run contains exactly the
//! cases that had *any* recorded result in the source run, not the source
//! run's full case set.

use std::collections::HashSet;

use chrono::Local;
use serde_json::json;
use tracing::{info, warn};

use crate::error::{SyncError, SyncResult};
use crate::gateway::Gateway;
use crate::models::{
    all_statuses_filter, CaseId, NewPlan, NewPlanEntry, Plan, PlanId, PlanSummary, ProjectId,
    RunId, SuiteId, TestInstance, UserId,
};

/// Inputs of one synchronization pass.
#[derive(Debug, Clone)]
pub struct PlanSyncOptions {
    /// Project holding the plans
    pub project_id: ProjectId,
    /// Title of the plan to reuse or create
    pub plan_title: String,
    /// Plan whose structure is cloned when `plan_title` does not exist
    pub base_plan_id: PlanId,
    /// Account whose plans are searched for `plan_title`
    pub created_by: UserId,
    /// Run names to keep when cloning; empty keeps every entry
    pub desired_run_names: Vec<String>,
}

/// Find or create the configured plan and return its run ids in entry order.
///
/// Calling this twice with the same title is idempotent: the second call
/// finds the plan, issues no create call, and returns the same run ids.
pub async fn sync_plan(gateway: &dyn Gateway, options: &PlanSyncOptions) -> SyncResult<Vec<RunId>> {
    let plan = match find_plan_by_title(gateway, options).await? {
        Some(existing_id) => {
            info!(
                "Plan '{}' already exists in project {} (plan {}), reusing it",
                options.plan_title, options.project_id, existing_id
            );
            get_plan(gateway, existing_id).await?
        }
        None => {
            info!(
                "Plan '{}' not found in project {}, cloning plan {}",
                options.plan_title, options.project_id, options.base_plan_id
            );
            rerun_plan(gateway, options).await?
        }
    };

    collect_run_ids(&plan)
}

/// Id of the plan titled `plan_title` among the plans `created_by` created in
/// the project, if present. The title must match exactly.
async fn find_plan_by_title(
    gateway: &dyn Gateway,
    options: &PlanSyncOptions,
) -> SyncResult<Option<PlanId>> {
    let value = gateway
        .get(&format!(
            "get_plans/{}&created_by={}",
            options.project_id, options.created_by
        ))
        .await?;
    let plans: Vec<PlanSummary> = serde_json::from_value(value)?;
    Ok(plans
        .iter()
        .find(|p| p.name == options.plan_title)
        .map(|p| p.id))
}

/// Clone the base plan into a new plan named `plan_title`.
///
/// Each surviving entry is rebuilt around the cases that had any recorded
/// result in its source run. Entries are dropped when their run name fails
/// the filter, and also when no case survives the narrowing: TestRail has
/// no use for a run with `include_all: false` and an empty case list.
async fn rerun_plan(gateway: &dyn Gateway, options: &PlanSyncOptions) -> SyncResult<Plan> {
    let base = get_plan(gateway, options.base_plan_id).await?;
    let statuses = all_statuses_filter();

    let mut entries = Vec::new();
    for entry in &base.entries {
        let run = match entry.first_run() {
            Some(run) => run,
            None => {
                return Err(SyncError::Structure(format!(
                    "entry for suite {} in base plan {} has no runs",
                    entry.suite_id, base.id
                )))
            }
        };
        let run_name = run.name.clone().unwrap_or_default();

        if !options.desired_run_names.is_empty()
            && !options.desired_run_names.iter().any(|n| n == &run_name)
        {
            continue;
        }

        let case_ids = case_ids_for_run(gateway, run.id, &statuses).await?;
        if case_ids.is_empty() {
            warn!(
                "Run '{}' ({}) has no recorded results, dropping its entry from plan '{}'",
                run_name, run.id, options.plan_title
            );
            continue;
        }

        entries.push(NewPlanEntry {
            suite_id: entry.suite_id,
            name: run_name,
            include_all: false,
            case_ids,
        });
    }

    let new_plan = NewPlan {
        name: options.plan_title.clone(),
        description: base.description.clone(),
        entries,
    };

    // The project the base plan belongs to is authoritative here, mirroring
    // the base rather than trusting the caller's project id to agree.
    let value = gateway
        .post(
            &format!("add_plan/{}", base.project_id),
            &serde_json::to_value(&new_plan)?,
        )
        .await?;
    Ok(serde_json::from_value(value)?)
}

/// Distinct case ids with any recorded result in `run_id`, first-seen order.
async fn case_ids_for_run(
    gateway: &dyn Gateway,
    run_id: RunId,
    statuses: &str,
) -> SyncResult<Vec<CaseId>> {
    let value = gateway
        .get(&format!("get_tests/{}&status_id={}", run_id, statuses))
        .await?;
    let tests: Vec<TestInstance> = serde_json::from_value(value)?;

    let mut seen = HashSet::new();
    Ok(tests
        .into_iter()
        .map(|t| t.case_id)
        .filter(|id| seen.insert(*id))
        .collect())
}

async fn get_plan(gateway: &dyn Gateway, plan_id: PlanId) -> SyncResult<Plan> {
    let value = gateway.get(&format!("get_plan/{}", plan_id)).await?;
    Ok(serde_json::from_value(value)?)
}

/// First run id of each entry, in entry order.
fn collect_run_ids(plan: &Plan) -> SyncResult<Vec<RunId>> {
    plan.entries
        .iter()
        .map(|entry| {
            entry.first_run().map(|run| run.id).ok_or_else(|| {
                SyncError::Structure(format!(
                    "entry for suite {} in plan {} has no runs",
                    entry.suite_id, plan.id
                ))
            })
        })
        .collect()
}

/// Append an include-all entry for `suite_id` to an existing plan and return
/// the new entry's run id. The run is named after the current local time so
/// repeated invocations stay distinguishable.
pub async fn add_plan_entry(
    gateway: &dyn Gateway,
    plan_id: PlanId,
    suite_id: SuiteId,
    assigned_to: UserId,
) -> SyncResult<RunId> {
    let body = json!({
        "suite_id": suite_id,
        "include_all": true,
        "assignedto_id": assigned_to,
        "name": Local::now().format("%a %b %d %H:%M:%S %Y").to_string(),
    });
    let value = gateway
        .post(&format!("add_plan_entry/{}", plan_id), &body)
        .await?;

    let runs = value
        .get("runs")
        .and_then(|r| r.as_array())
        .and_then(|r| r.first())
        .and_then(|r| r.get("id"))
        .and_then(|id| id.as_i64());
    runs.ok_or_else(|| {
        SyncError::Structure(format!("add_plan_entry/{} answered without a run", plan_id))
    })
}
