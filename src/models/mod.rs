//! Typed records for the TestRail API surface this crate consumes.

pub mod backup_record;
pub mod plan;
pub mod results;
pub mod suite;

// Re-export commonly used types
pub use backup_record::BackupRecord;
pub use plan::{NewPlan, NewPlanEntry, Plan, PlanEntry, PlanSummary, Run};
pub use results::{
    all_statuses_filter, CaseResult, ScenarioOutcome, TestInstance, ALL_RESULT_STATUSES,
    STATUS_FAILED, STATUS_PASSED,
};
pub use suite::{Section, Suite, TestCase};

/// Numeric TestRail identifiers. All entity ids share one integer space on
/// the wire; the aliases keep signatures readable.
pub type ProjectId = i64;
pub type SuiteId = i64;
pub type SectionId = i64;
pub type CaseId = i64;
pub type PlanId = i64;
pub type RunId = i64;
pub type UserId = i64;
pub type StatusId = i64;
