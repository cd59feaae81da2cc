//! Synchronization and backup services.

pub mod backup;
pub mod plan_sync;
pub mod replicator;
pub mod results;

pub use backup::{rotate_all, RotationFailure, RotationReport};
pub use plan_sync::{add_plan_entry, sync_plan, PlanSyncOptions};
pub use replicator::replicate_suite;
pub use results::ResultRecorder;
