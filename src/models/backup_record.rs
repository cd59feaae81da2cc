//! Checkpoint row for the suite backup rotation.

use crate::models::{ProjectId, SuiteId};

/// State of the most recent rotation for one tracked suite.
///
/// This is the only durable state the core produces. A row written at the end
/// of one rotation pass is the input of the next: `backup2_id` is the newest
/// copy (renamed to Backup 1 next time) and `backup1_id` the oldest (deleted
/// next time).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    /// Name of the live suite being tracked
    pub suite_name: String,
    /// Id of the live suite
    pub suite_id: SuiteId,
    /// Project owning the suite and its backups
    pub project_id: ProjectId,
    /// Newest backup generation ("Backup 2")
    pub backup2_id: SuiteId,
    /// Oldest backup generation ("Backup 1")
    pub backup1_id: SuiteId,
}
