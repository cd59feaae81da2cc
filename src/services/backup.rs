//! Suite backup rotator.
//!
//! Keeps exactly two backup generations per tracked suite and rolls them
//! forward once per invocation:
//!
//! 1. the suite at `backup2_id` is renamed ("Backup 2" -> "Backup 1"),
//! 2. the suite at `backup1_id` is deleted,
//! 3. a fresh `{name}-Backup 2` suite is created and populated through the
//!    hierarchy replicator.
//!
//! The step order is fixed: deleting first would destroy the only reference
//! to the oldest generation, and creating before renaming could transiently
//! leave two suites matching the "Backup 2" name pattern.

use serde_json::json;
use tracing::{error, info};

use crate::error::{SyncError, SyncResult};
use crate::gateway::Gateway;
use crate::models::{BackupRecord, ProjectId, Suite, SuiteId};
use crate::services::replicator::replicate_suite;

/// Outcome of one rotation pass over the tracked suites.
#[derive(Debug)]
pub struct RotationReport {
    /// Records for every suite fully rotated this pass, in input order.
    /// These rows must be persisted even when the pass aborted.
    pub completed: Vec<BackupRecord>,
    /// The failure that aborted the pass, if any.
    pub aborted: Option<RotationFailure>,
}

/// The failure that stopped a rotation pass.
#[derive(Debug)]
pub struct RotationFailure {
    /// Name of the suite whose rotation failed
    pub suite_name: String,
    pub error: SyncError,
}

impl RotationReport {
    /// Whether every tracked suite was rotated.
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Rotate the backups of every tracked suite, sequentially and fail-fast.
///
/// The first failing suite aborts the remaining ones, but the report still
/// carries every record produced before the failure so the caller can persist
/// them; the next invocation then resumes with the suites not yet reached.
pub async fn rotate_all(gateway: &dyn Gateway, records: &[BackupRecord]) -> RotationReport {
    let mut completed = Vec::new();

    for record in records {
        info!(
            "Rotating backups of suite '{}' (suite {}, project {})",
            record.suite_name, record.suite_id, record.project_id
        );
        match rotate_suite(gateway, record).await {
            Ok(updated) => {
                info!(
                    "Backup for suite '{}' created with id {}",
                    updated.suite_name, updated.backup2_id
                );
                completed.push(updated);
            }
            Err(e) => {
                error!(
                    "Rotation failed for suite '{}' (suite {}, project {}): {}",
                    record.suite_name, record.suite_id, record.project_id, e
                );
                return RotationReport {
                    completed,
                    aborted: Some(RotationFailure {
                        suite_name: record.suite_name.clone(),
                        error: e,
                    }),
                };
            }
        }
    }

    RotationReport {
        completed,
        aborted: None,
    }
}

/// Roll one suite's backups forward and return its updated record.
async fn rotate_suite(gateway: &dyn Gateway, record: &BackupRecord) -> SyncResult<BackupRecord> {
    // The newest generation becomes the oldest: rename in place.
    let backup2 = get_suite(gateway, record.backup2_id).await?;
    let demoted_name = backup2.name.replace("Backup 2", "Backup 1");
    update_suite(gateway, backup2.id, &demoted_name, backup2.description.as_deref()).await?;

    // The previous oldest generation is discarded.
    delete_suite(gateway, record.backup1_id).await?;

    // Fresh copy of the live suite becomes the new "Backup 2".
    let new_backup2_id =
        create_backup_of_suite(gateway, record.project_id, record.suite_id, "Backup 2").await?;

    Ok(BackupRecord {
        suite_name: record.suite_name.clone(),
        suite_id: record.suite_id,
        project_id: record.project_id,
        backup2_id: new_backup2_id,
        backup1_id: record.backup2_id,
    })
}

/// Create a `{name}-{backup_name}` copy of `suite_id` and replicate its
/// sections and cases into it. Returns the new suite's id.
pub async fn create_backup_of_suite(
    gateway: &dyn Gateway,
    project_id: ProjectId,
    suite_id: SuiteId,
    backup_name: &str,
) -> SyncResult<SuiteId> {
    let source = get_suite(gateway, suite_id).await?;

    let new_suite = add_suite(
        gateway,
        project_id,
        &format!("{}-{}", source.name, backup_name),
        source.description.as_deref(),
    )
    .await?;
    info!("New suite id for '{}': {}", source.name, new_suite);

    replicate_suite(gateway, project_id, suite_id, new_suite).await?;
    Ok(new_suite)
}

async fn get_suite(gateway: &dyn Gateway, suite_id: SuiteId) -> SyncResult<Suite> {
    let value = gateway.get(&format!("get_suite/{}", suite_id)).await?;
    Ok(serde_json::from_value(value)?)
}

async fn add_suite(
    gateway: &dyn Gateway,
    project_id: ProjectId,
    name: &str,
    description: Option<&str>,
) -> SyncResult<SuiteId> {
    let body = json!({
        "name": name,
        "description": description,
    });
    let value = gateway
        .post(&format!("add_suite/{}", project_id), &body)
        .await?;
    let suite: Suite = serde_json::from_value(value)?;
    Ok(suite.id)
}

async fn update_suite(
    gateway: &dyn Gateway,
    suite_id: SuiteId,
    name: &str,
    description: Option<&str>,
) -> SyncResult<()> {
    let body = json!({
        "name": name,
        "description": description,
    });
    gateway
        .post(&format!("update_suite/{}", suite_id), &body)
        .await?;
    Ok(())
}

async fn delete_suite(gateway: &dyn Gateway, suite_id: SuiteId) -> SyncResult<()> {
    gateway
        .post(&format!("delete_suite/{}", suite_id), &json!({}))
        .await?;
    Ok(())
}
