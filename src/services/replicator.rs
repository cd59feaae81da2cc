//! Hierarchy replicator: deep-copies a suite's section tree and cases.
//!
//! Sections are copied parent-before-child into the destination suite while a
//! source-to-destination id map translates parent references. TestRail
//! usually returns sections in a usable order, but the service's ordering is
//! not part of its contract, so the replicator orders the sections itself and
//! rejects malformed graphs instead of trusting the response.

use std::collections::{HashMap, HashSet};

use serde_json::json;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::gateway::Gateway;
use crate::models::{ProjectId, Section, SectionId, SuiteId, TestCase};

/// Copy every section and case of `source_suite_id` into `dest_suite_id`.
///
/// Any gateway failure aborts the replication immediately; the destination
/// suite may be left partially populated. Callers that use this for backups
/// simply discard such a destination on the next pass.
pub async fn replicate_suite(
    gateway: &dyn Gateway,
    project_id: ProjectId,
    source_suite_id: SuiteId,
    dest_suite_id: SuiteId,
) -> SyncResult<()> {
    let sections = fetch_sections(gateway, project_id, source_suite_id).await?;
    let ordered = topological_order(&sections)?;

    info!(
        "Replicating suite {} -> {} ({} sections)",
        source_suite_id,
        dest_suite_id,
        ordered.len()
    );

    let mut section_ids: HashMap<SectionId, SectionId> = HashMap::new();
    for section in ordered {
        let cases = fetch_cases(gateway, project_id, source_suite_id, section.id).await?;

        // Translate the parent through ids mapped earlier in this pass. After
        // the topological sort a miss can only mean a replicator bug.
        let dest_parent = match section.parent_id {
            None => None,
            Some(source_parent) => Some(*section_ids.get(&source_parent).ok_or_else(|| {
                SyncError::Structure(format!(
                    "section {} copied before its parent {}",
                    section.id, source_parent
                ))
            })?),
        };

        let new_section =
            add_section(gateway, project_id, dest_suite_id, &section.name, dest_parent).await?;

        if !cases.is_empty() {
            copy_cases_to_section(gateway, new_section, &cases).await?;
        }

        section_ids.insert(section.id, new_section);
        debug!(
            "Copied section {} -> {} ({} cases)",
            section.id,
            new_section,
            cases.len()
        );
    }

    Ok(())
}

/// Order sections parent-before-child.
///
/// Fails with `Structure` when a section references a parent outside the
/// suite or the graph contains a cycle. Both mean the remote answered with
/// something that is not a forest, and copying it would scramble the tree.
fn topological_order(sections: &[Section]) -> SyncResult<Vec<&Section>> {
    let known: HashMap<SectionId, &Section> =
        sections.iter().map(|s| (s.id, s)).collect();

    for section in sections {
        if let Some(parent) = section.parent_id {
            if !known.contains_key(&parent) {
                return Err(SyncError::Structure(format!(
                    "section {} references parent {} which is not in the suite",
                    section.id, parent
                )));
            }
        }
    }

    let mut ordered: Vec<&Section> = Vec::with_capacity(sections.len());
    let mut placed: HashSet<SectionId> = HashSet::with_capacity(sections.len());
    let mut remaining: Vec<&Section> = sections.iter().collect();

    while !remaining.is_empty() {
        let before = remaining.len();
        remaining.retain(|section| {
            let ready = match section.parent_id {
                None => true,
                Some(parent) => placed.contains(&parent),
            };
            if ready {
                placed.insert(section.id);
                ordered.push(section);
            }
            !ready
        });
        if remaining.len() == before {
            let stuck: Vec<String> = remaining.iter().map(|s| s.id.to_string()).collect();
            return Err(SyncError::Structure(format!(
                "section graph contains a cycle involving sections [{}]",
                stuck.join(", ")
            )));
        }
    }

    Ok(ordered)
}

async fn fetch_sections(
    gateway: &dyn Gateway,
    project_id: ProjectId,
    suite_id: SuiteId,
) -> SyncResult<Vec<Section>> {
    let value = gateway
        .get(&format!("get_sections/{}&suite_id={}", project_id, suite_id))
        .await?;
    Ok(serde_json::from_value(value)?)
}

async fn fetch_cases(
    gateway: &dyn Gateway,
    project_id: ProjectId,
    suite_id: SuiteId,
    section_id: SectionId,
) -> SyncResult<Vec<TestCase>> {
    let value = gateway
        .get(&format!(
            "get_cases/{}&suite_id={}&section_id={}",
            project_id, suite_id, section_id
        ))
        .await?;
    Ok(serde_json::from_value(value)?)
}

async fn add_section(
    gateway: &dyn Gateway,
    project_id: ProjectId,
    suite_id: SuiteId,
    name: &str,
    parent_id: Option<SectionId>,
) -> SyncResult<SectionId> {
    let mut body = json!({
        "suite_id": suite_id,
        "name": name,
    });
    if let Some(parent) = parent_id {
        body["parent_id"] = json!(parent);
    }
    let value = gateway
        .post(&format!("add_section/{}", project_id), &body)
        .await?;
    let section: Section = serde_json::from_value(value)?;
    Ok(section.id)
}

/// Copy all cases of one source section into `section_id` in a single call.
/// The path expects the ids as one comma-separated string.
async fn copy_cases_to_section(
    gateway: &dyn Gateway,
    section_id: SectionId,
    cases: &[TestCase],
) -> SyncResult<()> {
    let case_ids = cases
        .iter()
        .map(|c| c.id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let body = json!({ "case_ids": case_ids });
    gateway
        .post(&format!("copy_cases_to_section/{}", section_id), &body)
        .await?;
    Ok(())
}
