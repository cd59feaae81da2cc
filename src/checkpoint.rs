//! Checkpoint table for the suite backup rotation.
//!
//! One comma-separated row per tracked suite, under the header
//! `Suite Name,Suite ID,Project ID,Backup 2,Backup 1`. The file is rewritten
//! in full after every rotation pass; it is never appended to. Suite names
//! may contain commas or quotes, so fields are quoted when needed.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{SyncError, SyncResult};
use crate::models::BackupRecord;

const HEADER: [&str; 5] = ["Suite Name", "Suite ID", "Project ID", "Backup 2", "Backup 1"];

/// Load the previous pass's records from `path`.
///
/// Fails with `SyncError::Checkpoint` when the file is missing, the header
/// does not match, or a row is malformed; a damaged checkpoint must not be
/// silently treated as "nothing to rotate".
pub fn load(path: &Path) -> SyncResult<Vec<BackupRecord>> {
    let content = fs::read_to_string(path).map_err(|e| {
        SyncError::Checkpoint(format!("cannot read {}: {}", path.display(), e))
    })?;

    let mut lines = content.lines();
    let header = lines
        .next()
        .ok_or_else(|| SyncError::Checkpoint(format!("{} is empty", path.display())))?;
    if split_row(header)? != HEADER {
        return Err(SyncError::Checkpoint(format!(
            "{} has an unexpected header: {}",
            path.display(),
            header
        )));
    }

    let mut records = Vec::new();
    for (index, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_row(line)?;
        if fields.len() != HEADER.len() {
            return Err(SyncError::Checkpoint(format!(
                "row {} has {} fields, expected {}",
                index + 2,
                fields.len(),
                HEADER.len()
            )));
        }
        records.push(BackupRecord {
            suite_name: fields[0].clone(),
            suite_id: parse_field(&fields[1], index, "Suite ID")?,
            project_id: parse_field(&fields[2], index, "Project ID")?,
            backup2_id: parse_field(&fields[3], index, "Backup 2")?,
            backup1_id: parse_field(&fields[4], index, "Backup 1")?,
        });
    }

    info!("Loaded {} backup record(s) from {}", records.len(), path.display());
    Ok(records)
}

/// Write `records` to `path`, replacing any previous content.
pub fn store(path: &Path, records: &[BackupRecord]) -> SyncResult<()> {
    let mut out = String::new();
    out.push_str(&join_row(&HEADER.map(String::from)));
    out.push('\n');
    for record in records {
        let row = [
            record.suite_name.clone(),
            record.suite_id.to_string(),
            record.project_id.to_string(),
            record.backup2_id.to_string(),
            record.backup1_id.to_string(),
        ];
        out.push_str(&join_row(&row));
        out.push('\n');
    }

    fs::write(path, out).map_err(|e| {
        SyncError::Checkpoint(format!("cannot write {}: {}", path.display(), e))
    })?;
    info!("Stored {} backup record(s) to {}", records.len(), path.display());
    Ok(())
}

fn parse_field(value: &str, row_index: usize, column: &str) -> SyncResult<i64> {
    value.trim().parse::<i64>().map_err(|_| {
        SyncError::Checkpoint(format!(
            "row {}: '{}' is not a valid id for column '{}'",
            row_index + 2,
            value,
            column
        ))
    })
}

/// Render one row, quoting fields containing a comma, quote or newline.
fn join_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| {
            if field.contains(',') || field.contains('"') || field.contains('\n') {
                format!("\"{}\"", field.replace('"', "\"\""))
            } else {
                field.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Split one row, honoring double-quoted fields with doubled-quote escapes.
fn split_row(line: &str) -> SyncResult<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(current);
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err(SyncError::Checkpoint(format!(
            "unterminated quoted field in row: {}",
            line
        )));
    }
    fields.push(current);
    Ok(fields)
}
