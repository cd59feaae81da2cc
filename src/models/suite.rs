//! Suite, section and case records.

use serde::{Deserialize, Serialize};

use crate::models::{CaseId, SectionId, SuiteId};

/// A test suite owned by a project. Root of a section tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suite {
    pub id: SuiteId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A section grouping cases within a suite.
///
/// `parent_id` is `None` for root sections. The section graph of a suite is a
/// forest; every parent belongs to the same suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<SectionId>,
}

/// A test case. Section membership is positional: cases are fetched per
/// section and copied per section, so the struct does not carry it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: CaseId,
    #[serde(default)]
    pub title: Option<String>,
}
