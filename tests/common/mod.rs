#![allow(dead_code)] // each test crate uses its own slice of the fake

//! In-memory TestRail used by the integration tests.
//!
//! Implements [`Gateway`] by dispatching on the same API paths the real
//! client issues, over a small mutable model of suites, sections, cases,
//! plans, runs and results. Tests seed state through the `*_direct` helpers,
//! inject faults with [`FakeTestRail::fail_on`], and inspect effects through
//! the accessors and the post log.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use testrail_sync::error::{SyncError, SyncResult};
use testrail_sync::gateway::Gateway;

pub type Id = i64;

#[derive(Debug, Clone)]
struct SuiteRec {
    project_id: Id,
    name: String,
    description: Option<String>,
}

#[derive(Debug, Clone)]
struct SectionRec {
    suite_id: Id,
    name: String,
    parent_id: Option<Id>,
}

#[derive(Debug, Clone)]
struct CaseRec {
    section_id: Id,
    title: String,
}

#[derive(Debug, Clone)]
struct RunRec {
    name: String,
    suite_id: Id,
    /// (case id, status id) per test instance of the run
    tests: Vec<(Id, Id)>,
}

#[derive(Debug, Clone)]
struct EntryRec {
    suite_id: Id,
    name: String,
    run_ids: Vec<Id>,
    case_ids: Vec<Id>,
}

#[derive(Debug, Clone)]
struct PlanRec {
    project_id: Id,
    name: String,
    description: Option<String>,
    created_by: Id,
    entries: Vec<EntryRec>,
}

/// A fault rule: the first matching call fails with a 500.
struct FailRule {
    method: &'static str,
    path_contains: String,
    body_contains: Option<String>,
}

#[derive(Default)]
struct State {
    next_id: Id,
    suites: HashMap<Id, SuiteRec>,
    /// insertion order preserved so tests control the listing order
    sections: Vec<(Id, SectionRec)>,
    cases: Vec<(Id, CaseRec)>,
    plans: HashMap<Id, PlanRec>,
    runs: HashMap<Id, RunRec>,
    /// prior results per (run, case)
    results: HashMap<(Id, Id), Vec<Id>>,
    post_log: Vec<String>,
}

pub struct FakeTestRail {
    state: Mutex<State>,
    fail_rules: Mutex<Vec<FailRule>>,
}

impl Default for FakeTestRail {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTestRail {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1000,
                ..State::default()
            }),
            fail_rules: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next call whose method/path (and body, if given) match.
    pub fn fail_on(&self, method: &'static str, path_contains: &str, body_contains: Option<&str>) {
        self.fail_rules.lock().unwrap().push(FailRule {
            method,
            path_contains: path_contains.to_string(),
            body_contains: body_contains.map(String::from),
        });
    }

    fn check_fail(&self, method: &'static str, path: &str, body: Option<&Value>) -> SyncResult<()> {
        let mut rules = self.fail_rules.lock().unwrap();
        let hit = rules.iter().position(|rule| {
            rule.method == method
                && path.contains(&rule.path_contains)
                && match (&rule.body_contains, body) {
                    (None, _) => true,
                    (Some(needle), Some(body)) => body.to_string().contains(needle.as_str()),
                    (Some(_), None) => false,
                }
        });
        match hit {
            Some(index) => {
                rules.remove(index);
                Err(SyncError::Remote {
                    status: 500,
                    message: format!("injected failure for {} {}", method, path),
                })
            }
            None => Ok(()),
        }
    }

    // ----- seeding helpers -----

    pub fn seed_suite(&self, project_id: Id, name: &str, description: Option<&str>) -> Id {
        let mut state = self.state.lock().unwrap();
        let id = state.fresh_id();
        state.suites.insert(
            id,
            SuiteRec {
                project_id,
                name: name.to_string(),
                description: description.map(String::from),
            },
        );
        id
    }

    pub fn seed_section(&self, suite_id: Id, name: &str, parent_id: Option<Id>) -> Id {
        let mut state = self.state.lock().unwrap();
        let id = state.fresh_id();
        state.sections.push((
            id,
            SectionRec {
                suite_id,
                name: name.to_string(),
                parent_id,
            },
        ));
        id
    }

    pub fn seed_case(&self, section_id: Id, title: &str) -> Id {
        let mut state = self.state.lock().unwrap();
        let id = state.fresh_id();
        state.cases.push((
            id,
            CaseRec {
                section_id,
                title: title.to_string(),
            },
        ));
        id
    }

    pub fn seed_plan(
        &self,
        project_id: Id,
        name: &str,
        description: Option<&str>,
        created_by: Id,
    ) -> Id {
        let mut state = self.state.lock().unwrap();
        let id = state.fresh_id();
        state.plans.insert(
            id,
            PlanRec {
                project_id,
                name: name.to_string(),
                description: description.map(String::from),
                created_by,
                entries: Vec::new(),
            },
        );
        id
    }

    /// Add an entry (and its single run) to a seeded plan. `case_statuses`
    /// become the run's test instances. Returns the run id.
    pub fn seed_entry(
        &self,
        plan_id: Id,
        suite_id: Id,
        run_name: &str,
        case_statuses: &[(Id, Id)],
    ) -> Id {
        let mut state = self.state.lock().unwrap();
        let run_id = state.fresh_id();
        state.runs.insert(
            run_id,
            RunRec {
                name: run_name.to_string(),
                suite_id,
                tests: case_statuses.to_vec(),
            },
        );
        let case_ids = case_statuses.iter().map(|(c, _)| *c).collect();
        let plan = state.plans.get_mut(&plan_id).expect("seed_entry: unknown plan");
        plan.entries.push(EntryRec {
            suite_id,
            name: run_name.to_string(),
            run_ids: vec![run_id],
            case_ids,
        });
        run_id
    }

    /// Reverse the section listing order, so children come back before their
    /// parents. Exercises the replicator's refusal to trust the listing.
    pub fn reverse_section_order(&self) {
        self.state.lock().unwrap().sections.reverse();
    }

    /// Record a prior result for a case in a run.
    pub fn seed_result(&self, run_id: Id, case_id: Id, status_id: Id) {
        let mut state = self.state.lock().unwrap();
        state.results.entry((run_id, case_id)).or_default().push(status_id);
    }

    // ----- inspection helpers -----

    pub fn suite_exists(&self, suite_id: Id) -> bool {
        self.state.lock().unwrap().suites.contains_key(&suite_id)
    }

    pub fn suite_name(&self, suite_id: Id) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .suites
            .get(&suite_id)
            .map(|s| s.name.clone())
    }

    pub fn suite_description(&self, suite_id: Id) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .suites
            .get(&suite_id)
            .and_then(|s| s.description.clone())
    }

    /// `(section id, name, parent id)` of every section of the suite, in
    /// creation order.
    pub fn sections_of(&self, suite_id: Id) -> Vec<(Id, String, Option<Id>)> {
        self.state
            .lock()
            .unwrap()
            .sections
            .iter()
            .filter(|(_, s)| s.suite_id == suite_id)
            .map(|(id, s)| (*id, s.name.clone(), s.parent_id))
            .collect()
    }

    /// Titles of the cases in one section, in creation order.
    pub fn case_titles_in(&self, section_id: Id) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .cases
            .iter()
            .filter(|(_, c)| c.section_id == section_id)
            .map(|(_, c)| c.title.clone())
            .collect()
    }

    /// Total case count across every section of a suite.
    pub fn case_count_of_suite(&self, suite_id: Id) -> usize {
        let state = self.state.lock().unwrap();
        let section_ids: Vec<Id> = state
            .sections
            .iter()
            .filter(|(_, s)| s.suite_id == suite_id)
            .map(|(id, _)| *id)
            .collect();
        state
            .cases
            .iter()
            .filter(|(_, c)| section_ids.contains(&c.section_id))
            .count()
    }

    /// `(run name, suite id, case ids)` per entry of a plan.
    pub fn plan_entries(&self, plan_id: Id) -> Vec<(String, Id, Vec<Id>)> {
        self.state
            .lock()
            .unwrap()
            .plans
            .get(&plan_id)
            .map(|p| {
                p.entries
                    .iter()
                    .map(|e| (e.name.clone(), e.suite_id, e.case_ids.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn plan_id_by_name(&self, name: &str) -> Option<Id> {
        self.state
            .lock()
            .unwrap()
            .plans
            .iter()
            .find(|(_, p)| p.name == name)
            .map(|(id, _)| *id)
    }

    /// Recorded result statuses for a case in a run.
    pub fn results_for(&self, run_id: Id, case_id: Id) -> Vec<Id> {
        self.state
            .lock()
            .unwrap()
            .results
            .get(&(run_id, case_id))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of POST calls whose path contains `needle`.
    pub fn post_count(&self, needle: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .post_log
            .iter()
            .filter(|p| p.contains(needle))
            .count()
    }
}

impl State {
    fn fresh_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    fn plan_json(&self, plan_id: Id) -> SyncResult<Value> {
        let plan = self
            .plans
            .get(&plan_id)
            .ok_or_else(|| not_found(&format!("plan {}", plan_id)))?;
        let entries: Vec<Value> = plan
            .entries
            .iter()
            .map(|entry| {
                let runs: Vec<Value> = entry
                    .run_ids
                    .iter()
                    .map(|run_id| {
                        let run = &self.runs[run_id];
                        json!({ "id": run_id, "name": run.name, "suite_id": run.suite_id })
                    })
                    .collect();
                json!({ "suite_id": entry.suite_id, "name": entry.name, "runs": runs })
            })
            .collect();
        Ok(json!({
            "id": plan_id,
            "name": plan.name,
            "description": plan.description,
            "project_id": plan.project_id,
            "entries": entries,
        }))
    }
}

fn not_found(what: &str) -> SyncError {
    SyncError::Remote {
        status: 400,
        message: format!("{} is not a valid entity", what),
    }
}

/// `"3&suite_id=10&section_id=20"` -> `(3, {"suite_id": 10, "section_id": 20})`
fn parse_id_and_params(rest: &str) -> (Id, HashMap<String, String>) {
    let mut pieces = rest.split('&');
    let id = pieces.next().unwrap_or("0").parse::<Id>().unwrap_or(0);
    let params = pieces
        .filter_map(|p| p.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    (id, params)
}

#[async_trait]
impl Gateway for FakeTestRail {
    async fn get(&self, path: &str) -> SyncResult<Value> {
        self.check_fail("GET", path, None)?;
        let state = self.state.lock().unwrap();

        if let Some(rest) = path.strip_prefix("get_suite/") {
            let suite_id: Id = rest.parse().unwrap_or(0);
            let suite = state
                .suites
                .get(&suite_id)
                .ok_or_else(|| not_found(&format!("suite {}", suite_id)))?;
            return Ok(json!({
                "id": suite_id,
                "name": suite.name,
                "description": suite.description,
            }));
        }

        if let Some(rest) = path.strip_prefix("get_sections/") {
            let (_project, params) = parse_id_and_params(rest);
            let suite_id: Id = params["suite_id"].parse().unwrap_or(0);
            let sections: Vec<Value> = state
                .sections
                .iter()
                .filter(|(_, s)| s.suite_id == suite_id)
                .map(|(id, s)| json!({ "id": id, "name": s.name, "parent_id": s.parent_id }))
                .collect();
            return Ok(Value::Array(sections));
        }

        if let Some(rest) = path.strip_prefix("get_cases/") {
            let (_project, params) = parse_id_and_params(rest);
            let section_id: Id = params["section_id"].parse().unwrap_or(0);
            let cases: Vec<Value> = state
                .cases
                .iter()
                .filter(|(_, c)| c.section_id == section_id)
                .map(|(id, c)| json!({ "id": id, "title": c.title }))
                .collect();
            return Ok(Value::Array(cases));
        }

        if let Some(rest) = path.strip_prefix("get_plans/") {
            let (project_id, params) = parse_id_and_params(rest);
            let created_by: Id = params["created_by"].parse().unwrap_or(0);
            let plans: Vec<Value> = state
                .plans
                .iter()
                .filter(|(_, p)| p.project_id == project_id && p.created_by == created_by)
                .map(|(id, p)| json!({ "id": id, "name": p.name }))
                .collect();
            return Ok(Value::Array(plans));
        }

        if let Some(rest) = path.strip_prefix("get_plan/") {
            let plan_id: Id = rest.parse().unwrap_or(0);
            return state.plan_json(plan_id);
        }

        if let Some(rest) = path.strip_prefix("get_tests/") {
            let (run_id, params) = parse_id_and_params(rest);
            let statuses: Vec<Id> = params["status_id"]
                .split(',')
                .filter_map(|s| s.parse().ok())
                .collect();
            let run = state
                .runs
                .get(&run_id)
                .ok_or_else(|| not_found(&format!("run {}", run_id)))?;
            let tests: Vec<Value> = run
                .tests
                .iter()
                .enumerate()
                .filter(|(_, (_, status))| statuses.contains(status))
                .map(|(index, (case_id, status))| {
                    json!({ "id": run_id * 100 + index as i64, "case_id": case_id, "status_id": status })
                })
                .collect();
            return Ok(Value::Array(tests));
        }

        if let Some(rest) = path.strip_prefix("get_results_for_case/") {
            let (run_id, case_id) = rest
                .split_once('/')
                .and_then(|(r, c)| Some((r.parse::<Id>().ok()?, c.parse::<Id>().ok()?)))
                .ok_or_else(|| not_found(path))?;
            let results: Vec<Value> = state
                .results
                .get(&(run_id, case_id))
                .map(|statuses| statuses.iter().map(|s| json!({ "status_id": s })).collect())
                .unwrap_or_default();
            return Ok(Value::Array(results));
        }

        Err(not_found(path))
    }

    async fn post(&self, path: &str, body: &Value) -> SyncResult<Value> {
        self.check_fail("POST", path, Some(body))?;
        let mut state = self.state.lock().unwrap();
        state.post_log.push(path.to_string());

        if let Some(rest) = path.strip_prefix("add_suite/") {
            let project_id: Id = rest.parse().unwrap_or(0);
            let id = state.fresh_id();
            let name = body["name"].as_str().unwrap_or_default().to_string();
            let description = body["description"].as_str().map(String::from);
            state.suites.insert(
                id,
                SuiteRec {
                    project_id,
                    name: name.clone(),
                    description: description.clone(),
                },
            );
            return Ok(json!({ "id": id, "name": name, "description": description }));
        }

        if let Some(rest) = path.strip_prefix("update_suite/") {
            let suite_id: Id = rest.parse().unwrap_or(0);
            let name = body["name"].as_str().unwrap_or_default().to_string();
            let description = body["description"].as_str().map(String::from);
            let suite = state
                .suites
                .get_mut(&suite_id)
                .ok_or_else(|| not_found(&format!("suite {}", suite_id)))?;
            suite.name = name.clone();
            suite.description = description.clone();
            return Ok(json!({ "id": suite_id, "name": name, "description": description }));
        }

        if let Some(rest) = path.strip_prefix("delete_suite/") {
            let suite_id: Id = rest.parse().unwrap_or(0);
            state
                .suites
                .remove(&suite_id)
                .ok_or_else(|| not_found(&format!("suite {}", suite_id)))?;
            let gone: Vec<Id> = state
                .sections
                .iter()
                .filter(|(_, s)| s.suite_id == suite_id)
                .map(|(id, _)| *id)
                .collect();
            state.sections.retain(|(_, s)| s.suite_id != suite_id);
            state.cases.retain(|(_, c)| !gone.contains(&c.section_id));
            return Ok(Value::Null);
        }

        if let Some(rest) = path.strip_prefix("add_section/") {
            let _project_id: Id = rest.parse().unwrap_or(0);
            let suite_id = body["suite_id"].as_i64().unwrap_or(0);
            let parent_id = body.get("parent_id").and_then(|p| p.as_i64());
            if let Some(parent) = parent_id {
                let parent_ok = state
                    .sections
                    .iter()
                    .any(|(id, s)| *id == parent && s.suite_id == suite_id);
                if !parent_ok {
                    return Err(not_found(&format!("parent section {}", parent)));
                }
            }
            let id = state.fresh_id();
            let name = body["name"].as_str().unwrap_or_default().to_string();
            state.sections.push((
                id,
                SectionRec {
                    suite_id,
                    name: name.clone(),
                    parent_id,
                },
            ));
            return Ok(json!({ "id": id, "name": name, "parent_id": parent_id }));
        }

        if let Some(rest) = path.strip_prefix("copy_cases_to_section/") {
            let section_id: Id = rest.parse().unwrap_or(0);
            let case_ids: Vec<Id> = body["case_ids"]
                .as_str()
                .unwrap_or_default()
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if case_ids.is_empty() {
                return Err(not_found("empty case_ids"));
            }
            let mut copies = Vec::new();
            for case_id in &case_ids {
                let title = state
                    .cases
                    .iter()
                    .find(|(id, _)| id == case_id)
                    .map(|(_, c)| c.title.clone())
                    .ok_or_else(|| not_found(&format!("case {}", case_id)))?;
                copies.push(title);
            }
            for title in copies {
                let id = state.fresh_id();
                state.cases.push((id, CaseRec { section_id, title }));
            }
            return Ok(Value::Null);
        }

        if let Some(rest) = path.strip_prefix("add_plan_entry/") {
            let plan_id: Id = rest.parse().unwrap_or(0);
            let suite_id = body["suite_id"].as_i64().unwrap_or(0);
            let name = body["name"].as_str().unwrap_or_default().to_string();
            let run_id = state.fresh_id();
            state.runs.insert(
                run_id,
                RunRec {
                    name: name.clone(),
                    suite_id,
                    tests: Vec::new(),
                },
            );
            let plan = state
                .plans
                .get_mut(&plan_id)
                .ok_or_else(|| not_found(&format!("plan {}", plan_id)))?;
            plan.entries.push(EntryRec {
                suite_id,
                name: name.clone(),
                run_ids: vec![run_id],
                case_ids: Vec::new(),
            });
            return Ok(json!({
                "runs": [{ "id": run_id, "name": name, "suite_id": suite_id }],
            }));
        }

        if let Some(rest) = path.strip_prefix("add_plan/") {
            let project_id: Id = rest.parse().unwrap_or(0);
            let plan_id = state.fresh_id();
            let name = body["name"].as_str().unwrap_or_default().to_string();
            let description = body["description"].as_str().map(String::from);
            let mut entries = Vec::new();
            if let Some(body_entries) = body["entries"].as_array() {
                for entry in body_entries {
                    let suite_id = entry["suite_id"].as_i64().unwrap_or(0);
                    let entry_name = entry["name"].as_str().unwrap_or_default().to_string();
                    let case_ids: Vec<Id> = entry["case_ids"]
                        .as_array()
                        .map(|ids| ids.iter().filter_map(|v| v.as_i64()).collect())
                        .unwrap_or_default();
                    let run_id = state.fresh_id();
                    state.runs.insert(
                        run_id,
                        RunRec {
                            name: entry_name.clone(),
                            suite_id,
                            tests: case_ids.iter().map(|c| (*c, 3)).collect(),
                        },
                    );
                    entries.push(EntryRec {
                        suite_id,
                        name: entry_name,
                        run_ids: vec![run_id],
                        case_ids,
                    });
                }
            }
            state.plans.insert(
                plan_id,
                PlanRec {
                    project_id,
                    name,
                    description,
                    created_by: 0,
                    entries,
                },
            );
            return state.plan_json(plan_id);
        }

        if let Some(rest) = path.strip_prefix("add_result_for_case/") {
            let (run_id, case_id) = rest
                .split_once('/')
                .and_then(|(r, c)| Some((r.parse::<Id>().ok()?, c.parse::<Id>().ok()?)))
                .ok_or_else(|| not_found(path))?;
            let in_run = state
                .runs
                .get(&run_id)
                .ok_or_else(|| not_found(&format!("run {}", run_id)))?
                .tests
                .iter()
                .any(|(c, _)| *c == case_id);
            if !in_run {
                return Err(not_found(&format!("case {} in run {}", case_id, run_id)));
            }
            let status_id = body["status_id"].as_i64().unwrap_or(0);
            state
                .results
                .entry((run_id, case_id))
                .or_default()
                .push(status_id);
            let id = state.fresh_id();
            return Ok(json!({ "id": id, "status_id": status_id }));
        }

        Err(not_found(path))
    }
}
