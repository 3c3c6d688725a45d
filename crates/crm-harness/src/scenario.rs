// crates/crm-harness/src/scenario.rs
// ============================================================================
// Module: Scenario Runner
// Description: Generic CRUD and sub-resource scenarios over a resource table.
// Purpose: Run every resource suite through one parametrized runner.
// Dependencies: reqwest, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! A [`ResourceSpec`] describes one resource suite: its kind, prerequisite
//! fixtures, and the payloads used by each scenario. [`ScenarioRunner::run`]
//! executes one [`Scenario`] against a suite definition; [`ScenarioRunner::run_suite`]
//! runs them all and collects a [`SuiteReport`].
//! Invariants:
//! - Scenarios are independent: each acquires and releases its own fixtures.
//! - The first failing step aborts the scenario; fixtures are still released.
//! - A failed scenario never stops the rest of the suite.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tracing::error;
use tracing::info;
use tracing::info_span;

use crate::assert::expect_fields;
use crate::assert::expect_listed;
use crate::assert::expect_non_empty;
use crate::client::CrmClient;
use crate::error::HarnessError;
use crate::fixture::Fixture;
use crate::fixture::release_all;
use crate::report::duration_millis;
use crate::resource::ChildKind;
use crate::resource::ResourceApi;
use crate::resource::ResourceId;
use crate::resource::ResourceKind;

// ============================================================================
// SECTION: Specs
// ============================================================================

/// Builds a request body from the ids of already-acquired prerequisites.
pub type PayloadFn = fn(&Prerequisites) -> Result<Value, HarnessError>;

/// Ids of the fixtures acquired before a scenario body runs.
#[derive(Debug, Clone, Default)]
pub struct Prerequisites {
    /// Acquired ids keyed by kind.
    ids: BTreeMap<ResourceKind, ResourceId>,
}

impl Prerequisites {
    /// Returns the id of the prerequisite of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] when no such prerequisite was declared.
    pub fn id(&self, kind: ResourceKind) -> Result<&ResourceId, HarnessError> {
        self.ids.get(&kind).ok_or_else(|| {
            HarnessError::Config(format!("no {} prerequisite declared", kind.label()))
        })
    }

    /// Records an acquired prerequisite.
    pub fn insert(&mut self, kind: ResourceKind, id: ResourceId) {
        self.ids.insert(kind, id);
    }
}

/// A fixture acquired before each scenario of a suite.
#[derive(Debug, Clone, Copy)]
pub struct PrerequisiteSpec {
    /// Kind of the prerequisite resource.
    pub kind: ResourceKind,
    /// Creation body; sees the prerequisites declared before it.
    pub payload: PayloadFn,
}

/// A customer sub-resource flow.
#[derive(Debug, Clone, Copy)]
pub struct ChildFlowSpec {
    /// Child collection.
    pub child: ChildKind,
    /// Creation body for the child record.
    pub payload: PayloadFn,
    /// Whether to re-fetch the child by id and compare its fields.
    pub fetch_by_id: bool,
}

/// One resource suite.
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    /// Suite name (for example `customers`).
    pub name: &'static str,
    /// Resource kind under test.
    pub kind: ResourceKind,
    /// Fixtures acquired before every scenario, in order.
    pub prerequisites: Vec<PrerequisiteSpec>,
    /// Creation body for the subject of get/update/list/status/child scenarios.
    pub create: PayloadFn,
    /// Update body applied by the update scenario.
    pub update: PayloadFn,
    /// Creation body for the subject of the update scenario; `create` when absent.
    pub update_subject: Option<PayloadFn>,
    /// Records created by the list scenario; the `create` body alone when empty.
    pub list_subjects: Vec<PayloadFn>,
    /// Creation body for the subject of the delete scenario.
    pub delete_candidate: PayloadFn,
    /// Status transition body, when the resource supports one.
    pub status: Option<PayloadFn>,
    /// Sub-resource flows under the subject.
    pub children: Vec<ChildFlowSpec>,
}

impl ResourceSpec {
    /// Returns every scenario applicable to this suite, in run order.
    #[must_use]
    pub fn scenarios(&self) -> Vec<Scenario> {
        let mut scenarios = vec![Scenario::Get, Scenario::Update, Scenario::List, Scenario::Delete];
        if self.status.is_some() {
            scenarios.push(Scenario::Status);
        }
        scenarios.extend(self.children.iter().map(|flow| Scenario::Child(flow.child)));
        scenarios
    }

    /// Returns the child flow for `child`, if declared.
    #[must_use]
    pub fn child_flow(&self, child: ChildKind) -> Option<&ChildFlowSpec> {
        self.children.iter().find(|flow| flow.child == child)
    }
}

// ============================================================================
// SECTION: Scenarios
// ============================================================================

/// Scenario identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scenario {
    /// Create, fetch, compare.
    Get,
    /// Create, update, fetch, compare merged fields.
    Update,
    /// Create, list, expect the id.
    List,
    /// Create, delete, expect 404.
    Delete,
    /// Create, patch status, fetch, compare.
    Status,
    /// Create parent, create child, list children.
    Child(ChildKind),
}

impl Scenario {
    /// Parses a scenario name (`get`, `update`, `list`, `delete`, `status`,
    /// or `child:<segment>`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "get" => Some(Self::Get),
            "update" => Some(Self::Update),
            "list" => Some(Self::List),
            "delete" => Some(Self::Delete),
            "status" => Some(Self::Status),
            other => {
                other.strip_prefix("child:").and_then(ChildKind::from_segment).map(Self::Child)
            }
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("get"),
            Self::Update => f.write_str("update"),
            Self::List => f.write_str("list"),
            Self::Delete => f.write_str("delete"),
            Self::Status => f.write_str("status"),
            Self::Child(child) => write!(f, "child:{child}"),
        }
    }
}

impl Serialize for Scenario {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Scenario result classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// Every step succeeded.
    Pass,
    /// A step failed.
    Fail,
}

/// Outcome of one scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    /// Suite name.
    pub suite: String,
    /// Scenario identifier.
    pub scenario: Scenario,
    /// Result classification.
    pub status: ScenarioStatus,
    /// Error kind label on failure.
    pub error_kind: Option<&'static str>,
    /// Error text on failure.
    pub error: Option<String>,
    /// Wall-clock duration.
    pub duration_ms: u64,
}

/// Outcomes of one or more suites.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SuiteReport {
    /// Outcomes in run order.
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    /// Returns the number of passing scenarios.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.status == ScenarioStatus::Pass).count()
    }

    /// Returns the failing outcomes.
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.status == ScenarioStatus::Fail).collect()
    }

    /// Returns true when at least one scenario ran and none failed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        !self.outcomes.is_empty() && self.failures().is_empty()
    }

    /// Appends the outcomes of another report.
    pub fn merge(&mut self, other: Self) {
        self.outcomes.extend(other.outcomes);
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Sequential scenario runner bound to one client.
#[derive(Clone, Copy)]
pub struct ScenarioRunner<'c> {
    /// Client used for every scenario.
    client: &'c CrmClient,
}

impl<'c> ScenarioRunner<'c> {
    /// Creates a runner.
    #[must_use]
    pub const fn new(client: &'c CrmClient) -> Self {
        Self {
            client,
        }
    }

    /// Runs every scenario of `spec` and collects their outcomes.
    #[must_use]
    pub fn run_suite(&self, spec: &ResourceSpec) -> SuiteReport {
        self.run_selected(spec, &spec.scenarios())
    }

    /// Runs the given scenarios of `spec` in order and collects outcomes.
    #[must_use]
    pub fn run_selected(&self, spec: &ResourceSpec, scenarios: &[Scenario]) -> SuiteReport {
        let outcomes = scenarios
            .iter()
            .map(|scenario| {
                let started = Instant::now();
                let result = self.run(spec, *scenario);
                let duration_ms = duration_millis(started.elapsed());
                match result {
                    Ok(()) => {
                        info!(suite = spec.name, scenario = %scenario, duration_ms, "scenario passed");
                        ScenarioOutcome {
                            suite: spec.name.to_string(),
                            scenario: *scenario,
                            status: ScenarioStatus::Pass,
                            error_kind: None,
                            error: None,
                            duration_ms,
                        }
                    }
                    Err(err) => {
                        error!(suite = spec.name, scenario = %scenario, error = %err, "scenario failed");
                        ScenarioOutcome {
                            suite: spec.name.to_string(),
                            scenario: *scenario,
                            status: ScenarioStatus::Fail,
                            error_kind: Some(err.kind()),
                            error: Some(err.to_string()),
                            duration_ms,
                        }
                    }
                }
            })
            .collect();
        SuiteReport {
            outcomes,
        }
    }

    /// Runs one scenario with setup and unconditional teardown.
    ///
    /// # Errors
    ///
    /// Returns the first [`HarnessError`] raised by setup, the scenario body,
    /// or teardown, in that order of precedence.
    pub fn run(&self, spec: &ResourceSpec, scenario: Scenario) -> Result<(), HarnessError> {
        let span = info_span!("scenario", suite = spec.name, scenario = %scenario);
        let _entered = span.enter();
        let (fixtures, prerequisites) = self.acquire_prerequisites(spec)?;
        let body = self.run_body(spec, scenario, &prerequisites);
        let teardown = release_all(fixtures);
        body.and(teardown)
    }

    /// Creates the suite's prerequisite fixtures in declaration order.
    fn acquire_prerequisites(
        &self,
        spec: &ResourceSpec,
    ) -> Result<(Vec<Fixture<'c>>, Prerequisites), HarnessError> {
        let mut fixtures = Vec::with_capacity(spec.prerequisites.len());
        let mut prerequisites = Prerequisites::default();
        for prerequisite in &spec.prerequisites {
            let payload = (prerequisite.payload)(&prerequisites)?;
            let fixture = Fixture::acquire(self.client, prerequisite.kind, &payload)?;
            prerequisites.insert(prerequisite.kind, fixture.id().clone());
            fixtures.push(fixture);
        }
        Ok((fixtures, prerequisites))
    }

    /// Dispatches to the scenario body.
    fn run_body(
        &self,
        spec: &ResourceSpec,
        scenario: Scenario,
        prerequisites: &Prerequisites,
    ) -> Result<(), HarnessError> {
        match scenario {
            Scenario::Get => self.get_round_trip(spec, prerequisites),
            Scenario::Update => self.update_round_trip(spec, prerequisites),
            Scenario::List => self.list_contains(spec, prerequisites),
            Scenario::Delete => self.delete_then_absent(spec, prerequisites),
            Scenario::Status => self.status_transition(spec, prerequisites),
            Scenario::Child(child) => self.child_flow(spec, child, prerequisites),
        }
    }

    /// Create, fetch, and compare every readable create field.
    fn get_round_trip(
        &self,
        spec: &ResourceSpec,
        prerequisites: &Prerequisites,
    ) -> Result<(), HarnessError> {
        let payload = (spec.create)(prerequisites)?;
        let subject = Fixture::acquire(self.client, spec.kind, &payload)?;
        let record = subject.api().fetch(subject.id())?;
        expect_fields(&context(spec.kind, subject.id()), &record, &readable_fields(spec.kind, &payload)?)?;
        info!(kind = %spec.kind, id = %subject.id(), "verified {} data", spec.kind.label());
        subject.release()
    }

    /// Create, update, fetch, and compare the merged field set.
    fn update_round_trip(
        &self,
        spec: &ResourceSpec,
        prerequisites: &Prerequisites,
    ) -> Result<(), HarnessError> {
        let subject_payload = spec.update_subject.unwrap_or(spec.create);
        let payload = subject_payload(prerequisites)?;
        let update = (spec.update)(prerequisites)?;
        let subject = Fixture::acquire(self.client, spec.kind, &payload)?;
        subject.api().update(subject.id(), &update)?;
        let record = subject.api().fetch(subject.id())?;
        let mut expected = readable_fields(spec.kind, &payload)?;
        expected.extend(readable_fields(spec.kind, &update)?);
        expect_fields(&context(spec.kind, subject.id()), &record, &expected)?;
        info!(kind = %spec.kind, id = %subject.id(), "verified updated {} data", spec.kind.label());
        subject.release()
    }

    /// Create, list, and expect a non-empty collection containing every id.
    fn list_contains(
        &self,
        spec: &ResourceSpec,
        prerequisites: &Prerequisites,
    ) -> Result<(), HarnessError> {
        let payloads = if spec.list_subjects.is_empty() {
            vec![(spec.create)(prerequisites)?]
        } else {
            spec.list_subjects
                .iter()
                .map(|payload| payload(prerequisites))
                .collect::<Result<Vec<_>, _>>()?
        };
        let mut subjects = Vec::with_capacity(payloads.len());
        for payload in &payloads {
            subjects.push(Fixture::acquire(self.client, spec.kind, payload)?);
        }
        let records = ResourceApi::new(self.client, spec.kind).list()?;
        let collection = spec.kind.collection_path();
        expect_non_empty(&collection, &records)?;
        for subject in &subjects {
            expect_listed(&collection, &records, subject.id())?;
        }
        info!(kind = %spec.kind, count = records.len(), "listed {}", spec.kind);
        release_all(subjects)
    }

    /// Create, delete, and expect 404 on re-fetch.
    fn delete_then_absent(
        &self,
        spec: &ResourceSpec,
        prerequisites: &Prerequisites,
    ) -> Result<(), HarnessError> {
        let payload = (spec.delete_candidate)(prerequisites)?;
        let subject = Fixture::acquire(self.client, spec.kind, &payload)?;
        let id = subject.id().clone();
        let api = subject.api();
        subject.release()?;
        api.expect_absent(&id)
    }

    /// Create, patch status, fetch, and compare the status fields.
    fn status_transition(
        &self,
        spec: &ResourceSpec,
        prerequisites: &Prerequisites,
    ) -> Result<(), HarnessError> {
        let Some(status) = spec.status else {
            return Err(HarnessError::Config(format!("{} has no status scenario", spec.name)));
        };
        let payload = (spec.create)(prerequisites)?;
        let status_payload = status(prerequisites)?;
        let subject = Fixture::acquire(self.client, spec.kind, &payload)?;
        subject.api().update_status(subject.id(), &status_payload)?;
        let record = subject.api().fetch(subject.id())?;
        expect_fields(
            &context(spec.kind, subject.id()),
            &record,
            &readable_fields(spec.kind, &status_payload)?,
        )?;
        subject.release()
    }

    /// Create parent, create child, optionally re-fetch it, then list.
    fn child_flow(
        &self,
        spec: &ResourceSpec,
        child: ChildKind,
        prerequisites: &Prerequisites,
    ) -> Result<(), HarnessError> {
        let Some(flow) = spec.child_flow(child) else {
            return Err(HarnessError::Config(format!("{} has no {child} flow", spec.name)));
        };
        let payload = (spec.create)(prerequisites)?;
        let child_payload = (flow.payload)(prerequisites)?;
        let subject = Fixture::acquire(self.client, spec.kind, &payload)?;
        let children = subject.api().children(subject.id(), child);
        let child_id = children.create(&child_payload)?;
        let collection = children.collection_path();
        if flow.fetch_by_id {
            let record = children.fetch(&child_id)?;
            let expected = child_payload.as_object().cloned().unwrap_or_default();
            expect_fields(&format!("{collection}/{child_id}"), &record, &expected)?;
        }
        let records = children.list()?;
        expect_non_empty(&collection, &records)?;
        expect_listed(&collection, &records, &child_id)?;
        info!(parent = %subject.id(), child = %child, count = records.len(), "listed {child}");
        subject.release()
    }
}

/// Describes a record for error messages.
fn context(kind: ResourceKind, id: &ResourceId) -> String {
    kind.item_path(id)
}

/// Returns the payload fields expected on read-back.
fn readable_fields(kind: ResourceKind, payload: &Value) -> Result<Map<String, Value>, HarnessError> {
    let Value::Object(map) = payload else {
        return Err(HarnessError::UnexpectedShape {
            context: kind.collection_path(),
            message: "payload must be a JSON object".to_string(),
        });
    };
    let mut fields = map.clone();
    for field in kind.write_only_fields() {
        fields.remove(*field);
    }
    Ok(fields)
}
