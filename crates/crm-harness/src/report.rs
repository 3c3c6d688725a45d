// crates/crm-harness/src/report.rs
// ============================================================================
// Module: Run Reports
// Description: Run artifact directory and summary rendering.
// Purpose: Persist suite outcomes and the request transcript after a run.
// Dependencies: serde, serde_jcs
// ============================================================================

//! ## Overview
//! A run writes three artifacts into its root: `summary.json` (canonical JSON),
//! `summary.md`, and `transcript.json`. JSON artifacts use JCS serialization
//! so repeated runs with identical outcomes diff cleanly.

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::client::TranscriptEntry;
use crate::error::HarnessError;
use crate::scenario::ScenarioStatus;
use crate::scenario::SuiteReport;

/// Summary artifact file name.
pub const SUMMARY_JSON: &str = "summary.json";
/// Markdown summary artifact file name.
pub const SUMMARY_MARKDOWN: &str = "summary.md";
/// Transcript artifact file name.
pub const TRANSCRIPT_JSON: &str = "transcript.json";

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
///
/// Reports carry `u64` values because canonical JSON has no 128-bit integers.
#[must_use]
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Returns the current wall-clock time in milliseconds since the epoch.
#[must_use]
pub fn now_millis() -> u64 {
    duration_millis(SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default())
}

/// Returns the default artifact root for a run started now.
#[must_use]
pub fn default_run_root() -> PathBuf {
    PathBuf::from("target/crm-harness").join(format!("run_{}", now_millis()))
}

// ============================================================================
// SECTION: Summary
// ============================================================================

/// Serialized run summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// API base URL the run targeted.
    pub base_url: String,
    /// Whether a token exchange preceded the run.
    pub authenticated: bool,
    /// Run start time in epoch milliseconds.
    pub started_at_ms: u64,
    /// Run end time in epoch milliseconds.
    pub ended_at_ms: u64,
    /// Passing scenario count.
    pub passed: usize,
    /// Failing scenario count.
    pub failed: usize,
    /// Per-scenario outcomes.
    pub report: SuiteReport,
}

impl RunSummary {
    /// Builds a summary from a finished report.
    #[must_use]
    pub fn new(
        base_url: &str,
        authenticated: bool,
        started_at_ms: u64,
        report: SuiteReport,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            authenticated,
            started_at_ms,
            ended_at_ms: now_millis(),
            passed: report.passed(),
            failed: report.failures().len(),
            report,
        }
    }
}

/// Renders a run summary as Markdown.
#[must_use]
pub fn summary_markdown(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str("# CRM Harness Summary\n\n");
    out.push_str(&format!("- Base URL: `{}`\n", summary.base_url));
    out.push_str(&format!("- Authenticated: {}\n", summary.authenticated));
    out.push_str(&format!("- Passed: {}\n", summary.passed));
    out.push_str(&format!("- Failed: {}\n", summary.failed));
    out.push_str(&format!(
        "- Duration (ms): {}\n\n",
        summary.ended_at_ms.saturating_sub(summary.started_at_ms)
    ));
    out.push_str("## Scenarios\n\n");
    if summary.report.outcomes.is_empty() {
        out.push_str("- (none)\n");
        return out;
    }
    out.push_str("| Suite | Scenario | Status | Duration (ms) | Error |\n");
    out.push_str("|---|---|---|---|---|\n");
    for outcome in &summary.report.outcomes {
        let status = match outcome.status {
            ScenarioStatus::Pass => "pass",
            ScenarioStatus::Fail => "FAIL",
        };
        let error = outcome.error.as_deref().unwrap_or("").replace('|', "\\|").replace('\n', " ");
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            outcome.suite, outcome.scenario, status, outcome.duration_ms, error
        ));
    }
    out
}

// ============================================================================
// SECTION: Artifacts
// ============================================================================

/// Artifact directory for one run.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    /// Root directory.
    root: PathBuf,
}

impl RunArtifacts {
    /// Creates the artifact root directory.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Artifact`] when the directory cannot be created.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, HarnessError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|err| {
            HarnessError::Artifact(format!("create {}: {err}", root.display()))
        })?;
        Ok(Self {
            root,
        })
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a JSON artifact using canonical JCS serialization.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Artifact`] on serialization or I/O failure.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf, HarnessError> {
        let bytes = serde_jcs::to_vec(value)
            .map_err(|err| HarnessError::Artifact(format!("serialize {name}: {err}")))?;
        self.write_bytes(name, &bytes)
    }

    /// Writes a UTF-8 text artifact.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Artifact`] on I/O failure.
    pub fn write_text(&self, name: &str, value: &str) -> Result<PathBuf, HarnessError> {
        self.write_bytes(name, value.as_bytes())
    }

    /// Writes the summary pair and the transcript.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Artifact`] when any artifact cannot be written.
    pub fn write_run(
        &self,
        summary: &RunSummary,
        transcript: &[TranscriptEntry],
    ) -> Result<Vec<PathBuf>, HarnessError> {
        Ok(vec![
            self.write_json(SUMMARY_JSON, summary)?,
            self.write_text(SUMMARY_MARKDOWN, &summary_markdown(summary))?,
            self.write_json(TRANSCRIPT_JSON, &transcript)?,
        ])
    }

    fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, HarnessError> {
        let path = self.root.join(name);
        fs::write(&path, bytes)
            .map_err(|err| HarnessError::Artifact(format!("write {}: {err}", path.display())))?;
        Ok(path)
    }
}
