// crates/crm-harness-cli/src/main.rs
// ============================================================================
// Module: CRM Harness CLI Entry Point
// Description: Command dispatcher for running CRM suites against a live API.
// Purpose: Run catalog suites, list scenarios, and check credentials.
// Dependencies: clap, crm-harness, tracing
// ============================================================================

//! ## Overview
//! `crm-harness run` connects to the configured API, runs the selected
//! suites sequentially, prints one line per scenario, and writes the run
//! artifacts. The exit code is zero only when every scenario passed.
//! Configuration comes from `CRM_HARNESS_*` environment variables; flags
//! override the base URL, timeout, and artifact root.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use crm_harness::CrmSession;
use crm_harness::HarnessConfig;
use crm_harness::HarnessError;
use crm_harness::Scenario;
use crm_harness::ScenarioRunner;
use crm_harness::SuiteReport;
use crm_harness::auth::request_token;
use crm_harness::catalog;
use crm_harness::report::RunArtifacts;
use crm_harness::report::RunSummary;
use crm_harness::report::default_run_root;
use crm_harness::report::now_millis;
use crm_harness::scenario::ResourceSpec;
use crm_harness::scenario::ScenarioStatus;
use crm_harness::telemetry::init_logging;
use tracing::info;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Suite selector matching every catalog suite.
const ALL_SUITES: &str = "all";

/// Top-level arguments.
#[derive(Parser, Debug)]
#[command(name = "crm-harness", version, about = "Integration harness for a CRM HTTP API")]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run suites against the configured API.
    Run(RunCommand),
    /// List every suite and scenario in the catalog.
    List,
    /// Perform only the token exchange.
    Token(ConnectArgs),
}

/// Connection overrides shared by commands that reach the API.
#[derive(Args, Debug, Clone, Default)]
struct ConnectArgs {
    /// API base URL (overrides `CRM_HARNESS_BASE_URL`).
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
    /// Request timeout in seconds (overrides `CRM_HARNESS_TIMEOUT_SEC`).
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout_sec: Option<u64>,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Connection overrides.
    #[command(flatten)]
    connect: ConnectArgs,
    /// Suite name or `all`.
    #[arg(long, value_name = "SUITE", default_value = ALL_SUITES)]
    suite: String,
    /// Single scenario to run (for example `get` or `child:tasks`).
    #[arg(long, value_name = "SCENARIO")]
    scenario: Option<String>,
    /// Artifact directory (overrides `CRM_HARNESS_RUN_ROOT`).
    #[arg(long, value_name = "DIR")]
    run_root: Option<PathBuf>,
}

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug)]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

impl From<HarnessError> for CliError {
    fn from(err: HarnessError) -> Self {
        Self::new(err.to_string())
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Suites paired with the scenarios selected for them.
type RunPlan = Vec<(ResourceSpec, Vec<Scenario>)>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    init_logging("info");
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.message),
    }
}

/// Executes the command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(command) => command_run(command),
        Commands::List => command_list(),
        Commands::Token(connect) => command_token(&connect),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs the selected suites and writes artifacts.
fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let plan = build_plan(&command.suite, command.scenario.as_deref())?;
    let config = apply_run_root(
        apply_overrides(HarnessConfig::load()?, &command.connect)?,
        command.run_root.clone(),
    );
    let artifacts = RunArtifacts::create(config.run_root.clone().unwrap_or_else(default_run_root))?;

    let session = CrmSession::connect(config)?;
    let runner = ScenarioRunner::new(session.client());
    let started_at_ms = now_millis();
    let mut report = SuiteReport::default();
    for (spec, scenarios) in &plan {
        info!(suite = spec.name, scenarios = scenarios.len(), "running suite");
        let suite_report = runner.run_selected(spec, scenarios);
        for line in outcome_lines(&suite_report) {
            write_line(&line)?;
        }
        report.merge(suite_report);
    }

    let all_passed = report.all_passed();
    let summary =
        RunSummary::new(session.client().base_url(), session.is_authenticated(), started_at_ms, report);
    write_line(&format!("{} passed, {} failed", summary.passed, summary.failed))?;
    artifacts.write_run(&summary, &session.client().transcript())?;
    write_line(&format!("artifacts: {}", artifacts.root().display()))?;
    Ok(if all_passed { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Prints every suite and scenario.
fn command_list() -> CliResult<ExitCode> {
    for spec in catalog::all() {
        for scenario in spec.scenarios() {
            write_line(&format!("{} {scenario}", spec.name))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Performs the token exchange without printing the token.
fn command_token(connect: &ConnectArgs) -> CliResult<ExitCode> {
    let config = apply_overrides(HarnessConfig::load()?, connect)?;
    let Some(auth) = config.auth.as_ref() else {
        return Err(CliError::new(
            "token exchange requires CRM_HARNESS_AUTH_URL, CRM_HARNESS_AUTH_USERNAME, and \
             CRM_HARNESS_AUTH_PASSWORD"
                .to_string(),
        ));
    };
    request_token(auth, config.timeout)?;
    write_line(&format!("token exchange succeeded for {}", auth.username))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Applies command-line overrides on top of the environment configuration.
fn apply_overrides(config: HarnessConfig, connect: &ConnectArgs) -> CliResult<HarnessConfig> {
    let mut config = config;
    if let Some(base_url) = connect.base_url.as_deref() {
        config.base_url = HarnessConfig::for_base_url(base_url)?.base_url;
    }
    if let Some(seconds) = connect.timeout_sec {
        config = config.with_timeout(Some(Duration::from_secs(seconds)));
    }
    Ok(config)
}

/// Replaces the configured artifact root when `--run-root` is given.
fn apply_run_root(config: HarnessConfig, run_root: Option<PathBuf>) -> HarnessConfig {
    let mut config = config;
    if let Some(run_root) = run_root {
        config = config.with_run_root(run_root);
    }
    config
}

/// Resolves the suite and scenario selectors into a run plan.
fn build_plan(suite: &str, scenario: Option<&str>) -> CliResult<RunPlan> {
    let specs = if suite == ALL_SUITES {
        catalog::all()
    } else {
        let spec = catalog::find(suite).ok_or_else(|| {
            CliError::new(format!(
                "unknown suite `{suite}` (expected {ALL_SUITES} or one of: {})",
                catalog::names().join(", ")
            ))
        })?;
        vec![spec]
    };
    let selected = scenario
        .map(|raw| Scenario::parse(raw).ok_or_else(|| CliError::new(format!("unknown scenario `{raw}`"))))
        .transpose()?;
    let plan: RunPlan = specs
        .into_iter()
        .filter_map(|spec| {
            let scenarios: Vec<Scenario> = spec
                .scenarios()
                .into_iter()
                .filter(|candidate| selected.is_none_or(|wanted| wanted == *candidate))
                .collect();
            (!scenarios.is_empty()).then_some((spec, scenarios))
        })
        .collect();
    if plan.is_empty() {
        return Err(CliError::new(format!(
            "suite `{suite}` has no scenario `{}`",
            scenario.unwrap_or_default()
        )));
    }
    Ok(plan)
}

/// Formats one line per scenario outcome.
fn outcome_lines(report: &SuiteReport) -> Vec<String> {
    report
        .outcomes
        .iter()
        .map(|outcome| match outcome.status {
            ScenarioStatus::Pass => {
                format!("PASS {} {} ({} ms)", outcome.suite, outcome.scenario, outcome.duration_ms)
            }
            ScenarioStatus::Fail => format!(
                "FAIL {} {}: {}",
                outcome.suite,
                outcome.scenario,
                outcome.error.as_deref().unwrap_or("unknown error")
            ),
        })
        .collect()
}

/// Writes a line to stdout, mapping I/O failures into [`CliError`].
fn write_line(message: &str) -> CliResult<()> {
    write_stdout_line(message).map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
