//! story-verify - CI gate for dialogue content.
//!
//! Loads a content directory, runs every verification pass and compares the
//! findings against a committed baseline. Exits nonzero only when a violation
//! appears that the baseline does not already list.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use story_core::{
    load_registry, write_report, Baseline, BaselineDiff, BaselineError, SimulationConfig,
    VerificationReport, Verifier,
};

const BASELINE_FILE: &str = "verification-baseline.json";

#[derive(Parser, Debug)]
#[command(name = "story-verify")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify dialogue graphs and ratchet known violations")]
struct Cli {
    /// Content directory holding manifest.toml
    #[arg(long, env = "STORY_CONTENT_DIR", default_value = "content")]
    content: PathBuf,

    /// Baseline file [default: <content>/verification-baseline.json]
    #[arg(long, env = "STORY_BASELINE")]
    baseline: Option<PathBuf>,

    /// Write the full JSON report here
    #[arg(long, env = "STORY_REPORT")]
    report: Option<PathBuf>,

    /// TOML file with a [simulation] table of exploration ceilings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Accept the current findings as the new baseline
    #[arg(long)]
    write_baseline: bool,
}

#[derive(Debug, Default, Deserialize)]
struct VerifyConfig {
    #[serde(default)]
    simulation: SimulationConfig,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<VerifyConfig> {
    let Some(path) = path else {
        return Ok(VerifyConfig::default());
    };
    let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

fn print_summary(report: &VerificationReport) {
    println!(
        "graphs: {}  nodes: {}  edges: {}  reachable: {}  states: {}",
        report.graphs_scanned,
        report.node_count,
        report.edge_count,
        report.reachable_node_count,
        report.states_explored
    );
    println!(
        "broken: {}  duplicate choices: {}  deadlocks: {}  mismatches: {}  truncated: {}  unguarded: {}",
        report.broken_references.len(),
        report.duplicate_choices.len(),
        report.deadlocks.len(),
        report.requirement_mismatches.len(),
        report.truncated_graphs.len(),
        report.unguarded_edges.len()
    );
    if !report.node_id_collisions.is_empty() {
        println!("node id collisions (warning): {}", report.node_id_collisions.len());
    }
}

fn print_diff(diff: &BaselineDiff) {
    for key in &diff.new {
        println!("NEW       {key}");
    }
    for key in &diff.resolved {
        println!("RESOLVED  {key}");
    }
    println!(
        "new: {}  known: {}  resolved: {}",
        diff.new.len(),
        diff.known.len(),
        diff.resolved.len()
    );
}

/// Outcome of a run, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Pass,
    Fail,
}

impl From<Verdict> for ExitCode {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Pass => ExitCode::SUCCESS,
            Verdict::Fail => ExitCode::FAILURE,
        }
    }
}

/// Accept the current findings as the baseline.
fn accept(report: &VerificationReport, path: &Path) -> anyhow::Result<Verdict> {
    Baseline::from_report(report)
        .save(path)
        .context("writing baseline")?;
    tracing::info!(
        path = %path.display(),
        violations = report.violation_count(),
        "baseline written"
    );
    Ok(Verdict::Pass)
}

/// Fail on a missing baseline or on any key the baseline does not list.
/// Resolved keys are logged but never fail the run.
fn gate(
    baseline: Result<Baseline, BaselineError>,
    report: &VerificationReport,
) -> anyhow::Result<Verdict> {
    let baseline = match baseline {
        Ok(baseline) => baseline,
        Err(BaselineError::Missing(path)) => {
            tracing::error!(
                path = %path.display(),
                "no baseline found, run with --write-baseline to create one"
            );
            return Ok(Verdict::Fail);
        }
        Err(err) => return Err(err).context("loading baseline"),
    };

    let diff = baseline.diff(report);
    print_diff(&diff);

    if diff.has_regressions() {
        tracing::error!(new = diff.new.len(), "new violations since baseline");
        return Ok(Verdict::Fail);
    }
    if !diff.resolved.is_empty() {
        tracing::info!(
            resolved = diff.resolved.len(),
            "violations resolved, rerun with --write-baseline to tighten the baseline"
        );
    }
    Ok(Verdict::Pass)
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("STORY_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let baseline_path = cli
        .baseline
        .clone()
        .unwrap_or_else(|| cli.content.join(BASELINE_FILE));

    let registry = load_registry(&cli.content)
        .with_context(|| format!("loading content from {}", cli.content.display()))?;
    let report = Verifier::new(&registry, &config.simulation).run();
    print_summary(&report);

    if let Some(path) = &cli.report {
        write_report(path, &report).context("writing report")?;
        tracing::info!(path = %path.display(), "report written");
    }

    let verdict = if cli.write_baseline {
        accept(&report, &baseline_path)?
    } else {
        gate(Baseline::load(&baseline_path), &report)?
    };
    Ok(verdict.into())
}
