//! Baseline ratchet: known violations are tolerated, new ones fail.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::report::VerificationReport;

pub const BASELINE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum BaselineError {
    #[error("no baseline at {0}")]
    Missing(PathBuf),

    #[error("failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed JSON in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Snapshot of accepted violation keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub version: u32,
    pub violations: BTreeSet<String>,
}

/// A report compared against a baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineDiff {
    /// In the report, not in the baseline.
    pub new: BTreeSet<String>,
    /// In the baseline, no longer reported.
    pub resolved: BTreeSet<String>,
    pub known: BTreeSet<String>,
}

impl BaselineDiff {
    pub fn has_regressions(&self) -> bool {
        !self.new.is_empty()
    }
}

impl Baseline {
    pub fn from_report(report: &VerificationReport) -> Self {
        Self {
            version: BASELINE_VERSION,
            violations: report.violation_keys(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, BaselineError> {
        let raw = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => BaselineError::Missing(path.to_path_buf()),
            _ => BaselineError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        serde_json::from_str(&raw).map_err(|source| BaselineError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), BaselineError> {
        write_json(path, self)
    }

    pub fn diff(&self, report: &VerificationReport) -> BaselineDiff {
        let current = report.violation_keys();

        BaselineDiff {
            new: current.difference(&self.violations).cloned().collect(),
            resolved: self.violations.difference(&current).cloned().collect(),
            known: current.intersection(&self.violations).cloned().collect(),
        }
    }
}

/// Write the full report as pretty JSON.
pub fn write_report(path: &Path, report: &VerificationReport) -> Result<(), BaselineError> {
    write_json(path, report)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), BaselineError> {
    let io_error = |source| BaselineError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let mut json = serde_json::to_string_pretty(value).map_err(|source| BaselineError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    json.push('\n');
    fs::write(path, json).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::{Deadlock, TruncatedGraph, TruncationReason};

    fn report_with_deadlock() -> VerificationReport {
        let mut report = VerificationReport::default();
        report.deadlocks.push(Deadlock {
            graph_id: "maya".into(),
            node_id: "b".into(),
            trace: Vec::new(),
        });
        report
    }

    #[test]
    fn test_diff_against_empty_baseline() {
        let report = report_with_deadlock();
        let diff = Baseline::default().diff(&report);

        assert!(diff.has_regressions());
        assert!(diff.new.contains("deadlock:maya:b"));
        assert!(diff.resolved.is_empty());
    }

    #[test]
    fn test_ratchet_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ci").join("baseline.json");

        let report = report_with_deadlock();
        Baseline::from_report(&report).save(&path).unwrap();

        let baseline = Baseline::load(&path).unwrap();
        assert_eq!(baseline.version, BASELINE_VERSION);
        let diff = baseline.diff(&report);
        assert!(!diff.has_regressions());
        assert_eq!(diff.known.len(), 1);

        let mut worse = report.clone();
        worse.truncated_graphs.push(TruncatedGraph {
            graph_id: "samuel".into(),
            reasons: [TruncationReason::NodeStates].into_iter().collect(),
        });
        let diff = baseline.diff(&worse);
        assert_eq!(diff.new.iter().collect::<Vec<_>>(), vec!["truncated:samuel"]);

        let diff = baseline.diff(&VerificationReport::default());
        assert!(!diff.has_regressions());
        assert_eq!(diff.resolved.len(), 1);
    }

    #[test]
    fn test_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();

        let missing = Baseline::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, BaselineError::Missing(_)));

        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Baseline::load(&path), Err(BaselineError::Json { .. })));
    }
}
