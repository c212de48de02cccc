use crate::conflict::ConflictSet;
use crate::error::Result;
use crate::io::atomic_write;
use crate::metadata::EnvironmentMetadata;
use crate::types::{AttemptStatus, OutcomeCategory, PackageRef, Stage, UpgradeAttempt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FATAL: i32 = 1;
pub const EXIT_ABORTED: i32 = 2;
pub const EXIT_WARNINGS: i32 = 3;
pub const EXIT_WEIRD: i32 = 4;
pub const EXIT_FAILED: i32 = 5;

// ---------------------------------------------------------------------------
// RunStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    AbortedAtPrecheck,
    DryRun,
    /// Upgrades ran but the post-run check could not be completed.
    PostcheckFailed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::AbortedAtPrecheck => "aborted_at_precheck",
            RunStatus::DryRun => "dry_run",
            RunStatus::PostcheckFailed => "postcheck_failed",
        }
    }
}

// ---------------------------------------------------------------------------
// OutcomeRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub attempt: UpgradeAttempt,
    pub category: OutcomeCategory,
    /// Id of the classifier rule that assigned the category.
    pub rule: String,
    pub detail: String,
}

impl OutcomeRecord {
    pub fn package(&self) -> &PackageRef {
        &self.attempt.package
    }
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// Everything a run produced. Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub metadata: EnvironmentMetadata,
    pub status: RunStatus,
    pub forced: bool,
    pub dry_run: bool,
    pub pre_check: ConflictSet,
    #[serde(default)]
    pub post_check: Option<ConflictSet>,
    #[serde(default)]
    pub outcomes: Vec<OutcomeRecord>,
    /// Why the run could not complete normally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Most severe category among the records that count toward the exit
    /// status. `None` when nothing was upgraded.
    pub fn worst_category(&self) -> Option<OutcomeCategory> {
        self.outcomes
            .iter()
            .map(|o| o.category)
            .filter(|c| c.severity().is_some())
            .max_by_key(|c| c.severity())
    }

    pub fn exit_code(&self) -> i32 {
        match self.status {
            RunStatus::AbortedAtPrecheck => EXIT_ABORTED,
            RunStatus::DryRun => EXIT_OK,
            RunStatus::PostcheckFailed => EXIT_FATAL,
            RunStatus::Completed => match self.worst_category() {
                Some(OutcomeCategory::Failed) => EXIT_FAILED,
                Some(OutcomeCategory::Weird) => EXIT_WEIRD,
                Some(OutcomeCategory::Warnings) => EXIT_WARNINGS,
                _ => EXIT_OK,
            },
        }
    }

    /// Per-category record counts, in display order, zero counts omitted.
    pub fn counts(&self) -> Vec<(OutcomeCategory, usize)> {
        OutcomeCategory::all()
            .iter()
            .map(|&cat| {
                let n = self.outcomes.iter().filter(|o| o.category == cat).count();
                (cat, n)
            })
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    /// Number of upgrades actually handed to the package manager.
    pub fn attempted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.attempt.status != AttemptStatus::NotAttempted)
            .count()
    }
}

// ---------------------------------------------------------------------------
// ReportSink
// ---------------------------------------------------------------------------

/// Receives the finished report, plus optional progress notifications while
/// the run is in flight.
pub trait ReportSink {
    fn emit(&mut self, report: &RunReport) -> Result<()>;

    fn stage_started(&mut self, _stage: Stage) {}

    /// `index` is 1-based among the packages that will be upgraded.
    fn upgrade_started(&mut self, _package: &PackageRef, _index: usize, _total: usize) {}

    fn upgrade_finished(&mut self, _attempt: &UpgradeAttempt) {}
}

/// Writes the report as pretty JSON.
pub struct JsonReportSink {
    path: PathBuf,
}

impl JsonReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for JsonReportSink {
    fn emit(&mut self, report: &RunReport) -> Result<()> {
        let json = report.to_json_pretty()?;
        atomic_write(&self.path, json.as_bytes())?;
        info!(path = %self.path.display(), "report written");
        Ok(())
    }
}
