use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Package names
// ---------------------------------------------------------------------------

/// Normalize a distribution name for comparison.
///
/// Lowercases and collapses every run of `-`, `_` and `.` into a single `-`,
/// so `Zope.Interface`, `zope_interface` and `zope-interface` compare equal.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.trim().chars() {
        if matches!(ch, '-' | '_' | '.') {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('-');
        }
        pending_sep = false;
        out.extend(ch.to_lowercase());
    }
    out
}

// ---------------------------------------------------------------------------
// PackageRef
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRef {
    pub name: String,
    #[serde(default)]
    pub current_version: Option<String>,
    #[serde(default)]
    pub target_version: Option<String>,
}

impl PackageRef {
    pub fn new(
        name: impl Into<String>,
        current_version: Option<String>,
        target_version: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            current_version,
            target_version,
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn is_named(&self, other: &str) -> bool {
        self.normalized_name() == normalize_name(other)
    }

    pub fn from_version(&self) -> &str {
        self.current_version.as_deref().unwrap_or("?")
    }

    pub fn to_version(&self) -> &str {
        self.target_version.as_deref().unwrap_or("?")
    }
}

// ---------------------------------------------------------------------------
// UpgradeAttempt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    NotAttempted,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeAttempt {
    pub package: PackageRef,
    /// False when the package was withheld with `--skip`.
    pub requested: bool,
    pub status: AttemptStatus,
    #[serde(default)]
    pub exit_code: Option<i32>,
    /// Tail of the package manager's output, only kept on failure.
    #[serde(default)]
    pub diagnostics: Vec<String>,
}

impl UpgradeAttempt {
    /// An attempt that is about to be handed to the gateway.
    pub fn dispatch(package: PackageRef) -> Self {
        Self {
            package,
            requested: true,
            status: AttemptStatus::NotAttempted,
            exit_code: None,
            diagnostics: Vec::new(),
        }
    }

    /// A package withheld from upgrading.
    pub fn withheld(package: PackageRef) -> Self {
        Self {
            requested: false,
            ..Self::dispatch(package)
        }
    }

    pub fn succeed(mut self, exit_code: Option<i32>) -> Self {
        self.status = AttemptStatus::Succeeded;
        self.exit_code = exit_code;
        self.diagnostics.clear();
        self
    }

    pub fn fail(mut self, exit_code: Option<i32>, diagnostics: Vec<String>) -> Self {
        self.status = AttemptStatus::Failed;
        self.exit_code = exit_code;
        self.diagnostics = diagnostics;
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == AttemptStatus::Failed
    }
}

// ---------------------------------------------------------------------------
// OutcomeCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum OutcomeCategory {
    Ok,
    Warnings,
    Weird,
    Failed,
    Skipped,
    WouldUpgrade,
}

impl OutcomeCategory {
    pub fn all() -> &'static [OutcomeCategory] {
        &[
            OutcomeCategory::Ok,
            OutcomeCategory::Warnings,
            OutcomeCategory::Weird,
            OutcomeCategory::Failed,
            OutcomeCategory::Skipped,
            OutcomeCategory::WouldUpgrade,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeCategory::Ok => "OK",
            OutcomeCategory::Warnings => "WARNINGS",
            OutcomeCategory::Weird => "WEIRD",
            OutcomeCategory::Failed => "FAILED",
            OutcomeCategory::Skipped => "SKIPPED",
            OutcomeCategory::WouldUpgrade => "WOULD-UPGRADE",
        }
    }

    /// Rank used for the exit status. Bookkeeping labels have none.
    pub fn severity(self) -> Option<u8> {
        match self {
            OutcomeCategory::Ok => Some(0),
            OutcomeCategory::Warnings => Some(1),
            OutcomeCategory::Weird => Some(2),
            OutcomeCategory::Failed => Some(3),
            OutcomeCategory::Skipped | OutcomeCategory::WouldUpgrade => None,
        }
    }
}

impl fmt::Display for OutcomeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CheckPhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckPhase {
    PreRun,
    PostRun,
}

impl CheckPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckPhase::PreRun => "pre_run",
            CheckPhase::PostRun => "post_run",
        }
    }
}

impl fmt::Display for CheckPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Orchestrator stages, in the only order they may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Precheck,
    Enumerate,
    Upgrading,
    Postcheck,
    Classify,
    Report,
}

impl Stage {
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Precheck,
            Stage::Enumerate,
            Stage::Upgrading,
            Stage::Postcheck,
            Stage::Classify,
            Stage::Report,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Precheck => "precheck",
            Stage::Enumerate => "enumerate",
            Stage::Upgrading => "upgrading",
            Stage::Postcheck => "postcheck",
            Stage::Classify => "classify",
            Stage::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_separators_and_case() {
        assert_eq!(normalize_name("Zope.Interface"), "zope-interface");
        assert_eq!(normalize_name("zope__interface"), "zope-interface");
        assert_eq!(normalize_name("  Requests "), "requests");
        assert_eq!(normalize_name("a-_.b"), "a-b");
    }

    #[test]
    fn package_ref_matches_case_insensitively() {
        let pkg = PackageRef::new("PyYAML", Some("5.4".into()), Some("6.0".into()));
        assert!(pkg.is_named("pyyaml"));
        assert!(!pkg.is_named("yaml"));
    }

    #[test]
    fn missing_versions_render_as_question_mark() {
        let pkg = PackageRef::new("six", None, None);
        assert_eq!(pkg.from_version(), "?");
        assert_eq!(pkg.to_version(), "?");
    }

    #[test]
    fn withheld_attempt_is_not_requested() {
        let attempt = UpgradeAttempt::withheld(PackageRef::new("pip", None, None));
        assert!(!attempt.requested);
        assert_eq!(attempt.status, AttemptStatus::NotAttempted);
    }

    #[test]
    fn severity_orders_failed_above_weird_above_warnings() {
        let ok = OutcomeCategory::Ok.severity().unwrap();
        let warn = OutcomeCategory::Warnings.severity().unwrap();
        let weird = OutcomeCategory::Weird.severity().unwrap();
        let failed = OutcomeCategory::Failed.severity().unwrap();
        assert!(ok < warn && warn < weird && weird < failed);
        assert_eq!(OutcomeCategory::Skipped.severity(), None);
        assert_eq!(OutcomeCategory::WouldUpgrade.severity(), None);
    }

    #[test]
    fn category_serializes_as_label() {
        let json = serde_json::to_string(&OutcomeCategory::WouldUpgrade).unwrap();
        assert_eq!(json, "\"WOULD-UPGRADE\"");
        let json = serde_json::to_string(&OutcomeCategory::Ok).unwrap();
        assert_eq!(json, "\"OK\"");
    }

    #[test]
    fn stages_are_listed_in_run_order() {
        let names: Vec<&str> = Stage::all().iter().map(|s| s.as_str()).collect();
        assert_eq!(
            names,
            vec!["precheck", "enumerate", "upgrading", "postcheck", "classify", "report"]
        );
    }
}
