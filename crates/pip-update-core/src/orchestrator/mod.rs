//! The upgrade run as a fixed sequence of stages.
//!
//! `PRECHECK → ENUMERATE → UPGRADING → POSTCHECK → CLASSIFY → REPORT`
//!
//! Each stage runs at most once. A run may end early in two places: at
//! PRECHECK when the environment is already inconsistent and `force` is off,
//! and after ENUMERATE for a dry run. Both still reach REPORT. Infrastructure
//! errors from the package manager end the run immediately with `Err`, except
//! at POSTCHECK: once upgrades have run, a failed post-run check is recorded
//! in the report (`RunStatus::PostcheckFailed`) and the run still reaches
//! CLASSIFY and REPORT.

pub mod plan;

pub use plan::UpgradePlan;

use tracing::{debug, info, warn};

use crate::classifier::{Classifier, EvalContext};
use crate::conflict::ConflictSet;
use crate::error::Result;
use crate::gateway::PackageManager;
use crate::metadata::EnvironmentMetadata;
use crate::report::{OutcomeRecord, ReportSink, RunReport, RunStatus};
use crate::rules::default_rules;
use crate::types::{CheckPhase, OutcomeCategory, Stage, UpgradeAttempt};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Package names withheld from upgrading.
    pub skip: Vec<String>,
    pub dry_run: bool,
    /// Proceed even when the pre-run check reports conflicts.
    pub force: bool,
}

pub struct Orchestrator<'a> {
    manager: &'a dyn PackageManager,
    options: RunOptions,
    metadata: EnvironmentMetadata,
    classifier: Classifier,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        manager: &'a dyn PackageManager,
        options: RunOptions,
        metadata: EnvironmentMetadata,
    ) -> Self {
        Self {
            manager,
            options,
            metadata,
            classifier: Classifier::new(default_rules()),
        }
    }

    /// Drive one complete run, handing the finished report to every sink.
    pub fn run(self, sinks: &mut [Box<dyn ReportSink>]) -> Result<RunReport> {
        // PRECHECK
        notify_stage(sinks, Stage::Precheck);
        let pre = self.manager.check_consistency(CheckPhase::PreRun)?;
        if !pre.is_empty() {
            if !self.options.force {
                warn!(
                    conflicts = pre.len(),
                    "environment already inconsistent, not upgrading"
                );
                let report = self.report(RunStatus::AbortedAtPrecheck, pre, None, Vec::new());
                return finish(report, sinks);
            }
            warn!(
                conflicts = pre.len(),
                "continuing despite pre-existing conflicts (forced)"
            );
        }

        // ENUMERATE
        notify_stage(sinks, Stage::Enumerate);
        let outdated = self.manager.list_outdated()?;
        info!(outdated = outdated.len(), "outdated packages listed");
        let plan = UpgradePlan::build(outdated, &self.options.skip);
        for name in &plan.unmatched_skips {
            warn!(package = %name, "skip name matches no outdated package");
        }

        if self.options.dry_run {
            let outcomes = plan.attempts.into_iter().map(dry_run_record).collect();
            let report = self.report(RunStatus::DryRun, pre, None, outcomes);
            return finish(report, sinks);
        }

        // UPGRADING
        notify_stage(sinks, Stage::Upgrading);
        let total = plan.to_upgrade();
        let mut index = 0;
        let mut attempts = Vec::with_capacity(plan.attempts.len());
        for planned in plan.attempts {
            if !planned.requested {
                debug!(package = %planned.package.name, "withheld");
                attempts.push(planned);
                continue;
            }
            index += 1;
            for sink in sinks.iter_mut() {
                sink.upgrade_started(&planned.package, index, total);
            }
            let attempt = self.manager.upgrade(&planned.package);
            if attempt.is_failed() {
                warn!(
                    package = %attempt.package.name,
                    exit_code = ?attempt.exit_code,
                    "upgrade failed"
                );
            } else {
                info!(
                    package = %attempt.package.name,
                    to = attempt.package.to_version(),
                    "upgraded"
                );
            }
            for sink in sinks.iter_mut() {
                sink.upgrade_finished(&attempt);
            }
            attempts.push(attempt);
        }

        // POSTCHECK
        notify_stage(sinks, Stage::Postcheck);
        let post = match self.manager.check_consistency(CheckPhase::PostRun) {
            Ok(post) => post,
            Err(e) => {
                warn!(error = %e, "post-run consistency check failed");
                // Conflicts after upgrading are unknown; assume the pre-run state.
                notify_stage(sinks, Stage::Classify);
                let outcomes = attempts
                    .into_iter()
                    .map(|attempt| self.classify(attempt, &pre, &pre))
                    .collect();
                let mut report = self.report(RunStatus::PostcheckFailed, pre, None, outcomes);
                report.error = Some(e.to_string());
                return finish(report, sinks);
            }
        };
        let introduced = post.introduced_since(&pre);
        if !introduced.is_empty() {
            warn!(packages = ?introduced, "new conflicts after upgrading");
        }
        let resolved = post.resolved_since(&pre);
        if !resolved.is_empty() {
            info!(packages = ?resolved, "conflicts resolved by upgrading");
        }

        // CLASSIFY
        notify_stage(sinks, Stage::Classify);
        let outcomes = attempts
            .into_iter()
            .map(|attempt| self.classify(attempt, &pre, &post))
            .collect();

        let report = self.report(RunStatus::Completed, pre, Some(post), outcomes);
        finish(report, sinks)
    }

    fn classify(
        &self,
        attempt: UpgradeAttempt,
        pre: &ConflictSet,
        post: &ConflictSet,
    ) -> OutcomeRecord {
        let ctx = EvalContext {
            attempt: &attempt,
            pre,
            post,
        };
        let c = self.classifier.classify(&ctx);
        debug!(
            package = %attempt.package.name,
            category = %c.category,
            rule = %c.rule,
            "classified"
        );
        OutcomeRecord {
            attempt,
            category: c.category,
            rule: c.rule,
            detail: c.detail,
        }
    }

    fn report(
        &self,
        status: RunStatus,
        pre_check: ConflictSet,
        post_check: Option<ConflictSet>,
        outcomes: Vec<OutcomeRecord>,
    ) -> RunReport {
        RunReport {
            metadata: self.metadata.clone(),
            status,
            forced: self.options.force,
            dry_run: self.options.dry_run,
            pre_check,
            post_check,
            outcomes,
            error: None,
        }
    }
}

fn dry_run_record(attempt: UpgradeAttempt) -> OutcomeRecord {
    if attempt.requested {
        let detail = format!(
            "would upgrade {} -> {}",
            attempt.package.from_version(),
            attempt.package.to_version()
        );
        OutcomeRecord {
            attempt,
            category: OutcomeCategory::WouldUpgrade,
            rule: "dry_run".to_string(),
            detail,
        }
    } else {
        OutcomeRecord {
            attempt,
            category: OutcomeCategory::Skipped,
            rule: "skipped".to_string(),
            detail: "skipped by request".to_string(),
        }
    }
}

fn notify_stage(sinks: &mut [Box<dyn ReportSink>], stage: Stage) {
    debug!(%stage, "stage started");
    for sink in sinks.iter_mut() {
        sink.stage_started(stage);
    }
}

/// REPORT: every sink is attempted; the first failure is returned afterwards.
fn finish(report: RunReport, sinks: &mut [Box<dyn ReportSink>]) -> Result<RunReport> {
    notify_stage(sinks, Stage::Report);
    let mut first_err = None;
    for sink in sinks.iter_mut() {
        if let Err(e) = sink.emit(&report) {
            warn!(error = %e, "report sink failed");
            if first_err.is_none() {
                first_err = Some(e);
            }
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(report),
    }
}
