use crate::output::{category_style, format_table, Presentation};
use anstyle::{AnsiColor, Style};
use pip_update_core::conflict::ConflictSet;
use pip_update_core::report::{ReportSink, RunReport, RunStatus};
use pip_update_core::types::{OutcomeCategory, PackageRef, Stage, UpgradeAttempt};
use std::io::Write;

const HEADERS: &[&str] = &["Package", "From", "To", "Status", "Detail"];
const STATUS_COLUMN: usize = 3;

/// Human-readable progress and the final outcome table.
pub struct TerminalSink<W: Write> {
    out: W,
    presentation: Presentation,
}

impl TerminalSink<std::io::Stdout> {
    pub fn stdout(presentation: Presentation) -> Self {
        Self::new(std::io::stdout(), presentation)
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, presentation: Presentation) -> Self {
        Self { out, presentation }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // Progress lines are best effort; a closed stdout must not abort upgrades.
    fn progress(&mut self, line: &str) {
        let _ = writeln!(self.out, "{line}");
        let _ = self.out.flush();
    }
}

impl<W: Write> ReportSink for TerminalSink<W> {
    fn emit(&mut self, report: &RunReport) -> pip_update_core::Result<()> {
        for line in render_report(report, self.presentation) {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn stage_started(&mut self, stage: Stage) {
        match stage {
            Stage::Precheck => self.progress("Checking installed packages for conflicts..."),
            Stage::Enumerate => self.progress("Looking for outdated packages..."),
            Stage::Postcheck => self.progress("Re-checking installed packages for conflicts..."),
            _ => {}
        }
    }

    fn upgrade_started(&mut self, package: &PackageRef, index: usize, total: usize) {
        self.progress(&format!(
            "[{index}/{total}] Upgrading {} ({} -> {})",
            package.name,
            package.from_version(),
            package.to_version()
        ));
    }

    fn upgrade_finished(&mut self, attempt: &UpgradeAttempt) {
        if attempt.is_failed() {
            let line = format!("  upgrade of {} failed", attempt.package.name);
            let painted = self
                .presentation
                .paint(category_style(OutcomeCategory::Failed), &line);
            self.progress(&painted);
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render_report(report: &RunReport, presentation: Presentation) -> Vec<String> {
    let mut lines = Vec::new();

    if report.status == RunStatus::AbortedAtPrecheck {
        lines.push(presentation.paint(
            warning_style(),
            "Installed packages already have dependency conflicts; nothing was upgraded.",
        ));
        push_conflicts(&mut lines, "Conflicts found before upgrading:", &report.pre_check);
        lines.push("Re-run with --force to upgrade anyway.".to_string());
        return lines;
    }

    if report.forced && !report.pre_check.is_empty() {
        let verb = if report.status == RunStatus::DryRun {
            "would upgrade"
        } else {
            "upgrading"
        };
        lines.push(presentation.paint(
            warning_style(),
            &format!(
                "WARNING: {verb} despite {} pre-existing conflict(s) (--force).",
                report.pre_check.len()
            ),
        ));
        push_conflicts(&mut lines, "Conflicts found before upgrading:", &report.pre_check);
    }

    if report.outcomes.is_empty() {
        lines.push("No outdated packages found.".to_string());
    } else {
        if report.status == RunStatus::DryRun {
            lines.push("Dry run: nothing was upgraded.".to_string());
        }
        let rows: Vec<Vec<String>> = report
            .outcomes
            .iter()
            .map(|o| {
                vec![
                    o.package().name.clone(),
                    o.package().from_version().to_string(),
                    o.package().to_version().to_string(),
                    o.category.to_string(),
                    o.detail.clone(),
                ]
            })
            .collect();
        lines.push(String::new());
        lines.extend(format_table(HEADERS, &rows, presentation, |r, c| {
            (c == STATUS_COLUMN).then(|| category_style(report.outcomes[r].category))
        }));
    }

    for outcome in report.outcomes.iter().filter(|o| o.attempt.is_failed()) {
        if outcome.attempt.diagnostics.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("Output from failed upgrade of {}:", outcome.package().name));
        lines.extend(outcome.attempt.diagnostics.iter().map(|l| format!("    {l}")));
    }

    if report.status == RunStatus::PostcheckFailed {
        lines.push(String::new());
        lines.push(presentation.paint(
            category_style(OutcomeCategory::Failed),
            &format!(
                "Post-upgrade consistency check failed: {}",
                report.error.as_deref().unwrap_or("unknown error")
            ),
        ));
        lines.push("Conflicts after upgrading are unknown; run `pip check` by hand.".to_string());
    }

    if let Some(post) = &report.post_check {
        if post.is_empty() {
            if !report.pre_check.is_empty() {
                lines.push(String::new());
                lines.push("No conflicts remain after upgrading.".to_string());
            }
        } else {
            push_conflicts(&mut lines, "Conflicts found after upgrading:", post);
        }
    }

    if !report.outcomes.is_empty() {
        lines.push(String::new());
        lines.push(summary_line(report));
    }
    lines
}

fn push_conflicts(lines: &mut Vec<String>, title: &str, set: &ConflictSet) {
    if set.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(title.to_string());
    lines.extend(set.statements.iter().map(|s| format!("  - {}", s.text)));
}

fn summary_line(report: &RunReport) -> String {
    let parts: Vec<String> = report
        .counts()
        .into_iter()
        .map(|(cat, n)| format!("{n} {cat}"))
        .collect();
    format!("Summary: {}", parts.join(", "))
}

fn warning_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::Yellow.into()))
}
