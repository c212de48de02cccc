use crate::classifier::{EvalContext, Rule};
use crate::types::OutcomeCategory;

/// The outcome rules, in precedence order.
///
/// A failed upgrade is `FAILED` before any conflict is looked at. Conflicts
/// are attributed by package identity: a package named post-run but not
/// pre-run is `WEIRD`; one named on both sides is `WARNINGS`.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: "skipped",
            condition: |ctx| !ctx.attempt.requested,
            category: OutcomeCategory::Skipped,
            detail: |_| "skipped by request".to_string(),
        },
        Rule {
            id: "failed",
            condition: |ctx| ctx.attempt.is_failed(),
            category: OutcomeCategory::Failed,
            detail: failed_detail,
        },
        Rule {
            id: "new_conflict",
            condition: |ctx| ctx.conflicted_after() && !ctx.conflicted_before(),
            category: OutcomeCategory::Weird,
            detail: |ctx| {
                format!(
                    "new conflict after upgrade: {}",
                    ctx.post_statement().unwrap_or("(no diagnostic text)")
                )
            },
        },
        Rule {
            id: "persisting_conflict",
            condition: |ctx| ctx.conflicted_after() && ctx.conflicted_before(),
            category: OutcomeCategory::Warnings,
            detail: |ctx| {
                format!(
                    "pre-existing conflict persists: {}",
                    ctx.post_statement().unwrap_or("(no diagnostic text)")
                )
            },
        },
    ]
}

fn failed_detail(ctx: &EvalContext) -> String {
    let code = match ctx.attempt.exit_code {
        Some(code) => format!("exit {code}"),
        None => "did not run".to_string(),
    };
    match ctx.attempt.diagnostics.last() {
        Some(line) => format!("upgrade failed ({code}): {line}"),
        None => format!("upgrade failed ({code})"),
    }
}
