use crate::conflict::ConflictSet;
use crate::types::{OutcomeCategory, UpgradeAttempt};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EvalContext
// ---------------------------------------------------------------------------

pub struct EvalContext<'a> {
    pub attempt: &'a UpgradeAttempt,
    pub pre: &'a ConflictSet,
    pub post: &'a ConflictSet,
}

impl EvalContext<'_> {
    pub fn name(&self) -> &str {
        &self.attempt.package.name
    }

    pub fn conflicted_before(&self) -> bool {
        self.pre.implicates(self.name())
    }

    pub fn conflicted_after(&self) -> bool {
        self.post.implicates(self.name())
    }

    /// First post-run diagnostic naming this package.
    pub fn post_statement(&self) -> Option<&str> {
        self.post
            .statements_naming(self.name())
            .next()
            .map(|s| s.text.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classification (output)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: OutcomeCategory,
    pub rule: String,
    pub detail: String,
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A fn-pointer rule; the first rule whose condition holds decides.
pub struct Rule {
    pub id: &'static str,
    pub condition: fn(&EvalContext) -> bool,
    pub category: OutcomeCategory,
    pub detail: fn(&EvalContext) -> String,
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, ctx: &EvalContext) -> Classification {
        for rule in &self.rules {
            if (rule.condition)(ctx) {
                return Classification {
                    category: rule.category,
                    rule: rule.id.to_string(),
                    detail: (rule.detail)(ctx),
                };
            }
        }

        // Fallback: clean upgrade
        let detail = if ctx.conflicted_before() {
            format!(
                "upgraded {} -> {}; pre-existing conflict no longer reported",
                ctx.attempt.package.from_version(),
                ctx.attempt.package.to_version()
            )
        } else {
            format!(
                "upgraded {} -> {}",
                ctx.attempt.package.from_version(),
                ctx.attempt.package.to_version()
            )
        };
        Classification {
            category: OutcomeCategory::Ok,
            rule: "clean".to_string(),
            detail,
        }
    }
}
