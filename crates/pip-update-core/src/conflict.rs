//! Conflict model: the parsed result of one consistency check.
//!
//! `pip check` prints one diagnostic per broken requirement. Each line is
//! reduced to the set of distributions it implicates; two checks are compared
//! by those names only, since the wording of a diagnostic can change between
//! pip releases even when the underlying conflict is the same.

use crate::error::{PipUpdateError, Result};
use crate::types::{normalize_name, CheckPhase};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

static HAS_REQUIREMENT_RE: OnceLock<Regex> = OnceLock::new();
static NOT_INSTALLED_RE: OnceLock<Regex> = OnceLock::new();
static UNSUPPORTED_RE: OnceLock<Regex> = OnceLock::new();

fn has_requirement_re() -> &'static Regex {
    HAS_REQUIREMENT_RE.get_or_init(|| {
        Regex::new(r"^(?P<a>\S+) (?P<av>\S+) has requirement .+, but you have (?P<b>\S+) (?P<bv>\S+?)\.?$")
            .unwrap()
    })
}

fn not_installed_re() -> &'static Regex {
    NOT_INSTALLED_RE.get_or_init(|| {
        Regex::new(
            r"^(?P<a>\S+) (?P<av>\S+) requires (?P<b>[A-Za-z0-9][A-Za-z0-9._\-]*).*, which is not installed\.?$",
        )
        .unwrap()
    })
}

fn unsupported_re() -> &'static Regex {
    UNSUPPORTED_RE.get_or_init(|| {
        Regex::new(r"^(?P<a>\S+) (?P<av>\S+) is not supported on this platform\.?$").unwrap()
    })
}

// ---------------------------------------------------------------------------
// ConflictStatement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictStatement {
    /// Normalized names, in the order the diagnostic mentions them.
    pub packages: Vec<String>,
    pub text: String,
}

impl ConflictStatement {
    /// Parse one `pip check` diagnostic. Returns `None` for lines that match
    /// none of the known diagnostic shapes.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let names: Vec<&str> = if let Some(caps) = has_requirement_re().captures(line) {
            vec![caps.name("a")?.as_str(), caps.name("b")?.as_str()]
        } else if let Some(caps) = not_installed_re().captures(line) {
            vec![caps.name("a")?.as_str(), caps.name("b")?.as_str()]
        } else if let Some(caps) = unsupported_re().captures(line) {
            vec![caps.name("a")?.as_str()]
        } else {
            return None;
        };

        let mut packages: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let normalized = normalize_name(name);
            if !packages.contains(&normalized) {
                packages.push(normalized);
            }
        }

        Some(Self {
            packages,
            text: line.to_string(),
        })
    }

    pub fn implicates(&self, name: &str) -> bool {
        let wanted = normalize_name(name);
        self.packages.iter().any(|p| *p == wanted)
    }
}

// ---------------------------------------------------------------------------
// ConflictSet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSet {
    pub phase: CheckPhase,
    pub checked_at: String,
    pub statements: Vec<ConflictStatement>,
}

impl ConflictSet {
    pub fn new(phase: CheckPhase, statements: Vec<ConflictStatement>) -> Self {
        Self {
            phase,
            checked_at: chrono::Utc::now().to_rfc3339(),
            statements,
        }
    }

    pub fn empty(phase: CheckPhase) -> Self {
        Self::new(phase, Vec::new())
    }

    /// Build a set from the outcome of a consistency check.
    ///
    /// A successful exit means a consistent environment whatever was printed.
    /// A failing exit must consist entirely of recognised diagnostics;
    /// anything else is reported as an error rather than guessed at.
    pub fn from_check_output(
        phase: CheckPhase,
        success: bool,
        exit_code: Option<i32>,
        stdout: &str,
        stderr: &str,
    ) -> Result<Self> {
        if success {
            return Ok(Self::empty(phase));
        }

        let exit_code = exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());

        let mut statements = Vec::new();
        for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match ConflictStatement::parse(line) {
                Some(statement) => statements.push(statement),
                None => {
                    return Err(PipUpdateError::UnparseableConsistencyCheck {
                        exit_code,
                        line: line.to_string(),
                    })
                }
            }
        }

        if statements.is_empty() {
            let hint = stderr
                .lines()
                .map(str::trim)
                .rfind(|l| !l.is_empty())
                .unwrap_or("no output")
                .to_string();
            return Err(PipUpdateError::UnparseableConsistencyCheck {
                exit_code,
                line: hint,
            });
        }

        Ok(Self::new(phase, statements))
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Every normalized name any statement implicates.
    pub fn implicated(&self) -> BTreeSet<String> {
        self.statements
            .iter()
            .flat_map(|s| s.packages.iter().cloned())
            .collect()
    }

    pub fn implicates(&self, name: &str) -> bool {
        self.statements.iter().any(|s| s.implicates(name))
    }

    pub fn statements_naming<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a ConflictStatement> + 'a {
        self.statements.iter().filter(move |s| s.implicates(name))
    }

    /// Names implicated here that `earlier` did not implicate.
    pub fn introduced_since(&self, earlier: &ConflictSet) -> BTreeSet<String> {
        let before = earlier.implicated();
        self.implicated()
            .into_iter()
            .filter(|name| !before.contains(name))
            .collect()
    }

    /// Names implicated in `earlier` that no longer appear here.
    pub fn resolved_since(&self, earlier: &ConflictSet) -> BTreeSet<String> {
        earlier.introduced_since(self)
    }
}
