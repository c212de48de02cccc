//! `pip` as an external process.
//!
//! Finds a working pip invocation and implements [`PackageManager`] on top of
//! `pip check`, `pip list --outdated` and `pip install --upgrade`.
//!
//! # Detection order
//! 1. `pip`
//! 2. `pip3`
//! 3. `python3 -m pip`
//! 4. `python -m pip`
//!
//! A candidate is accepted when its program is on `PATH` and `--version`
//! exits successfully.

use std::fmt;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::conflict::ConflictSet;
use crate::error::{PipUpdateError, Result};
use crate::gateway::PackageManager;
use crate::listing::OutdatedListing;
use crate::types::{CheckPhase, PackageRef, UpgradeAttempt};

const CANDIDATES: &[&str] = &["pip", "pip3", "python3 -m pip", "python -m pip"];

pub const DEFAULT_TAIL_LINES: usize = 20;

// ---------------------------------------------------------------------------
// PipCommand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipCommand {
    program: String,
    args: Vec<String>,
}

impl PipCommand {
    /// Parse a whitespace-separated invocation such as `python3 -m pip`.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut parts = spec.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| PipUpdateError::InvalidCommand(spec.to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Detect the first working pip invocation.
    pub fn detect() -> Result<Self> {
        for candidate in CANDIDATES {
            let cmd = Self::parse(candidate)?;
            if which::which(cmd.program()).is_err() {
                debug!(candidate, "not on PATH");
                continue;
            }
            let works = cmd
                .command()
                .arg("--version")
                .stdin(Stdio::null())
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false);
            if works {
                debug!(candidate, "using package manager");
                return Ok(cmd);
            }
            debug!(candidate, "--version failed");
        }
        Err(PipUpdateError::PackageManagerNotFound)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.env("PIP_DISABLE_PIP_VERSION_CHECK", "1");
        cmd
    }
}

impl fmt::Display for PipCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ProcessOutput
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// The last `n` non-empty lines of stdout followed by stderr.
    pub fn tail(&self, n: usize) -> Vec<String> {
        let lines: Vec<&str> = self
            .stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].iter().map(|l| l.to_string()).collect()
    }
}

// ---------------------------------------------------------------------------
// PipGateway
// ---------------------------------------------------------------------------

pub struct PipGateway {
    command: PipCommand,
    tail_lines: usize,
}

impl PipGateway {
    pub fn new(command: PipCommand, tail_lines: usize) -> Self {
        Self {
            command,
            tail_lines,
        }
    }

    pub fn command(&self) -> &PipCommand {
        &self.command
    }

    fn run(&self, args: &[&str]) -> Result<ProcessOutput> {
        let rendered = format!("{} {}", self.command, args.join(" "));
        debug!(command = %rendered, "running");

        let output = self
            .command
            .command()
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| PipUpdateError::Spawn {
                command: rendered.clone(),
                source,
            })?;

        let result = ProcessOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(command = %rendered, exit_code = ?result.exit_code, "finished");
        Ok(result)
    }
}

impl PackageManager for PipGateway {
    fn check_consistency(&self, phase: CheckPhase) -> Result<ConflictSet> {
        let out = self.run(&["check"])?;
        let set = ConflictSet::from_check_output(
            phase,
            out.success,
            out.exit_code,
            &out.stdout,
            &out.stderr,
        )?;
        debug!(%phase, conflicts = set.len(), "consistency check parsed");
        Ok(set)
    }

    fn list_outdated(&self) -> Result<Vec<PackageRef>> {
        let structured = self.run(&["list", "--outdated", "--format=json"])?;
        if structured.success {
            match OutdatedListing::parse_structured(&structured.stdout) {
                Ok(listing) => {
                    debug!(source = listing.source(), "outdated listing parsed");
                    return Ok(listing.into_packages());
                }
                Err(e) => warn!(error = %e, "JSON listing unreadable, falling back to text"),
            }
        } else {
            warn!(
                exit_code = ?structured.exit_code,
                "JSON listing unavailable, falling back to text"
            );
        }

        let text = self.run(&["list", "--outdated"])?;
        if !text.success {
            let hint = text.tail(1).pop().unwrap_or_else(|| {
                format!("exit code {}", text.exit_code.unwrap_or(-1))
            });
            return Err(PipUpdateError::ListingFailed(hint));
        }
        let listing = OutdatedListing::parse_line_oriented(&text.stdout)?;
        debug!(source = listing.source(), "outdated listing parsed");
        Ok(listing.into_packages())
    }

    fn upgrade(&self, package: &PackageRef) -> UpgradeAttempt {
        let attempt = UpgradeAttempt::dispatch(package.clone());
        match self.run(&["install", "--upgrade", &package.name]) {
            Ok(out) if out.success => attempt.succeed(out.exit_code),
            Ok(out) => {
                let diagnostics = out.tail(self.tail_lines);
                attempt.fail(out.exit_code, diagnostics)
            }
            Err(e) => attempt.fail(None, vec![e.to_string()]),
        }
    }

    fn version(&self) -> Option<String> {
        let out = self.run(&["--version"]).ok()?;
        if !out.success {
            return None;
        }
        out.stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_program_and_args() {
        let cmd = PipCommand::parse("python3 -m pip").unwrap();
        assert_eq!(cmd.program(), "python3");
        assert_eq!(cmd.to_string(), "python3 -m pip");
    }

    #[test]
    fn parse_rejects_blank_command() {
        assert!(matches!(
            PipCommand::parse("   "),
            Err(PipUpdateError::InvalidCommand(_))
        ));
    }

    #[test]
    fn tail_keeps_last_lines_across_streams() {
        let out = ProcessOutput {
            success: false,
            exit_code: Some(1),
            stdout: "Collecting foo\n\nDownloading foo-2.0.tar.gz\n".into(),
            stderr: "ERROR: Failed building wheel for foo\n".into(),
        };
        assert_eq!(
            out.tail(2),
            vec![
                "Downloading foo-2.0.tar.gz".to_string(),
                "ERROR: Failed building wheel for foo".to_string()
            ]
        );
        assert_eq!(out.tail(10).len(), 3);
        assert!(out.tail(0).is_empty());
    }

    #[test]
    fn missing_program_becomes_failed_attempt() {
        let gateway = PipGateway::new(
            PipCommand::parse("definitely-not-a-real-pip-binary").unwrap(),
            DEFAULT_TAIL_LINES,
        );
        let attempt = gateway.upgrade(&PackageRef::new("six", None, None));
        assert!(attempt.is_failed());
        assert!(attempt.requested);
        assert_eq!(attempt.exit_code, None);
        assert!(attempt.diagnostics[0].contains("definitely-not-a-real-pip-binary"));
    }

    #[test]
    fn missing_program_is_an_infrastructure_error_for_checks() {
        let gateway = PipGateway::new(
            PipCommand::parse("definitely-not-a-real-pip-binary").unwrap(),
            DEFAULT_TAIL_LINES,
        );
        assert!(matches!(
            gateway.check_consistency(CheckPhase::PreRun),
            Err(PipUpdateError::Spawn { .. })
        ));
        assert!(gateway.version().is_none());
    }
}
