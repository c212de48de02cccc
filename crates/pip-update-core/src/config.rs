use crate::error::{PipUpdateError, Result};
use crate::paths;
use crate::pip::DEFAULT_TAIL_LINES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ColorChoice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Package-manager invocation, e.g. `python3 -m pip`. Detected when unset.
    #[serde(default)]
    pub pip: Option<String>,
    /// Packages never upgraded, merged with `--skip`.
    #[serde(default)]
    pub skip: Vec<String>,
    /// Lines of output kept from a failed upgrade.
    #[serde(default = "default_tail_lines")]
    pub tail_lines: usize,
    #[serde(default)]
    pub color: ColorChoice,
}

fn default_tail_lines() -> usize {
    DEFAULT_TAIL_LINES
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pip: None,
            skip: Vec::new(),
            tail_lines: default_tail_lines(),
            color: ColorChoice::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipUpdateError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load the explicitly named file, else the per-user file if present,
    /// else defaults. Returns the path that was read, if any.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }
        match paths::default_config_path() {
            Some(path) if path.exists() => {
                let cfg = Self::load(&path)?;
                Ok((cfg, Some(path)))
            }
            _ => Ok((Self::default(), None)),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(pip) = &self.pip {
            if pip.trim().is_empty() {
                return Err(PipUpdateError::InvalidConfig(
                    "'pip' must not be blank".to_string(),
                ));
            }
        }
        if let Some(name) = self.skip.iter().find(|s| s.trim().is_empty()) {
            return Err(PipUpdateError::InvalidConfig(format!(
                "'skip' contains a blank entry: {name:?}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_apply_to_missing_keys() {
        let cfg: Config = serde_yaml::from_str("skip: [pip]\n").unwrap();
        assert_eq!(cfg.skip, vec!["pip"]);
        assert_eq!(cfg.tail_lines, DEFAULT_TAIL_LINES);
        assert_eq!(cfg.color, ColorChoice::Auto);
        assert!(cfg.pip.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = serde_yaml::from_str::<Config>("skpi: [pip]\n");
        assert!(result.is_err(), "typo in key should be rejected");
    }

    #[test]
    fn load_reads_full_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "pip: python3 -m pip\nskip:\n  - pip\n  - setuptools\ntail_lines: 5\ncolor: never\n",
        )
        .unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.pip.as_deref(), Some("python3 -m pip"));
        assert_eq!(cfg.skip, vec!["pip", "setuptools"]);
        assert_eq!(cfg.tail_lines, 5);
        assert_eq!(cfg.color, ColorChoice::Never);
    }

    #[test]
    fn empty_file_is_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.yaml");
        assert!(matches!(
            Config::resolve(Some(&path)),
            Err(PipUpdateError::ConfigNotFound(_))
        ));
    }

    #[test]
    fn blank_pip_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "pip: '  '\n").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(PipUpdateError::InvalidConfig(_))
        ));
    }
}
