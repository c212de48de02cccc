use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

static PYTHON_IN_BANNER_RE: OnceLock<Regex> = OnceLock::new();

/// Facts about the machine and interpreter a run happened on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentMetadata {
    pub tool_version: String,
    pub username: String,
    pub hostname: String,
    pub timestamp: String,
    pub os: String,
    pub arch: String,
    pub package_manager: String,
    pub pip_version: Option<String>,
    pub python_version: Option<String>,
    pub virtual_environment_active: bool,
}

impl EnvironmentMetadata {
    /// Collect metadata from the process environment.
    pub fn collect(package_manager: &str, pip_banner: Option<String>) -> Self {
        Self::collect_with(package_manager, pip_banner, |key| std::env::var(key).ok())
    }

    pub fn collect_with(
        package_manager: &str,
        pip_banner: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let username = env("USER")
            .or_else(|| env("USERNAME"))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unknown_user".to_string());
        let hostname = env("HOSTNAME")
            .or_else(|| env("COMPUTERNAME"))
            .or_else(read_etc_hostname)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unknown_host".to_string());
        let virtual_environment_active =
            env("VIRTUAL_ENV").is_some() || env("CONDA_DEFAULT_ENV").is_some();
        let python_version = pip_banner.as_deref().and_then(python_version_from_banner);

        Self {
            tool_version: TOOL_VERSION.to_string(),
            username,
            hostname,
            timestamp: chrono::Utc::now().to_rfc3339(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            package_manager: package_manager.to_string(),
            pip_version: pip_banner,
            python_version,
            virtual_environment_active,
        }
    }
}

fn read_etc_hostname() -> Option<String> {
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
}

/// Extract `3.11` from `pip 23.1 from /usr/lib/python3/dist-packages/pip (python 3.11)`.
pub fn python_version_from_banner(banner: &str) -> Option<String> {
    let re = PYTHON_IN_BANNER_RE.get_or_init(|| Regex::new(r"\(python ([^)\s]+)\)").unwrap());
    re.captures(banner).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn python_version_is_read_from_pip_banner() {
        assert_eq!(
            python_version_from_banner("pip 24.0 from /opt/venv/lib/python3.12/site-packages/pip (python 3.12)"),
            Some("3.12".to_string())
        );
        assert_eq!(python_version_from_banner("pip 9.0.1"), None);
    }

    #[test]
    fn venv_is_detected_from_environment() {
        let vars: HashMap<&str, &str> =
            [("USER", "alice"), ("HOSTNAME", "box"), ("VIRTUAL_ENV", "/opt/venv")]
                .into_iter()
                .collect();
        let meta = EnvironmentMetadata::collect_with(
            "pip",
            Some("pip 24.0 from x (python 3.12)".to_string()),
            |k| vars.get(k).map(|v| v.to_string()),
        );
        assert_eq!(meta.username, "alice");
        assert_eq!(meta.hostname, "box");
        assert!(meta.virtual_environment_active);
        assert_eq!(meta.python_version.as_deref(), Some("3.12"));
        assert_eq!(meta.tool_version, TOOL_VERSION);
    }

    #[test]
    fn conda_counts_as_virtual_environment() {
        let meta = EnvironmentMetadata::collect_with("pip", None, |k| {
            (k == "CONDA_DEFAULT_ENV").then(|| "base".to_string())
        });
        assert!(meta.virtual_environment_active);
        assert_eq!(meta.username, "unknown_user");
        assert!(meta.pip_version.is_none());
    }
}
