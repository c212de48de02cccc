use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const CONFIG_DIR: &str = ".config/pip-update";
pub const CONFIG_FILE: &str = "config.yaml";

pub const CONFIG_ENV: &str = "PIP_UPDATE_CONFIG";
pub const PIP_ENV: &str = "PIP_UPDATE_PIP";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path_in(home: &Path) -> PathBuf {
    home.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// `$HOME/.config/pip-update/config.yaml`, if a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    home::home_dir().map(|home| config_path_in(&home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_under_home() {
        let path = config_path_in(Path::new("/home/alice"));
        assert_eq!(
            path,
            PathBuf::from("/home/alice/.config/pip-update/config.yaml")
        );
    }
}
