use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipUpdateError {
    #[error("no working pip command found in PATH (tried pip, pip3, python3 -m pip, python -m pip)")]
    PackageManagerNotFound,

    #[error("invalid package manager command: {0:?}")]
    InvalidCommand(String),

    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'pip check' exited with {exit_code} and unrecognised output: {line}")]
    UnparseableConsistencyCheck { exit_code: String, line: String },

    #[error("'pip list --outdated' failed: {0}")]
    ListingFailed(String),

    #[error("unparseable line in outdated listing: {0:?}")]
    UnparseableListing(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipUpdateError>;
