use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Project file not found in {0}. Looked for:\n\
        - lambdaflow.local.yaml, lambdaflow.yaml, .lambdaflow.yaml\n\
        The path can also be given with the LAMBDAFLOW_PROJECT_PATH environment variable"
    )]
    ProjectFileNotFound(PathBuf),

    #[error("Invalid project file {path}: {message}")]
    InvalidProject { path: PathBuf, message: String },

    #[error("Settings file {path} has version {found}, newer than supported version {supported}")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
