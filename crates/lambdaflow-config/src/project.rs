//! Project file (`lambdaflow.yaml`) of a function directory

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_handler_module() -> String {
    "main".to_string()
}

/// Settings of a single function project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Function name, also the API Gateway path part
    pub name: String,

    /// Lambda runtime identifier (e.g. "python3.12", "provided.al2023")
    pub runtime: String,

    /// Function called by the runtime
    pub entry_point: String,

    /// Module containing the entry point
    #[serde(default = "default_handler_module")]
    pub handler_module: String,

    /// Glob patterns excluded from the deployment archive
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ProjectConfig {
    pub fn new(
        name: impl Into<String>,
        runtime: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            runtime: runtime.into(),
            entry_point: entry_point.into(),
            handler_module: default_handler_module(),
            exclude: Vec::new(),
        }
    }

    /// Load and validate a project file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let project: ProjectConfig = serde_yaml::from_str(&content)?;
        project.validate(path)?;
        tracing::debug!("Loaded project '{}' from {}", project.name, path.display());
        Ok(project)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |message: &str| ConfigError::InvalidProject {
            path: path.to_path_buf(),
            message: message.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.name.contains('/') || self.name.contains(char::is_whitespace) {
            return Err(invalid("name must not contain '/' or whitespace"));
        }
        if self.runtime.trim().is_empty() {
            return Err(invalid("runtime must not be empty"));
        }
        if self.entry_point.trim().is_empty() {
            return Err(invalid("entry_point must not be empty"));
        }
        Ok(())
    }

    /// Lambda handler string, `<module>.<entry_point>`
    pub fn handler(&self) -> String {
        format!("{}.{}", self.handler_module, self.entry_point)
    }
}
