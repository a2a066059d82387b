pub mod error;
pub mod project;
pub mod store;

pub use error::*;
pub use project::ProjectConfig;
pub use store::{ConfigStore, KeyValueStore, MemoryStore};

use std::path::{Path, PathBuf};

/// Candidate project file names, in priority order
pub const PROJECT_FILE_CANDIDATES: [&str; 3] =
    ["lambdaflow.local.yaml", "lambdaflow.yaml", ".lambdaflow.yaml"];

/// Get the LambdaFlow config directory, creating it if needed
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("lambdaflow");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Find the project file of a function directory
///
/// Search order:
/// 1. `LAMBDAFLOW_PROJECT_PATH` environment variable (direct path)
/// 2. `dir`: lambdaflow.local.yaml, lambdaflow.yaml, .lambdaflow.yaml
pub fn find_project_file(dir: &Path) -> Result<PathBuf> {
    if let Ok(project_path) = std::env::var("LAMBDAFLOW_PROJECT_PATH") {
        let path = PathBuf::from(project_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "LAMBDAFLOW_PROJECT_PATH points to a missing file: {}",
            path.display()
        );
    }

    for filename in &PROJECT_FILE_CANDIDATES {
        let path = dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    Err(ConfigError::ProjectFileNotFound(dir.to_path_buf()))
}

/// Path of the settings file holding persisted deployment values
pub fn settings_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("LAMBDAFLOW_SETTINGS_PATH") {
        return Ok(PathBuf::from(path));
    }
    Ok(get_config_dir()?.join("settings.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_get_config_dir() {
        let config_dir = get_config_dir().unwrap();
        assert!(config_dir.ends_with("lambdaflow"));
        assert!(config_dir.exists());
    }

    #[test]
    #[serial]
    fn test_find_project_file_in_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("lambdaflow.yaml"), "name: x").unwrap();

        temp_env::with_var_unset("LAMBDAFLOW_PROJECT_PATH", || {
            let found = find_project_file(temp_dir.path()).unwrap();
            assert!(found.ends_with("lambdaflow.yaml"));
        });
    }

    #[test]
    #[serial]
    fn test_find_project_file_local_priority() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("lambdaflow.yaml"), "name: shared").unwrap();
        fs::write(temp_dir.path().join("lambdaflow.local.yaml"), "name: local").unwrap();

        temp_env::with_var_unset("LAMBDAFLOW_PROJECT_PATH", || {
            let found = find_project_file(temp_dir.path()).unwrap();
            assert!(found.ends_with("lambdaflow.local.yaml"));
        });
    }

    #[test]
    #[serial]
    fn test_find_project_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let custom = temp_dir.path().join("custom.yaml");
        fs::write(&custom, "name: custom").unwrap();
        let empty_dir = tempfile::tempdir().unwrap();

        temp_env::with_var("LAMBDAFLOW_PROJECT_PATH", Some(&custom), || {
            let found = find_project_file(empty_dir.path()).unwrap();
            assert_eq!(found, custom);
        });
    }

    #[test]
    #[serial]
    fn test_find_project_file_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();

        temp_env::with_var_unset("LAMBDAFLOW_PROJECT_PATH", || {
            let result = find_project_file(temp_dir.path());
            assert!(matches!(result, Err(ConfigError::ProjectFileNotFound(_))));
        });
    }

    #[test]
    #[serial]
    fn test_settings_path_env_override() {
        temp_env::with_var("LAMBDAFLOW_SETTINGS_PATH", Some("/tmp/lf-settings.json"), || {
            assert_eq!(
                settings_path().unwrap(),
                PathBuf::from("/tmp/lf-settings.json")
            );
        });
    }
}
