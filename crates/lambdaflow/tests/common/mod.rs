use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestProject {
    pub root: TempDir,
}

#[allow(dead_code)]
impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    /// Function directory with a project file and one source file
    pub fn with_function(name: &str) -> Self {
        let project = Self::new();
        fs::create_dir_all(project.function_dir()).unwrap();
        fs::write(
            project.function_dir().join("lambdaflow.yaml"),
            format!("name: {}\nruntime: python3.12\nentry_point: handle\n", name),
        )
        .unwrap();
        fs::write(
            project.function_dir().join("main.py"),
            "def handle(event, context):\n    return {}\n",
        )
        .unwrap();
        project
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn function_dir(&self) -> PathBuf {
        self.root.path().join("function")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.path().join("settings.json")
    }

    pub fn write_settings(&self, values: &[(&str, &str)]) {
        let values: serde_json::Map<String, serde_json::Value> = values
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        let content = serde_json::json!({
            "version": 1,
            "updated_at": "2024-01-01T00:00:00Z",
            "values": values,
        });
        fs::write(self.settings_path(), content.to_string()).unwrap();
    }

    /// Executable shell script standing in for the aws CLI. Every call is
    /// appended to `aws-calls.log`.
    #[cfg(unix)]
    pub fn write_fake_aws(&self, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.root.path().join("aws");
        let log = self.calls_log();
        let script = format!(
            "#!/bin/sh\necho \"$@\" >> '{}'\n{}\n",
            log.display(),
            body
        );
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    pub fn calls_log(&self) -> PathBuf {
        self.root.path().join("aws-calls.log")
    }

    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.calls_log())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
