//! Deployment archive creation

use crate::error::{CloudError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use zip::write::SimpleFileOptions;

/// Directories never shipped in a function package
const ALWAYS_SKIPPED: [&str; 3] = [".git", "target", ".lambdaflow"];

/// A zip file ready to be uploaded
#[derive(Debug)]
pub struct DeploymentArchive {
    path: PathBuf,
    // Deletes the file once the deployment is done with it
    _temp: Option<TempPath>,
}

impl DeploymentArchive {
    /// Archive that already exists on disk and is not cleaned up
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _temp: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value for the AWS CLI `--zip-file` flag
    pub fn zip_file_arg(&self) -> String {
        format!("fileb://{}", self.path.display())
    }
}

/// Produces the artifact uploaded as function code
pub trait Packager: Send + Sync {
    fn package(&self, function_name: &str) -> Result<DeploymentArchive>;
}

/// Zips a function directory into a temporary file
#[derive(Debug, Clone)]
pub struct ZipPackager {
    source_dir: PathBuf,
    exclude: Vec<glob::Pattern>,
}

impl ZipPackager {
    pub fn new(source_dir: impl Into<PathBuf>, exclude: &[String]) -> Result<Self> {
        let exclude = exclude
            .iter()
            .map(|p| {
                glob::Pattern::new(p)
                    .map_err(|e| CloudError::Package(format!("invalid exclude pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source_dir: source_dir.into(),
            exclude,
        })
    }

    fn is_excluded(&self, relative: &str) -> bool {
        self.exclude.iter().any(|p| p.matches(relative))
    }

    /// Files to include, as (absolute path, archive entry name), sorted
    fn collect_files(&self) -> Result<Vec<(PathBuf, String)>> {
        let mut files = Vec::new();
        let mut pending = vec![self.source_dir.clone()];

        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                let relative = entry_name(&self.source_dir, &path)?;
                let file_type = entry.file_type()?;

                if file_type.is_dir() {
                    let dir_name = entry.file_name();
                    if ALWAYS_SKIPPED.iter().any(|s| dir_name == *s) || self.is_excluded(&relative)
                    {
                        tracing::debug!("Skipping directory {}", relative);
                        continue;
                    }
                    pending.push(path);
                } else if file_type.is_file() {
                    if self.is_excluded(&relative) {
                        tracing::debug!("Skipping file {}", relative);
                        continue;
                    }
                    files.push((path, relative));
                }
            }
        }

        files.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(files)
    }
}

/// Archive entry name of `path` relative to `root`, always `/`-separated
fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        CloudError::Package(format!("{} is outside {}", path.display(), root.display()))
    })?;
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/"))
}

#[cfg(unix)]
fn file_mode(file: &File) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(file.metadata()?.permissions().mode())
}

#[cfg(not(unix))]
fn file_mode(_file: &File) -> Result<u32> {
    Ok(0o644)
}

impl Packager for ZipPackager {
    fn package(&self, function_name: &str) -> Result<DeploymentArchive> {
        if !self.source_dir.is_dir() {
            return Err(CloudError::Package(format!(
                "{} is not a directory",
                self.source_dir.display()
            )));
        }

        let files = self.collect_files()?;
        if files.is_empty() {
            return Err(CloudError::Package(format!(
                "no files to package in {}",
                self.source_dir.display()
            )));
        }

        let temp = tempfile::Builder::new()
            .prefix(&format!("{}-", function_name))
            .suffix(".zip")
            .tempfile()?;

        {
            let mut zip = zip::ZipWriter::new(temp.as_file());
            for (path, name) in &files {
                let mut file = File::open(path)?;
                let options = SimpleFileOptions::default()
                    .compression_method(zip::CompressionMethod::Deflated)
                    .unix_permissions(file_mode(&file)?);
                zip.start_file(name.as_str(), options)
                    .map_err(|e| CloudError::Package(e.to_string()))?;
                std::io::copy(&mut file, &mut zip)?;
            }
            zip.finish().map_err(|e| CloudError::Package(e.to_string()))?;
        }

        let path = temp.path().to_path_buf();
        tracing::debug!("Packaged {} files into {}", files.len(), path.display());

        Ok(DeploymentArchive {
            path,
            _temp: Some(temp.into_temp_path()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn archive_entries(path: &Path) -> Vec<String> {
        let file = File::open(path).unwrap();
        let archive = zip::ZipArchive::new(file).unwrap();
        let mut names: Vec<String> = archive.file_names().map(|s| s.to_string()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_package_directory() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("main.py"), "def handle(e, c): pass").unwrap();
        fs::write(temp_dir.path().join("README.md"), "docs").unwrap();
        let lib = temp_dir.path().join("lib");
        fs::create_dir(&lib).unwrap();
        fs::write(lib.join("util.py"), "X = 1").unwrap();
        let git = temp_dir.path().join(".git");
        fs::create_dir(&git).unwrap();
        fs::write(git.join("HEAD"), "ref").unwrap();

        let packager = ZipPackager::new(temp_dir.path(), &["*.md".to_string()]).unwrap();
        let archive = packager.package("orders").unwrap();

        assert_eq!(
            archive_entries(archive.path()),
            vec!["lib/util.py".to_string(), "main.py".to_string()]
        );
        assert!(archive.zip_file_arg().starts_with("fileb://"));
    }

    #[test]
    fn test_archive_removed_on_drop() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("bootstrap"), "#!/bin/sh").unwrap();

        let packager = ZipPackager::new(temp_dir.path(), &[]).unwrap();
        let archive = packager.package("orders").unwrap();
        let path = archive.path().to_path_buf();
        assert!(path.exists());

        drop(archive);
        assert!(!path.exists());
    }

    #[test]
    fn test_empty_directory_fails() {
        let temp_dir = tempdir().unwrap();
        let packager = ZipPackager::new(temp_dir.path(), &[]).unwrap();
        assert!(matches!(packager.package("orders"), Err(CloudError::Package(_))));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = ZipPackager::new(".", &["[".to_string()]);
        assert!(matches!(result, Err(CloudError::Package(_))));
    }
}
