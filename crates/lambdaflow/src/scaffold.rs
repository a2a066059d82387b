//! Project scaffolding from templates
//!
//! A template is a directory (or a git repository) containing a
//! `template.yaml` that lists the values to ask for, and a `template/`
//! directory whose files are rendered with tera into the new project.
//!
//! Placeholders use tera syntax (`{{ ProjectName }}`). The dotted form
//! `{{.ProjectName}}` found in older templates is accepted and rewritten to
//! it; other Go template actions (`{{if}}`, `{{range}}`) are not.

use anyhow::{Context as _, Result, bail};
use colored::Colorize;
use lambdaflow_cloud::Prompter;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tera::{Context, Tera};

pub const TEMPLATE_CONFIG_FILE: &str = "template.yaml";
pub const TEMPLATE_FILES_DIR: &str = "template";

/// Value always available to templates
pub const PROJECT_NAME_KEY: &str = "ProjectName";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateConfig {
    #[serde(default)]
    pub prompts: Vec<TemplatePrompt>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplatePrompt {
    pub key: String,
    pub prompt: String,
}

impl TemplateConfig {
    pub fn load(template_root: &Path) -> Result<Self> {
        let path = template_root.join(TEMPLATE_CONFIG_FILE);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: TemplateConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid template config {}", path.display()))?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Local(PathBuf),
    Git(String),
}

impl TemplateSource {
    pub fn parse(value: &str) -> Self {
        if value.ends_with(".git") {
            TemplateSource::Git(value.to_string())
        } else {
            TemplateSource::Local(PathBuf::from(value))
        }
    }
}

/// Template available on disk. A cloned repository is removed on drop.
pub struct TemplateCheckout {
    root: PathBuf,
    _temp: Option<TempDir>,
}

impl TemplateCheckout {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

pub async fn checkout(source: &TemplateSource) -> Result<TemplateCheckout> {
    match source {
        TemplateSource::Local(path) => {
            if !path.is_dir() {
                bail!("template not found: {}", path.display());
            }
            Ok(TemplateCheckout {
                root: path.clone(),
                _temp: None,
            })
        }
        TemplateSource::Git(url) => {
            let temp = tempfile::Builder::new().prefix("lambdaflow-").tempdir()?;
            println!("{}", "Cloning template...".blue());
            tracing::debug!("git clone {} {}", url, temp.path().display());

            let status = tokio::process::Command::new("git")
                .arg("clone")
                .arg(url)
                .arg(temp.path())
                .status()
                .await
                .context("failed to run git")?;
            if !status.success() {
                bail!("git clone {} failed ({})", url, status);
            }

            Ok(TemplateCheckout {
                root: temp.path().to_path_buf(),
                _temp: Some(temp),
            })
        }
    }
}

/// Ask for every value the template needs
pub fn collect_values(
    config: &TemplateConfig,
    project_name: &str,
    prompter: &dyn Prompter,
) -> Result<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();
    values.insert(PROJECT_NAME_KEY.to_string(), project_name.to_string());
    for prompt in &config.prompts {
        let answer = prompter.prompt_for_string(&prompt.prompt)?;
        values.insert(prompt.key.clone(), answer);
    }
    Ok(values)
}

/// Render every file under `<template_root>/template` into `target`,
/// keeping relative paths. Returns the written files.
pub fn render_template(
    template_root: &Path,
    target: &Path,
    values: &BTreeMap<String, String>,
) -> Result<Vec<PathBuf>> {
    let files_dir = template_root.join(TEMPLATE_FILES_DIR);
    if !files_dir.is_dir() {
        bail!("template has no {}/ directory", TEMPLATE_FILES_DIR);
    }

    let mut context = Context::new();
    for (key, value) in values {
        context.insert(key, value);
    }

    let mut written = Vec::new();
    let mut pending = vec![files_dir.clone()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }

            let relative = path.strip_prefix(&files_dir)?;
            let destination = target.join(relative);
            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent)?;
            }

            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let rendered = render_file(&relative.to_string_lossy(), &content, &context)?;
                    std::fs::write(&destination, rendered)?;
                }
                // Binary files are copied as is
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    std::fs::copy(&path, &destination)?;
                }
                Err(e) => return Err(e.into()),
            }
            tracing::debug!("Wrote {}", destination.display());
            written.push(destination);
        }
    }

    written.sort();
    Ok(written)
}

fn render_file(name: &str, content: &str, context: &Context) -> Result<String> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_raw_template(name, &undot_placeholders(content))
        .with_context(|| format!("invalid template {}", name))?;
    tera.render(name, context)
        .with_context(|| format!("failed to render {}", name))
}

/// `{{.Key}}` -> `{{ Key}}`
fn undot_placeholders(content: &str) -> String {
    content.replace("{{ .", "{{ ").replace("{{.", "{{ ")
}
