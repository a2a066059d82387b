use crate::prompt::DialoguerPrompter;
use crate::scaffold::{self, TemplateConfig, TemplateSource};
use anyhow::bail;
use colored::Colorize;
use lambdaflow_cloud::Prompter;
use std::path::Path;

pub async fn handle(template: &str) -> anyhow::Result<()> {
    let source = TemplateSource::parse(template);
    let checkout = scaffold::checkout(&source).await?;
    let config = TemplateConfig::load(checkout.root())?;
    let prompter = DialoguerPrompter;

    let name = prompter.prompt_for_string("Directory name")?.trim().to_string();
    if name.is_empty() {
        bail!("a directory name is required");
    }
    let target = std::env::current_dir()?.join(&name);
    if target.exists() {
        bail!("directory already exists: {}", target.display());
    }
    std::fs::create_dir(&target)?;

    match populate(checkout.root(), &target, &name, &config, &prompter) {
        Ok(count) => {
            println!();
            println!("{}", "✓ Project created".green().bold());
            println!("  {} ({} files)", target.display().to_string().cyan(), count);
            println!();
            println!("Deploy it with:");
            println!("  {} deploy {}", "lambdaflow".cyan(), name);
            Ok(())
        }
        Err(e) => {
            if let Err(cleanup) = std::fs::remove_dir_all(&target) {
                eprintln!(
                    "{} failed to clean up {}: {}",
                    "Warning:".yellow(),
                    target.display(),
                    cleanup
                );
            }
            Err(e)
        }
    }
}

fn populate(
    template_root: &Path,
    target: &Path,
    name: &str,
    config: &TemplateConfig,
    prompter: &dyn Prompter,
) -> anyhow::Result<usize> {
    let values = scaffold::collect_values(config, name, prompter)?;
    let written = scaffold::render_template(template_root, target, &values)?;
    Ok(written.len())
}
