use crate::prompt::DialoguerPrompter;
use colored::Colorize;
use lambdaflow_cloud::Prompter;
use lambdaflow_config::{ConfigStore, KeyValueStore};

pub fn handle_show() -> anyhow::Result<()> {
    let store = ConfigStore::open_default()?;
    println!("{} {}", "Settings:".bold(), store.path().display());

    let keys = store.keys();
    if keys.is_empty() {
        println!("  (no saved settings)");
        return Ok(());
    }

    for key in keys {
        let value = store.get(&key).unwrap_or_default();
        println!("  {} = {}", key.cyan(), value);
    }
    println!(
        "  {}",
        format!("updated {}", store.updated_at().format("%Y-%m-%d %H:%M:%S UTC")).dimmed()
    );
    Ok(())
}

pub fn handle_reset(yes: bool) -> anyhow::Result<()> {
    let mut store = ConfigStore::open_default()?;
    let keys = store.keys();
    if keys.is_empty() {
        println!("No saved settings");
        return Ok(());
    }

    if !yes && !DialoguerPrompter.prompt_to_confirm("Forget every saved setting")? {
        println!("{}", "Cancelled".yellow());
        return Ok(());
    }

    for key in &keys {
        store.remove(key);
    }
    store.save()?;
    println!("{} Removed {} settings", "✓".green(), keys.len());
    Ok(())
}
