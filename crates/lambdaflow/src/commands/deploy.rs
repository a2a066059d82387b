use crate::prompt::DialoguerPrompter;
use colored::Colorize;
use lambdaflow_cloud::{
    CliRunner, DeployReport, DeploymentConfig, Field, StepOutcome, ZipPackager,
};
use lambdaflow_cloud_aws::{AwsCli, GatewayChoice, Orchestrator, Provisioner};
use lambdaflow_config::{ConfigStore, KeyValueStore, ProjectConfig};
use std::path::Path;
use std::sync::Arc;

pub async fn handle(
    dir: &Path,
    gateway_choice: GatewayChoice,
    region: Option<String>,
    aws_bin: String,
) -> anyhow::Result<()> {
    let project_file = lambdaflow_config::find_project_file(dir)?;
    let project = ProjectConfig::load(&project_file)?;

    println!(
        "{}",
        format!("Deploying {} as an AWS Lambda function", project.name)
            .blue()
            .bold()
    );
    println!(
        "  Entry point: {} ({})",
        project.handler().cyan(),
        project.runtime
    );

    let mut store = ConfigStore::open_default()?;
    let mut cfg = DeploymentConfig::new(&project.name, &project.runtime, &project.entry_point)
        .with_handler_module(&project.handler_module);

    if let Some(region) = &region {
        forget_other_region(&mut store, region);
        cfg.set(Field::Region, region.as_str())?;
    }
    cfg.seed_from(&store)?;

    let packager = ZipPackager::new(dir, &project.exclude)?;
    let aws = AwsCli::new(Arc::new(CliRunner::aws()))
        .with_program(aws_bin)
        .with_region(region);
    let prompter = DialoguerPrompter;

    let report = Orchestrator::new(Provisioner::new(&aws, &prompter), &packager)
        .with_gateway_choice(gateway_choice)
        .run(&mut cfg)
        .await?;

    cfg.persist_to(&mut store);
    store.save()?;

    print_report(&report);
    Ok(())
}

/// REST API identifiers saved for another region do not apply to this one
fn forget_other_region(store: &mut ConfigStore, region: &str) {
    let Some(saved) = store.get(&Field::Region.store_key()) else {
        return;
    };
    if saved == region {
        return;
    }

    tracing::warn!(
        "Region {} differs from saved region {}, forgetting saved REST API",
        region,
        saved
    );
    for field in [
        Field::Region,
        Field::RestApiId,
        Field::RestApiRootResourceId,
    ] {
        store.remove(&field.store_key());
    }
}

fn print_report(report: &DeployReport) {
    println!();
    for record in &report.steps {
        let outcome = match record.outcome {
            StepOutcome::Created => record.outcome.to_string().green(),
            StepOutcome::Updated => record.outcome.to_string().yellow(),
            StepOutcome::Reused => record.outcome.to_string().cyan(),
            StepOutcome::Skipped => record.outcome.to_string().dimmed(),
        };
        println!("  {:<22} {:<8} {}", record.step.to_string(), outcome, record.detail);
    }

    println!();
    if let Some(branch) = report.branch {
        println!(
            "{} {} ({}, {:.1}s)",
            "✓".green(),
            format!("{} {}", report.function_name, branch).bold(),
            report.summary(),
            report.duration_ms as f64 / 1000.0
        );
    }
    if let Some(endpoint) = &report.endpoint {
        println!("  API endpoint: {}", endpoint.cyan());
    }
}
