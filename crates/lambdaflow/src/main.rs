mod commands;
mod prompt;
mod scaffold;

use clap::{Parser, Subcommand};
use lambdaflow_cloud_aws::{DEFAULT_AWS_BIN, GatewayChoice};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lambdaflow")]
#[command(about = "Deploy AWS Lambda functions, optionally behind API Gateway", long_about = None)]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the function in a project directory
    Deploy {
        /// Project directory (defaults to the current directory)
        dir: Option<PathBuf>,
        /// Expose a new function through API Gateway without asking
        #[arg(long, conflicts_with = "no_gateway")]
        gateway: bool,
        /// Never expose a new function through API Gateway
        #[arg(long)]
        no_gateway: bool,
        /// AWS region passed to every aws call
        #[arg(long, env = "AWS_REGION")]
        region: Option<String>,
        /// aws CLI executable
        #[arg(long, env = "LAMBDAFLOW_AWS_BIN", default_value = DEFAULT_AWS_BIN)]
        aws_bin: String,
    },
    /// Create a new project from a template directory or git repository
    ///
    /// Files under the template's `template/` directory are rendered with
    /// tera. Placeholders are written `{{ ProjectName }}`; the dotted
    /// `{{.ProjectName}}` form is accepted as well.
    Create {
        /// Local template directory or git URL ending in .git
        template: String,
    },
    /// Show or reset saved deployment settings
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the saved settings
    Show,
    /// Forget every saved setting
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Deploy {
            dir,
            gateway,
            no_gateway,
            region,
            aws_bin,
        } => {
            let choice = match (gateway, no_gateway) {
                (true, _) => GatewayChoice::Always,
                (_, true) => GatewayChoice::Never,
                _ => GatewayChoice::Ask,
            };
            let dir = match dir {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            commands::deploy::handle(&dir, choice, region, aws_bin).await?;
        }
        Commands::Create { template } => {
            commands::create::handle(&template).await?;
        }
        Commands::Config(ConfigCommands::Show) => {
            commands::config::handle_show()?;
        }
        Commands::Config(ConfigCommands::Reset { yes }) => {
            commands::config::handle_reset(yes)?;
        }
        Commands::Version => {
            println!("lambdaflow {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
