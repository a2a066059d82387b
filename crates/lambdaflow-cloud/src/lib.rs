//! LambdaFlow deployment core
//!
//! Provider-facing building blocks shared by the AWS provisioning steps:
//!
//! - [`CommandRunner`]: runs the provider CLI and separates "no such
//!   resource" from real failures
//! - [`DeploymentConfig`]: identifiers resolved during one deployment run
//! - [`Prompter`]: questions asked to the operator
//! - [`Packager`]: builds the zip archive uploaded as function code
//! - [`DeployReport`]: what a run created, reused or skipped

pub mod deployment;
pub mod error;
pub mod package;
pub mod prompt;
pub mod report;
pub mod runner;

// Re-exports
pub use deployment::{DeploymentConfig, Field};
pub use error::{CloudError, Result};
pub use package::{DeploymentArchive, Packager, ZipPackager};
pub use prompt::Prompter;
pub use report::{DeployBranch, DeployReport, ReportSummary, Step, StepOutcome, StepRecord};
pub use runner::{
    AWS_NOT_FOUND_EXIT_CODE, CliRunner, CommandOutcome, CommandRunner, OutputMode,
    describe_action,
};
