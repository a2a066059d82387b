//! AWS Lambda and API Gateway provisioning for LambdaFlow
//!
//! Deploys a function with the `aws` CLI and optionally exposes it as
//! `POST /<name>` on an API Gateway REST API.
//!
//! # Requirements
//!
//! - `aws` CLI v2 must be installed and configured
//! - Credentials and the default region come from the CLI profile
//!
//! # Example
//!
//! ```ignore
//! use lambdaflow_cloud::{CliRunner, DeploymentConfig, ZipPackager};
//! use lambdaflow_cloud_aws::{AwsCli, GatewayChoice, Orchestrator, Provisioner};
//! use std::sync::Arc;
//!
//! let aws = AwsCli::new(Arc::new(CliRunner::aws()));
//! let packager = ZipPackager::new("./orders", &[])?;
//! let provisioner = Provisioner::new(&aws, &prompter);
//!
//! let mut cfg = DeploymentConfig::new("orders", "python3.12", "handler");
//! let report = Orchestrator::new(provisioner, &packager)
//!     .with_gateway_choice(GatewayChoice::Always)
//!     .run(&mut cfg)
//!     .await?;
//! println!("{:?}", report.endpoint);
//! ```

pub mod arn;
pub mod aws;
pub mod identity;
pub mod orchestrator;
pub mod provisioner;
pub mod resolver;

pub use aws::{AwsCli, DEFAULT_AWS_BIN, FunctionWait};
pub use orchestrator::{DeployPhase, GatewayChoice, Observation, Orchestrator, next_phase};
pub use provisioner::Provisioner;
pub use resolver::{ChildResource, Resolver, RestApiListing};
