//! Deployment state machine
//!
//! A run walks through [`DeployPhase`]s. [`next_phase`] decides the next
//! phase from the current one and what the phase observed; [`Orchestrator`]
//! performs each phase's side effects. Any error ends the run as is: there is
//! no retry and nothing already created is removed.

use crate::aws::FunctionWait;
use crate::provisioner::Provisioner;
use lambdaflow_cloud::{
    CloudError, DeployBranch, DeployReport, DeploymentArchive, DeploymentConfig, Field, Packager,
    Result, Step, StepOutcome,
};
use std::time::Instant;

/// Whether a new function is exposed through API Gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatewayChoice {
    /// Ask the operator
    #[default]
    Ask,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployPhase {
    Start,
    Package,
    FunctionCheck,
    UpdateFunction,
    PromptGatewayChoice,
    CreateFunction { wire_gateway: bool },
    WireGateway,
    Wait(FunctionWait),
    Done,
}

/// What a phase found out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The phase completed and has nothing to report
    Completed,
    FunctionExists(bool),
    GatewayChosen(bool),
}

/// Next phase, or `None` when the observation does not fit the phase
pub fn next_phase(phase: DeployPhase, observation: Observation) -> Option<DeployPhase> {
    use DeployPhase::*;
    use Observation::*;

    let next = match (phase, observation) {
        (Start, Completed) => Package,
        (Package, Completed) => FunctionCheck,
        (FunctionCheck, FunctionExists(true)) => UpdateFunction,
        (FunctionCheck, FunctionExists(false)) => PromptGatewayChoice,
        (UpdateFunction, Completed) => Wait(FunctionWait::Updated),
        (PromptGatewayChoice, GatewayChosen(wire_gateway)) => CreateFunction { wire_gateway },
        (CreateFunction { wire_gateway: true }, Completed) => WireGateway,
        (CreateFunction { wire_gateway: false }, Completed) => Wait(FunctionWait::Active),
        (WireGateway, Completed) => Wait(FunctionWait::Active),
        (Wait(_), Completed) => Done,
        (Done, Completed) => Done,
        _ => return None,
    };
    Some(next)
}

pub struct Orchestrator<'a> {
    provisioner: Provisioner<'a>,
    packager: &'a dyn Packager,
    gateway_choice: GatewayChoice,
}

impl<'a> Orchestrator<'a> {
    pub fn new(provisioner: Provisioner<'a>, packager: &'a dyn Packager) -> Self {
        Self {
            provisioner,
            packager,
            gateway_choice: GatewayChoice::Ask,
        }
    }

    pub fn with_gateway_choice(mut self, choice: GatewayChoice) -> Self {
        self.gateway_choice = choice;
        self
    }

    /// Deploy the function described by `cfg`.
    ///
    /// `cfg` is updated with every identifier resolved on the way, also when
    /// the run fails, so the caller can inspect how far it got.
    pub async fn run(&self, cfg: &mut DeploymentConfig) -> Result<DeployReport> {
        let started = Instant::now();
        let mut report = DeployReport::new(cfg.name());
        let mut archive: Option<DeploymentArchive> = None;
        let mut phase = DeployPhase::Start;

        tracing::debug!("Deploying {}", cfg.name());

        // A region known up front applies to every call, the function check
        // included
        if let Some(region) = cfg.get(Field::Region) {
            self.provisioner.aws.pin_region(region)?;
        }

        while phase != DeployPhase::Done {
            let observation = self
                .execute(phase, cfg, &mut archive, &mut report)
                .await?;
            let next = next_phase(phase, observation).ok_or_else(|| {
                CloudError::PreconditionFailed(format!(
                    "no transition from {:?} on {:?}",
                    phase, observation
                ))
            })?;
            tracing::debug!("{:?} -> {:?}", phase, next);
            phase = next;
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        Ok(report)
    }

    async fn execute(
        &self,
        phase: DeployPhase,
        cfg: &mut DeploymentConfig,
        archive: &mut Option<DeploymentArchive>,
        report: &mut DeployReport,
    ) -> Result<Observation> {
        let provisioner = &self.provisioner;

        match phase {
            DeployPhase::Start | DeployPhase::Done => Ok(Observation::Completed),
            DeployPhase::Package => {
                let packaged = self.packager.package(cfg.name())?;
                report.record(
                    Step::Package,
                    StepOutcome::Created,
                    packaged.path().display().to_string(),
                );
                *archive = Some(packaged);
                Ok(Observation::Completed)
            }
            DeployPhase::FunctionCheck => {
                let exists = provisioner.resolver().function_exists(cfg.name()).await?;
                let outcome = if exists {
                    StepOutcome::Reused
                } else {
                    StepOutcome::Skipped
                };
                report.record(Step::CheckFunction, outcome, cfg.name());
                Ok(Observation::FunctionExists(exists))
            }
            DeployPhase::UpdateFunction => {
                let archive = require_archive(archive)?;
                provisioner.update_function(cfg, archive, report).await?;
                report.branch = Some(DeployBranch::Updated);
                Ok(Observation::Completed)
            }
            DeployPhase::PromptGatewayChoice => {
                let wire = match self.gateway_choice {
                    GatewayChoice::Always => true,
                    GatewayChoice::Never => false,
                    GatewayChoice::Ask => provisioner
                        .prompter
                        .prompt_to_confirm("Add Lambda function to a REST API")?,
                };
                Ok(Observation::GatewayChosen(wire))
            }
            DeployPhase::CreateFunction { wire_gateway } => {
                let archive = require_archive(archive)?;
                provisioner.create_function(cfg, archive, report).await?;
                report.branch = Some(if wire_gateway {
                    DeployBranch::CreatedWithGateway
                } else {
                    DeployBranch::Created
                });
                Ok(Observation::Completed)
            }
            DeployPhase::WireGateway => {
                let endpoint = provisioner.wire_gateway(cfg, report).await?;
                report.endpoint = Some(endpoint);
                Ok(Observation::Completed)
            }
            DeployPhase::Wait(wait) => {
                provisioner.wait_for_function(cfg, wait, report).await?;
                Ok(Observation::Completed)
            }
        }
    }
}

fn require_archive(archive: &Option<DeploymentArchive>) -> Result<&DeploymentArchive> {
    archive.as_ref().ok_or_else(|| {
        CloudError::PreconditionFailed(
            "deployment archive was not built".to_string(),
        )
    })
}
