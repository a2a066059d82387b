//! Account, execution role and region resolution

use crate::arn::{BASIC_EXECUTION_POLICY_ARN, LAMBDA_ROLE_NAME, LAMBDA_TRUST_POLICY};
use crate::provisioner::Provisioner;
use lambdaflow_cloud::{
    CloudError, DeployReport, DeploymentConfig, Field, Result, Step, StepOutcome,
};

impl Provisioner<'_> {
    /// Account ID of the CLI credentials
    pub async fn ensure_account_id(
        &self,
        cfg: &mut DeploymentConfig,
        report: &mut DeployReport,
    ) -> Result<()> {
        if let Some(id) = cfg.get(Field::AccountId) {
            report.record(Step::ResolveAccount, StepOutcome::Reused, id);
            return Ok(());
        }

        let identity = self.aws.get_caller_identity().await?;
        report.record(
            Step::ResolveAccount,
            StepOutcome::Reused,
            identity.account.as_str(),
        );
        cfg.set(Field::AccountId, identity.account)?;
        Ok(())
    }

    /// Pick an existing role, or create a basic Lambda execution role
    pub async fn ensure_execution_role(
        &self,
        cfg: &mut DeploymentConfig,
        report: &mut DeployReport,
    ) -> Result<()> {
        if let Some(arn) = cfg.get(Field::RoleArn) {
            report.record(Step::ResolveRole, StepOutcome::Reused, arn);
            return Ok(());
        }

        let roles = self.aws.list_roles().await?;
        let selected = if roles.is_empty() {
            None
        } else {
            let names: Vec<String> = roles.iter().map(|r| r.role_name.clone()).collect();
            self.prompter
                .prompt_for_choice("AWS execution role", &names, true)?
                .filter(|name| !name.is_empty())
        };

        let chosen = selected
            .and_then(|name| roles.iter().find(|r| r.role_name == name))
            .or_else(|| roles.iter().find(|r| r.role_name == LAMBDA_ROLE_NAME));

        let (arn, outcome) = match chosen {
            Some(role) => (role.arn.clone(), StepOutcome::Reused),
            None => {
                let arn = self
                    .aws
                    .create_role(LAMBDA_ROLE_NAME, LAMBDA_TRUST_POLICY)
                    .await?;
                self.aws
                    .attach_role_policy(LAMBDA_ROLE_NAME, BASIC_EXECUTION_POLICY_ARN)
                    .await?;
                self.aws.wait_role_exists(LAMBDA_ROLE_NAME).await?;
                tracing::info!("Created execution role {}", arn);
                (arn, StepOutcome::Created)
            }
        };

        report.record(Step::ResolveRole, outcome, arn.as_str());
        cfg.set(Field::RoleArn, arn)?;
        Ok(())
    }

    /// Region from `--region`, the CLI profile, or the operator.
    ///
    /// The resolved region is pinned on the CLI wrapper so every later call
    /// targets the region the recorded ARNs are built for.
    pub async fn ensure_region(
        &self,
        cfg: &mut DeploymentConfig,
        report: &mut DeployReport,
    ) -> Result<()> {
        if let Some(region) = cfg.get(Field::Region) {
            self.aws.pin_region(region)?;
            report.record(Step::ResolveRegion, StepOutcome::Reused, region);
            return Ok(());
        }

        let region = match self.aws.region() {
            Some(region) => Some(region.to_string()),
            None => self.aws.configured_region().await?,
        };
        let region = match region {
            Some(region) => region,
            None => self
                .prompter
                .prompt_for_string("AWS deployment region")?
                .trim()
                .to_string(),
        };
        if region.is_empty() {
            return Err(CloudError::PreconditionFailed(
                "no deployment region configured".to_string(),
            ));
        }

        self.aws.pin_region(&region)?;
        report.record(Step::ResolveRegion, StepOutcome::Reused, region.as_str());
        cfg.set(Field::Region, region)?;
        Ok(())
    }
}
