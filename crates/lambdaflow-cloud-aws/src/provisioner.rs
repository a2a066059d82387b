//! Get-or-create provisioning steps
//!
//! Each step checks what already exists before creating anything, so a run
//! that failed halfway can simply be started again. Steps read their inputs
//! from the [`DeploymentConfig`] and record what they resolve before
//! returning.

use crate::arn::{self, DEPLOYMENT_STAGE, PERMISSION_ENVIRONMENTS, RESERVED_API_NAME};
use crate::aws::{AwsCli, CreateFunctionRequest, FunctionWait, PermissionGrant};
use crate::resolver::Resolver;
use lambdaflow_cloud::{
    DeployReport, DeploymentArchive, DeploymentConfig, Field, Prompter, Result, Step, StepOutcome,
};

pub struct Provisioner<'a> {
    pub(crate) aws: &'a AwsCli,
    pub(crate) prompter: &'a dyn Prompter,
}

impl<'a> Provisioner<'a> {
    pub fn new(aws: &'a AwsCli, prompter: &'a dyn Prompter) -> Self {
        Self { aws, prompter }
    }

    pub fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.aws)
    }

    // ========== Function ==========

    /// Replace the code of the existing function
    pub async fn update_function(
        &self,
        cfg: &DeploymentConfig,
        archive: &DeploymentArchive,
        report: &mut DeployReport,
    ) -> Result<()> {
        self.aws
            .update_function_code(cfg.name(), &archive.zip_file_arg())
            .await?;
        report.record(Step::UpdateFunction, StepOutcome::Updated, cfg.name());
        Ok(())
    }

    /// Create the function, resolving the region, account and execution role
    /// first
    pub async fn create_function(
        &self,
        cfg: &mut DeploymentConfig,
        archive: &DeploymentArchive,
        report: &mut DeployReport,
    ) -> Result<()> {
        self.ensure_region(cfg, report).await?;
        self.ensure_account_id(cfg, report).await?;
        self.ensure_execution_role(cfg, report).await?;

        let role_arn = cfg.require(Field::RoleArn, "function creation")?;
        let request = CreateFunctionRequest {
            name: cfg.name(),
            runtime: cfg.runtime(),
            role_arn,
            handler: cfg.handler(),
            zip_file: archive.zip_file_arg(),
        };
        self.aws.create_function(&request).await?;

        tracing::info!("Created function {}", cfg.name());
        report.record(
            Step::CreateFunction,
            StepOutcome::Created,
            format!("{} ({}, {})", cfg.name(), cfg.runtime(), cfg.handler()),
        );
        Ok(())
    }

    pub async fn wait_for_function(
        &self,
        cfg: &DeploymentConfig,
        wait: FunctionWait,
        report: &mut DeployReport,
    ) -> Result<()> {
        self.aws.wait_function(cfg.name(), wait).await?;
        report.record(Step::WaitFunction, StepOutcome::Reused, wait.waiter());
        Ok(())
    }

    // ========== API Gateway ==========

    /// Expose the function as `POST /<name>` and return the endpoint URL
    pub async fn wire_gateway(
        &self,
        cfg: &mut DeploymentConfig,
        report: &mut DeployReport,
    ) -> Result<String> {
        self.ensure_region(cfg, report).await?;
        self.ensure_account_id(cfg, report).await?;

        let new_api = self.ensure_rest_api(cfg, report).await?;
        self.ensure_root_resource(cfg, report).await?;
        self.ensure_child_resource(cfg, report).await?;
        self.ensure_post_method(cfg, report).await?;
        self.put_integration(cfg, report).await?;
        if new_api {
            self.deploy_rest_api(cfg, report).await?;
        } else {
            report.record(
                Step::DeployApi,
                StepOutcome::Skipped,
                "existing REST API is already deployed",
            );
        }
        self.grant_invoke_permissions(cfg, report).await?;

        let endpoint = arn::endpoint_url(
            cfg.require(Field::RestApiId, "endpoint")?,
            cfg.require(Field::Region, "endpoint")?,
            cfg.name(),
        );
        Ok(endpoint)
    }

    /// Select or create the REST API. Returns `true` when a new one was created.
    pub async fn ensure_rest_api(
        &self,
        cfg: &mut DeploymentConfig,
        report: &mut DeployReport,
    ) -> Result<bool> {
        if let Some(id) = cfg.get(Field::RestApiId) {
            report.record(Step::SelectRestApi, StepOutcome::Reused, id);
            return Ok(false);
        }

        let listing = self.resolver().rest_apis().await?;
        let selected = if listing.is_empty() {
            None
        } else {
            // Without the reserved API an empty answer means "create it"
            self.prompter
                .prompt_for_choice("AWS REST API", &listing.names(), !listing.reserved_exists)?
                .filter(|name| !name.is_empty())
        };

        let existing = selected.and_then(|name| listing.id_of(&name).map(str::to_string));
        let (id, created) = match existing {
            Some(id) => (id, false),
            None => {
                let id = self.aws.create_rest_api(RESERVED_API_NAME).await?;
                tracing::info!("Created REST API {} ({})", RESERVED_API_NAME, id);
                (id, true)
            }
        };

        let outcome = if created {
            StepOutcome::Created
        } else {
            StepOutcome::Reused
        };
        report.record(Step::SelectRestApi, outcome, id.as_str());
        cfg.set(Field::RestApiId, id)?;
        Ok(created)
    }

    pub async fn ensure_root_resource(
        &self,
        cfg: &mut DeploymentConfig,
        report: &mut DeployReport,
    ) -> Result<()> {
        if let Some(id) = cfg.get(Field::RestApiRootResourceId) {
            report.record(Step::ResolveRootResource, StepOutcome::Reused, id);
            return Ok(());
        }

        let api_id = cfg.require(Field::RestApiId, "root resource lookup")?;
        let root = self.resolver().root_resource(api_id).await?;
        report.record(Step::ResolveRootResource, StepOutcome::Reused, root.as_str());
        cfg.set(Field::RestApiRootResourceId, root)?;
        Ok(())
    }

    /// Reuse the resource at `/<name>` or create it below the root
    pub async fn ensure_child_resource(
        &self,
        cfg: &mut DeploymentConfig,
        report: &mut DeployReport,
    ) -> Result<()> {
        if let Some(id) = cfg.get(Field::RestApiResourceId) {
            report.record(Step::EnsureResource, StepOutcome::Reused, id);
            return Ok(());
        }

        let api_id = cfg.require(Field::RestApiId, "resource creation")?;
        let root_id = cfg.require(Field::RestApiRootResourceId, "resource creation")?;

        let (id, outcome) = match self.resolver().child_resource(api_id, cfg.name()).await? {
            Some(child) => (child.id, StepOutcome::Reused),
            None => {
                let id = self
                    .aws
                    .create_resource(api_id, root_id, cfg.name())
                    .await?;
                tracing::info!("Created resource /{} ({})", cfg.name(), id);
                (id, StepOutcome::Created)
            }
        };

        report.record(Step::EnsureResource, outcome, id.as_str());
        cfg.set(Field::RestApiResourceId, id)?;
        Ok(())
    }

    /// Add `POST` and its JSON method response unless the resource has one
    pub async fn ensure_post_method(
        &self,
        cfg: &mut DeploymentConfig,
        report: &mut DeployReport,
    ) -> Result<()> {
        let api_id = cfg.require(Field::RestApiId, "method creation")?;
        let resource_id = cfg.require(Field::RestApiResourceId, "method creation")?;

        let existing = self.resolver().child_resource(api_id, cfg.name()).await?;
        if existing.is_some_and(|child| child.has_post_method) {
            report.record(Step::EnsureMethod, StepOutcome::Skipped, "POST already present");
            return Ok(());
        }

        self.aws.put_method(api_id, resource_id).await?;
        self.aws.put_method_response(api_id, resource_id).await?;
        report.record(Step::EnsureMethod, StepOutcome::Created, "POST");
        Ok(())
    }

    /// Point `POST /<name>` at the function
    pub async fn put_integration(
        &self,
        cfg: &DeploymentConfig,
        report: &mut DeployReport,
    ) -> Result<()> {
        let api_id = cfg.require(Field::RestApiId, "integration")?;
        let resource_id = cfg.require(Field::RestApiResourceId, "integration")?;
        let region = cfg.require(Field::Region, "integration")?;
        let account_id = cfg.require(Field::AccountId, "integration")?;

        let uri = arn::integration_uri(region, account_id, cfg.name());
        self.aws.put_integration(api_id, resource_id, &uri).await?;
        self.aws
            .put_integration_response(api_id, resource_id)
            .await?;
        report.record(Step::PutIntegration, StepOutcome::Updated, uri);
        Ok(())
    }

    pub async fn deploy_rest_api(
        &self,
        cfg: &DeploymentConfig,
        report: &mut DeployReport,
    ) -> Result<()> {
        let api_id = cfg.require(Field::RestApiId, "API deployment")?;
        self.aws.create_deployment(api_id, DEPLOYMENT_STAGE).await?;
        tracing::info!("Deployed REST API {} to stage {}", api_id, DEPLOYMENT_STAGE);
        report.record(Step::DeployApi, StepOutcome::Created, DEPLOYMENT_STAGE);
        Ok(())
    }

    /// Allow API Gateway to invoke the function from every environment
    pub async fn grant_invoke_permissions(
        &self,
        cfg: &DeploymentConfig,
        report: &mut DeployReport,
    ) -> Result<()> {
        let api_id = cfg.require(Field::RestApiId, "permission grant")?;
        let region = cfg.require(Field::Region, "permission grant")?;
        let account_id = cfg.require(Field::AccountId, "permission grant")?;

        for (environment, stage) in PERMISSION_ENVIRONMENTS {
            let grant = PermissionGrant {
                function_name: cfg.name().to_string(),
                statement_id: arn::statement_id(environment),
                source_arn: arn::invoke_source_arn(region, account_id, api_id, stage, cfg.name()),
            };
            self.aws.add_permission(&grant).await?;
            report.record(Step::GrantPermission, StepOutcome::Created, grant.statement_id);
        }
        Ok(())
    }
}
