//! aws CLI wrapper
//!
//! Wraps the `aws` commands used to provision Lambda functions and
//! API Gateway REST APIs. Each method issues one command and decodes only
//! the fields it needs.

use lambdaflow_cloud::{CloudError, CommandOutcome, CommandRunner, OutputMode, Result};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::sync::{Arc, OnceLock};

pub const DEFAULT_AWS_BIN: &str = "aws";

/// State a `aws lambda wait` call blocks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionWait {
    /// After `update-function-code`
    Updated,
    /// After `create-function`
    Active,
}

impl FunctionWait {
    pub fn waiter(&self) -> &'static str {
        match self {
            FunctionWait::Updated => "function-updated",
            FunctionWait::Active => "function-active",
        }
    }
}

/// Arguments of `aws lambda create-function`
#[derive(Debug, Clone)]
pub struct CreateFunctionRequest<'a> {
    pub name: &'a str,
    pub runtime: &'a str,
    pub role_arn: &'a str,
    pub handler: &'a str,
    pub zip_file: String,
}

/// Arguments of `aws lambda add-permission`
#[derive(Debug, Clone)]
pub struct PermissionGrant {
    pub function_name: String,
    pub statement_id: String,
    pub source_arn: String,
}

/// aws CLI wrapper
pub struct AwsCli {
    runner: Arc<dyn CommandRunner>,
    program: String,
    region: OnceLock<String>,
}

impl AwsCli {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            program: DEFAULT_AWS_BIN.to_string(),
            region: OnceLock::new(),
        }
    }

    /// Use another executable than `aws`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Pass `--region` on every call instead of relying on the CLI profile
    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region.map(OnceLock::from).unwrap_or_default();
        self
    }

    /// Pin the region used by every following call.
    ///
    /// The region can be pinned once; pinning a different one later fails.
    pub fn pin_region(&self, region: &str) -> Result<()> {
        let pinned = self.region.get_or_init(|| region.to_string());
        if pinned != region {
            return Err(CloudError::FieldConflict {
                field: "region",
                existing: pinned.clone(),
                attempted: region.to_string(),
            });
        }
        Ok(())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Region passed with `--region`, if one is pinned
    pub fn region(&self) -> Option<&str> {
        self.region.get().map(String::as_str)
    }

    async fn call(&self, args: &[&str], mode: OutputMode) -> Result<CommandOutcome> {
        let mut full: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        if let Some(region) = self.region.get() {
            full.push("--region".to_string());
            full.push(region.clone());
        }
        self.runner.run(&self.program, &full, mode).await
    }

    /// Read-only call whose JSON answer is decoded; `None` when absent
    async fn query<T: DeserializeOwned>(&self, args: &[&str]) -> Result<Option<T>> {
        let mut full = args.to_vec();
        full.extend(["--output", "json"]);
        match self.call(&full, OutputMode::Capture).await? {
            CommandOutcome::Output(output) => Ok(Some(serde_json::from_slice(&output)?)),
            CommandOutcome::Absent => Ok(None),
        }
    }

    /// Call that must succeed; absence is a failure
    async fn execute(&self, args: &[&str], mode: OutputMode) -> Result<Vec<u8>> {
        let action = args.iter().take(2).cloned().collect::<Vec<_>>().join(" ");
        self.call(args, mode)
            .await?
            .into_output(&self.program, &action)
    }

    /// Mutating call whose JSON answer is decoded
    async fn create<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let mut full = args.to_vec();
        full.extend(["--output", "json"]);
        let output = self.execute(&full, OutputMode::Capture).await?;
        Ok(serde_json::from_slice(&output)?)
    }

    // ========== Lambda ==========

    /// Fetch a function by name
    pub async fn get_function(&self, name: &str) -> Result<Option<FunctionConfiguration>> {
        let response: Option<GetFunctionResponse> = self
            .query(&["lambda", "get-function", "--function-name", name])
            .await?;
        Ok(response.map(|r| r.configuration))
    }

    /// Replace the code of an existing function
    pub async fn update_function_code(&self, name: &str, zip_file: &str) -> Result<()> {
        self.execute(
            &[
                "lambda",
                "update-function-code",
                "--function-name",
                name,
                "--zip-file",
                zip_file,
            ],
            OutputMode::Mirror,
        )
        .await?;
        Ok(())
    }

    pub async fn create_function(&self, request: &CreateFunctionRequest<'_>) -> Result<()> {
        self.execute(
            &[
                "lambda",
                "create-function",
                "--function-name",
                request.name,
                "--runtime",
                request.runtime,
                "--role",
                request.role_arn,
                "--handler",
                request.handler,
                "--package-type",
                "Zip",
                "--zip-file",
                &request.zip_file,
            ],
            OutputMode::Mirror,
        )
        .await?;
        Ok(())
    }

    /// Block until the function reaches the given state. The CLI waiter does
    /// its own polling and gives up after its built-in attempt limit.
    pub async fn wait_function(&self, name: &str, wait: FunctionWait) -> Result<()> {
        self.execute(
            &["lambda", "wait", wait.waiter(), "--function-name", name],
            OutputMode::Mirror,
        )
        .await?;
        Ok(())
    }

    /// Add a resource policy statement
    pub async fn add_permission(&self, grant: &PermissionGrant) -> Result<()> {
        self.execute(
            &[
                "lambda",
                "add-permission",
                "--function-name",
                &grant.function_name,
                "--statement-id",
                &grant.statement_id,
                "--action",
                "lambda:InvokeFunction",
                "--principal",
                "apigateway.amazonaws.com",
                "--source-arn",
                &grant.source_arn,
            ],
            OutputMode::Capture,
        )
        .await?;
        Ok(())
    }

    // ========== API Gateway ==========

    /// List REST APIs; an absent answer is an empty list
    pub async fn get_rest_apis(&self) -> Result<Vec<RestApiItem>> {
        let response: Option<Items<RestApiItem>> =
            self.query(&["apigateway", "get-rest-apis"]).await?;
        Ok(response.map(|r| r.items).unwrap_or_default())
    }

    pub async fn create_rest_api(&self, name: &str) -> Result<String> {
        let created: CreatedId = self
            .create(&["apigateway", "create-rest-api", "--name", name])
            .await?;
        Ok(created.id)
    }

    /// List the resources of a REST API; `None` when the API does not exist
    pub async fn get_resources(&self, rest_api_id: &str) -> Result<Option<Vec<ResourceItem>>> {
        let response: Option<Items<ResourceItem>> = self
            .query(&["apigateway", "get-resources", "--rest-api-id", rest_api_id])
            .await?;
        Ok(response.map(|r| r.items))
    }

    pub async fn create_resource(
        &self,
        rest_api_id: &str,
        parent_id: &str,
        path_part: &str,
    ) -> Result<String> {
        let created: CreatedId = self
            .create(&[
                "apigateway",
                "create-resource",
                "--rest-api-id",
                rest_api_id,
                "--parent-id",
                parent_id,
                "--path-part",
                path_part,
            ])
            .await?;
        Ok(created.id)
    }

    pub async fn put_method(&self, rest_api_id: &str, resource_id: &str) -> Result<()> {
        self.execute(
            &[
                "apigateway",
                "put-method",
                "--rest-api-id",
                rest_api_id,
                "--resource-id",
                resource_id,
                "--http-method",
                "POST",
                "--authorization-type",
                "NONE",
            ],
            OutputMode::Capture,
        )
        .await?;
        Ok(())
    }

    pub async fn put_method_response(&self, rest_api_id: &str, resource_id: &str) -> Result<()> {
        self.execute(
            &[
                "apigateway",
                "put-method-response",
                "--rest-api-id",
                rest_api_id,
                "--resource-id",
                resource_id,
                "--http-method",
                "POST",
                "--status-code",
                "200",
                "--response-models",
                "application/json=Empty",
            ],
            OutputMode::Capture,
        )
        .await?;
        Ok(())
    }

    pub async fn put_integration(
        &self,
        rest_api_id: &str,
        resource_id: &str,
        uri: &str,
    ) -> Result<()> {
        self.execute(
            &[
                "apigateway",
                "put-integration",
                "--rest-api-id",
                rest_api_id,
                "--resource-id",
                resource_id,
                "--http-method",
                "POST",
                "--type",
                "AWS",
                "--integration-http-method",
                "POST",
                "--uri",
                uri,
            ],
            OutputMode::Capture,
        )
        .await?;
        Ok(())
    }

    pub async fn put_integration_response(
        &self,
        rest_api_id: &str,
        resource_id: &str,
    ) -> Result<()> {
        self.execute(
            &[
                "apigateway",
                "put-integration-response",
                "--rest-api-id",
                rest_api_id,
                "--resource-id",
                resource_id,
                "--http-method",
                "POST",
                "--status-code",
                "200",
                "--response-templates",
                "application/json=\"\"",
            ],
            OutputMode::Capture,
        )
        .await?;
        Ok(())
    }

    pub async fn create_deployment(&self, rest_api_id: &str, stage: &str) -> Result<()> {
        self.execute(
            &[
                "apigateway",
                "create-deployment",
                "--rest-api-id",
                rest_api_id,
                "--stage-name",
                stage,
            ],
            OutputMode::Capture,
        )
        .await?;
        Ok(())
    }

    // ========== Identity ==========

    pub async fn get_caller_identity(&self) -> Result<CallerIdentity> {
        self.query(&["sts", "get-caller-identity"])
            .await?
            .ok_or_else(|| {
                CloudError::PreconditionFailed(
                    "sts get-caller-identity returned no identity".to_string(),
                )
            })
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleItem>> {
        let response: Option<RolesResponse> = self.query(&["iam", "list-roles"]).await?;
        Ok(response.map(|r| r.roles).unwrap_or_default())
    }

    /// Create a role and return its ARN
    pub async fn create_role(&self, name: &str, trust_policy: &str) -> Result<String> {
        let created: CreateRoleResponse = self
            .create(&[
                "iam",
                "create-role",
                "--role-name",
                name,
                "--assume-role-policy-document",
                trust_policy,
            ])
            .await?;
        Ok(created.role.arn)
    }

    pub async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()> {
        self.execute(
            &[
                "iam",
                "attach-role-policy",
                "--role-name",
                role_name,
                "--policy-arn",
                policy_arn,
            ],
            OutputMode::Capture,
        )
        .await?;
        Ok(())
    }

    pub async fn wait_role_exists(&self, role_name: &str) -> Result<()> {
        self.execute(
            &["iam", "wait", "role-exists", "--role-name", role_name],
            OutputMode::Capture,
        )
        .await?;
        Ok(())
    }

    /// Region of the active CLI profile, if one is configured
    pub async fn configured_region(&self) -> Result<Option<String>> {
        // `configure get` exits with 1 when the key is unset
        match self
            .call(&["configure", "get", "region"], OutputMode::Capture)
            .await
        {
            Ok(CommandOutcome::Output(output)) => {
                let region = String::from_utf8_lossy(&output).trim().to_string();
                Ok((!region.is_empty()).then_some(region))
            }
            Ok(CommandOutcome::Absent) => Ok(None),
            Err(CloudError::CommandFailed { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CreatedId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GetFunctionResponse {
    #[serde(rename = "Configuration")]
    configuration: FunctionConfiguration,
}

/// Function details from `get-function`
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionConfiguration {
    #[serde(rename = "FunctionName")]
    pub function_name: String,

    #[serde(rename = "FunctionArn", default)]
    pub function_arn: Option<String>,

    #[serde(rename = "State", default)]
    pub state: Option<String>,
}

/// Entry of `get-rest-apis`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RestApiItem {
    pub id: String,
    pub name: String,
}

/// Entry of `get-resources`
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceItem {
    pub id: String,

    pub path: String,

    #[serde(rename = "pathPart", default)]
    pub path_part: Option<String>,

    #[serde(rename = "resourceMethods", default)]
    pub resource_methods: ResourceMethods,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceMethods {
    #[serde(rename = "POST", default)]
    post: Option<IgnoredAny>,
}

impl ResourceItem {
    pub fn has_post_method(&self) -> bool {
        self.resource_methods.post.is_some()
    }
}

/// Answer of `sts get-caller-identity`
#[derive(Debug, Clone, Deserialize)]
pub struct CallerIdentity {
    #[serde(rename = "Account")]
    pub account: String,

    #[serde(rename = "Arn", default)]
    pub arn: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RolesResponse {
    #[serde(rename = "Roles", default = "Vec::new")]
    roles: Vec<RoleItem>,
}

#[derive(Debug, Deserialize)]
struct CreateRoleResponse {
    #[serde(rename = "Role")]
    role: RoleItem,
}

/// IAM role summary
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleItem {
    #[serde(rename = "RoleName")]
    pub role_name: String,

    #[serde(rename = "Arn")]
    pub arn: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_item_post_detection() {
        let json = r#"{"items": [
            {"id": "r0", "path": "/"},
            {"id": "r1", "path": "/orders", "pathPart": "orders",
             "resourceMethods": {"POST": {}, "GET": {}}},
            {"id": "r2", "path": "/users", "pathPart": "users",
             "resourceMethods": {"GET": {}}}
        ]}"#;

        let items: Items<ResourceItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items.items.len(), 3);
        assert!(!items.items[0].has_post_method());
        assert!(items.items[0].path_part.is_none());
        assert!(items.items[1].has_post_method());
        assert!(!items.items[2].has_post_method());
    }

    #[test]
    fn test_missing_items_is_empty() {
        let items: Items<RestApiItem> = serde_json::from_str("{}").unwrap();
        assert!(items.items.is_empty());
    }

    #[test]
    fn test_function_configuration_ignores_extra_fields() {
        let json = r#"{"Configuration": {"FunctionName": "orders", "Runtime": "provided",
            "State": "Active"}, "Code": {"Location": "https://example"}}"#;
        let response: GetFunctionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.configuration.function_name, "orders");
        assert_eq!(response.configuration.state.as_deref(), Some("Active"));
    }

    #[test]
    fn test_waiter_names() {
        assert_eq!(FunctionWait::Updated.waiter(), "function-updated");
        assert_eq!(FunctionWait::Active.waiter(), "function-active");
    }
}
