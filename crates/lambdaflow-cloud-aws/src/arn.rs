//! Fixed names and ARN formats used when wiring a function to API Gateway

/// Name of the REST API created when none is selected
pub const RESERVED_API_NAME: &str = "lambdaflow-api-gateway";

/// Stage a newly created REST API is deployed to
pub const DEPLOYMENT_STAGE: &str = "prod";

/// Path of the root resource of every REST API
pub const ROOT_PATH: &str = "/";

pub const STATEMENT_ID_PREFIX: &str = "lambdaflow-apigateway";

/// Environments granted invoke permission, with the stage each one covers.
/// `*` allows calls from the console test feature.
pub const PERMISSION_ENVIRONMENTS: [(&str, &str); 2] = [("test", "*"), ("prod", DEPLOYMENT_STAGE)];

/// Execution role created when the user picks none
pub const LAMBDA_ROLE_NAME: &str = "lambdaflow-lambda-role";

pub const BASIC_EXECUTION_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

pub const LAMBDA_TRUST_POLICY: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"Service":"lambda.amazonaws.com"},"Action":"sts:AssumeRole"}]}"#;

pub fn function_arn(region: &str, account_id: &str, function_name: &str) -> String {
    format!(
        "arn:aws:lambda:{}:{}:function:{}",
        region, account_id, function_name
    )
}

/// `--uri` of a Lambda proxy integration
pub fn integration_uri(region: &str, account_id: &str, function_name: &str) -> String {
    format!(
        "arn:aws:apigateway:{}:lambda:path/2015-03-31/functions/{}/invocations",
        region,
        function_arn(region, account_id, function_name)
    )
}

/// Source ARN allowed to invoke the function's POST method on `stage`
pub fn invoke_source_arn(
    region: &str,
    account_id: &str,
    rest_api_id: &str,
    stage: &str,
    function_name: &str,
) -> String {
    format!(
        "arn:aws:execute-api:{}:{}:{}/{}/POST/{}",
        region, account_id, rest_api_id, stage, function_name
    )
}

pub fn statement_id(environment: &str) -> String {
    format!("{}-{}", STATEMENT_ID_PREFIX, environment)
}

/// Public URL of the function's resource on the deployment stage
pub fn endpoint_url(rest_api_id: &str, region: &str, function_name: &str) -> String {
    format!(
        "https://{}.execute-api.{}.amazonaws.com/{}/{}",
        rest_api_id, region, DEPLOYMENT_STAGE, function_name
    )
}
