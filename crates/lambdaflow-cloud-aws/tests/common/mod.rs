use async_trait::async_trait;
use lambdaflow_cloud::{
    CloudError, CommandOutcome, CommandRunner, DeploymentArchive, OutputMode, Packager, Prompter,
    Result, describe_action,
};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Mutex;

pub const ACCOUNT_ID: &str = "123456789012";

#[derive(Debug, Clone)]
pub struct FakeResource {
    pub id: String,
    pub path: String,
    pub path_part: Option<String>,
    pub has_post: bool,
}

#[derive(Debug, Clone)]
pub struct FakeApi {
    pub id: String,
    pub name: String,
    pub resources: Vec<FakeResource>,
    pub deployments: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    functions: BTreeSet<String>,
    apis: Vec<FakeApi>,
    roles: Vec<(String, String)>,
    permissions: BTreeSet<(String, String)>,
    configured_region: Option<String>,
    fail_on: Option<String>,
    absent_on: Option<String>,
    next_id: usize,
    calls: Vec<Vec<String>>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn api_mut(&mut self, id: &str) -> Option<&mut FakeApi> {
        self.apis.iter_mut().find(|a| a.id == id)
    }
}

/// In-memory stand-in for the `aws` CLI
#[derive(Default)]
pub struct FakeAws {
    state: Mutex<State>,
}

#[allow(dead_code)]
impl FakeAws {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(self, region: &str) -> Self {
        self.state.lock().unwrap().configured_region = Some(region.to_string());
        self
    }

    pub fn with_function(self, name: &str) -> Self {
        self.state.lock().unwrap().functions.insert(name.to_string());
        self
    }

    pub fn with_role(self, name: &str) -> Self {
        let arn = format!("arn:aws:iam::{}:role/{}", ACCOUNT_ID, name);
        self.state.lock().unwrap().roles.push((name.to_string(), arn));
        self
    }

    pub fn with_api(self, id: &str, name: &str, resources: Vec<FakeResource>) -> Self {
        self.state.lock().unwrap().apis.push(FakeApi {
            id: id.to_string(),
            name: name.to_string(),
            resources,
            deployments: Vec::new(),
        });
        self
    }

    /// Make every call of `action` (e.g. `apigateway create-resource`) fail
    pub fn failing_on(self, action: &str) -> Self {
        self.state.lock().unwrap().fail_on = Some(action.to_string());
        self
    }

    /// Make every call of `action` exit with the CLI's not-found code, the
    /// way a rejected mutation (AccessDenied, throttling...) does
    pub fn absent_on(self, action: &str) -> Self {
        self.state.lock().unwrap().absent_on = Some(action.to_string());
        self
    }

    /// Delete a function together with its resource policy
    pub fn remove_function(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.functions.remove(name);
        state.permissions.retain(|(function, _)| function != name);
    }

    pub fn permissions(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().permissions.iter().cloned().collect()
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().calls.clone()
    }

    /// `<service> <action>` of every call, in order
    pub fn actions(&self) -> Vec<String> {
        self.calls().iter().map(|args| describe_action(args)).collect()
    }

    pub fn count(&self, action: &str) -> usize {
        self.actions().iter().filter(|a| *a == action).count()
    }

    pub fn apis(&self) -> Vec<FakeApi> {
        self.state.lock().unwrap().apis.clone()
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.state.lock().unwrap().functions.contains(name)
    }
}

pub fn resource(id: &str, path: &str, has_post: bool) -> FakeResource {
    let path_part = path.rsplit('/').next().filter(|p| !p.is_empty());
    FakeResource {
        id: id.to_string(),
        path: path.to_string(),
        path_part: path_part.map(str::to_string),
        has_post,
    }
}

fn flag<'a>(args: &'a [String], name: &str) -> &'a str {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
        .unwrap_or_else(|| panic!("missing {} in {:?}", name, args))
}

fn json(value: serde_json::Value) -> Result<CommandOutcome> {
    Ok(CommandOutcome::Output(value.to_string().into_bytes()))
}

fn ok() -> Result<CommandOutcome> {
    Ok(CommandOutcome::Output(Vec::new()))
}

#[async_trait]
impl CommandRunner for FakeAws {
    async fn run(&self, program: &str, args: &[String], _mode: OutputMode) -> Result<CommandOutcome> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(args.to_vec());

        let action = describe_action(args);
        if state.fail_on.as_deref() == Some(action.as_str()) {
            return Err(CloudError::CommandFailed {
                program: program.to_string(),
                action,
                status: "exit status 255".to_string(),
                stderr: "An error occurred (TooManyRequestsException)".to_string(),
            });
        }
        if state.absent_on.as_deref() == Some(action.as_str()) {
            return Ok(CommandOutcome::Absent);
        }

        match action.as_str() {
            "lambda get-function" => {
                let name = flag(args, "--function-name");
                if state.functions.contains(name) {
                    json(serde_json::json!({
                        "Configuration": {"FunctionName": name, "State": "Active"}
                    }))
                } else {
                    Ok(CommandOutcome::Absent)
                }
            }
            "lambda create-function" => {
                let name = flag(args, "--function-name").to_string();
                state.functions.insert(name);
                ok()
            }
            "lambda update-function-code" => {
                if state.functions.contains(flag(args, "--function-name")) {
                    ok()
                } else {
                    Ok(CommandOutcome::Absent)
                }
            }
            "lambda wait" => ok(),
            "lambda add-permission" => {
                let key = (
                    flag(args, "--function-name").to_string(),
                    flag(args, "--statement-id").to_string(),
                );
                state.permissions.insert(key);
                ok()
            }
            "apigateway get-rest-apis" => {
                let items: Vec<_> = state
                    .apis
                    .iter()
                    .map(|a| serde_json::json!({"id": a.id, "name": a.name}))
                    .collect();
                json(serde_json::json!({ "items": items }))
            }
            "apigateway create-rest-api" => {
                let id = state.next_id("api");
                let root = state.next_id("root");
                state.apis.push(FakeApi {
                    id: id.clone(),
                    name: flag(args, "--name").to_string(),
                    resources: vec![resource(&root, "/", false)],
                    deployments: Vec::new(),
                });
                json(serde_json::json!({ "id": id }))
            }
            "apigateway get-resources" => {
                let api_id = flag(args, "--rest-api-id").to_string();
                let Some(api) = state.api_mut(&api_id) else {
                    return Ok(CommandOutcome::Absent);
                };
                let items: Vec<_> = api
                    .resources
                    .iter()
                    .map(|r| {
                        let mut item = serde_json::json!({"id": r.id, "path": r.path});
                        if let Some(part) = &r.path_part {
                            item["pathPart"] = serde_json::json!(part);
                        }
                        if r.has_post {
                            item["resourceMethods"] = serde_json::json!({"POST": {}});
                        }
                        item
                    })
                    .collect();
                json(serde_json::json!({ "items": items }))
            }
            "apigateway create-resource" => {
                let api_id = flag(args, "--rest-api-id").to_string();
                let part = flag(args, "--path-part").to_string();
                let id = state.next_id("res");
                let Some(api) = state.api_mut(&api_id) else {
                    return Ok(CommandOutcome::Absent);
                };
                api.resources.push(resource(&id, &format!("/{}", part), false));
                json(serde_json::json!({ "id": id }))
            }
            "apigateway put-method" => {
                let api_id = flag(args, "--rest-api-id").to_string();
                let resource_id = flag(args, "--resource-id").to_string();
                let Some(api) = state.api_mut(&api_id) else {
                    return Ok(CommandOutcome::Absent);
                };
                match api.resources.iter_mut().find(|r| r.id == resource_id) {
                    Some(r) => {
                        r.has_post = true;
                        ok()
                    }
                    None => Ok(CommandOutcome::Absent),
                }
            }
            "apigateway put-method-response"
            | "apigateway put-integration"
            | "apigateway put-integration-response" => ok(),
            "apigateway create-deployment" => {
                let api_id = flag(args, "--rest-api-id").to_string();
                let stage = flag(args, "--stage-name").to_string();
                match state.api_mut(&api_id) {
                    Some(api) => {
                        api.deployments.push(stage);
                        ok()
                    }
                    None => Ok(CommandOutcome::Absent),
                }
            }
            "sts get-caller-identity" => json(serde_json::json!({
                "UserId": "AIDAEXAMPLE",
                "Account": ACCOUNT_ID,
                "Arn": format!("arn:aws:iam::{}:user/deployer", ACCOUNT_ID),
            })),
            "iam list-roles" => {
                let roles: Vec<_> = state
                    .roles
                    .iter()
                    .map(|(name, arn)| serde_json::json!({"RoleName": name, "Arn": arn}))
                    .collect();
                json(serde_json::json!({ "Roles": roles }))
            }
            "iam create-role" => {
                let name = flag(args, "--role-name").to_string();
                let arn = format!("arn:aws:iam::{}:role/{}", ACCOUNT_ID, name);
                state.roles.push((name.clone(), arn.clone()));
                json(serde_json::json!({"Role": {"RoleName": name, "Arn": arn}}))
            }
            "iam attach-role-policy" | "iam wait" => ok(),
            "configure get" => match &state.configured_region {
                Some(region) => Ok(CommandOutcome::Output(format!("{}\n", region).into_bytes())),
                None => Err(CloudError::CommandFailed {
                    program: program.to_string(),
                    action,
                    status: "exit status 1".to_string(),
                    stderr: String::new(),
                }),
            },
            other => panic!("unexpected aws call: {} ({:?})", other, args),
        }
    }
}

/// Prompter answering from a script
#[derive(Default)]
pub struct ScriptedPrompter {
    confirm: bool,
    choices: Mutex<VecDeque<Option<String>>>,
    strings: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirming(mut self, answer: bool) -> Self {
        self.confirm = answer;
        self
    }

    pub fn choosing(self, answer: Option<&str>) -> Self {
        self.choices
            .lock()
            .unwrap()
            .push_back(answer.map(str::to_string));
        self
    }

    pub fn answering(self, answer: &str) -> Self {
        self.strings.lock().unwrap().push_back(answer.to_string());
        self
    }

    /// Labels of the questions asked so far
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt_for_string(&self, label: &str) -> Result<String> {
        self.asked.lock().unwrap().push(label.to_string());
        Ok(self.strings.lock().unwrap().pop_front().unwrap_or_default())
    }

    fn prompt_for_choice(
        &self,
        label: &str,
        options: &[String],
        allow_empty: bool,
    ) -> Result<Option<String>> {
        self.asked.lock().unwrap().push(label.to_string());
        match self.choices.lock().unwrap().pop_front() {
            Some(answer) => Ok(answer),
            None if allow_empty => Ok(None),
            None => Ok(options.first().cloned()),
        }
    }

    fn prompt_to_confirm(&self, label: &str) -> Result<bool> {
        self.asked.lock().unwrap().push(label.to_string());
        Ok(self.confirm)
    }
}

/// Packager handing out a fixed path without building anything
pub struct StaticPackager;

impl Packager for StaticPackager {
    fn package(&self, function_name: &str) -> Result<DeploymentArchive> {
        Ok(DeploymentArchive::from_path(format!(
            "/tmp/{}.zip",
            function_name
        )))
    }
}
