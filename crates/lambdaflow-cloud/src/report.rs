//! Record of what a deployment run did

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Provisioning steps, in the order they can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Package,
    CheckFunction,
    UpdateFunction,
    ResolveAccount,
    ResolveRole,
    CreateFunction,
    ResolveRegion,
    SelectRestApi,
    ResolveRootResource,
    EnsureResource,
    EnsureMethod,
    PutIntegration,
    DeployApi,
    GrantPermission,
    WaitFunction,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Step::Package => "package",
            Step::CheckFunction => "check-function",
            Step::UpdateFunction => "update-function",
            Step::ResolveAccount => "resolve-account",
            Step::ResolveRole => "resolve-role",
            Step::CreateFunction => "create-function",
            Step::ResolveRegion => "resolve-region",
            Step::SelectRestApi => "select-rest-api",
            Step::ResolveRootResource => "resolve-root-resource",
            Step::EnsureResource => "ensure-resource",
            Step::EnsureMethod => "ensure-method",
            Step::PutIntegration => "put-integration",
            Step::DeployApi => "deploy-api",
            Step::GrantPermission => "grant-permission",
            Step::WaitFunction => "wait-function",
        };
        write!(f, "{}", label)
    }
}

/// What a step did to its resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// A new resource was created
    Created,
    /// An existing resource was changed
    Updated,
    /// An existing resource or a known identifier was used as is
    Reused,
    /// Nothing needed doing
    Skipped,
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOutcome::Created => write!(f, "created"),
            StepOutcome::Updated => write!(f, "updated"),
            StepOutcome::Reused => write!(f, "reused"),
            StepOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: Step,
    pub outcome: StepOutcome,
    pub detail: String,
}

/// Which path through the deployment was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployBranch {
    /// Function existed; its code was replaced
    Updated,
    /// Function was created without an API endpoint
    Created,
    /// Function was created and exposed through API Gateway
    CreatedWithGateway,
}

impl std::fmt::Display for DeployBranch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeployBranch::Updated => write!(f, "updated"),
            DeployBranch::Created => write!(f, "created"),
            DeployBranch::CreatedWithGateway => write!(f, "created with API gateway"),
        }
    }
}

/// Result of a successful deployment run
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub function_name: String,
    pub branch: Option<DeployBranch>,
    pub steps: Vec<StepRecord>,
    pub endpoint: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl DeployReport {
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            branch: None,
            steps: Vec::new(),
            endpoint: None,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn record(&mut self, step: Step, outcome: StepOutcome, detail: impl Into<String>) {
        let detail = detail.into();
        tracing::debug!("{} {}: {}", step, outcome, detail);
        self.steps.push(StepRecord {
            step,
            outcome,
            detail,
        });
    }

    /// Steps in execution order
    pub fn step_sequence(&self) -> Vec<Step> {
        self.steps.iter().map(|r| r.step).collect()
    }

    pub fn outcome_of(&self, step: Step) -> Option<StepOutcome> {
        self.steps
            .iter()
            .rev()
            .find(|r| r.step == step)
            .map(|r| r.outcome)
    }

    pub fn summary(&self) -> ReportSummary {
        let count = |outcome: StepOutcome| self.steps.iter().filter(|r| r.outcome == outcome).count();
        ReportSummary {
            created: count(StepOutcome::Created),
            updated: count(StepOutcome::Updated),
            reused: count(StepOutcome::Reused),
            skipped: count(StepOutcome::Skipped),
        }
    }
}

/// Counts of step outcomes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub created: usize,
    pub updated: usize,
    pub reused: usize,
    pub skipped: usize,
}

impl std::fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} reused, {} skipped",
            self.created, self.updated, self.reused, self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut report = DeployReport::new("orders");
        report.record(Step::SelectRestApi, StepOutcome::Created, "api1");
        report.record(Step::ResolveRootResource, StepOutcome::Reused, "root");
        report.record(Step::EnsureMethod, StepOutcome::Skipped, "POST present");

        assert_eq!(
            report.summary().to_string(),
            "1 created, 0 updated, 1 reused, 1 skipped"
        );
        assert_eq!(report.outcome_of(Step::EnsureMethod), Some(StepOutcome::Skipped));
        assert_eq!(report.outcome_of(Step::DeployApi), None);
    }
}
