//! Deployment configuration shared by every provisioning step
//!
//! One [`DeploymentConfig`] exists per deployment run. Steps receive it by
//! `&mut`, read the identifiers resolved so far and record the ones they
//! discover or create. The type is not meant to be shared between parallel
//! deployments of the same function.

use crate::error::{CloudError, Result};
use lambdaflow_config::KeyValueStore;
use serde::Serialize;

/// Identifiers resolved lazily during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    AccountId,
    RoleArn,
    Region,
    RestApiId,
    RestApiRootResourceId,
    RestApiResourceId,
}

impl Field {
    /// Fields written back to the settings store after a successful run.
    /// The child resource is specific to one function and is looked up again.
    pub const PERSISTED: [Field; 5] = [
        Field::AccountId,
        Field::RoleArn,
        Field::Region,
        Field::RestApiId,
        Field::RestApiRootResourceId,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::AccountId => "account_id",
            Field::RoleArn => "role_arn",
            Field::Region => "region",
            Field::RestApiId => "rest_api_id",
            Field::RestApiRootResourceId => "rest_api_root_resource_id",
            Field::RestApiResourceId => "rest_api_resource_id",
        }
    }

    /// Key used in the settings store
    pub fn store_key(&self) -> String {
        format!("aws.{}", self.name())
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeploymentConfig {
    name: String,
    runtime: String,
    entry_point: String,
    handler: String,
    account_id: Option<String>,
    role_arn: Option<String>,
    region: Option<String>,
    rest_api_id: Option<String>,
    rest_api_root_resource_id: Option<String>,
    rest_api_resource_id: Option<String>,
}

impl DeploymentConfig {
    /// New record with every identifier unresolved. The handler defaults to
    /// `main.<entry_point>`.
    pub fn new(
        name: impl Into<String>,
        runtime: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        let entry_point = entry_point.into();
        Self {
            name: name.into(),
            runtime: runtime.into(),
            handler: format!("main.{}", entry_point),
            entry_point,
            ..Default::default()
        }
    }

    pub fn with_handler_module(mut self, module: &str) -> Self {
        self.handler = format!("{}.{}", module, self.entry_point);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::AccountId => &self.account_id,
            Field::RoleArn => &self.role_arn,
            Field::Region => &self.region,
            Field::RestApiId => &self.rest_api_id,
            Field::RestApiRootResourceId => &self.rest_api_root_resource_id,
            Field::RestApiResourceId => &self.rest_api_resource_id,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::AccountId => &mut self.account_id,
            Field::RoleArn => &mut self.role_arn,
            Field::Region => &mut self.region,
            Field::RestApiId => &mut self.rest_api_id,
            Field::RestApiRootResourceId => &mut self.rest_api_root_resource_id,
            Field::RestApiResourceId => &mut self.rest_api_resource_id,
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn is_resolved(&self, field: Field) -> bool {
        self.slot(field).is_some()
    }

    /// Record a resolved identifier.
    ///
    /// Returns `true` when the field was newly set. Setting the same value
    /// twice is a no-op; a different value is rejected and nothing changes.
    pub fn set(&mut self, field: Field, value: impl Into<String>) -> Result<bool> {
        let value = value.into();
        if value.is_empty() {
            return Err(CloudError::PreconditionFailed(format!(
                "refusing to record an empty {}",
                field
            )));
        }

        let slot = self.slot_mut(field);
        match slot.as_ref() {
            Some(existing) if *existing == value => Ok(false),
            Some(existing) => Err(CloudError::FieldConflict {
                field: field.name(),
                existing: existing.clone(),
                attempted: value,
            }),
            None => {
                tracing::debug!("Resolved {} = {}", field, value);
                *slot = Some(value);
                Ok(true)
            }
        }
    }

    /// Value of a field a step cannot run without
    pub fn require(&self, field: Field, step: &str) -> Result<&str> {
        self.get(field).ok_or_else(|| {
            CloudError::PreconditionFailed(format!("{} is not set before {}", field, step))
        })
    }

    /// Fill unresolved persisted fields from the settings store
    pub fn seed_from(&mut self, store: &dyn KeyValueStore) -> Result<()> {
        for field in Field::PERSISTED {
            if self.is_resolved(field) {
                continue;
            }
            if let Some(value) = store.get(&field.store_key())
                && !value.is_empty()
            {
                self.set(field, value)?;
            }
        }
        Ok(())
    }

    /// Write resolved persisted fields to the settings store
    pub fn persist_to(&self, store: &mut dyn KeyValueStore) {
        for field in Field::PERSISTED {
            if let Some(value) = self.get(field) {
                store.set(&field.store_key(), value);
            }
        }
    }
}
