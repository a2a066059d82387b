//! Read-only existence queries
//!
//! Nothing here touches [`DeploymentConfig`](lambdaflow_cloud::DeploymentConfig);
//! callers decide what to record.

use crate::arn::{RESERVED_API_NAME, ROOT_PATH};
use crate::aws::{AwsCli, ResourceItem};
use lambdaflow_cloud::{CloudError, Result};
use std::collections::BTreeMap;

/// REST APIs visible to the account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestApiListing {
    /// name -> id
    pub apis: BTreeMap<String, String>,
    pub reserved_exists: bool,
}

impl RestApiListing {
    pub fn is_empty(&self) -> bool {
        self.apis.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.apis.keys().cloned().collect()
    }

    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.apis.get(name).map(String::as_str)
    }
}

/// Resource at the function's path below the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildResource {
    pub id: String,
    pub has_post_method: bool,
}

pub struct Resolver<'a> {
    aws: &'a AwsCli,
}

impl<'a> Resolver<'a> {
    pub fn new(aws: &'a AwsCli) -> Self {
        Self { aws }
    }

    pub async fn function_exists(&self, name: &str) -> Result<bool> {
        let exists = self.aws.get_function(name).await?.is_some();
        tracing::debug!("Function {} exists: {}", name, exists);
        Ok(exists)
    }

    pub async fn rest_apis(&self) -> Result<RestApiListing> {
        let mut listing = RestApiListing::default();
        for api in self.aws.get_rest_apis().await? {
            if api.name == RESERVED_API_NAME {
                listing.reserved_exists = true;
            }
            listing.apis.insert(api.name, api.id);
        }
        tracing::debug!(
            "Found {} REST APIs (reserved present: {})",
            listing.apis.len(),
            listing.reserved_exists
        );
        Ok(listing)
    }

    async fn resources(&self, rest_api_id: &str) -> Result<Vec<ResourceItem>> {
        self.aws
            .get_resources(rest_api_id)
            .await?
            .ok_or_else(|| {
                CloudError::PreconditionFailed(format!("REST API {} does not exist", rest_api_id))
            })
    }

    /// Id of the `/` resource. Every REST API has one, so its absence is fatal.
    pub async fn root_resource(&self, rest_api_id: &str) -> Result<String> {
        let items = self.resources(rest_api_id).await?;
        if items.is_empty() {
            return Err(CloudError::PreconditionFailed(format!(
                "REST API {} has no resources",
                rest_api_id
            )));
        }

        items
            .into_iter()
            .find(|item| item.path == ROOT_PATH)
            .map(|item| item.id)
            .ok_or_else(|| {
                CloudError::PreconditionFailed(format!(
                    "REST API {} has no root resource",
                    rest_api_id
                ))
            })
    }

    pub async fn child_resource(
        &self,
        rest_api_id: &str,
        path_part: &str,
    ) -> Result<Option<ChildResource>> {
        let items = self.resources(rest_api_id).await?;
        Ok(items
            .into_iter()
            .find(|item| item.path_part.as_deref() == Some(path_part))
            .map(|item| ChildResource {
                has_post_method: item.has_post_method(),
                id: item.id,
            }))
    }
}
