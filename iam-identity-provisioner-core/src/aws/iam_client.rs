//! AWS IAM client wrapper for principal and policy operations

use async_trait::async_trait;
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::Client as IamClient;
use tokio::sync::OnceCell;

use crate::aws::IamCapability;
use crate::error::{ProvisionError, ProvisionResult};

pub struct AwsIamClient {
    client: OnceCell<IamClient>,
}

impl AwsIamClient {
    pub fn new(client: IamClient) -> Self {
        Self {
            client: OnceCell::from(client),
        }
    }

    /// Client backed by the standard credential provider chain.
    ///
    /// Nothing is resolved until the first IAM call, so a run that makes no calls
    /// never touches credentials or region configuration.
    pub fn from_env() -> Self {
        Self {
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> &IamClient {
        self.client
            .get_or_init(|| async {
                let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .load()
                    .await;
                IamClient::new(&config)
            })
            .await
    }
}

fn service_error<E>(operation: &'static str, target: &str, error: E) -> ProvisionError
where
    E: std::error::Error,
{
    ProvisionError::service(operation, target, DisplayErrorContext(error).to_string())
}

#[async_trait]
impl IamCapability for AwsIamClient {
    async fn create_role(&self, name: &str, trust_document: Option<&str>) -> ProvisionResult<()> {
        self.client()
            .await
            .create_role()
            .role_name(name)
            .set_assume_role_policy_document(trust_document.map(str::to_string))
            .send()
            .await
            .map_err(|e| service_error("CreateRole", name, e))?;
        Ok(())
    }

    async fn create_group(&self, name: &str) -> ProvisionResult<()> {
        self.client()
            .await
            .create_group()
            .group_name(name)
            .send()
            .await
            .map_err(|e| service_error("CreateGroup", name, e))?;
        Ok(())
    }

    async fn attach_managed_policy_to_role(&self, name: &str, arn: &str) -> ProvisionResult<()> {
        self.client()
            .await
            .attach_role_policy()
            .role_name(name)
            .policy_arn(arn)
            .send()
            .await
            .map_err(|e| service_error("AttachRolePolicy", name, e))?;
        Ok(())
    }

    async fn attach_managed_policy_to_group(&self, name: &str, arn: &str) -> ProvisionResult<()> {
        self.client()
            .await
            .attach_group_policy()
            .group_name(name)
            .policy_arn(arn)
            .send()
            .await
            .map_err(|e| service_error("AttachGroupPolicy", name, e))?;
        Ok(())
    }

    async fn put_inline_role_policy(
        &self,
        name: &str,
        policy_name: &str,
        document: &str,
    ) -> ProvisionResult<()> {
        self.client()
            .await
            .put_role_policy()
            .role_name(name)
            .policy_name(policy_name)
            .policy_document(document)
            .send()
            .await
            .map_err(|e| service_error("PutRolePolicy", name, e))?;
        Ok(())
    }

    async fn put_inline_group_policy(
        &self,
        name: &str,
        policy_name: &str,
        document: &str,
    ) -> ProvisionResult<()> {
        self.client()
            .await
            .put_group_policy()
            .group_name(name)
            .policy_name(policy_name)
            .policy_document(document)
            .send()
            .await
            .map_err(|e| service_error("PutGroupPolicy", name, e))?;
        Ok(())
    }

    async fn list_roles(&self) -> ProvisionResult<Vec<String>> {
        let mut roles = self
            .client()
            .await
            .list_roles()
            .into_paginator()
            .items()
            .send();
        let mut names = Vec::new();
        while let Some(role) = roles.next().await {
            let role = role.map_err(|e| service_error("ListRoles", "*", e))?;
            names.push(role.role_name().to_string());
        }
        Ok(names)
    }

    async fn list_groups(&self) -> ProvisionResult<Vec<String>> {
        let mut groups = self
            .client()
            .await
            .list_groups()
            .into_paginator()
            .items()
            .send();
        let mut names = Vec::new();
        while let Some(group) = groups.next().await {
            let group = group.map_err(|e| service_error("ListGroups", "*", e))?;
            names.push(group.group_name().to_string());
        }
        Ok(names)
    }
}
