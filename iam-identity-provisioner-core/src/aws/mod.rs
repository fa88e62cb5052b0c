//! IAM capability interface and its AWS SDK implementation.

pub(crate) mod iam_client;

use async_trait::async_trait;

use crate::error::ProvisionResult;

pub use iam_client::AwsIamClient;

/// The IAM operations provisioning relies on.
///
/// Every failure is reported as [`ProvisionError::ServiceOperationFailed`]; callers do
/// not distinguish throttling, conflicts or validation errors.
///
/// [`ProvisionError::ServiceOperationFailed`]: crate::ProvisionError::ServiceOperationFailed
#[async_trait]
pub trait IamCapability: Send + Sync {
    /// Create a role, optionally with an assume-role (trust) document.
    async fn create_role(&self, name: &str, trust_document: Option<&str>) -> ProvisionResult<()>;

    async fn create_group(&self, name: &str) -> ProvisionResult<()>;

    async fn attach_managed_policy_to_role(&self, name: &str, arn: &str) -> ProvisionResult<()>;

    async fn attach_managed_policy_to_group(&self, name: &str, arn: &str) -> ProvisionResult<()>;

    async fn put_inline_role_policy(
        &self,
        name: &str,
        policy_name: &str,
        document: &str,
    ) -> ProvisionResult<()>;

    async fn put_inline_group_policy(
        &self,
        name: &str,
        policy_name: &str,
        document: &str,
    ) -> ProvisionResult<()>;

    /// Names of every role in the account.
    async fn list_roles(&self) -> ProvisionResult<Vec<String>>;

    /// Names of every group in the account.
    async fn list_groups(&self) -> ProvisionResult<Vec<String>>;
}
