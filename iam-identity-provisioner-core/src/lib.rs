//! This crate provides the core of declarative IAM provisioning:
//! - Naming resolution for inline policies and their documents
//! - A read-only JSON definition store
//! - A catalogue of policy document templates
//! - Per-identity provisioning against an IAM capability interface
//! - Batch execution with per-definition failure isolation
//!

pub mod aws;
mod batch;
mod config;
mod error;
mod events;
pub mod naming;
mod provisioner;
mod store;
pub mod templates;
mod types;

#[cfg(any(test, feature = "integ-test"))]
pub mod test_utils;

// Re-exports for a small, focused public API
pub use aws::{AwsIamClient, IamCapability};
pub use batch::{BatchRunner, DefinitionFailure, KindReport, KindSelection, KindStatus, RunSummary};
pub use config::{
    managed_policy_arn, AccountId, ProvisionerConfig, DEFAULT_ACCOUNT_ID,
    MANAGED_POLICY_ARN_PREFIX,
};
pub use error::{ProvisionError, ProvisionResult};
pub use events::{EventSink, LogSink, ProvisionEvent};
pub use provisioner::{IdentityProvisioner, ProvisionOutcome};
pub use store::DefinitionStore;
pub use templates::{render_by_name, PolicyTemplate, TemplateParams};
pub use types::{
    Effect, IdentityDefinition, IdentityKind, PolicyDocument, ResolvedNames, Statement,
    POLICY_VERSION,
};
