//! Test doubles for the IAM capability and event sink, plus store fixtures.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::aws::IamCapability;
use crate::error::{ProvisionError, ProvisionResult};
use crate::events::{EventSink, ProvisionEvent};

/// One call received by [`RecordingIamClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IamCall {
    CreateRole {
        name: String,
        trust_document: Option<String>,
    },
    CreateGroup {
        name: String,
    },
    AttachRolePolicy {
        name: String,
        arn: String,
    },
    AttachGroupPolicy {
        name: String,
        arn: String,
    },
    PutRolePolicy {
        name: String,
        policy_name: String,
        document: String,
    },
    PutGroupPolicy {
        name: String,
        policy_name: String,
        document: String,
    },
    ListRoles,
    ListGroups,
}

/// In-memory IAM capability that records every call, including failed ones.
///
/// Failures are configured per `(operation, principal)`; listing operations use `*`
/// as the principal.
#[derive(Debug, Default)]
pub struct RecordingIamClient {
    calls: Mutex<Vec<IamCall>>,
    failures: HashSet<(String, String)>,
}

impl RecordingIamClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `operation` (e.g. `CreateRole`) fail for `principal`.
    pub fn fail_on(mut self, operation: &str, principal: &str) -> Self {
        self.failures
            .insert((operation.to_string(), principal.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<IamCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, operation: &'static str, principal: &str, call: IamCall) -> ProvisionResult<()> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        if self
            .failures
            .contains(&(operation.to_string(), principal.to_string()))
        {
            return Err(ProvisionError::service(
                operation,
                principal,
                "simulated service failure",
            ));
        }
        Ok(())
    }

    fn created(&self, pick: impl Fn(&IamCall) -> Option<&String>) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|call| pick(call).cloned())
            .collect()
    }
}

#[async_trait]
impl IamCapability for RecordingIamClient {
    async fn create_role(&self, name: &str, trust_document: Option<&str>) -> ProvisionResult<()> {
        self.record(
            "CreateRole",
            name,
            IamCall::CreateRole {
                name: name.to_string(),
                trust_document: trust_document.map(str::to_string),
            },
        )
    }

    async fn create_group(&self, name: &str) -> ProvisionResult<()> {
        self.record(
            "CreateGroup",
            name,
            IamCall::CreateGroup {
                name: name.to_string(),
            },
        )
    }

    async fn attach_managed_policy_to_role(&self, name: &str, arn: &str) -> ProvisionResult<()> {
        self.record(
            "AttachRolePolicy",
            name,
            IamCall::AttachRolePolicy {
                name: name.to_string(),
                arn: arn.to_string(),
            },
        )
    }

    async fn attach_managed_policy_to_group(&self, name: &str, arn: &str) -> ProvisionResult<()> {
        self.record(
            "AttachGroupPolicy",
            name,
            IamCall::AttachGroupPolicy {
                name: name.to_string(),
                arn: arn.to_string(),
            },
        )
    }

    async fn put_inline_role_policy(
        &self,
        name: &str,
        policy_name: &str,
        document: &str,
    ) -> ProvisionResult<()> {
        self.record(
            "PutRolePolicy",
            name,
            IamCall::PutRolePolicy {
                name: name.to_string(),
                policy_name: policy_name.to_string(),
                document: document.to_string(),
            },
        )
    }

    async fn put_inline_group_policy(
        &self,
        name: &str,
        policy_name: &str,
        document: &str,
    ) -> ProvisionResult<()> {
        self.record(
            "PutGroupPolicy",
            name,
            IamCall::PutGroupPolicy {
                name: name.to_string(),
                policy_name: policy_name.to_string(),
                document: document.to_string(),
            },
        )
    }

    async fn list_roles(&self) -> ProvisionResult<Vec<String>> {
        let roles = self.created(|call| match call {
            IamCall::CreateRole { name, .. } => Some(name),
            _ => None,
        });
        self.record("ListRoles", "*", IamCall::ListRoles)?;
        Ok(roles)
    }

    async fn list_groups(&self) -> ProvisionResult<Vec<String>> {
        let groups = self.created(|call| match call {
            IamCall::CreateGroup { name } => Some(name),
            _ => None,
        });
        self.record("ListGroups", "*", IamCall::ListGroups)?;
        Ok(groups)
    }
}

/// Event sink that keeps every event in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProvisionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProvisionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &ProvisionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_document(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture directory");
    }
    std::fs::write(&path, content).expect("write fixture document");
}
