//! Per-identity provisioning: create the principal, attach managed policies, attach
//! the inline policy.
//!
//! Steps run in that fixed order. Absent optional documents skip their step; any
//! other failure aborts the remaining steps for this identity and is returned to the
//! caller. Nothing is rolled back.

use serde::Serialize;

use crate::aws::IamCapability;
use crate::config::managed_policy_arn;
use crate::error::ProvisionResult;
use crate::events::{EventSink, ProvisionEvent};
use crate::store::DefinitionStore;
use crate::types::{IdentityDefinition, IdentityKind, ResolvedNames};

/// What was applied for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionOutcome {
    pub kind: IdentityKind,
    pub name: String,
    pub trust_document_attached: bool,
    /// ARNs of attached managed policies, in attachment order.
    pub managed_policies: Vec<String>,
    /// Name of the inline policy, when one was attached.
    pub inline_policy: Option<String>,
}

pub struct IdentityProvisioner<'a> {
    client: &'a dyn IamCapability,
    store: &'a DefinitionStore,
    sink: &'a dyn EventSink,
}

impl<'a> IdentityProvisioner<'a> {
    pub fn new(
        client: &'a dyn IamCapability,
        store: &'a DefinitionStore,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            client,
            store,
            sink,
        }
    }

    pub async fn provision(
        &self,
        kind: IdentityKind,
        definition: &IdentityDefinition,
        names: &ResolvedNames,
    ) -> ProvisionResult<ProvisionOutcome> {
        let name = definition.name.as_str();

        let trust_document_attached = self.create_principal(kind, name, names).await?;

        let mut managed_policies = Vec::with_capacity(definition.managed_policies.len());
        for policy in &definition.managed_policies {
            let arn = managed_policy_arn(policy);
            match kind {
                IdentityKind::Role => self.client.attach_managed_policy_to_role(name, &arn).await?,
                IdentityKind::Group => {
                    self.client.attach_managed_policy_to_group(name, &arn).await?
                }
            }
            self.sink.record(&ProvisionEvent::ManagedPolicyAttached {
                kind,
                name: name.to_string(),
                arn: arn.clone(),
            });
            managed_policies.push(arn);
        }

        let inline_policy = self.attach_inline_policy(kind, name, names).await?;

        Ok(ProvisionOutcome {
            kind,
            name: name.to_string(),
            trust_document_attached,
            managed_policies,
            inline_policy,
        })
    }

    /// Returns whether a trust document was passed at creation.
    async fn create_principal(
        &self,
        kind: IdentityKind,
        name: &str,
        names: &ResolvedNames,
    ) -> ProvisionResult<bool> {
        let trust_path = match kind {
            IdentityKind::Role => names.base_policy_path.as_deref(),
            IdentityKind::Group => None,
        };

        let trust_document = match trust_path {
            Some(path) => {
                let document = self.store.load_optional_string(path).await?;
                if document.is_none() {
                    self.sink.record(&ProvisionEvent::TrustDocumentAbsent {
                        name: name.to_string(),
                        path: path.to_path_buf(),
                    });
                }
                document
            }
            None => None,
        };

        match kind {
            IdentityKind::Role => {
                self.client
                    .create_role(name, trust_document.as_deref())
                    .await?
            }
            IdentityKind::Group => self.client.create_group(name).await?,
        }

        let attached = trust_document.is_some();
        self.sink.record(&ProvisionEvent::PrincipalCreated {
            kind,
            name: name.to_string(),
            trust_document: trust_path.filter(|_| attached).map(|p| p.to_path_buf()),
        });
        Ok(attached)
    }

    async fn attach_inline_policy(
        &self,
        kind: IdentityKind,
        name: &str,
        names: &ResolvedNames,
    ) -> ProvisionResult<Option<String>> {
        let path = &names.custom_policy_path;
        let Some(document) = self.store.load_optional_string(path).await? else {
            self.sink.record(&ProvisionEvent::InlinePolicyAbsent {
                kind,
                name: name.to_string(),
                path: path.clone(),
            });
            return Ok(None);
        };

        match kind {
            IdentityKind::Role => {
                self.client
                    .put_inline_role_policy(name, &names.policy_name, &document)
                    .await?
            }
            IdentityKind::Group => {
                self.client
                    .put_inline_group_policy(name, &names.policy_name, &document)
                    .await?
            }
        }

        self.sink.record(&ProvisionEvent::InlinePolicyAttached {
            kind,
            name: name.to_string(),
            policy_name: names.policy_name.clone(),
            path: path.clone(),
        });
        Ok(Some(names.policy_name.clone()))
    }
}
