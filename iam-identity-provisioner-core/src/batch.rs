//! Batch execution across identity kinds with a per-definition failure boundary.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aws::IamCapability;
use crate::error::ProvisionResult;
use crate::events::{EventSink, ProvisionEvent};
use crate::naming::{resolve, validate_name};
use crate::provisioner::{IdentityProvisioner, ProvisionOutcome};
use crate::store::DefinitionStore;
use crate::types::{IdentityDefinition, IdentityKind};

/// Which identity kinds a run processes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindSelection {
    pub roles: bool,
    pub groups: bool,
}

impl KindSelection {
    pub fn new(roles: bool, groups: bool) -> Self {
        Self { roles, groups }
    }

    pub fn all() -> Self {
        Self::new(true, true)
    }

    pub fn contains(&self, kind: IdentityKind) -> bool {
        match kind {
            IdentityKind::Role => self.roles,
            IdentityKind::Group => self.groups,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.roles && !self.groups
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "error")]
pub enum KindStatus {
    Skipped,
    Processed,
    /// The identity list could not be loaded; nothing was provisioned.
    LoadFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionFailure {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindReport {
    pub kind: IdentityKind,
    pub status: KindStatus,
    /// What each successful definition created and attached, in processing order.
    pub succeeded: Vec<ProvisionOutcome>,
    pub failures: Vec<DefinitionFailure>,
    /// Principal count returned by the post-batch listing.
    pub listed_principals: Option<usize>,
    pub report_error: Option<String>,
}

impl KindReport {
    fn new(kind: IdentityKind, status: KindStatus) -> Self {
        Self {
            kind,
            status,
            succeeded: Vec::new(),
            failures: Vec::new(),
            listed_principals: None,
            report_error: None,
        }
    }

    pub fn succeeded_names(&self) -> Vec<&str> {
        self.succeeded.iter().map(|o| o.name.as_str()).collect()
    }
}

/// Outcome of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub kinds: Vec<KindReport>,
}

impl RunSummary {
    pub fn succeeded_count(&self) -> usize {
        self.kinds.iter().map(|k| k.succeeded.len()).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.kinds.iter().map(|k| k.failures.len()).sum()
    }

    /// True when a definition failed or a requested identity list could not be loaded.
    /// Listing failures do not count.
    pub fn has_failures(&self) -> bool {
        self.kinds
            .iter()
            .any(|k| !k.failures.is_empty() || matches!(k.status, KindStatus::LoadFailed(_)))
    }

    pub fn kind(&self, kind: IdentityKind) -> Option<&KindReport> {
        self.kinds.iter().find(|k| k.kind == kind)
    }
}

pub struct BatchRunner<'a> {
    client: &'a dyn IamCapability,
    store: &'a DefinitionStore,
    sink: &'a dyn EventSink,
}

impl<'a> BatchRunner<'a> {
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

    /// Provision every definition of every requested kind, in order.
    ///
    /// Never fails as a whole: failures are recorded in the summary and reported to
    /// the sink, and processing moves on.
    pub async fn run(&self, requested: KindSelection) -> RunSummary {
        let started_at = Utc::now();
        let mut kinds = Vec::with_capacity(IdentityKind::ALL.len());

        for kind in IdentityKind::ALL {
            if !requested.contains(kind) {
                self.sink.record(&ProvisionEvent::KindSkipped { kind });
                kinds.push(KindReport::new(kind, KindStatus::Skipped));
                continue;
            }
            kinds.push(self.run_kind(kind).await);
        }

        RunSummary { started_at, kinds }
    }

    async fn run_kind(&self, kind: IdentityKind) -> KindReport {
        let source = self.store.identity_list_path(kind);
        let definitions = match self.store.list_definitions(kind).await {
            Ok(definitions) => definitions,
            Err(e) => {
                self.sink.record(&ProvisionEvent::KindLoadFailed {
                    kind,
                    error: e.to_string(),
                });
                return KindReport::new(kind, KindStatus::LoadFailed(e.to_string()));
            }
        };

        self.sink.record(&ProvisionEvent::KindStarted {
            kind,
            source,
            definitions: definitions.len(),
        });

        let mut report = KindReport::new(kind, KindStatus::Processed);
        for definition in &definitions {
            match self.provision_one(kind, definition).await {
                Ok(outcome) => report.succeeded.push(outcome),
                Err(e) => {
                    self.sink.record(&ProvisionEvent::DefinitionFailed {
                        kind,
                        name: definition.name.clone(),
                        error: e.to_string(),
                    });
                    report.failures.push(DefinitionFailure {
                        name: definition.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let listing = match kind {
            IdentityKind::Role => self.client.list_roles().await,
            IdentityKind::Group => self.client.list_groups().await,
        };
        match listing {
            Ok(principals) => {
                report.listed_principals = Some(principals.len());
                self.sink
                    .record(&ProvisionEvent::ReportListed { kind, principals });
            }
            Err(e) => {
                self.sink.record(&ProvisionEvent::ReportFailed {
                    kind,
                    error: e.to_string(),
                });
                report.report_error = Some(e.to_string());
            }
        }

        report
    }

    async fn provision_one(
        &self,
        kind: IdentityKind,
        definition: &IdentityDefinition,
    ) -> ProvisionResult<ProvisionOutcome> {
        validate_name(
            kind,
            &definition.name,
            &self.store.identity_list_path(kind),
        )?;
        let names = resolve(self.store.root(), kind, &definition.name);
        IdentityProvisioner::new(self.client, self.store, self.sink)
            .provision(kind, definition, &names)
            .await
    }
}
