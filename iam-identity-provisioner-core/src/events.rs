//! Provisioning progress events and the sinks that receive them.

use std::path::PathBuf;

use log::{error, info, warn};

use crate::types::IdentityKind;

/// One observable step of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionEvent {
    KindStarted {
        kind: IdentityKind,
        source: PathBuf,
        definitions: usize,
    },
    KindSkipped {
        kind: IdentityKind,
    },
    KindLoadFailed {
        kind: IdentityKind,
        error: String,
    },
    PrincipalCreated {
        kind: IdentityKind,
        name: String,
        trust_document: Option<PathBuf>,
    },
    TrustDocumentAbsent {
        name: String,
        path: PathBuf,
    },
    ManagedPolicyAttached {
        kind: IdentityKind,
        name: String,
        arn: String,
    },
    InlinePolicyAttached {
        kind: IdentityKind,
        name: String,
        policy_name: String,
        path: PathBuf,
    },
    InlinePolicyAbsent {
        kind: IdentityKind,
        name: String,
        path: PathBuf,
    },
    DefinitionFailed {
        kind: IdentityKind,
        name: String,
        error: String,
    },
    ReportListed {
        kind: IdentityKind,
        principals: Vec<String>,
    },
    ReportFailed {
        kind: IdentityKind,
        error: String,
    },
}

/// Receiver of provisioning events, injected into the provisioner and batch runner.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &ProvisionEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, event: &ProvisionEvent) {
        match event {
            ProvisionEvent::KindStarted {
                kind,
                source,
                definitions,
            } => info!(
                "Creating {} {kind} definitions from {}",
                definitions,
                source.display()
            ),
            ProvisionEvent::KindSkipped { kind } => info!("Skipping {kind}"),
            ProvisionEvent::KindLoadFailed { kind, error } => {
                error!("Failed to load {kind} definitions: {error}")
            }
            ProvisionEvent::PrincipalCreated {
                kind,
                name,
                trust_document,
            } => match trust_document {
                Some(path) => info!("Created {kind} {name} trusting {}", path.display()),
                None => info!("Created {kind} {name}"),
            },
            ProvisionEvent::TrustDocumentAbsent { name, path } => info!(
                "No trust document at {}, creating role {name} without one",
                path.display()
            ),
            ProvisionEvent::ManagedPolicyAttached { kind, name, arn } => {
                info!("Added policy {arn} to {kind} {name}")
            }
            ProvisionEvent::InlinePolicyAttached {
                kind,
                name,
                policy_name,
                path,
            } => info!(
                "Added inline policy {policy_name} {} to {kind} {name}",
                path.display()
            ),
            ProvisionEvent::InlinePolicyAbsent { kind, name, path } => info!(
                "No inline policy for {kind} {name} at {}, skipping",
                path.display()
            ),
            ProvisionEvent::DefinitionFailed { kind, name, error } => {
                error!("Failed to provision {kind} {name}: {error}")
            }
            ProvisionEvent::ReportListed { kind, principals } => {
                info!("Reporting on {kind}: {} present", principals.len());
                for principal in principals {
                    info!("  {principal}");
                }
            }
            ProvisionEvent::ReportFailed { kind, error } => {
                warn!("Failed to list {kind} principals: {error}")
            }
        }
    }
}
