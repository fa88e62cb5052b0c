//! End-to-end batch runs against an on-disk definition store and a recording IAM client.

use std::path::PathBuf;

use iam_identity_provisioner_core::test_utils::{
    write_document, IamCall, RecordingIamClient, RecordingSink,
};
use iam_identity_provisioner_core::{
    BatchRunner, DefinitionStore, IdentityKind, KindSelection, KindStatus, ProvisionEvent,
};
use tempfile::TempDir;

const TRUST: &str = r#"{"Version": "2012-10-17", "Statement": [{"Effect": "Allow", "Action": ["sts:AssumeRole"], "Principal": {"Service": ["ec2.amazonaws.com"]}}]}"#;

fn sample_store() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data")
}

#[tokio::test]
async fn test_failed_definition_does_not_affect_others() {
    let dir = TempDir::new().unwrap();
    write_document(
        dir.path(),
        "roles.json",
        r#"[{"publisher": ["ReadOnlyAccess"]}, {"bad": []}]"#,
    );
    write_document(dir.path(), "roles/policy.json", TRUST);
    write_document(dir.path(), "roles/policy-bad.json", "{\"Statement\": [");

    let store = DefinitionStore::new(dir.path());
    let client = RecordingIamClient::new();
    let sink = RecordingSink::new();

    let summary = BatchRunner::new(&client, &store, &sink)
        .run(KindSelection::new(true, false))
        .await;

    let roles = summary.kind(IdentityKind::Role).unwrap();
    assert_eq!(roles.status, KindStatus::Processed);
    assert_eq!(roles.succeeded_names(), ["publisher"]);
    assert!(roles.succeeded[0].trust_document_attached);
    assert_eq!(roles.failures.len(), 1);
    assert_eq!(roles.failures[0].name, "bad");
    assert_eq!(roles.listed_principals, Some(2));
    assert!(summary.has_failures());

    let calls = client.calls();
    assert_eq!(
        calls[1],
        IamCall::AttachRolePolicy {
            name: "publisher".into(),
            arn: "arn:aws:iam::aws:policy/ReadOnlyAccess".into(),
        }
    );
    // The bad role was created before its inline policy failed to parse; no rollback.
    assert!(calls.contains(&IamCall::CreateRole {
        name: "bad".into(),
        trust_document: Some(
            serde_json::to_string(&serde_json::from_str::<serde_json::Value>(TRUST).unwrap())
                .unwrap()
        ),
    }));
    assert!(!calls
        .iter()
        .any(|c| matches!(c, IamCall::PutRolePolicy { name, .. } if name == "bad")));
    assert_eq!(calls.last(), Some(&IamCall::ListRoles));

    assert!(sink.events().iter().any(|e| matches!(
        e,
        ProvisionEvent::DefinitionFailed { kind: IdentityKind::Role, name, .. } if name == "bad"
    )));
}

#[tokio::test]
async fn test_malformed_trust_document_fails_every_role() {
    let dir = TempDir::new().unwrap();
    write_document(
        dir.path(),
        "roles.json",
        r#"[{"publisher": ["ReadOnlyAccess"]}, {"service": []}]"#,
    );
    write_document(dir.path(), "roles/policy.json", "{ broken");
    write_document(dir.path(), "roles/policy-publisher.json", TRUST);

    let store = DefinitionStore::new(dir.path());
    let client = RecordingIamClient::new();
    let sink = RecordingSink::new();

    let summary = BatchRunner::new(&client, &store, &sink)
        .run(KindSelection::new(true, false))
        .await;

    let roles = summary.kind(IdentityKind::Role).unwrap();
    assert_eq!(roles.status, KindStatus::Processed);
    assert!(roles.succeeded.is_empty());
    assert_eq!(summary.failed_count(), 2);
    assert_eq!(summary.succeeded_count(), 0);
    assert!(roles
        .failures
        .iter()
        .all(|f| f.error.contains("policy.json")));

    // The shared trust document is parsed before any principal is created.
    assert_eq!(client.calls(), vec![IamCall::ListRoles]);
    assert_eq!(roles.listed_principals, Some(0));

    let failed: Vec<String> = sink
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ProvisionEvent::DefinitionFailed {
                kind: IdentityKind::Role,
                name,
                ..
            } => Some(name),
            _ => None,
        })
        .collect();
    assert_eq!(failed, ["publisher", "service"]);
}

#[tokio::test]
async fn test_service_failure_on_create_moves_to_next_definition() {
    let dir = TempDir::new().unwrap();
    write_document(
        dir.path(),
        "groups.json",
        r#"[{"admin": ["AdministratorAccess"]}, {"staff": ["IAMUserChangePassword"]}]"#,
    );

    let store = DefinitionStore::new(dir.path());
    let client = RecordingIamClient::new().fail_on("CreateGroup", "admin");
    let sink = RecordingSink::new();

    let summary = BatchRunner::new(&client, &store, &sink)
        .run(KindSelection::new(false, true))
        .await;

    assert_eq!(summary.failed_count(), 1);
    assert_eq!(summary.succeeded_count(), 1);
    assert_eq!(
        client.calls(),
        vec![
            IamCall::CreateGroup {
                name: "admin".into()
            },
            IamCall::CreateGroup {
                name: "staff".into()
            },
            IamCall::AttachGroupPolicy {
                name: "staff".into(),
                arn: "arn:aws:iam::aws:policy/IAMUserChangePassword".into(),
            },
            IamCall::ListGroups,
        ]
    );
}

#[tokio::test]
async fn test_sample_store_provisions_everything() {
    let store = DefinitionStore::new(sample_store());
    let client = RecordingIamClient::new();
    let sink = RecordingSink::new();

    let summary = BatchRunner::new(&client, &store, &sink)
        .run(KindSelection::all())
        .await;

    assert!(!summary.has_failures(), "{summary:?}");
    assert_eq!(summary.succeeded_count(), 6);

    let calls = client.calls();
    let created_roles: Vec<&IamCall> = calls
        .iter()
        .filter(|c| matches!(c, IamCall::CreateRole { .. }))
        .collect();
    assert_eq!(created_roles.len(), 3);
    assert!(created_roles
        .iter()
        .all(|c| matches!(c, IamCall::CreateRole { trust_document: Some(_), .. })));

    assert!(calls.contains(&IamCall::AttachRolePolicy {
        name: "support".into(),
        arn: "arn:aws:iam::aws:policy/job-function/SupportUser".into(),
    }));

    let inline: Vec<(&str, &str)> = calls
        .iter()
        .filter_map(|c| match c {
            IamCall::PutRolePolicy {
                name, policy_name, ..
            }
            | IamCall::PutGroupPolicy {
                name, policy_name, ..
            } => Some((name.as_str(), policy_name.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(
        inline,
        [
            ("publisher", "RolePolicyPublisher"),
            ("staff", "GroupPolicyStaff")
        ]
    );

    // Roles are fully processed and listed before any group is touched.
    let list_roles = calls.iter().position(|c| *c == IamCall::ListRoles).unwrap();
    let first_group = calls
        .iter()
        .position(|c| matches!(c, IamCall::CreateGroup { .. }))
        .unwrap();
    assert!(list_roles < first_group);
    assert_eq!(calls.last(), Some(&IamCall::ListGroups));
}
