//! Definition store backed by a directory of JSON documents.
//!
//! Logical paths map to `{root}/{logical}.json`. Identity lists live at
//! `{root}/{plural kind}.json`; policy documents under `{root}/{plural kind}/`.

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::fs;

use crate::error::{ProvisionError, ProvisionResult};
use crate::naming::storage_folder;
use crate::types::{IdentityDefinition, IdentityKind};

/// Read-only access to identity lists and policy documents.
#[derive(Debug, Clone)]
pub struct DefinitionStore {
    root: PathBuf,
}

impl DefinitionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a logical document path.
    pub fn document_path(&self, logical: &str) -> PathBuf {
        self.root.join(format!("{logical}.json"))
    }

    /// Location of the identity list for a kind, e.g. `{root}/roles.json`.
    pub fn identity_list_path(&self, kind: IdentityKind) -> PathBuf {
        self.document_path(&storage_folder(kind))
    }

    async fn read(&self, path: &Path) -> ProvisionResult<String> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| ProvisionError::file_system("access", path, e))?;
        if !metadata.is_file() {
            return Err(ProvisionError::not_found(path));
        }
        fs::read_to_string(path).await.map_err(|e| match e.kind() {
            ErrorKind::InvalidData => ProvisionError::malformed(path, "not valid UTF-8"),
            _ => ProvisionError::file_system("read", path, e),
        })
    }

    /// Load and parse the JSON document at `path`.
    pub async fn load(&self, path: &Path) -> ProvisionResult<Value> {
        let content = self.read(path).await?;
        debug!("Loaded {} ({} bytes)", path.display(), content.len());
        serde_json::from_str(&content).map_err(|e| ProvisionError::malformed(path, e.to_string()))
    }

    /// Load the document at `path` and return its canonical compact serialization.
    pub async fn load_as_string(&self, path: &Path) -> ProvisionResult<String> {
        let value = self.load(path).await?;
        serde_json::to_string(&value).map_err(|e| ProvisionError::malformed(path, e.to_string()))
    }

    /// Like [`load_as_string`](Self::load_as_string), but absence yields `None`.
    pub async fn load_optional_string(&self, path: &Path) -> ProvisionResult<Option<String>> {
        match self.load_as_string(path).await {
            Ok(document) => Ok(Some(document)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Load the document at `path` into a typed value.
    pub async fn load_as<T: DeserializeOwned>(&self, path: &Path) -> ProvisionResult<T> {
        let value = self.load(path).await?;
        serde_json::from_value(value).map_err(|e| ProvisionError::malformed(path, e.to_string()))
    }

    /// Read the identity list for `kind`, preserving store order.
    ///
    /// The list is a JSON array of single-key objects mapping a name to its managed
    /// policy identifiers.
    pub async fn list_definitions(
        &self,
        kind: IdentityKind,
    ) -> ProvisionResult<Vec<IdentityDefinition>> {
        let path = self.identity_list_path(kind);
        let entries: Vec<HashMap<String, Vec<String>>> = self.load_as(&path).await?;

        let mut seen = HashSet::new();
        let mut definitions = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            if entry.len() != 1 {
                return Err(ProvisionError::malformed(
                    &path,
                    format!(
                        "entry {index} must map exactly one {kind} name to its policies, found {} keys",
                        entry.len()
                    ),
                ));
            }
            for (name, managed_policies) in entry {
                if !seen.insert(name.clone()) {
                    return Err(ProvisionError::malformed(
                        &path,
                        format!("duplicate {kind} name '{name}'"),
                    ));
                }
                definitions.push(IdentityDefinition::new(name, managed_policies));
            }
        }

        Ok(definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write(dir: &TempDir, relative: &str, content: &str) -> PathBuf {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.unwrap();
        }
        fs::write(&path, content).await.unwrap();
        path
    }

    #[test]
    fn test_paths() {
        let store = DefinitionStore::new("/data");
        assert_eq!(
            store.identity_list_path(IdentityKind::Role),
            PathBuf::from("/data/roles.json")
        );
        assert_eq!(
            store.document_path("groups/policy-admin"),
            PathBuf::from("/data/groups/policy-admin.json")
        );
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = DefinitionStore::new(dir.path());
        let err = store
            .load(&dir.path().join("roles.json"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_directory_is_not_a_document() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("roles.json")).await.unwrap();
        let store = DefinitionStore::new(dir.path());
        let err = store
            .load(&dir.path().join("roles.json"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_load_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "roles/policy.json", "{ not json").await;
        let store = DefinitionStore::new(dir.path());
        let err = store.load(&path).await.unwrap_err();
        assert!(matches!(err, ProvisionError::MalformedDocument { .. }));

        // Malformed is never downgraded to absence.
        assert!(store.load_optional_string(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roles.json");
        fs::write(&path, [b'[', 0xff, 0xfe, b']']).await.unwrap();
        let store = DefinitionStore::new(dir.path());

        let err = store.load(&path).await.unwrap_err();
        assert!(matches!(err, ProvisionError::MalformedDocument { .. }), "{err}");
        assert!(store.load_optional_string(&path).await.is_err());
        assert!(matches!(
            store.list_definitions(IdentityKind::Role).await,
            Err(ProvisionError::MalformedDocument { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_as_string_round_trip() {
        let dir = TempDir::new().unwrap();
        let original = r#"{
            "Version": "2012-10-17",
            "Statement": [{"Effect": "Allow", "Action": ["s3:ListBucket"], "Resource": ["*"]}]
        }"#;
        let path = write(&dir, "groups/policy-admin.json", original).await;
        let store = DefinitionStore::new(dir.path());

        let compact = store.load_as_string(&path).await.unwrap();
        assert!(!compact.contains('\n'));

        let reparsed: Value = serde_json::from_str(&compact).unwrap();
        let expected: Value = serde_json::from_str(original).unwrap();
        assert_eq!(reparsed, expected);
    }

    #[tokio::test]
    async fn test_load_optional_string_absent() {
        let dir = TempDir::new().unwrap();
        let store = DefinitionStore::new(dir.path());
        let loaded = store
            .load_optional_string(&dir.path().join("groups/policy-staff.json"))
            .await
            .unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_list_definitions_preserves_order() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "roles.json",
            r#"[
                {"publisher": ["ReadOnlyAccess", "AmazonS3FullAccess"]},
                {"service": []},
                {"support": ["job-function/SupportUser"]}
            ]"#,
        )
        .await;
        let store = DefinitionStore::new(dir.path());

        let definitions = store.list_definitions(IdentityKind::Role).await.unwrap();
        let names: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["publisher", "service", "support"]);
        assert_eq!(
            definitions[0].managed_policies,
            ["ReadOnlyAccess", "AmazonS3FullAccess"]
        );
        assert!(definitions[1].managed_policies.is_empty());
    }

    #[tokio::test]
    async fn test_list_definitions_rejects_bad_shapes() {
        let dir = TempDir::new().unwrap();
        let store = DefinitionStore::new(dir.path());

        for content in [
            r#"{"admin": []}"#,
            r#"[{"admin": [], "staff": []}]"#,
            r#"[{}]"#,
            r#"[{"admin": "AdministratorAccess"}]"#,
            r#"[{"admin": []}, {"admin": ["ReadOnlyAccess"]}]"#,
        ] {
            write(&dir, "groups.json", content).await;
            let err = store
                .list_definitions(IdentityKind::Group)
                .await
                .unwrap_err();
            assert!(
                matches!(err, ProvisionError::MalformedDocument { .. }),
                "{content}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_list_definitions_missing_list() {
        let dir = TempDir::new().unwrap();
        let store = DefinitionStore::new(dir.path());
        let err = store
            .list_definitions(IdentityKind::Group)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
