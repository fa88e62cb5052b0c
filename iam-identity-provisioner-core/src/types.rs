//! Core data model: identity kinds, identity definitions and policy documents.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProvisionError, ProvisionResult};

/// IAM policy language version stamped on rendered documents.
pub const POLICY_VERSION: &str = "2012-10-17";

/// The kinds of IAM principal this crate provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    Role,
    Group,
}

impl IdentityKind {
    /// Processing order for a batch run.
    pub const ALL: [IdentityKind; 2] = [IdentityKind::Role, IdentityKind::Group];

    pub fn as_str(self) -> &'static str {
        match self {
            IdentityKind::Role => "role",
            IdentityKind::Group => "group",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            IdentityKind::Role => "Role",
            IdentityKind::Group => "Group",
        }
    }

    /// Maximum principal name length accepted by IAM.
    pub fn max_name_len(self) -> usize {
        match self {
            IdentityKind::Role => 64,
            IdentityKind::Group => 128,
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityKind {
    type Err = ProvisionError;

    fn from_str(s: &str) -> ProvisionResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "role" => Ok(IdentityKind::Role),
            "group" => Ok(IdentityKind::Group),
            _ => Err(ProvisionError::unknown_selector("identity kind", s)),
        }
    }
}

/// A named principal and the managed policies it references, in store order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityDefinition {
    pub name: String,
    pub managed_policies: Vec<String>,
}

impl IdentityDefinition {
    pub fn new(name: impl Into<String>, managed_policies: Vec<String>) -> Self {
        Self {
            name: name.into(),
            managed_policies,
        }
    }
}

/// Names and paths derived for one (kind, name) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNames {
    /// `{Kind}Policy{Name}`, the inline policy name.
    pub policy_name: String,
    /// Location of the optional inline policy document.
    pub custom_policy_path: PathBuf,
    /// Location of the optional trust document (roles only).
    pub base_policy_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// IAM policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    pub fn new(statement: Vec<Statement>) -> Self {
        Self {
            version: Some(POLICY_VERSION.to_string()),
            statement,
        }
    }
}

/// A single policy statement. Absent fields are omitted when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub effect: Effect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_action: Option<Vec<String>>,
    /// Principal type (`Service`, `AWS`, ...) to principal values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Vec<String>>,
}

impl Statement {
    pub fn allow() -> Self {
        Self {
            sid: None,
            effect: Effect::Allow,
            action: None,
            not_action: None,
            principal: None,
            resource: None,
        }
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_not_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.not_action = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_principal(mut self, principal_type: &str, values: Vec<String>) -> Self {
        self.principal
            .get_or_insert_with(BTreeMap::new)
            .insert(principal_type.to_string(), values);
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource = Some(resources.into_iter().map(Into::into).collect());
        self
    }
}
