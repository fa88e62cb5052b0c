//! Runtime configuration: definition store location and the AWS account used in principals.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ProvisionError, ProvisionResult};

/// Namespace of AWS managed policies.
pub const MANAGED_POLICY_ARN_PREFIX: &str = "arn:aws:iam::aws:policy/";

/// Account used when none is configured.
pub const DEFAULT_ACCOUNT_ID: &str = "123456789012";

/// Canonical ARN for an AWS managed policy identifier.
pub fn managed_policy_arn(policy: &str) -> String {
    format!("{MANAGED_POLICY_ARN_PREFIX}{policy}")
}

/// A 12-digit AWS account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> ProvisionResult<Self> {
        let id = id.into();
        if id.len() == 12 && id.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(id))
        } else {
            Err(ProvisionError::InvalidConfig(format!(
                "account id must be exactly 12 digits, got '{id}'"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `arn:aws:iam::{id}:root`
    pub fn root_principal_arn(&self) -> String {
        format!("arn:aws:iam::{}:root", self.0)
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self(DEFAULT_ACCOUNT_ID.to_string())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = ProvisionError;

    fn from_str(s: &str) -> ProvisionResult<Self> {
        Self::new(s.trim())
    }
}

/// Settings shared by a batch run and standalone rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerConfig {
    /// Root directory of the definition store.
    pub storage_root: PathBuf,
    pub account_id: AccountId,
}

impl ProvisionerConfig {
    pub fn new(storage_root: impl Into<PathBuf>, account_id: AccountId) -> Self {
        Self {
            storage_root: storage_root.into(),
            account_id,
        }
    }
}
