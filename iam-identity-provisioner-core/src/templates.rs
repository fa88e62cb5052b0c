//! Catalogue of policy document templates.
//!
//! Rendering is pure: no I/O, no AWS calls.

use std::fmt;
use std::str::FromStr;

use crate::config::AccountId;
use crate::error::{ProvisionError, ProvisionResult};
use crate::types::{PolicyDocument, Statement};

/// Service principal allowed to assume roles rendered from `assumed-role`.
pub const COMPUTE_SERVICE_PRINCIPAL: &str = "ec2.amazonaws.com";

const ASSUME_ROLE_ACTION: &str = "sts:AssumeRole";

/// Parameters available to every template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateParams {
    pub account_id: AccountId,
}

impl TemplateParams {
    pub fn new(account_id: AccountId) -> Self {
        Self { account_id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyTemplate {
    /// Trust document letting EC2 and the configured account assume a role.
    AssumedRole,
    /// Placeholder permissions for roles, meant to be replaced per environment.
    DefaultRole,
    /// Placeholder permissions for groups, meant to be replaced per environment.
    DefaultGroup,
}

impl PolicyTemplate {
    pub const ALL: [PolicyTemplate; 3] = [
        PolicyTemplate::AssumedRole,
        PolicyTemplate::DefaultRole,
        PolicyTemplate::DefaultGroup,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PolicyTemplate::AssumedRole => "assumed-role",
            PolicyTemplate::DefaultRole => "default-role",
            PolicyTemplate::DefaultGroup => "default-group",
        }
    }

    pub fn render(self, params: &TemplateParams) -> PolicyDocument {
        match self {
            PolicyTemplate::AssumedRole => assumed_role(params),
            PolicyTemplate::DefaultRole | PolicyTemplate::DefaultGroup => negated_wildcard(),
        }
    }
}

impl fmt::Display for PolicyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PolicyTemplate {
    type Err = ProvisionError;

    fn from_str(s: &str) -> ProvisionResult<Self> {
        Self::ALL
            .into_iter()
            .find(|template| template.name() == s)
            .ok_or_else(|| ProvisionError::unknown_selector("policy template", s))
    }
}

/// Render a template chosen by name at runtime, e.g. from a CLI flag.
pub fn render_by_name(name: &str, params: &TemplateParams) -> ProvisionResult<PolicyDocument> {
    let template: PolicyTemplate = name.parse()?;
    Ok(template.render(params))
}

fn assumed_role(params: &TemplateParams) -> PolicyDocument {
    PolicyDocument::new(vec![
        Statement::allow()
            .with_sid("AssumeRolePrincipalService")
            .with_actions([ASSUME_ROLE_ACTION])
            .with_principal("Service", vec![COMPUTE_SERVICE_PRINCIPAL.to_string()]),
        Statement::allow()
            .with_sid("AssumeRolePrincipalAWS")
            .with_actions([ASSUME_ROLE_ACTION])
            .with_principal("AWS", vec![params.account_id.root_principal_arn()]),
    ])
}

fn negated_wildcard() -> PolicyDocument {
    PolicyDocument::new(vec![Statement::allow()
        .with_not_actions(["*"])
        .with_resources(["*"])])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Effect;

    fn params() -> TemplateParams {
        TemplateParams::new(AccountId::new("123456789012").unwrap())
    }

    #[test]
    fn test_assumed_role_statements() {
        let doc = render_by_name("assumed-role", &params()).unwrap();
        assert_eq!(doc.statement.len(), 2);

        let service = &doc.statement[0];
        assert_eq!(service.effect, Effect::Allow);
        assert_eq!(service.action.as_deref(), Some(&["sts:AssumeRole".to_string()][..]));
        assert_eq!(
            service.principal.as_ref().unwrap()["Service"],
            ["ec2.amazonaws.com"]
        );

        let account = &doc.statement[1];
        assert_eq!(account.effect, Effect::Allow);
        assert_eq!(account.action.as_deref(), Some(&["sts:AssumeRole".to_string()][..]));
        assert_eq!(
            account.principal.as_ref().unwrap()["AWS"],
            ["arn:aws:iam::123456789012:root"]
        );
    }

    #[test]
    fn test_assumed_role_json_shape() {
        let json = serde_json::to_value(PolicyTemplate::AssumedRole.render(&params())).unwrap();
        assert_eq!(json["Version"], "2012-10-17");
        assert_eq!(json["Statement"][0]["Sid"], "AssumeRolePrincipalService");
        assert_eq!(json["Statement"][1]["Sid"], "AssumeRolePrincipalAWS");
        assert_eq!(
            json["Statement"][1]["Principal"]["AWS"][0],
            "arn:aws:iam::123456789012:root"
        );
    }

    #[test]
    fn test_default_templates() {
        for name in ["default-role", "default-group"] {
            let doc = render_by_name(name, &params()).unwrap();
            assert_eq!(doc.statement.len(), 1, "{name}");
            let statement = &doc.statement[0];
            assert_eq!(statement.effect, Effect::Allow);
            assert_eq!(statement.action, None);
            assert_eq!(statement.not_action, Some(vec!["*".to_string()]));
            assert_eq!(statement.resource, Some(vec!["*".to_string()]));
        }
    }

    #[test]
    fn test_unknown_template() {
        let err = render_by_name("nonexistent", &params()).unwrap_err();
        assert!(matches!(err, ProvisionError::UnknownSelector { .. }));
    }

    #[test]
    fn test_names_round_trip_through_from_str() {
        for template in PolicyTemplate::ALL {
            assert_eq!(template.name().parse::<PolicyTemplate>().unwrap(), template);
        }
    }
}
