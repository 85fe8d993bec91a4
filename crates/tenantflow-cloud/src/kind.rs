//! Resource kinds known to the reconciler

use crate::error::CloudError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Kind of cloud resource that can be created and waited on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    DataSource,
    DataSet,
    Namespace,
    Template,
    Analysis,
    Dashboard,
    /// QuickSight user registration. Create-only.
    User,
    AthenaQuery,
    IamRole,
    /// Inline policy attached to an IAM role. Create-only.
    RolePolicy,
}

/// Remote operations backing a resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiOperation {
    /// Service namespace, e.g. `quicksight`
    pub service: &'static str,
    /// Operation issuing the creation request
    pub create: &'static str,
    /// Operation describing the resource status, `None` for create-only kinds
    pub describe: Option<&'static str>,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::DataSource,
        ResourceKind::DataSet,
        ResourceKind::Namespace,
        ResourceKind::Template,
        ResourceKind::Analysis,
        ResourceKind::Dashboard,
        ResourceKind::User,
        ResourceKind::AthenaQuery,
        ResourceKind::IamRole,
        ResourceKind::RolePolicy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::DataSource => "data-source",
            ResourceKind::DataSet => "data-set",
            ResourceKind::Namespace => "namespace",
            ResourceKind::Template => "template",
            ResourceKind::Analysis => "analysis",
            ResourceKind::Dashboard => "dashboard",
            ResourceKind::User => "user",
            ResourceKind::AthenaQuery => "athena-query",
            ResourceKind::IamRole => "iam-role",
            ResourceKind::RolePolicy => "role-policy",
        }
    }

    pub fn operation(&self) -> ApiOperation {
        let (service, create, describe) = match self {
            ResourceKind::DataSource => (
                "quicksight",
                "create-data-source",
                Some("describe-data-source"),
            ),
            ResourceKind::DataSet => ("quicksight", "create-data-set", Some("describe-data-set")),
            ResourceKind::Namespace => (
                "quicksight",
                "create-namespace",
                Some("describe-namespace"),
            ),
            ResourceKind::Template => ("quicksight", "create-template", Some("describe-template")),
            ResourceKind::Analysis => ("quicksight", "create-analysis", Some("describe-analysis")),
            ResourceKind::Dashboard => (
                "quicksight",
                "create-dashboard",
                Some("describe-dashboard"),
            ),
            ResourceKind::User => ("quicksight", "register-user", None),
            ResourceKind::AthenaQuery => (
                "athena",
                "start-query-execution",
                Some("get-query-execution"),
            ),
            ResourceKind::IamRole => ("iam", "create-role", Some("get-role")),
            ResourceKind::RolePolicy => ("iam", "put-role-policy", None),
        };
        ApiOperation {
            service,
            create,
            describe,
        }
    }

    /// Field of the create payload holding the identifying key
    pub fn key_field(&self) -> Option<&'static str> {
        match self {
            ResourceKind::DataSource => Some("DataSourceId"),
            ResourceKind::DataSet => Some("DataSetId"),
            ResourceKind::Namespace => Some("Namespace"),
            ResourceKind::Template => Some("TemplateId"),
            ResourceKind::Analysis => Some("AnalysisId"),
            ResourceKind::Dashboard => Some("DashboardId"),
            ResourceKind::User => Some("Email"),
            ResourceKind::AthenaQuery => None,
            ResourceKind::IamRole => Some("RoleName"),
            ResourceKind::RolePolicy => Some("PolicyName"),
        }
    }

    /// Field of the create response holding a server-assigned key
    pub fn response_key_field(&self) -> Option<&'static str> {
        match self {
            ResourceKind::AthenaQuery => Some("QueryExecutionId"),
            _ => None,
        }
    }

    /// QuickSight kinds are scoped by `AwsAccountId`
    pub fn is_account_scoped(&self) -> bool {
        self.operation().service == "quicksight"
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "datasource" => Ok(ResourceKind::DataSource),
            "dataset" => Ok(ResourceKind::DataSet),
            "namespace" => Ok(ResourceKind::Namespace),
            "template" => Ok(ResourceKind::Template),
            "analysis" => Ok(ResourceKind::Analysis),
            "dashboard" => Ok(ResourceKind::Dashboard),
            "user" => Ok(ResourceKind::User),
            "athenaquery" | "query" => Ok(ResourceKind::AthenaQuery),
            "iamrole" | "role" => Ok(ResourceKind::IamRole),
            "rolepolicy" => Ok(ResourceKind::RolePolicy),
            _ => Err(CloudError::InvalidConfig(format!(
                "unknown resource kind '{}' (expected one of: {})",
                s,
                ResourceKind::ALL
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

impl Serialize for ResourceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResourceKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
