// tables.rs - Deployment-supplied authorization tables.
//
// These are consumed by the engine, not compiled. Every table is optional;
// a missing table or missing key is an empty set, never a wildcard.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TablesError;

/// Per-tool role requirement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolPermission {
    pub required_role: String,
}

/// Rate limit configured for one subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u64,
    /// Informational window label (e.g. "hour"); the usage counter owns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<String>,
}

/// The full set of authorization tables for one deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthzTables {
    /// subject → components the subject may reach.
    #[serde(default)]
    pub user_components: BTreeMap<String, BTreeSet<String>>,
    /// component → roles that may reach it.
    #[serde(default)]
    pub component_roles: BTreeMap<String, BTreeSet<String>>,
    /// subject → component → tools the subject may call there.
    #[serde(default)]
    pub user_tools: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
    /// component → tool → role required to call it.
    #[serde(default)]
    pub tool_permissions: BTreeMap<String, BTreeMap<String, ToolPermission>>,
    /// Tools only `super_admin` may call.
    #[serde(default)]
    pub dangerous_tools: BTreeSet<String>,
    /// subject → rate limit.
    #[serde(default)]
    pub rate_limits: BTreeMap<String, RateLimit>,
}

impl AuthzTables {
    pub fn from_json_str(json: &str) -> Result<Self, TablesError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, TablesError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load tables from a file; `.yaml`/`.yml` parse as YAML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self, TablesError> {
        let content = std::fs::read_to_string(path).map_err(|source| TablesError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// True when no grant table is populated.
    pub fn is_empty(&self) -> bool {
        self.user_components.is_empty()
            && self.component_roles.is_empty()
            && self.user_tools.is_empty()
            && self.tool_permissions.is_empty()
            && self.dangerous_tools.is_empty()
            && self.rate_limits.is_empty()
    }

    pub fn user_has_component(&self, subject: &str, component: &str) -> bool {
        self.user_components
            .get(subject)
            .is_some_and(|components| components.contains(component))
    }

    pub fn component_admits_any_role(&self, component: &str, roles: &BTreeSet<String>) -> bool {
        self.component_roles
            .get(component)
            .is_some_and(|allowed| !allowed.is_disjoint(roles))
    }

    pub fn user_has_tool(&self, subject: &str, component: &str, tool: &str) -> bool {
        self.user_tools
            .get(subject)
            .and_then(|by_component| by_component.get(component))
            .is_some_and(|tools| tools.contains(tool))
    }

    pub fn tool_required_role(&self, component: &str, tool: &str) -> Option<&str> {
        self.tool_permissions
            .get(component)
            .and_then(|tools| tools.get(tool))
            .map(|p| p.required_role.as_str())
    }

    pub fn is_dangerous(&self, tool: &str) -> bool {
        self.dangerous_tools.contains(tool)
    }

    pub fn rate_limit(&self, subject: &str) -> Option<&RateLimit> {
        self.rate_limits.get(subject)
    }
}
