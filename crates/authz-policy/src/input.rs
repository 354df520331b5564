// input.rs - Per-request decision input.
//
// The token half arrives already verified (signature, issuer, audience,
// expiry) and is trusted verbatim. The request and MCP halves are extracted
// from the inbound HTTP request by `request.rs`.
//
// Wire shape:
// { "token":   { "sub": "...", "claims": { "roles": [...], "org_id": "..." }, "scopes": [...] },
//   "request": { "component": "..." },
//   "mcp":     { "method": "tools/call", "tool": "..." } }

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role that grants access to every component and tool.
pub const ADMIN_ROLE: &str = "admin";

/// Role that may invoke dangerous tools. Distinct from [`ADMIN_ROLE`].
pub const SUPER_ADMIN_ROLE: &str = "super_admin";

/// Scope that grants root (component-less) discovery.
pub const MCP_ACCESS_SCOPE: &str = "mcp:access";

pub const METHOD_TOOLS_CALL: &str = "tools/call";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_PROMPTS_LIST: &str = "prompts/list";
pub const METHOD_RESOURCES_LIST: &str = "resources/list";

/// Everything the engine knows about one inbound call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecisionInput {
    pub token: TokenInfo,
    #[serde(default)]
    pub request: RequestInfo,
    /// Present only when the body parsed as a JSON-RPC request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp: Option<McpContext>,
}

/// Verified identity of the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenInfo {
    pub sub: String,
    #[serde(default)]
    pub claims: Claims,
    #[serde(default)]
    pub scopes: BTreeSet<String>,
}

/// The claims the engine reads. Unknown claims are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    #[serde(default)]
    pub roles: BTreeSet<String>,
    /// Set on machine tokens only. User tokens carry membership in `sub`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestInfo {
    /// Target component; absent for root discovery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

impl RequestInfo {
    /// The requested component, treating an empty name as absent.
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref().filter(|c| !c.is_empty())
    }
}

/// JSON-RPC detail of an MCP request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct McpContext {
    pub method: String,
    /// Tool name for `tools/call`. Missing when the call is malformed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// `params.arguments` of a `tools/call`, untouched. Not read by the
    /// engine; kept so custom policies can inspect it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl McpContext {
    pub fn is_tool_call(&self) -> bool {
        self.method == METHOD_TOOLS_CALL
    }

    /// Discovery methods are authorized by component access alone.
    pub fn is_discovery(&self) -> bool {
        matches!(
            self.method.as_str(),
            METHOD_TOOLS_LIST | METHOD_PROMPTS_LIST | METHOD_RESOURCES_LIST
        )
    }

    /// The tool being invoked, if this is a well-formed `tools/call`.
    pub fn called_tool(&self) -> Option<&str> {
        if self.is_tool_call() {
            self.tool.as_deref()
        } else {
            None
        }
    }
}

impl TokenInfo {
    pub fn has_role(&self, role: &str) -> bool {
        self.claims.roles.contains(role)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }
}
