// request.rs - Build a DecisionInput from an inbound gateway request.
//
// The gateway routes `/mcp` to root discovery and `/mcp/x/{component}/...`
// to a single component. The JSON-RPC body, when it parses, supplies the
// MCP method and (for tools/call) the tool name. Bodies that do not parse
// simply produce no MCP detail; whether that is acceptable is the engine's
// call, not the parser's.

use serde::Deserialize;
use serde_json::Value;

use crate::input::{DecisionInput, McpContext, RequestInfo, TokenInfo, METHOD_TOOLS_CALL};

const COMPONENT_PREFIX: &str = "mcp/x/";

/// Component named by a gateway path.
///
/// - `/mcp` → `None`
/// - `/mcp/x/{component}` → `Some(component)`
/// - `/mcp/x/{component}/readonly` → `Some(component)`
pub fn component_from_path(path: &str) -> Option<String> {
    let path = path.trim_start_matches('/').trim_end_matches('/');
    let remaining = path.strip_prefix(COMPONENT_PREFIX)?;
    remaining
        .split('/')
        .next()
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

impl McpContext {
    /// Parse the MCP detail out of a JSON-RPC request body.
    ///
    /// For `tools/call`, a missing or non-string `params.name` leaves the
    /// tool empty; the engine treats that as an unauthorized call.
    pub fn from_jsonrpc(body: &[u8]) -> Option<Self> {
        let request: JsonRpcRequest = match serde_json::from_slice(body) {
            Ok(r) => r,
            Err(e) => {
                tracing::trace!("body is not a JSON-RPC request: {}", e);
                return None;
            }
        };

        let (tool, arguments) = match request.params {
            Some(params) if request.method == METHOD_TOOLS_CALL => (
                params.get("name").and_then(Value::as_str).map(str::to_string),
                params.get("arguments").cloned(),
            ),
            _ => (None, None),
        };

        Some(Self {
            method: request.method,
            tool,
            arguments,
        })
    }
}

impl DecisionInput {
    /// Assemble the decision input for one gateway request.
    pub fn from_request(token: TokenInfo, path: &str, body: Option<&[u8]>) -> Self {
        Self {
            token,
            request: RequestInfo {
                component: component_from_path(path),
            },
            mcp: body.and_then(McpContext::from_jsonrpc),
        }
    }
}
