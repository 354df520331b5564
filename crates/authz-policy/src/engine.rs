// engine.rs - Decision evaluator.
//
// Every inbound call passes through `decide()`, which evaluates all layers
// (no short-circuit, so the trace always shows every verdict) and combines:
//
//   allow = component_allowed ∧ tool_allowed ∧ ¬dangerous_tool ∧ ¬rate_limited
//
// Layer A (component access) grants if any of:
//   - private/org: the deployment's base rule (owner / org membership) matches
//   - custom: the caller holds the `admin` role
//   - custom: root discovery (no component) with the `mcp:access` scope
//   - user_components lists the component for the subject
//   - component_roles shares a role with the caller
//
// In private and org mode neither `admin` nor `mcp:access` opens the door on
// its own, so a deployment with empty tables admits exactly the callers its
// base rule admits.
//
// Layer B (tool access), only when A granted:
//   - anything that is not a `tools/call` (discovery, initialize, ...)
//   - the base rule matched, or the caller holds `admin`
//   - `tools/call` whose tool is in user_tools[subject][component]
//   - `tools/call` whose tool's required role the caller holds
//
// Layer C (dangerous tool) blocks a `tools/call` on a dangerous tool unless
// the caller holds `super_admin`. `admin` does not bypass it.
//
// Layer D (rate limit) blocks when the injected usage counter reports the
// subject at or above rate_limits[subject].
//
// The engine is total: missing tables, keys or fields are "not granted".
// Public mode is a constant allow and skips every layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::artifact::PolicyArtifact;
use crate::input::{
    DecisionInput, McpContext, TokenInfo, ADMIN_ROLE, MCP_ACCESS_SCOPE, SUPER_ADMIN_ROLE,
};
use crate::mode::Mode;
use crate::rate_limit::{limit_exceeded, NoUsageCounter, UsageCounter};
use crate::tables::AuthzTables;

/// Why a request was denied. Rendered as text only at the boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DenyReason {
    #[serde(rename = "component access denied")]
    ComponentAccessDenied,
    #[serde(rename = "tool access denied")]
    ToolAccessDenied,
    #[serde(rename = "dangerous tool requires super_admin role")]
    DangerousToolRequiresSuperAdmin,
    #[serde(rename = "rate limit exceeded")]
    RateLimitExceeded,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::ComponentAccessDenied => "component access denied",
            DenyReason::ToolAccessDenied => "tool access denied",
            DenyReason::DangerousToolRequiresSuperAdmin => {
                "dangerous tool requires super_admin role"
            }
            DenyReason::RateLimitExceeded => "rate limit exceeded",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of one evaluation. `deny_reasons` is empty iff `allow`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Decision {
    pub allow: bool,
    #[serde(default)]
    pub deny_reasons: Vec<DenyReason>,
}

impl Decision {
    pub fn allowed() -> Self {
        Self {
            allow: true,
            deny_reasons: Vec::new(),
        }
    }

    pub fn denied_for(&self, reason: DenyReason) -> bool {
        self.deny_reasons.contains(&reason)
    }
}

/// Which layer a trace step reports on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    PublicMode,
    BaseRule,
    ComponentAccess,
    ToolAccess,
    DangerousTool,
    RateLimit,
}

/// One layer's verdict. `passed` is false when the layer withholds or blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerStep {
    pub layer: Layer,
    pub passed: bool,
    pub detail: String,
}

/// A decision plus the per-layer verdicts that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTrace {
    pub decision: Decision,
    pub steps: Vec<LayerStep>,
}

impl DecisionTrace {
    pub fn step(&self, layer: Layer) -> Option<&LayerStep> {
        self.steps.iter().find(|s| s.layer == layer)
    }
}

/// The decision evaluator.
///
/// Stateless apart from the usage counter; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine<C = NoUsageCounter> {
    counter: C,
}

impl DecisionEngine {
    /// Engine with no usage counter: the rate-limit layer never fires.
    pub fn new() -> Self {
        Self {
            counter: NoUsageCounter,
        }
    }
}

impl<C: UsageCounter> DecisionEngine<C> {
    pub fn with_counter(counter: C) -> Self {
        Self { counter }
    }

    /// Decide one request.
    pub fn decide(
        &self,
        artifact: Option<&PolicyArtifact>,
        mode: Mode,
        tables: &AuthzTables,
        input: &DecisionInput,
    ) -> Decision {
        self.decide_with_trace(artifact, mode, tables, input).decision
    }

    /// Decide one request and record every layer's verdict.
    pub fn decide_with_trace(
        &self,
        artifact: Option<&PolicyArtifact>,
        mode: Mode,
        tables: &AuthzTables,
        input: &DecisionInput,
    ) -> DecisionTrace {
        if mode == Mode::Public {
            return DecisionTrace {
                decision: Decision::allowed(),
                steps: vec![LayerStep {
                    layer: Layer::PublicMode,
                    passed: true,
                    detail: "public deployment: constant allow".to_string(),
                }],
            };
        }

        let token = &input.token;
        let component = input.request.component();
        let mcp = input.mcp.as_ref();
        let mut steps = Vec::with_capacity(5);

        let (base_granted, detail) = base_rule(artifact, mode, token);
        steps.push(LayerStep {
            layer: Layer::BaseRule,
            passed: base_granted,
            detail,
        });

        let (component_allowed, detail) =
            component_access(tables, token, component, mode, base_granted);
        steps.push(LayerStep {
            layer: Layer::ComponentAccess,
            passed: component_allowed,
            detail,
        });

        let (tool_allowed, detail) = if component_allowed {
            tool_access(tables, token, component, mcp, base_granted)
        } else {
            (false, "skipped: component access denied".to_string())
        };
        steps.push(LayerStep {
            layer: Layer::ToolAccess,
            passed: tool_allowed,
            detail,
        });

        let dangerous_denied = match mcp.and_then(McpContext::called_tool) {
            Some(tool) if tables.is_dangerous(tool) => !token.has_role(SUPER_ADMIN_ROLE),
            _ => false,
        };
        steps.push(LayerStep {
            layer: Layer::DangerousTool,
            passed: !dangerous_denied,
            detail: if dangerous_denied {
                "dangerous tool without super_admin role".to_string()
            } else {
                "no dangerous tool restriction applies".to_string()
            },
        });

        let rate_limited = tables
            .rate_limit(&token.sub)
            .is_some_and(|limit| limit_exceeded(&self.counter, &token.sub, limit));
        steps.push(LayerStep {
            layer: Layer::RateLimit,
            passed: !rate_limited,
            detail: if rate_limited {
                format!("subject '{}' is at or over its limit", token.sub)
            } else {
                "within limit".to_string()
            },
        });

        let mut deny_reasons = Vec::new();
        if !component_allowed {
            deny_reasons.push(DenyReason::ComponentAccessDenied);
        }
        if component_allowed && !tool_allowed {
            deny_reasons.push(DenyReason::ToolAccessDenied);
        }
        if dangerous_denied {
            deny_reasons.push(DenyReason::DangerousToolRequiresSuperAdmin);
        }
        if rate_limited {
            deny_reasons.push(DenyReason::RateLimitExceeded);
        }

        let allow = component_allowed && tool_allowed && !dangerous_denied && !rate_limited;
        tracing::debug!(
            mode = %mode,
            subject = %token.sub,
            component = component.unwrap_or("-"),
            allow,
            reasons = ?deny_reasons,
            "evaluated request"
        );

        DecisionTrace {
            decision: Decision {
                allow,
                deny_reasons,
            },
            steps,
        }
    }
}

/// The deployment's single-owner/org rule, as a Layer A grant path.
///
/// Fails closed when the artifact is missing or was compiled for a
/// different mode than the deployment declares.
fn base_rule(artifact: Option<&PolicyArtifact>, mode: Mode, token: &TokenInfo) -> (bool, String) {
    match mode {
        Mode::Public | Mode::Custom => (false, format!("no base rule in {} mode", mode)),
        Mode::Private | Mode::Org => match artifact {
            None => {
                tracing::warn!(mode = %mode, "no compiled policy for deployment; base rule denies");
                (false, format!("no compiled policy for {} mode", mode))
            }
            Some(a) if a.mode() != mode => {
                tracing::warn!(
                    mode = %mode,
                    artifact_mode = %a.mode(),
                    "policy artifact does not match deployment mode; base rule denies"
                );
                (
                    false,
                    format!("artifact compiled for {} mode, deployment is {}", a.mode(), mode),
                )
            }
            Some(a) if a.allows(token) => (true, format!("subject matched {} rule", mode)),
            Some(_) => (false, format!("subject not matched by {} rule", mode)),
        },
    }
}

fn component_access(
    tables: &AuthzTables,
    token: &TokenInfo,
    component: Option<&str>,
    mode: Mode,
    base_granted: bool,
) -> (bool, String) {
    if base_granted {
        return (true, "base rule".to_string());
    }
    let has_base_rule = matches!(mode, Mode::Private | Mode::Org);
    if !has_base_rule && token.has_role(ADMIN_ROLE) {
        return (true, "admin role".to_string());
    }
    match component {
        None if !has_base_rule && token.has_scope(MCP_ACCESS_SCOPE) => {
            (true, "root discovery with mcp:access scope".to_string())
        }
        None if has_base_rule => {
            (false, format!("root discovery not granted by {} rule", mode))
        }
        None => (false, "root discovery requires mcp:access scope".to_string()),
        Some(c) if tables.user_has_component(&token.sub, c) => {
            (true, format!("user_components grants '{}'", c))
        }
        Some(c) if tables.component_admits_any_role(c, &token.claims.roles) => {
            (true, format!("component_roles grants '{}'", c))
        }
        Some(c) => (false, format!("no grant for component '{}'", c)),
    }
}

fn tool_access(
    tables: &AuthzTables,
    token: &TokenInfo,
    component: Option<&str>,
    mcp: Option<&McpContext>,
    base_granted: bool,
) -> (bool, String) {
    let mcp = match mcp {
        None => return (true, "no MCP detail".to_string()),
        Some(m) if m.is_discovery() => return (true, format!("discovery method '{}'", m.method)),
        Some(m) if !m.is_tool_call() => return (true, format!("method '{}'", m.method)),
        Some(m) => m,
    };

    if base_granted {
        return (true, "base rule".to_string());
    }
    if token.has_role(ADMIN_ROLE) {
        return (true, "admin role".to_string());
    }
    let Some(tool) = mcp.called_tool() else {
        return (false, "tools/call without a tool name".to_string());
    };
    let Some(component) = component else {
        return (false, format!("tool '{}' called without a component", tool));
    };

    if tables.user_has_tool(&token.sub, component, tool) {
        return (true, format!("user_tools grants '{}'", tool));
    }
    match tables.tool_required_role(component, tool) {
        Some(role) if token.has_role(role) => {
            (true, format!("tool_permissions grants '{}' to role '{}'", tool, role))
        }
        Some(role) => (false, format!("tool '{}' requires role '{}'", tool, role)),
        None => (false, format!("no grant for tool '{}'", tool)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::PolicyCompiler;
    use crate::context::PolicyContext;
    use crate::input::{Claims, RequestInfo};

    /// Helper: a request from `sub` with the given roles.
    fn input(sub: &str, roles: &[&str]) -> DecisionInput {
        DecisionInput {
            token: TokenInfo {
                sub: sub.to_string(),
                claims: Claims {
                    roles: roles.iter().map(|r| r.to_string()).collect(),
                    org_id: None,
                },
                scopes: Default::default(),
            },
            request: RequestInfo::default(),
            mcp: None,
        }
    }

    fn at(mut input: DecisionInput, component: &str) -> DecisionInput {
        input.request.component = Some(component.to_string());
        input
    }

    fn call(mut input: DecisionInput, tool: &str) -> DecisionInput {
        input.mcp = Some(McpContext {
            method: "tools/call".to_string(),
            tool: Some(tool.to_string()),
            arguments: None,
        });
        input
    }

    fn method(mut input: DecisionInput, method: &str) -> DecisionInput {
        input.mcp = Some(McpContext {
            method: method.to_string(),
            tool: None,
            arguments: None,
        });
        input
    }

    fn tables() -> AuthzTables {
        AuthzTables::from_json_str(
            r#"{
                "user_components": {"alice": ["backend"]},
                "component_roles": {"reports": ["analyst"]},
                "user_tools": {"alice": {"backend": ["query"]}},
                "tool_permissions": {
                    "backend": {"migrate": {"required_role": "dba"}},
                    "reports": {"export": {"required_role": "analyst"}}
                },
                "dangerous_tools": ["drop_database"],
                "rate_limits": {"alice": {"max_requests": 10}}
            }"#,
        )
        .unwrap()
    }

    fn decide(tables: &AuthzTables, input: &DecisionInput) -> Decision {
        DecisionEngine::new().decide(None, Mode::Custom, tables, input)
    }

    #[test]
    fn default_deny_with_empty_tables() {
        let empty = AuthzTables::default();
        for mode in [Mode::Private, Mode::Org, Mode::Custom] {
            for request in [
                input("u1", &[]),
                at(input("u1", &["user"]), "backend"),
                call(at(input("u1", &["super_admin"]), "backend"), "query"),
                method(at(input("u1", &[]), "backend"), "tools/list"),
            ] {
                let decision = DecisionEngine::new().decide(None, mode, &empty, &request);
                assert!(!decision.allow, "mode {} allowed {:?}", mode, request);
                assert!(decision.denied_for(DenyReason::ComponentAccessDenied));
            }
        }
    }

    #[test]
    fn public_mode_is_constant_allow() {
        let mut request = call(at(input("anyone", &[]), "backend"), "drop_database");
        request.token.sub = String::new();
        let trace = DecisionEngine::new().decide_with_trace(None, Mode::Public, &tables(), &request);
        assert_eq!(trace.decision, Decision::allowed());
        assert_eq!(trace.steps.len(), 1);
        assert_eq!(trace.steps[0].layer, Layer::PublicMode);
    }

    #[test]
    fn private_mode_owner_only() {
        let artifact = PolicyCompiler::compile(Mode::Private, &PolicyContext::private("u1"))
            .unwrap()
            .unwrap();
        let engine = DecisionEngine::new();
        let empty = AuthzTables::default();

        let owner = engine.decide(Some(&artifact), Mode::Private, &empty, &input("u1", &[]));
        assert_eq!(owner, Decision::allowed());

        let other = engine.decide(Some(&artifact), Mode::Private, &empty, &input("u2", &[]));
        assert!(!other.allow);
        assert_eq!(other.deny_reasons, vec![DenyReason::ComponentAccessDenied]);
    }

    #[test]
    fn org_mode_users_and_machines() {
        let artifact = PolicyCompiler::compile(Mode::Org, &PolicyContext::org("o1", ["u1"]))
            .unwrap()
            .unwrap();
        let engine = DecisionEngine::new();
        let empty = AuthzTables::default();

        let member = input("u1", &[]);
        assert!(engine.decide(Some(&artifact), Mode::Org, &empty, &member).allow);

        let mut machine = input("bot", &[]);
        machine.token.claims.org_id = Some("o1".to_string());
        assert!(engine.decide(Some(&artifact), Mode::Org, &empty, &machine).allow);

        machine.token.claims.org_id = Some("o2".to_string());
        let foreign = engine.decide(Some(&artifact), Mode::Org, &empty, &machine);
        assert!(!foreign.allow);
        assert!(foreign.denied_for(DenyReason::ComponentAccessDenied));
    }

    #[test]
    fn artifact_for_other_mode_never_grants() {
        let private = PolicyCompiler::compile(Mode::Private, &PolicyContext::private("u1"))
            .unwrap()
            .unwrap();
        let engine = DecisionEngine::new();
        let empty = AuthzTables::default();
        for mode in [Mode::Org, Mode::Custom] {
            assert!(!engine.decide(Some(&private), mode, &empty, &input("u1", &[])).allow);
        }
        assert!(!engine.decide(None, Mode::Private, &empty, &input("u1", &[])).allow);
    }

    #[test]
    fn base_rule_grants_tool_calls_but_not_dangerous_ones() {
        let artifact = PolicyCompiler::compile(Mode::Private, &PolicyContext::private("u1"))
            .unwrap()
            .unwrap();
        let engine = DecisionEngine::new();
        let request = call(at(input("u1", &[]), "backend"), "unlisted");
        let trace = engine.decide_with_trace(Some(&artifact), Mode::Private, &tables(), &request);
        assert_eq!(trace.decision, Decision::allowed());
        assert_eq!(trace.step(Layer::ToolAccess).unwrap().detail, "base rule");

        let drop = call(at(input("u1", &[]), "backend"), "drop_database");
        let decision = engine.decide(Some(&artifact), Mode::Private, &tables(), &drop);
        assert_eq!(
            decision.deny_reasons,
            vec![DenyReason::DangerousToolRequiresSuperAdmin]
        );
    }

    #[test]
    fn org_member_may_call_any_tool_without_tables() {
        let artifact = PolicyCompiler::compile(Mode::Org, &PolicyContext::org("o1", ["u1"]))
            .unwrap()
            .unwrap();
        let request = call(at(input("u1", &[]), "backend"), "query");
        let decision =
            DecisionEngine::new().decide(Some(&artifact), Mode::Org, &AuthzTables::default(), &request);
        assert_eq!(decision, Decision::allowed());
    }

    #[test]
    fn base_rule_still_rate_limited() {
        let artifact = PolicyCompiler::compile(Mode::Private, &PolicyContext::private("alice"))
            .unwrap()
            .unwrap();
        let engine = DecisionEngine::with_counter(|_: &str| -> Option<u64> { Some(10) });
        let request = call(at(input("alice", &[]), "backend"), "query");
        let decision = engine.decide(Some(&artifact), Mode::Private, &tables(), &request);
        assert_eq!(decision.deny_reasons, vec![DenyReason::RateLimitExceeded]);
    }

    #[test]
    fn scope_and_admin_do_not_bypass_base_rule() {
        let private = PolicyCompiler::compile(Mode::Private, &PolicyContext::private("u1"))
            .unwrap()
            .unwrap();
        let org = PolicyCompiler::compile(Mode::Org, &PolicyContext::org("o1", ["u1"]))
            .unwrap()
            .unwrap();
        let engine = DecisionEngine::new();
        let empty = AuthzTables::default();

        let mut scoped = method(input("u2", &[]), "tools/list");
        scoped.token.scopes.insert(MCP_ACCESS_SCOPE.to_string());
        for (artifact, mode) in [(&private, Mode::Private), (&org, Mode::Org)] {
            let decision = engine.decide(Some(artifact), mode, &empty, &scoped);
            assert_eq!(decision.deny_reasons, vec![DenyReason::ComponentAccessDenied]);
        }

        let mut foreign_admin = method(at(input("ops", &["admin"]), "backend"), "tools/list");
        foreign_admin.token.claims.org_id = Some("o_evil".to_string());
        let decision = engine.decide(Some(&org), Mode::Org, &empty, &foreign_admin);
        assert_eq!(decision.deny_reasons, vec![DenyReason::ComponentAccessDenied]);

        let stranger_admin = at(input("u2", &["admin"]), "backend");
        assert!(!engine.decide(Some(&private), Mode::Private, &empty, &stranger_admin).allow);
    }

    #[test]
    fn table_grants_still_extend_base_rule() {
        let artifact = PolicyCompiler::compile(Mode::Private, &PolicyContext::private("u1"))
            .unwrap()
            .unwrap();
        let engine = DecisionEngine::new();
        let t = tables();
        let granted = call(at(input("alice", &[]), "backend"), "query");
        assert!(engine.decide(Some(&artifact), Mode::Private, &t, &granted).allow);

        // A table-granted caller holding admin gets every tool of the component.
        let admin = call(at(input("alice", &["admin"]), "backend"), "migrate");
        assert!(engine.decide(Some(&artifact), Mode::Private, &t, &admin).allow);
        let plain = call(at(input("alice", &[]), "backend"), "migrate");
        assert!(!engine.decide(Some(&artifact), Mode::Private, &t, &plain).allow);
    }

    #[test]
    fn empty_tables_follow_base_rule_exactly() {
        let private = PolicyCompiler::compile(Mode::Private, &PolicyContext::private("u1"))
            .unwrap()
            .unwrap();
        let org = PolicyCompiler::compile(Mode::Org, &PolicyContext::org("o1", ["u1"]))
            .unwrap()
            .unwrap();
        let engine = DecisionEngine::new();
        let empty = AuthzTables::default();

        let scoped = |mut request: DecisionInput| {
            request.token.scopes.insert(MCP_ACCESS_SCOPE.to_string());
            request
        };
        let org_claim = |mut request: DecisionInput, org_id: &str| {
            request.token.claims.org_id = Some(org_id.to_string());
            request
        };

        let cases: Vec<(&PolicyArtifact, Mode, DecisionInput)> = vec![
            (&private, Mode::Private, call(at(input("u1", &[]), "backend"), "query")),
            (&private, Mode::Private, method(input("u1", &[]), "tools/list")),
            (&private, Mode::Private, scoped(method(input("u2", &[]), "tools/list"))),
            (&private, Mode::Private, call(at(input("u2", &["admin"]), "backend"), "query")),
            (&private, Mode::Private, at(input("", &[]), "backend")),
            (&org, Mode::Org, call(at(input("u1", &[]), "backend"), "query")),
            (&org, Mode::Org, call(at(input("u2", &[]), "backend"), "query")),
            (&org, Mode::Org, scoped(method(input("u2", &[]), "tools/list"))),
            (&org, Mode::Org, org_claim(call(at(input("bot", &[]), "backend"), "query"), "o1")),
            (&org, Mode::Org, org_claim(call(at(input("ops", &["admin"]), "backend"), "query"), "o_evil")),
            (&org, Mode::Org, org_claim(method(input("u1", &[]), "tools/list"), "o_evil")),
        ];

        for (artifact, mode, request) in cases {
            let expected = artifact.allows(&request.token);
            let decision = engine.decide(Some(artifact), mode, &empty, &request);
            assert_eq!(decision.allow, expected, "mode {} on {:?}", mode, request);
            assert_eq!(decision.allow, decision.deny_reasons.is_empty());
        }
    }

    #[test]
    fn root_discovery_requires_scope() {
        let t = tables();
        assert!(!decide(&t, &method(input("alice", &[]), "tools/list")).allow);

        let mut scoped = method(input("alice", &[]), "tools/list");
        scoped.token.scopes.insert("mcp:access".to_string());
        assert!(decide(&t, &scoped).allow);
    }

    #[test]
    fn component_granted_by_user_table_or_role() {
        let t = tables();
        assert!(decide(&t, &at(input("alice", &[]), "backend")).allow);
        assert!(decide(&t, &at(input("bob", &["analyst"]), "reports")).allow);
        assert!(!decide(&t, &at(input("bob", &["analyst"]), "backend")).allow);
        assert!(!decide(&t, &at(input("alice", &[]), "reports")).allow);
    }

    #[test]
    fn discovery_allowed_with_component_access_only() {
        let t = tables();
        for m in ["tools/list", "prompts/list", "resources/list"] {
            assert!(decide(&t, &method(at(input("alice", &[]), "backend"), m)).allow, "{}", m);
        }
    }

    #[test]
    fn tool_call_requires_tool_grant() {
        let t = tables();
        assert!(decide(&t, &call(at(input("alice", &[]), "backend"), "query")).allow);
        assert!(decide(&t, &call(at(input("alice", &["dba"]), "backend"), "migrate")).allow);

        let denied = decide(&t, &call(at(input("alice", &[]), "backend"), "migrate"));
        assert_eq!(denied.deny_reasons, vec![DenyReason::ToolAccessDenied]);

        let unknown = decide(&t, &call(at(input("alice", &[]), "backend"), "unknown"));
        assert_eq!(unknown.deny_reasons, vec![DenyReason::ToolAccessDenied]);
    }

    #[test]
    fn tools_call_without_tool_name_is_denied_not_an_error() {
        let t = tables();
        let mut request = at(input("alice", &[]), "backend");
        request.mcp = Some(McpContext {
            method: "tools/call".to_string(),
            tool: None,
            arguments: None,
        });
        let trace = DecisionEngine::new().decide_with_trace(None, Mode::Custom, &t, &request);
        assert_eq!(trace.decision.deny_reasons, vec![DenyReason::ToolAccessDenied]);
        assert!(trace.step(Layer::DangerousTool).unwrap().passed);
    }

    #[test]
    fn admin_reaches_every_component_and_tool() {
        let t = tables();
        assert!(decide(&t, &input("root", &["admin"])).allow);
        assert!(decide(&t, &at(input("root", &["admin"]), "anything")).allow);
        assert!(decide(&t, &call(at(input("root", &["admin"]), "anything"), "whatever")).allow);
    }

    #[test]
    fn admin_does_not_bypass_dangerous_tool() {
        let t = tables();
        let decision = decide(&t, &call(at(input("root", &["admin"]), "backend"), "drop_database"));
        assert!(!decision.allow);
        assert_eq!(
            decision.deny_reasons,
            vec![DenyReason::DangerousToolRequiresSuperAdmin]
        );
    }

    #[test]
    fn super_admin_may_call_dangerous_tool() {
        let t = tables();
        let request = call(at(input("root", &["admin", "super_admin"]), "backend"), "drop_database");
        assert!(decide(&t, &request).allow);

        // super_admin alone does not grant component or tool access.
        let bare = call(at(input("root", &["super_admin"]), "backend"), "drop_database");
        let decision = decide(&t, &bare);
        assert_eq!(decision.deny_reasons, vec![DenyReason::ComponentAccessDenied]);
    }

    #[test]
    fn dangerous_tool_reason_collected_alongside_others() {
        let t = tables();
        let decision = decide(&t, &call(at(input("mallory", &[]), "backend"), "drop_database"));
        assert_eq!(
            decision.deny_reasons,
            vec![
                DenyReason::ComponentAccessDenied,
                DenyReason::DangerousToolRequiresSuperAdmin
            ]
        );
    }

    #[test]
    fn dangerous_tool_list_is_not_a_call() {
        let t = tables();
        let mut request = at(input("alice", &[]), "backend");
        request.mcp = Some(McpContext {
            method: "tools/list".to_string(),
            tool: Some("drop_database".to_string()),
            arguments: None,
        });
        assert!(decide(&t, &request).allow);
    }

    #[test]
    fn rate_limit_never_fires_without_counter() {
        let t = tables();
        let trace =
            DecisionEngine::new().decide_with_trace(None, Mode::Custom, &t, &at(input("alice", &[]), "backend"));
        assert!(trace.decision.allow);
        assert!(trace.step(Layer::RateLimit).unwrap().passed);
    }

    #[test]
    fn rate_limit_fires_with_injected_counter() {
        let t = tables();
        let engine = DecisionEngine::with_counter(|sub: &str| -> Option<u64> {
            (sub == "alice").then_some(10)
        });
        let decision = engine.decide(None, Mode::Custom, &t, &at(input("alice", &[]), "backend"));
        assert!(!decision.allow);
        assert_eq!(decision.deny_reasons, vec![DenyReason::RateLimitExceeded]);

        // Subjects without a configured limit are never limited.
        let other = engine.decide(None, Mode::Custom, &t, &at(input("bob", &["analyst"]), "reports"));
        assert!(other.allow);
    }

    #[test]
    fn trace_records_every_layer() {
        let t = tables();
        let trace = DecisionEngine::new().decide_with_trace(
            None,
            Mode::Custom,
            &t,
            &call(at(input("mallory", &[]), "backend"), "query"),
        );
        let layers: Vec<Layer> = trace.steps.iter().map(|s| s.layer).collect();
        assert_eq!(
            layers,
            vec![
                Layer::BaseRule,
                Layer::ComponentAccess,
                Layer::ToolAccess,
                Layer::DangerousTool,
                Layer::RateLimit
            ]
        );
        assert!(trace.step(Layer::ToolAccess).unwrap().detail.starts_with("skipped"));
    }

    #[test]
    fn reasons_empty_iff_allowed() {
        let t = tables();
        for request in [
            at(input("alice", &[]), "backend"),
            at(input("alice", &[]), "reports"),
            call(at(input("alice", &[]), "backend"), "migrate"),
            call(at(input("root", &["admin"]), "backend"), "drop_database"),
        ] {
            let d = decide(&t, &request);
            assert_eq!(d.allow, d.deny_reasons.is_empty());
        }
    }

    #[test]
    fn decision_wire_shape() {
        let decision = Decision {
            allow: false,
            deny_reasons: vec![
                DenyReason::ComponentAccessDenied,
                DenyReason::DangerousToolRequiresSuperAdmin,
            ],
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "allow": false,
                "deny_reasons": ["component access denied", "dangerous tool requires super_admin role"]
            })
        );
        assert_eq!(DenyReason::RateLimitExceeded.to_string(), "rate limit exceeded");
    }
}
