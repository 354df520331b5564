// compiler.rs - Policy Compiler.
//
// Compiles a deployment's mode and context into a PolicyArtifact. Runs once
// per mode/context change at deployment time; the artifact is persisted and
// consulted by every request-time decision.
//
// The compiler is a pure function: the same (mode, context) always produces
// a byte-identical artifact, so deployments can be diffed by digest.
//
// - public  → no artifact (constant allow)
// - custom  → no artifact (the caller supplies an opaque one)
// - private → owner template, data = { owner }
// - org     → org template, data = { org_id, members }

use std::collections::BTreeMap;

use serde_json::Value;

use crate::artifact::{PolicyArtifact, RuleTemplate, MEMBERS_KEY, ORG_ID_KEY, OWNER_KEY};
use crate::context::PolicyContext;
use crate::error::ConfigError;
use crate::mode::Mode;

/// The Policy Compiler: turns deployment context into an enforceable artifact.
pub struct PolicyCompiler;

impl PolicyCompiler {
    /// Compile a mode and context into an artifact.
    ///
    /// Returns `Ok(None)` for modes that carry no compiled artifact. Missing
    /// required context is an error, never a silent downgrade.
    pub fn compile(
        mode: Mode,
        context: &PolicyContext,
    ) -> Result<Option<PolicyArtifact>, ConfigError> {
        let artifact = match mode {
            Mode::Public | Mode::Custom => None,
            Mode::Private => Some(Self::compile_private(context)?),
            Mode::Org => Some(Self::compile_org(context)?),
        };
        match &artifact {
            Some(a) => tracing::debug!(mode = %mode, digest = %a.digest(), "compiled policy"),
            None => tracing::debug!(mode = %mode, "mode carries no compiled policy"),
        }
        Ok(artifact)
    }

    fn compile_private(context: &PolicyContext) -> Result<PolicyArtifact, ConfigError> {
        let owner = non_empty(&context.owner_subject).ok_or(ConfigError::MissingOwnerSubject)?;

        let mut data = BTreeMap::new();
        data.insert(OWNER_KEY.to_string(), Value::from(owner));
        Ok(PolicyArtifact::new(RuleTemplate::Private, data))
    }

    fn compile_org(context: &PolicyContext) -> Result<PolicyArtifact, ConfigError> {
        let org_id = non_empty(&context.org_id).ok_or(ConfigError::MissingOrgId)?;

        let members: Vec<Value> = context
            .org_members
            .iter()
            .map(|m| Value::from(m.as_str()))
            .collect();

        let mut data = BTreeMap::new();
        data.insert(ORG_ID_KEY.to_string(), Value::from(org_id));
        data.insert(MEMBERS_KEY.to_string(), Value::Array(members));
        Ok(PolicyArtifact::new(RuleTemplate::Org, data))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
