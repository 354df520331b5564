// config.rs - Deployment configuration surface.
//
// Deployment tooling hands us a mode plus the context fields that mode
// needs, as TOML:
//
//   mode = "org"
//   org_id = "org_abc123"
//   org_members = ["user_alice", "user_bob"]
//
// Custom mode instead carries an opaque policy that is passed through
// untouched:
//
//   mode = "custom"
//   [custom]
//   policy = "package mcp.authorization ..."
//   policy_data = '{"allowed_users": ["alice"]}'

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::artifact::PolicyArtifact;
use crate::compiler::PolicyCompiler;
use crate::context::PolicyContext;
use crate::error::ConfigError;
use crate::mode::{ActorType, Mode};

/// A caller-authored policy for custom mode. Never parsed or validated here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomPolicy {
    pub policy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_data: Option<String>,
}

/// Deployment authorization settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default)]
    pub org_members: Vec<String>,
    #[serde(default)]
    pub actor_type: ActorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomPolicy>,
}

/// What a deployment enforces once its config is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledPolicy {
    /// Public mode: every request allowed.
    Open,
    /// Private/org mode: a compiled artifact.
    Artifact(PolicyArtifact),
    /// Custom mode: the caller's own policy, opaque.
    Custom(CustomPolicy),
}

impl CompiledPolicy {
    pub fn artifact(&self) -> Option<&PolicyArtifact> {
        match self {
            CompiledPolicy::Artifact(a) => Some(a),
            CompiledPolicy::Open | CompiledPolicy::Custom(_) => None,
        }
    }
}

impl DeploymentConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// The compiler's view of this deployment.
    pub fn context(&self) -> PolicyContext {
        PolicyContext {
            owner_subject: self.owner_subject.clone(),
            org_id: self.org_id.clone(),
            org_members: self.org_members.clone(),
            actor_type: self.actor_type,
        }
    }

    /// Compile this config. Errors abort deployment synthesis.
    pub fn compile(&self) -> Result<CompiledPolicy, ConfigError> {
        match self.mode {
            Mode::Public => Ok(CompiledPolicy::Open),
            Mode::Custom => match &self.custom {
                Some(custom) if !custom.policy.trim().is_empty() => {
                    Ok(CompiledPolicy::Custom(custom.clone()))
                }
                _ => Err(ConfigError::MissingCustomPolicy),
            },
            Mode::Private | Mode::Org => {
                match PolicyCompiler::compile(self.mode, &self.context())? {
                    Some(artifact) => Ok(CompiledPolicy::Artifact(artifact)),
                    None => Ok(CompiledPolicy::Open),
                }
            }
        }
    }
}
