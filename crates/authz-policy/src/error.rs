// error.rs - Error types for the authorization subsystem.
//
// Only deployment-time operations can fail. The decision evaluator is total
// and returns a Decision for every well-formed input.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning a deployment configuration into a policy.
///
/// These are fatal: deployment synthesis must abort rather than fall back to
/// a weaker mode.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Private mode without an owner.
    #[error("owner subject required")]
    MissingOwnerSubject,

    /// Org mode without an organization id.
    #[error("organization id required")]
    MissingOrgId,

    /// Custom mode without a caller-supplied policy.
    #[error("custom policy required")]
    MissingCustomPolicy,

    /// The mode string is not one of public/private/org/custom.
    #[error("unknown authorization mode: {0}")]
    UnknownMode(String),

    /// The deployment config file could not be read.
    #[error("failed to read deployment config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The deployment config is not valid TOML or has the wrong shape.
    #[error("invalid deployment config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors raised while decoding a stored policy artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The rule source does not match any known template verbatim.
    #[error("rule source does not match a known policy template")]
    UnknownTemplate,

    /// A required data key is absent.
    #[error("artifact data is missing '{field}'")]
    MissingField { field: &'static str },

    /// A data key holds a value of the wrong JSON type.
    #[error("artifact data field '{field}' must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    /// The artifact document is not valid JSON.
    #[error("invalid artifact JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading authorization tables.
#[derive(Debug, Error)]
pub enum TablesError {
    /// The tables file could not be read.
    #[error("failed to read authorization tables '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON tables failed to parse.
    #[error("invalid authorization tables JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML tables failed to parse.
    #[error("invalid authorization tables YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
