// artifact.rs - Compiled policy artifacts.
//
// An artifact is the (rule source, data) pair persisted with a deployment.
// The rule source is always one of the fixed templates below, kept verbatim
// so evaluators already deployed elsewhere read the same text. The data
// document carries the mode-specific parameters.
//
// Artifacts are immutable. A mode or context change compiles a new one.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::ArtifactError;
use crate::input::TokenInfo;
use crate::mode::Mode;

pub(crate) const OWNER_KEY: &str = "owner";
pub(crate) const ORG_ID_KEY: &str = "org_id";
pub(crate) const MEMBERS_KEY: &str = "members";

const PRIVATE_SOURCE: &str = "package mcp.authorization

# Private mode: Only the owner can access
default allow = false

allow if {
\tinput.token.sub == data.owner
}
";

const ORG_SOURCE: &str = "package mcp.authorization

# Organization mode: Members and machines can access
default allow = false

# Allow org members (user tokens without org_id claim)
allow if {
\tnot input.token.claims.org_id
\tinput.token.sub == data.members[_]
}

# Allow machines from the same org (machine tokens with org_id claim)
allow if {
\tinput.token.claims.org_id
\tinput.token.claims.org_id == data.org_id
}
";

/// The fixed decision-logic templates an artifact can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleTemplate {
    Private,
    Org,
}

impl RuleTemplate {
    /// Verbatim rule source text.
    pub fn source(&self) -> &'static str {
        match self {
            RuleTemplate::Private => PRIVATE_SOURCE,
            RuleTemplate::Org => ORG_SOURCE,
        }
    }

    /// Match a rule source against the known templates, byte for byte.
    pub fn from_source(source: &str) -> Option<Self> {
        [RuleTemplate::Private, RuleTemplate::Org]
            .into_iter()
            .find(|t| t.source() == source)
    }

    /// The mode this template implements.
    pub fn mode(&self) -> Mode {
        match self {
            RuleTemplate::Private => Mode::Private,
            RuleTemplate::Org => Mode::Org,
        }
    }
}

impl Serialize for RuleTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.source())
    }
}

impl<'de> Deserialize<'de> for RuleTemplate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        RuleTemplate::from_source(&source)
            .ok_or_else(|| D::Error::custom(ArtifactError::UnknownTemplate))
    }
}

/// A compiled policy: rule template plus its data document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyArtifact {
    rule_source: RuleTemplate,
    data: BTreeMap<String, Value>,
}

impl PolicyArtifact {
    pub(crate) fn new(rule_source: RuleTemplate, data: BTreeMap<String, Value>) -> Self {
        Self { rule_source, data }
    }

    /// Decode a stored artifact and check its data has the template's shape.
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let artifact: PolicyArtifact = serde_json::from_str(json)?;
        crate::context::PolicyContext::from_artifact(&artifact)?;
        Ok(artifact)
    }

    pub fn to_json(&self) -> Result<String, ArtifactError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn template(&self) -> RuleTemplate {
        self.rule_source
    }

    pub fn mode(&self) -> Mode {
        self.rule_source.mode()
    }

    pub fn rule_source(&self) -> &'static str {
        self.rule_source.source()
    }

    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    /// Compact JSON of the data document, keys sorted.
    pub fn data_json(&self) -> String {
        let object: serde_json::Map<String, Value> = self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(object).to_string()
    }

    /// SHA-256 over rule source and data, lowercase hex.
    ///
    /// Equal artifacts always have equal digests, so deployments can diff
    /// and cache on this value.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.rule_source().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.data_json().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Evaluate the template's base rule against a verified token.
    ///
    /// This is the simple single-owner/org evaluator. Every absent or
    /// mistyped data field evaluates to "not allowed".
    pub fn allows(&self, token: &TokenInfo) -> bool {
        match self.rule_source {
            RuleTemplate::Private => self
                .data_str(OWNER_KEY)
                .is_some_and(|owner| !owner.is_empty() && token.sub == owner),
            RuleTemplate::Org => match token.claims.org_id.as_deref() {
                // User token: membership is by subject.
                None => self
                    .data
                    .get(MEMBERS_KEY)
                    .and_then(Value::as_array)
                    .is_some_and(|members| {
                        members
                            .iter()
                            .any(|m| m.as_str() == Some(token.sub.as_str()))
                    }),
                // Machine token: membership is by org claim.
                Some(org_id) => self
                    .data_str(ORG_ID_KEY)
                    .is_some_and(|expected| !expected.is_empty() && expected == org_id),
            },
        }
    }

    fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

impl fmt::Display for PolicyArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} policy {}", self.mode(), &self.digest()[..12])
    }
}
