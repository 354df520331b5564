// mode.rs - Deployment access modes and actor types.
//
// A deployment runs in exactly one mode. Adding a mode means every `match`
// over `Mode` in the compiler and the engine stops compiling until the new
// variant is handled.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Deployment-wide access-control strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Mode {
    /// No authorization: every request is allowed.
    Public,
    /// Single owner: only the owner subject may call.
    Private,
    /// Organization: members (user tokens) and same-org machines may call.
    Org,
    /// Externally authored policy, passed through without interpretation.
    Custom,
}

impl Mode {
    /// All modes, in declaration order.
    pub const ALL: [Mode; 4] = [Mode::Public, Mode::Private, Mode::Org, Mode::Custom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Public => "public",
            Mode::Private => "private",
            Mode::Org => "org",
            Mode::Custom => "custom",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownMode(s.to_string()))
    }
}

impl TryFrom<String> for Mode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What kind of identity the deployment is being configured for.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    #[default]
    User,
    Machine,
}
