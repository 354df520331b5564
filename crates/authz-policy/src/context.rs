// context.rs - What is known about a deployment when its policy is compiled.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::{PolicyArtifact, RuleTemplate, MEMBERS_KEY, ORG_ID_KEY, OWNER_KEY};
use crate::error::ArtifactError;
use crate::mode::{ActorType, Mode};

/// Deployment context consumed by the policy compiler.
///
/// Which fields matter depends on the mode: private needs `owner_subject`,
/// org needs `org_id` and optionally `org_members`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default)]
    pub org_members: Vec<String>,
    #[serde(default)]
    pub actor_type: ActorType,
}

impl PolicyContext {
    /// Context for a single-owner deployment.
    pub fn private(owner_subject: impl Into<String>) -> Self {
        Self {
            owner_subject: Some(owner_subject.into()),
            ..Self::default()
        }
    }

    /// Context for an organization deployment.
    pub fn org<I, S>(org_id: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            org_id: Some(org_id.into()),
            org_members: members.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Recover the mode and context an artifact was compiled from.
    ///
    /// Recompiling the result yields an identical artifact. `actor_type` is
    /// not recorded in artifacts and comes back as the default.
    pub fn from_artifact(artifact: &PolicyArtifact) -> Result<(Mode, Self), ArtifactError> {
        let data = artifact.data();
        match artifact.template() {
            RuleTemplate::Private => {
                let owner = required_str(data.get(OWNER_KEY), OWNER_KEY)?;
                Ok((Mode::Private, Self::private(owner)))
            }
            RuleTemplate::Org => {
                let org_id = required_str(data.get(ORG_ID_KEY), ORG_ID_KEY)?;
                let members = match data.get(MEMBERS_KEY) {
                    None => Vec::new(),
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(|item| {
                            item.as_str()
                                .map(str::to_string)
                                .ok_or(ArtifactError::InvalidField {
                                    field: MEMBERS_KEY,
                                    expected: "an array of strings",
                                })
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                    Some(_) => {
                        return Err(ArtifactError::InvalidField {
                            field: MEMBERS_KEY,
                            expected: "an array of strings",
                        })
                    }
                };
                Ok((Mode::Org, Self::org(org_id, members)))
            }
        }
    }
}

fn required_str<'a>(
    value: Option<&'a Value>,
    field: &'static str,
) -> Result<&'a str, ArtifactError> {
    match value {
        None => Err(ArtifactError::MissingField { field }),
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(_) => Err(ArtifactError::InvalidField {
            field,
            expected: "a non-empty string",
        }),
    }
}
