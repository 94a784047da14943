use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ArtifactError, ArtifactResult};

/// A capitalized identifier naming a UI component (`[A-Z][A-Za-z0-9_$]*`).
///
/// Only values that pass [`Identifier::parse`] exist, so an `Identifier` can be
/// spliced into generated program text as a bare binding reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(name: &str) -> ArtifactResult<Self> {
        if is_component_name(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(ArtifactError::InvalidIdentifier {
                name: name.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// True if `name` follows the component naming convention.
pub fn is_component_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identifier {
    type Error = ArtifactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Identifier::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}
