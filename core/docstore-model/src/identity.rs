use crate::{Entity, ModelError, ModelResult};
use std::fmt;
use std::str::FromStr;

/// How an entity's cross-snapshot identity is derived.
///
/// Chosen once per kind from a configuration token and fixed for the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum IdentityStrategy {
    /// The key's leaf identifier.
    #[default]
    ByKey,
    /// A named string property.
    ByProperty(String),
    /// The identifier of the nearest ancestor of the given kind.
    ByParent(String),
}

impl IdentityStrategy {
    /// Parses `"key"`, `"property:<name>"` or `"parent:<kind>"`.
    pub fn from_token(token: &str) -> ModelResult<Self> {
        let token = token.trim();
        if token == "key" {
            return Ok(Self::ByKey);
        }
        match token.split_once(':') {
            Some(("property", name)) if !name.is_empty() => Ok(Self::ByProperty(name.to_string())),
            Some(("parent", kind)) if !kind.is_empty() => Ok(Self::ByParent(kind.to_string())),
            _ => Err(ModelError::InvalidIdentityToken(token.to_string())),
        }
    }

    /// Renders the configuration token for this strategy.
    pub fn token(&self) -> String {
        match self {
            Self::ByKey => "key".to_string(),
            Self::ByProperty(name) => format!("property:{name}"),
            Self::ByParent(kind) => format!("parent:{kind}"),
        }
    }

    /// Extracts the identity of `entity`.
    ///
    /// `ByKey` never fails; a new entity has the empty identity.
    pub fn extract(&self, entity: &Entity) -> ModelResult<String> {
        match self {
            Self::ByKey => Ok(entity.identifier()),
            Self::ByProperty(name) => match entity.get(name) {
                Some(value) => value.as_str().map(str::to_string).ok_or_else(|| {
                    self.not_found(format!(
                        "property {name:?} is a {}, not a string",
                        value.type_name()
                    ))
                }),
                None => Err(self.not_found(format!("property {name:?} is absent"))),
            },
            Self::ByParent(kind) => entity
                .key
                .ancestors()
                .find(|ancestor| &ancestor.kind == kind)
                .map(|ancestor| ancestor.id_string())
                .ok_or_else(|| self.not_found(format!("no ancestor of kind {kind:?}"))),
        }
    }

    fn not_found(&self, reason: String) -> ModelError {
        ModelError::IdentityNotFound {
            strategy: self.token(),
            reason,
        }
    }
}

impl fmt::Display for IdentityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl FromStr for IdentityStrategy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}
