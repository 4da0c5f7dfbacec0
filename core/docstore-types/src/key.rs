//! Entity keys and their ancestor chain.
//!
//! A key is `(kind, identifier, namespace)` plus an optional parent key.
//! Each key owns its parent, so the chain is singly linked and acyclic.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The leaf identifier of a key: a numeric id or a string name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyId {
    Id(i64),
    Name(String),
}

impl KeyId {
    /// Parses an identifier as it appears in snapshot files.
    ///
    /// Anything that parses as an `i64` becomes a numeric id, everything
    /// else is a name.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(id) => Self::Id(id),
            Err(_) => Self::Name(s.to_string()),
        }
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// A key identifying one entity in the store.
///
/// `id == None` marks an incomplete key: the store assigns an identifier
/// when the entity is first written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub kind: String,
    pub id: Option<KeyId>,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<EntityKey>>,
}

impl EntityKey {
    /// Creates a key with an explicit (possibly absent) identifier.
    pub fn new(kind: impl Into<String>, id: Option<KeyId>, namespace: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id,
            namespace: namespace.into(),
            parent: None,
        }
    }

    /// Shorthand for a key with a numeric id.
    pub fn with_id(kind: impl Into<String>, id: i64, namespace: impl Into<String>) -> Self {
        Self::new(kind, Some(KeyId::Id(id)), namespace)
    }

    /// Shorthand for a key with a string name.
    pub fn with_name(
        kind: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self::new(kind, Some(KeyId::Name(name.into())), namespace)
    }

    /// Shorthand for an incomplete key.
    pub fn incomplete(kind: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self::new(kind, None, namespace)
    }

    /// Builds a key from a root-first path of `(kind, id)` segments.
    ///
    /// Every segment shares `namespace`. Only the last segment may have no id.
    pub fn from_path(
        namespace: &str,
        path: impl IntoIterator<Item = (String, Option<KeyId>)>,
    ) -> Result<Self> {
        let mut current: Option<EntityKey> = None;
        for (kind, id) in path {
            if kind.is_empty() {
                return Err(Error::InvalidKeyPath("empty kind in key path".into()));
            }
            if let Some(parent) = &current {
                if parent.id.is_none() {
                    return Err(Error::InvalidKeyPath(format!(
                        "ancestor {} has no identifier",
                        parent.kind
                    )));
                }
            }
            let key = EntityKey::new(kind, id, namespace);
            current = Some(match current {
                Some(parent) => key.with_parent(parent),
                None => key,
            });
        }
        current.ok_or_else(|| Error::InvalidKeyPath("empty key path".into()))
    }

    /// Returns this key with `parent` attached as its direct ancestor.
    #[must_use]
    pub fn with_parent(mut self, parent: EntityKey) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Whether the key carries an identifier.
    pub fn is_complete(&self) -> bool {
        self.id.is_some()
    }

    /// The leaf identifier rendered as a string, or `""` for an incomplete key.
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(ToString::to_string).unwrap_or_default()
    }

    /// The direct parent, if any.
    pub fn parent(&self) -> Option<&EntityKey> {
        self.parent.as_deref()
    }

    /// Iterates over the ancestors, nearest first. Ends at the root.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            next: self.parent(),
        }
    }

    /// The root-first path of `(kind, id)` segments, including this key.
    pub fn path(&self) -> Vec<(&str, Option<&KeyId>)> {
        let mut path: Vec<_> = std::iter::once(self)
            .chain(self.ancestors())
            .map(|k| (k.kind.as_str(), k.id.as_ref()))
            .collect();
        path.reverse();
        path
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (kind, id)) in self.path().into_iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match id {
                Some(id) => write!(f, "{kind},{id}")?,
                None => write!(f, "{kind},<incomplete>")?,
            }
        }
        Ok(())
    }
}

/// Iterator over a key's ancestor chain.
pub struct Ancestors<'a> {
    next: Option<&'a EntityKey>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a EntityKey;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}
