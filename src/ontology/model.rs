//! Typed view of ontology entities.
//!
//! Only `id`, `capabilities`, and `links` mean anything to the engine. Every
//! other field is carried through untouched in `extra` so documents can grow
//! new descriptive fields without a code change.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Stable identifier of an ontology entity (e.g., `SHAPE.HEX`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

/// Capability tag an entity carries or a rule guard requires.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(pub String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Capability {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId(value.to_string())
    }
}

impl From<&str> for Capability {
    fn from(value: &str) -> Self {
        Capability(value.to_string())
    }
}

impl From<String> for Capability {
    fn from(value: String) -> Self {
        Capability(value)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// One ontology entity as loaded from a source document.
pub struct Entity {
    pub id: EntityId,
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
    #[serde(default)]
    pub links: Vec<Link>,
    /// Descriptive fields the engine never inspects (`label`, `kind`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// Directed edge from the owning entity to `to`.
pub struct Link {
    pub to: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: EntityId(id.into()),
            capabilities: BTreeSet::new(),
            links: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, caps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities
            .extend(caps.into_iter().map(|c| Capability(c.into())));
        self
    }

    pub fn with_link(mut self, to: impl Into<String>, relation: Option<&str>) -> Self {
        self.links.push(Link {
            to: EntityId(to.into()),
            relation: relation.map(str::to_string),
            extra: Map::new(),
        });
        self
    }

    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }
}
