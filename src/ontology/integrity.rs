//! Referential integrity over the entity graph.
//!
//! The checker never fails by itself: it returns every dangling link so a
//! caller can print the full list in one pass and decide whether to exit.

use crate::ontology::model::EntityId;
use crate::ontology::store::EntityStore;
use serde::Serialize;
use std::fmt;

/// A link whose target id is not in the entity table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DanglingLink {
    pub source: EntityId,
    pub target: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

impl DanglingLink {
    /// `(source, missing target)` pair.
    pub fn pair(&self) -> (&str, &str) {
        (self.source.as_str(), self.target.as_str())
    }
}

impl fmt::Display for DanglingLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.source, self.target)
    }
}

/// Every dangling link, ordered by source id then link position.
pub fn check(entities: &EntityStore) -> Vec<DanglingLink> {
    let mut dangling = Vec::new();
    for entity in entities.iter() {
        for link in &entity.links {
            if !entities.contains(&link.to) {
                dangling.push(DanglingLink {
                    source: entity.id.clone(),
                    target: link.to.clone(),
                    relation: link.relation.clone(),
                });
            }
        }
    }
    dangling
}
