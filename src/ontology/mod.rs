//! Ontology entities: typed model, the merged entity table, and the
//! referential integrity check that runs over it.

pub mod integrity;
pub mod model;
pub mod store;

pub use integrity::{DanglingLink, check};
pub use model::{Capability, Entity, EntityId, Link};
pub use store::{EntityLoad, EntityStore, LoadPolicy, SourceDocument, ontology_files};
