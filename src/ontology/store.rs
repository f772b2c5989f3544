//! Entity table built from ontology source documents.
//!
//! Documents are processed in the order given (sorted by file name when a
//! directory is loaded). Each one is parsed, shape-checked, schema-validated,
//! and decoded before any of its entities are merged, so a rejected document
//! never leaves partial state behind. Colliding ids resolve last-writer-wins:
//! the entity from the later document (or the later record within one
//! document) replaces the earlier one.

use crate::error::LoadError;
use crate::ontology::model::{Capability, Entity, EntityId};
use crate::schema::SchemaValidator;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Raw ontology source: a display name plus its unparsed contents.
#[derive(Clone, Debug)]
pub struct SourceDocument {
    pub name: String,
    pub body: String,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }

    /// Read a document from disk; the handle is closed before returning.
    pub fn read(path: &Path) -> Result<Self, LoadError> {
        let io_err = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_err)?;
        let mut body = String::new();
        BufReader::new(file)
            .read_to_string(&mut body)
            .map_err(io_err)?;
        Ok(Self {
            name: path.display().to_string(),
            body,
        })
    }
}

/// What to do when a single document fails to parse or validate.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LoadPolicy {
    /// Abort the whole load on the first bad document. A half-loaded table
    /// could hide dangling links, so this is the default.
    #[default]
    Strict,
    /// Skip the bad document, log it, and report it in [`EntityLoad::skipped`].
    Lenient,
}

/// Result of a successful load: the table plus any documents skipped under
/// [`LoadPolicy::Lenient`].
#[derive(Debug)]
pub struct EntityLoad {
    pub store: EntityStore,
    pub skipped: Vec<LoadError>,
}

/// In-memory entity table keyed by id.
///
/// Built once per load and never mutated afterwards; reloading means building
/// a new store.
#[derive(Clone, Debug, Default)]
pub struct EntityStore {
    by_id: BTreeMap<EntityId, Entity>,
}

impl EntityStore {
    /// Build a store directly from entities, later ones overwriting earlier.
    pub fn from_entities<I: IntoIterator<Item = Entity>>(entities: I) -> Self {
        let mut by_id = BTreeMap::new();
        for entity in entities {
            by_id.insert(entity.id.clone(), entity);
        }
        Self { by_id }
    }

    /// Load and merge `sources` in order.
    pub fn load(
        sources: &[SourceDocument],
        validator: &SchemaValidator,
        policy: LoadPolicy,
    ) -> Result<EntityLoad, LoadError> {
        let mut by_id = BTreeMap::new();
        let mut skipped = Vec::new();

        for source in sources {
            match decode_document(source, validator) {
                Ok(entities) => {
                    tracing::debug!(
                        document = %source.name,
                        entities = entities.len(),
                        "merged ontology document"
                    );
                    for entity in entities {
                        if let Some(previous) = by_id.insert(entity.id.clone(), entity) {
                            tracing::debug!(
                                id = %previous.id,
                                document = %source.name,
                                "entity redefined; later definition wins"
                            );
                        }
                    }
                }
                Err(err) => match policy {
                    LoadPolicy::Strict => return Err(err),
                    LoadPolicy::Lenient => {
                        tracing::warn!(document = %source.name, "skipping document: {err}");
                        skipped.push(err);
                    }
                },
            }
        }

        Ok(EntityLoad {
            store: Self { by_id },
            skipped,
        })
    }

    /// Load every `*.json` file directly under `dir`, in file-name order.
    pub fn load_dir(
        dir: &Path,
        validator: &SchemaValidator,
        policy: LoadPolicy,
    ) -> Result<EntityLoad, LoadError> {
        let mut sources = Vec::new();
        let mut unreadable = Vec::new();
        for path in ontology_files(dir)? {
            match SourceDocument::read(&path) {
                Ok(doc) => sources.push(doc),
                Err(err) if policy == LoadPolicy::Lenient => {
                    tracing::warn!(document = %path.display(), "skipping document: {err}");
                    unreadable.push(err);
                }
                Err(err) => return Err(err),
            }
        }
        let mut load = Self::load(&sources, validator, policy)?;
        unreadable.append(&mut load.skipped);
        load.skipped = unreadable;
        Ok(load)
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Capability set of `id`; unknown ids yield an empty set.
    pub fn capabilities_of(&self, id: &EntityId) -> BTreeSet<Capability> {
        self.by_id
            .get(id)
            .map(|entity| entity.capabilities.clone())
            .unwrap_or_default()
    }

    /// Iterates entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.by_id.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.by_id.keys()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Sorted list of `*.json` files directly under `dir`.
pub fn ontology_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn decode_document(
    source: &SourceDocument,
    validator: &SchemaValidator,
) -> Result<Vec<Entity>, LoadError> {
    let value: Value = serde_json::from_str(&source.body).map_err(|err| {
        LoadError::malformed_document(&source.name, format!("invalid JSON: {err}"))
    })?;
    check_shape(&source.name, &value)?;
    validator.validate(&source.name, &value)?;

    // Shape and schema both passed; decode errors here mean a custom schema
    // admitted something the typed model cannot hold.
    let Value::Object(mut top) = value else {
        return Err(LoadError::malformed_document(
            &source.name,
            "top level must be an object",
        ));
    };
    let records = top.remove("entities").unwrap_or(Value::Array(Vec::new()));
    serde_json::from_value(records)
        .map_err(|err| LoadError::malformed_document(&source.name, format!("entities: {err}")))
}

/// Minimum shape before schema validation: an `entities` array whose records
/// are objects carrying an `id`. Value types are left to the schema so every
/// violation in the document is reported together.
fn check_shape(document: &str, value: &Value) -> Result<(), LoadError> {
    let Some(top) = value.as_object() else {
        return Err(LoadError::malformed_document(
            document,
            "top level must be an object",
        ));
    };
    let Some(entities) = top.get("entities") else {
        return Err(LoadError::malformed_document(
            document,
            "missing 'entities' list",
        ));
    };
    let Some(records) = entities.as_array() else {
        return Err(LoadError::malformed_document(
            document,
            "'entities' must be a list",
        ));
    };
    for (idx, record) in records.iter().enumerate() {
        if !record.is_object() {
            return Err(LoadError::malformed_document(
                document,
                format!("entities[{idx}] is not an object"),
            ));
        }
        if record.get("id").is_none() {
            return Err(LoadError::malformed_document(
                document,
                format!("entities[{idx}] has no 'id'"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> SchemaValidator {
        SchemaValidator::builtin().expect("builtin schema")
    }

    fn doc(name: &str, value: Value) -> SourceDocument {
        SourceDocument::new(name, value.to_string())
    }

    #[test]
    fn later_source_overwrites_colliding_id() {
        let sources = vec![
            doc(
                "a.json",
                json!({"entities": [{"id": "X", "capabilities": ["old"]}, {"id": "Y"}]}),
            ),
            doc(
                "b.json",
                json!({"entities": [{"id": "X", "capabilities": ["new"]}]}),
            ),
        ];
        let load = EntityStore::load(&sources, &validator(), LoadPolicy::Strict).unwrap();
        assert!(load.skipped.is_empty());
        assert_eq!(load.store.len(), 2);
        let caps = load.store.capabilities_of(&EntityId::from("X"));
        assert_eq!(caps, BTreeSet::from([Capability::from("new")]));
    }

    #[test]
    fn later_record_in_same_document_wins() {
        let sources = vec![doc(
            "a.json",
            json!({"entities": [{"id": "X", "label": "first"}, {"id": "X", "label": "second"}]}),
        )];
        let load = EntityStore::load(&sources, &validator(), LoadPolicy::Strict).unwrap();
        let entity = load.store.get(&EntityId::from("X")).unwrap();
        assert_eq!(entity.extra.get("label"), Some(&json!("second")));
    }

    #[test]
    fn strict_aborts_on_unparseable_document() {
        let sources = vec![
            doc("good.json", json!({"entities": [{"id": "A"}]})),
            SourceDocument::new("broken.json", "{ entities: ["),
        ];
        let err = EntityStore::load(&sources, &validator(), LoadPolicy::Strict)
            .expect_err("broken JSON should abort");
        assert!(matches!(
            err,
            LoadError::MalformedDocument { ref document, .. } if document == "broken.json"
        ));
    }

    #[test]
    fn record_without_id_is_malformed() {
        let sources = vec![doc(
            "noid.json",
            json!({"entities": [{"id": "A"}, {"capabilities": []}]}),
        )];
        let err = EntityStore::load(&sources, &validator(), LoadPolicy::Strict).unwrap_err();
        let LoadError::MalformedDocument { detail, .. } = err else {
            panic!("expected MalformedDocument");
        };
        assert!(detail.contains("entities[1]"), "{detail}");
    }

    #[test]
    fn mistyped_id_is_reported_with_other_violations() {
        let sources = vec![doc(
            "d.json",
            json!({"entities": [{"id": 7}, {"id": "has space"}, {"id": "B", "kind": "robot"}]}),
        )];
        let err = EntityStore::load(&sources, &validator(), LoadPolicy::Strict).unwrap_err();
        let LoadError::SchemaViolation { violations, .. } = err else {
            panic!("expected SchemaViolation");
        };
        assert_eq!(violations.len(), 3, "{violations:?}");
        assert!(violations.iter().any(|v| v.starts_with("/entities/0/id")));
        assert!(violations.iter().any(|v| v.starts_with("/entities/1/id")));
        assert!(violations.iter().any(|v| v.starts_with("/entities/2/kind")));
    }

    #[test]
    fn missing_entities_list_is_malformed() {
        let sources = vec![doc("empty.json", json!({"shapes": []}))];
        let err = EntityStore::load(&sources, &validator(), LoadPolicy::Strict).unwrap_err();
        assert!(matches!(err, LoadError::MalformedDocument { .. }));
    }

    #[test]
    fn strict_aborts_on_schema_violation() {
        let sources = vec![doc(
            "kinds.json",
            json!({"entities": [{"id": "A", "kind": "spaceship", "capabilities": [""]}]}),
        )];
        let err = EntityStore::load(&sources, &validator(), LoadPolicy::Strict).unwrap_err();
        let LoadError::SchemaViolation {
            document,
            violations,
        } = err
        else {
            panic!("expected SchemaViolation");
        };
        assert_eq!(document, "kinds.json");
        assert_eq!(violations.len(), 2, "{violations:?}");
    }

    #[test]
    fn lenient_skips_bad_document_and_reports_it() {
        let sources = vec![
            doc("a.json", json!({"entities": [{"id": "A"}]})),
            doc("bad.json", json!({"entities": [{"id": "B", "links": "C"}]})),
            doc("c.json", json!({"entities": [{"id": "C"}]})),
        ];
        let load = EntityStore::load(&sources, &validator(), LoadPolicy::Lenient).unwrap();
        let ids: Vec<&str> = load.store.ids().map(EntityId::as_str).collect();
        assert_eq!(ids, vec!["A", "C"]);
        assert_eq!(load.skipped.len(), 1);
        assert_eq!(load.skipped[0].origin(), Some("bad.json"));
    }

    #[test]
    fn unknown_id_has_no_capabilities() {
        let store = EntityStore::from_entities([Entity::new("A").with_capabilities(["flies"])]);
        assert!(store.capabilities_of(&EntityId::from("Q")).is_empty());
        assert!(store.contains(&EntityId::from("A")));
        assert!(!store.is_empty());
    }

    #[test]
    fn load_dir_reads_json_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("20_late.json"),
            json!({"entities": [{"id": "X", "label": "late"}]}).to_string(),
        )
        .unwrap();
        fs::write(
            dir.path().join("10_early.json"),
            json!({"entities": [{"id": "X", "label": "early"}, {"id": "Y"}]}).to_string(),
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not an ontology").unwrap();

        let load = EntityStore::load_dir(dir.path(), &validator(), LoadPolicy::Strict).unwrap();
        assert_eq!(load.store.len(), 2);
        let x = load.store.get(&EntityId::from("X")).unwrap();
        assert_eq!(x.extra.get("label"), Some(&json!("late")));
    }

    #[test]
    fn load_dir_on_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EntityStore::load_dir(&dir.path().join("nope"), &validator(), LoadPolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
