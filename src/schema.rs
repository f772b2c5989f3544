//! JSON Schema gate for ontology documents.
//!
//! Every ontology source is checked against `schema/core.schema.json` before
//! its entities are merged. The schema ships embedded in the crate so the
//! binaries still validate when the on-disk copy is missing; an explicit path
//! always wins when it exists.

use crate::error::LoadError;
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Embedded copy of the ontology document schema.
pub const BUILTIN_SCHEMA: &str = include_str!("../schema/core.schema.json");

/// Label used in errors when the embedded schema is in play.
const BUILTIN_SCHEMA_LABEL: &str = "<builtin core.schema.json>";

/// Compiled ontology schema plus the location it was loaded from.
pub struct SchemaValidator {
    compiled: JSONSchema,
    origin: PathBuf,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("origin", &self.origin)
            .finish()
    }
}

impl SchemaValidator {
    /// Read and compile a schema file from disk.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: Value =
            serde_json::from_reader(BufReader::new(file)).map_err(|err| LoadError::Schema {
                path: path.to_path_buf(),
                detail: format!("invalid JSON: {err}"),
            })?;
        Self::compile(&raw, path.to_path_buf())
    }

    /// Compile the schema embedded at build time.
    pub fn builtin() -> Result<Self, LoadError> {
        let origin = PathBuf::from(BUILTIN_SCHEMA_LABEL);
        let raw: Value = serde_json::from_str(BUILTIN_SCHEMA).map_err(|err| LoadError::Schema {
            path: origin.clone(),
            detail: format!("invalid JSON: {err}"),
        })?;
        Self::compile(&raw, origin)
    }

    /// Use `path` when it exists, otherwise fall back to the embedded schema.
    pub fn load_or_builtin(path: &Path) -> Result<Self, LoadError> {
        if path.is_file() {
            Self::load(path)
        } else {
            tracing::debug!(
                schema = %path.display(),
                "schema file not found; using embedded copy"
            );
            Self::builtin()
        }
    }

    fn compile(raw: &Value, origin: PathBuf) -> Result<Self, LoadError> {
        // Compile errors borrow the schema value, so flatten them to text here.
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(raw)
            .map_err(|err| LoadError::Schema {
                path: origin.clone(),
                detail: err.to_string(),
            })?;
        Ok(Self { compiled, origin })
    }

    /// Where the schema came from (a path, or the builtin label).
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Validate one parsed document.
    ///
    /// Collects every constraint failure instead of stopping at the first so
    /// the report for a bad document is complete in one pass.
    pub fn validate(&self, document: &str, value: &Value) -> Result<(), LoadError> {
        let violations = self.violations(value);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(LoadError::SchemaViolation {
                document: document.to_string(),
                violations,
            })
        }
    }

    /// Each failure rendered as `<instance path>: <message>`.
    pub fn violations(&self, value: &Value) -> Vec<String> {
        match self.compiled.validate(value) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|err| {
                    let pointer = err.instance_path.to_string();
                    let location = if pointer.is_empty() { "/" } else { &pointer };
                    format!("{location}: {err}")
                })
                .collect(),
        }
    }
}
