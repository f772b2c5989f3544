//! Load-time failures for ontology documents, schemas, and rule sources.
//!
//! Every variant names the offending source so callers can print the error
//! as-is. Dangling links and unmatched queries are deliberately absent: they
//! are reported as data (`DanglingLink`, `Resolution::NoMatch`), not errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    /// The source could not be parsed into `{ "entities": [ { "id": ... } ] }`.
    #[error("malformed document {document}: {detail}")]
    MalformedDocument { document: String, detail: String },

    /// The document parsed but broke one or more schema constraints.
    #[error(
        "document {document} failed schema validation ({} violation(s)):\n{}",
        .violations.len(),
        format_violations(.violations)
    )]
    SchemaViolation {
        document: String,
        violations: Vec<String>,
    },

    /// One rule record was unusable; the rest of the rule source still loads.
    #[error("malformed rule at {origin}:{line}: {detail}")]
    MalformedRule {
        origin: String,
        line: usize,
        detail: String,
    },

    #[error("unable to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The schema file itself could not be read, parsed, or compiled.
    #[error("unable to load schema {}: {detail}", .path.display())]
    Schema { path: PathBuf, detail: String },
}

impl LoadError {
    pub(crate) fn malformed_document(document: &str, detail: impl Into<String>) -> Self {
        LoadError::MalformedDocument {
            document: document.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn malformed_rule(origin: &str, line: usize, detail: impl Into<String>) -> Self {
        LoadError::MalformedRule {
            origin: origin.to_string(),
            line,
            detail: detail.into(),
        }
    }

    /// Name of the document or rule source the error refers to, if any.
    pub fn origin(&self) -> Option<&str> {
        match self {
            LoadError::MalformedDocument { document, .. }
            | LoadError::SchemaViolation { document, .. } => Some(document),
            LoadError::MalformedRule { origin, .. } => Some(origin),
            LoadError::Io { .. } | LoadError::Schema { .. } => None,
        }
    }
}

fn format_violations(violations: &[String]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_violation_lists_every_failure() {
        let err = LoadError::SchemaViolation {
            document: "ontology/bad.json".to_string(),
            violations: vec![
                "/entities/0/id: 5 is not of type \"string\"".to_string(),
                "/entities/1: \"id\" is a required property".to_string(),
            ],
        };
        let rendered = err.to_string();
        assert!(rendered.contains("ontology/bad.json"));
        assert!(rendered.contains("2 violation(s)"));
        assert!(rendered.contains("/entities/0/id"));
        assert!(rendered.contains("/entities/1"));
        assert_eq!(err.origin(), Some("ontology/bad.json"));
    }

    #[test]
    fn malformed_rule_names_source_and_line() {
        let err = LoadError::malformed_rule("rules/expand.jsonl", 7, "missing when.op");
        assert_eq!(
            err.to_string(),
            "malformed rule at rules/expand.jsonl:7: missing when.op"
        );
    }
}
