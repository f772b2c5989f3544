//! Where ontology documents, the rules file, and the schema live.
//!
//! Defaults hang off the project root (`ontology/`, `rules/expand.jsonl`,
//! `schema/core.schema.json`). Each path can be overridden from the
//! environment, and binaries apply their CLI flags on top of that.

use crate::find_repo_root;
use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

pub const ONTOLOGY_DIR: &str = "ontology";
pub const RULES_FILE: &str = "rules/expand.jsonl";
pub const SCHEMA_FILE: &str = "schema/core.schema.json";

pub const ONTOLOGY_DIR_ENV: &str = "ROSETTA_ONTOLOGY_DIR";
pub const RULES_PATH_ENV: &str = "ROSETTA_RULES_PATH";
pub const SCHEMA_PATH_ENV: &str = "ROSETTA_SCHEMA_PATH";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub ontology_dir: PathBuf,
    pub rules_path: PathBuf,
    pub schema_path: PathBuf,
}

/// Explicit path choices, typically from command-line flags.
#[derive(Clone, Debug, Default)]
pub struct LayoutOverrides {
    pub ontology_dir: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
    pub schema_path: Option<PathBuf>,
}

impl Layout {
    /// Default layout under `root`.
    pub fn from_root(root: &Path) -> Self {
        Self {
            ontology_dir: root.join(ONTOLOGY_DIR),
            rules_path: root.join(RULES_FILE),
            schema_path: root.join(SCHEMA_FILE),
        }
    }

    /// Resolve the layout: overrides, then environment, then root defaults.
    ///
    /// The root is only discovered when some path still needs it, so fully
    /// overridden invocations work outside a checkout.
    pub fn resolve(overrides: &LayoutOverrides) -> Result<Self> {
        let ontology_dir = pick(overrides.ontology_dir.as_ref(), ONTOLOGY_DIR_ENV);
        let rules_path = pick(overrides.rules_path.as_ref(), RULES_PATH_ENV);
        let schema_path = pick(overrides.schema_path.as_ref(), SCHEMA_PATH_ENV);

        if let (Some(ontology_dir), Some(rules_path), Some(schema_path)) =
            (&ontology_dir, &rules_path, &schema_path)
        {
            return Ok(Self {
                ontology_dir: ontology_dir.clone(),
                rules_path: rules_path.clone(),
                schema_path: schema_path.clone(),
            });
        }

        let defaults = Self::from_root(&find_repo_root()?);
        Ok(Self {
            ontology_dir: ontology_dir.unwrap_or(defaults.ontology_dir),
            rules_path: rules_path.unwrap_or(defaults.rules_path),
            schema_path: schema_path.unwrap_or(defaults.schema_path),
        })
    }
}

fn pick(explicit: Option<&PathBuf>, env_key: &str) -> Option<PathBuf> {
    explicit.cloned().or_else(|| {
        env::var_os(env_key)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    })
}
