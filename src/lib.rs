//! Shared library for the rosetta shape ontology tools.
//!
//! The crate loads ontology documents into an entity table, validates them
//! against the core schema, checks that every link resolves, and answers
//! `op(args)` queries through a priority-ordered, capability-guarded rule set.
//! The `rosetta-expand` and `rosetta-validate` binaries are thin front ends
//! over these modules.

use anyhow::{Result, bail};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub mod cli_support;
pub mod error;
pub mod layout;
pub mod ontology;
pub mod rules;
pub mod schema;
pub mod snapshot;

pub use error::LoadError;
pub use layout::{Layout, LayoutOverrides};
pub use ontology::{
    Capability, DanglingLink, Entity, EntityId, EntityLoad, EntityStore, Link, LoadPolicy,
    SourceDocument, check,
};
pub use rules::{GuardMiss, Pattern, Resolution, Rule, RuleLoad, RuleSet};
pub use schema::SchemaValidator;
pub use snapshot::{KnowledgeBase, LoadReport, SharedKnowledgeBase};

const ROOT_SCHEMA: &str = "schema/core.schema.json";
const ROOT_ONTOLOGY_DIR: &str = "ontology";

/// Returns true when `candidate` looks like a project root.
fn is_repo_root(candidate: &Path) -> bool {
    candidate.join(ROOT_SCHEMA).is_file() && candidate.join(ROOT_ONTOLOGY_DIR).is_dir()
}

fn repo_root_from_hint(hint: &str) -> Option<PathBuf> {
    if hint.is_empty() {
        return None;
    }
    let hint_path = PathBuf::from(hint);
    if !is_repo_root(&hint_path) {
        return None;
    }
    fs::canonicalize(hint_path).ok()
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        if is_repo_root(&dir) {
            return Some(dir);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the project root.
///
/// Honors `ROSETTA_ROOT` when it points at a real root, then climbs up from
/// the current executable, then tries the build-time hint, and finally the
/// current directory and its parents.
pub fn find_repo_root() -> Result<PathBuf> {
    if let Ok(env_root) = env::var("ROSETTA_ROOT") {
        if let Some(root) = repo_root_from_hint(&env_root) {
            return Ok(root);
        }
    }

    if let Ok(exe_path) = env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            if let Some(root) = search_upwards(exe_dir) {
                return Ok(root);
            }
        }
    }

    if let Some(hint) = option_env!("ROSETTA_ROOT_HINT") {
        if let Some(root) = repo_root_from_hint(hint) {
            return Ok(root);
        }
    }

    if let Ok(cwd) = env::current_dir() {
        if let Some(root) = search_upwards(&cwd) {
            return Ok(root);
        }
    }

    bail!(
        "Unable to locate the ontology root (a directory with {ROOT_ONTOLOGY_DIR}/ and {ROOT_SCHEMA}). Set ROSETTA_ROOT or pass explicit paths."
    );
}

/// Split comma- or whitespace-delimited lists into tokens.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
