#![allow(dead_code)]

use anyhow::{Context, Result};
use rosetta_shape_core::schema::BUILTIN_SCHEMA;
use rosetta_shape_core::{Layout, SourceDocument};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Throwaway project root with `ontology/`, `rules/`, and `schema/`.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("allocate fixture dir");
        fs::create_dir_all(dir.path().join("ontology")).expect("create ontology dir");
        fs::create_dir_all(dir.path().join("rules")).expect("create rules dir");
        fs::create_dir_all(dir.path().join("schema")).expect("create schema dir");
        fs::write(dir.path().join("schema/core.schema.json"), BUILTIN_SCHEMA)
            .expect("write schema");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn layout(&self) -> Layout {
        Layout::from_root(self.root())
    }

    pub fn write_ontology(&self, name: &str, doc: &Value) -> PathBuf {
        let path = self.root().join("ontology").join(name);
        fs::write(&path, serde_json::to_string_pretty(doc).expect("encode doc"))
            .expect("write ontology doc");
        path
    }

    pub fn write_ontology_raw(&self, name: &str, body: &str) -> PathBuf {
        let path = self.root().join("ontology").join(name);
        fs::write(&path, body).expect("write ontology doc");
        path
    }

    pub fn write_rules(&self, records: &[Value]) -> PathBuf {
        let body = records
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        self.write_rules_raw(&body)
    }

    pub fn write_rules_raw(&self, body: &str) -> PathBuf {
        let path = self.root().join("rules/expand.jsonl");
        fs::write(&path, body).expect("write rules");
        path
    }
}

pub fn doc(name: &str, value: &Value) -> SourceDocument {
    SourceDocument::new(name, value.to_string())
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Run a crate binary against `fixture`, returning its raw output.
pub fn run_bin(bin: &str, fixture: &Fixture, args: &[&str]) -> Result<Output> {
    let mut cmd = Command::new(bin);
    cmd.args(args)
        .env("ROSETTA_ROOT", fixture.root())
        .env_remove("ROSETTA_ONTOLOGY_DIR")
        .env_remove("ROSETTA_RULES_PATH")
        .env_remove("ROSETTA_SCHEMA_PATH")
        .env_remove("RUST_LOG");
    cmd.output()
        .with_context(|| format!("failed to run command: {:?}", cmd))
}

pub fn stdout_json(output: &Output) -> Result<Value> {
    serde_json::from_slice(&output.stdout).with_context(|| {
        format!(
            "stdout is not JSON:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}
