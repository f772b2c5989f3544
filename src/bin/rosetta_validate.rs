//! Validates the ontology: schema-checks every document, then verifies that
//! every link points at a loaded entity.
//!
//! Prints `Ontology OK` on success. Dangling links are listed one per line on
//! stderr (`- SOURCE → TARGET`) and the process exits 1. Malformed rule
//! records are reported as warnings and do not change the exit status.

use anyhow::{Context, Result, bail};
use rosetta_shape_core::cli_support::{CommonArgs, init_tracing, utf8};
use rosetta_shape_core::{KnowledgeBase, Layout};
use std::env;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let common = parse_args()?;
    let layout = Layout::resolve(&common.overrides)?;
    let (kb, report) = KnowledgeBase::load(&layout, common.policy)
        .with_context(|| format!("validating {}", layout.ontology_dir.display()))?;

    for skipped in &report.skipped_documents {
        eprintln!("rosetta-validate: skipped document: {skipped}");
    }
    for skipped in &report.skipped_rules {
        eprintln!("rosetta-validate: warning: {skipped}");
    }

    let dangling = kb.check_integrity();
    if !dangling.is_empty() {
        let lines = dangling
            .iter()
            .map(|link| format!("- {link}"))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Referential integrity failed:\n{lines}");
    }

    println!("Ontology OK");
    Ok(())
}

fn parse_args() -> Result<CommonArgs> {
    let mut args = env::args_os().skip(1);
    let mut common = CommonArgs::default();
    while let Some(arg) = args.next() {
        let arg = utf8(arg)?;
        match arg.as_str() {
            "--help" | "-h" => usage(0),
            other => {
                if !common.accept(other, &mut args)? {
                    bail!("unknown argument: {other}");
                }
            }
        }
    }
    Ok(common)
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: rosetta-validate [--ontology DIR] [--rules PATH] [--schema PATH] [--lenient | --strict]\n\nOptions:\n  --ontology DIR     Ontology documents directory (or set ROSETTA_ONTOLOGY_DIR).\n  --rules PATH       Rules file to lint (or set ROSETTA_RULES_PATH).\n  --schema PATH      Ontology schema (or set ROSETTA_SCHEMA_PATH).\n  --lenient          Skip invalid documents instead of aborting.\n  --strict           Abort on the first invalid document (default).\n  --help             Show this help text."
    );
    std::process::exit(code);
}
