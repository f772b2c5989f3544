//! Resolves one `OP ARG0 [ARG1]` query against the ontology rule set.
//!
//! Loads the ontology documents (schema-checked) and `rules/expand.jsonl`,
//! runs first-match resolution with any `--have` capabilities, and prints
//! `{"op", "args", "result"}` as pretty JSON. An unmatched query prints
//! `"result": null` and still exits 0.

use anyhow::{Context, Result, bail};
use rosetta_shape_core::cli_support::{CommonArgs, init_tracing, utf8};
use rosetta_shape_core::{Capability, KnowledgeBase, Layout, Resolution, split_list};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::env;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse()?;
    let layout = Layout::resolve(&cli.common.overrides)?;
    let (kb, report) = KnowledgeBase::load(&layout, cli.common.policy)
        .with_context(|| format!("loading ontology from {}", layout.ontology_dir.display()))?;
    for skipped in report.skipped_documents.iter().chain(&report.skipped_rules) {
        eprintln!("rosetta-expand: warning: {skipped}");
    }

    let resolution = kb.resolve(&cli.op, &cli.args, &cli.have);
    let result = match resolution {
        Resolution::Match(rule) => json!({
            "then": rule.then,
            "why": rule.why,
            "rule": rule,
            "origin": rule.origin.to_string(),
            "load_order": rule.origin.ordinal,
        }),
        Resolution::NoMatch => Value::Null,
    };

    let mut output = json!({
        "op": cli.op,
        "args": cli.args,
        "result": result,
    });
    if cli.explain {
        let rejected: Vec<Value> = kb
            .diagnose(&cli.op, &cli.args, &cli.have)
            .into_iter()
            .map(|miss| {
                json!({
                    "rule": miss.rule,
                    "origin": miss.rule.origin.to_string(),
                    "load_order": miss.rule.origin.ordinal,
                    "missing": miss.missing,
                })
            })
            .collect();
        output["rejected"] = Value::Array(rejected);
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

struct Cli {
    op: String,
    args: Vec<String>,
    have: BTreeSet<Capability>,
    explain: bool,
    common: CommonArgs,
}

impl Cli {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1).peekable();
        let mut positional = Vec::new();
        let mut have = BTreeSet::new();
        let mut explain = false;
        let mut common = CommonArgs::default();

        while let Some(arg) = args.next() {
            let arg = utf8(arg)?;
            match arg.as_str() {
                "--have" => {
                    // Takes every following token up to the next flag.
                    while let Some(next) = args.peek() {
                        if next.to_str().is_some_and(|s| s.starts_with("--")) {
                            break;
                        }
                        let token = utf8(args.next().unwrap_or_default())?;
                        have.extend(split_list(&token).into_iter().map(Capability));
                    }
                }
                "--explain" => explain = true,
                "--help" | "-h" => usage(0),
                flag if flag.starts_with("--") => {
                    if !common.accept(flag, &mut args)? {
                        bail!("unknown argument: {flag}");
                    }
                }
                _ => positional.push(arg),
            }
        }

        if positional.len() < 2 {
            usage(1);
        }
        if positional.len() > 3 {
            bail!(
                "expected OP ARG0 [ARG1], got {} positional arguments",
                positional.len()
            );
        }
        let op = positional.remove(0);
        Ok(Self {
            op,
            args: positional,
            have,
            explain,
            common,
        })
    }
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: rosetta-expand OP ARG0 [ARG1] [--have CAP ...] [--explain] [--ontology DIR] [--rules PATH] [--schema PATH] [--lenient | --strict]\n\nOptions:\n  --have CAP ...     Extra capabilities that count toward rule guards.\n  --explain          List rules whose pattern matched but whose guard failed.\n  --ontology DIR     Ontology documents directory (or set ROSETTA_ONTOLOGY_DIR).\n  --rules PATH       Rules file (or set ROSETTA_RULES_PATH).\n  --schema PATH      Ontology schema (or set ROSETTA_SCHEMA_PATH).\n  --lenient          Skip invalid ontology documents instead of aborting.\n  --strict           Abort on the first invalid ontology document (default).\n  --help             Show this help text."
    );
    std::process::exit(code);
}
