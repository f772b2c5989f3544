//! Priority-ordered rule collection.
//!
//! Rules are advisory content: a bad record is logged and skipped while the
//! rest of the source keeps loading. The final order is priority descending,
//! and equal priorities keep their load order (the sort is stable), so the
//! first-loaded rule wins a tie on every run.

use crate::error::LoadError;
use crate::ontology::SourceDocument;
use crate::rules::model::{Rule, RuleOrigin};
use serde_json::Value;
use std::path::Path;

/// Ordered, read-only rule set.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

/// Rules that loaded plus the records that were skipped.
#[derive(Debug)]
pub struct RuleLoad {
    pub rules: RuleSet,
    pub skipped: Vec<LoadError>,
}

impl RuleSet {
    /// Order `rules` by priority, keeping the given order among equals.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        let mut rules = rules;
        for (ordinal, rule) in rules.iter_mut().enumerate() {
            rule.origin.ordinal = ordinal;
        }
        sort_by_priority(&mut rules);
        Self { rules }
    }

    /// Parse a rule source: NDJSON, a JSON array of records, or one record.
    pub fn load(source: &SourceDocument) -> RuleLoad {
        let mut rules = Vec::new();
        let mut skipped = Vec::new();

        for (line, record) in split_records(&source.body) {
            let parsed = record
                .map_err(|detail| LoadError::malformed_rule(&source.name, line, detail))
                .and_then(|value| decode_rule(&source.name, line, value));
            match parsed {
                Ok(mut rule) => {
                    rule.origin = RuleOrigin {
                        source: source.name.clone(),
                        line,
                        ordinal: rules.len(),
                    };
                    rules.push(rule);
                }
                Err(err) => {
                    tracing::warn!("skipping rule: {err}");
                    skipped.push(err);
                }
            }
        }

        sort_by_priority(&mut rules);
        tracing::debug!(
            source = %source.name,
            loaded = rules.len(),
            skipped = skipped.len(),
            "loaded rules"
        );
        RuleLoad {
            rules: Self { rules },
            skipped,
        }
    }

    /// Load rules from `path`. A missing file is an empty rule set.
    pub fn load_path(path: &Path) -> Result<RuleLoad, LoadError> {
        if !path.exists() {
            tracing::debug!(rules = %path.display(), "no rules file; rule set is empty");
            return Ok(RuleLoad {
                rules: Self::default(),
                skipped: Vec::new(),
            });
        }
        let source = SourceDocument::read(path)?;
        Ok(Self::load(&source))
    }

    /// Rules in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn sort_by_priority(rules: &mut [Rule]) {
    // `sort_by` is stable; equal priorities stay in load order.
    rules.sort_by(|a, b| b.priority.cmp(&a.priority));
}

/// Split a rule source into `(position, record)` pairs.
///
/// A body that parses as a whole is an array of records or a single record;
/// anything else is read as NDJSON with 1-based line numbers, skipping blank
/// lines. A body opening with `[` is always an array, so a syntax error there
/// is one failure at serde's reported line.
fn split_records(body: &str) -> Vec<(usize, Result<Value, String>)> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => {
            return items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| (idx + 1, Ok(item)))
                .collect();
        }
        Ok(other) => return vec![(1, Ok(other))],
        Err(err) if trimmed.starts_with('[') => {
            return vec![(err.line(), Err(format!("invalid JSON array: {err}")))];
        }
        Err(_) => {}
    }

    body.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let record = serde_json::from_str::<Value>(line.trim())
                .map_err(|err| format!("invalid JSON: {err}"));
            (idx + 1, record)
        })
        .collect()
}

fn decode_rule(origin: &str, line: usize, value: Value) -> Result<Rule, LoadError> {
    if !value.is_object() {
        return Err(LoadError::malformed_rule(
            origin,
            line,
            "record is not an object",
        ));
    }
    if value.pointer("/when/op").and_then(Value::as_str).is_none() {
        return Err(LoadError::malformed_rule(origin, line, "missing when.op"));
    }
    if value.get("then").is_none() {
        return Err(LoadError::malformed_rule(origin, line, "missing then"));
    }
    serde_json::from_value(value)
        .map_err(|err| LoadError::malformed_rule(origin, line, err.to_string()))
}
