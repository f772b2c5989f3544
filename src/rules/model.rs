//! Rule records: a `when` pattern, an optional capability guard, a priority,
//! and the opaque `then` payload handed back on a match.

use crate::ontology::Capability;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
/// Operation plus positional arguments a query must equal exactly.
pub struct Pattern {
    pub op: String,
    pub args: Vec<String>,
}

impl Pattern {
    /// Exact match: same op, same arguments in the same order and arity.
    pub fn matches(&self, op: &str, args: &[String]) -> bool {
        self.op == op && self.args.as_slice() == args
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.op, self.args.join(", "))
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
/// Capabilities the subject must hold (directly or via caller extras).
pub struct Guard {
    #[serde(default)]
    pub requires: BTreeSet<Capability>,
}

impl Guard {
    pub fn is_satisfied_by(&self, effective: &BTreeSet<Capability>) -> bool {
        self.requires.is_subset(effective)
    }

    /// Required capabilities absent from `effective`, in sorted order.
    pub fn missing(&self, effective: &BTreeSet<Capability>) -> Vec<Capability> {
        self.requires.difference(effective).cloned().collect()
    }
}

/// Where a rule was read from and its position in load order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RuleOrigin {
    pub source: String,
    /// 1-based line (NDJSON) or array element (JSON array).
    pub line: usize,
    /// 0-based index among the rules that loaded successfully. Breaks
    /// priority ties and is reported as `load_order` by `rosetta-expand`.
    pub ordinal: usize,
}

impl fmt::Display for RuleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// One transformation rule. Read-only once loaded.
pub struct Rule {
    pub when: Pattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<Guard>,
    #[serde(default)]
    pub priority: i64,
    pub then: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why: Option<String>,
    #[serde(skip)]
    pub origin: RuleOrigin,
}

impl Rule {
    pub fn new(op: &str, args: &[&str], priority: i64, then: Value) -> Self {
        Self {
            when: Pattern {
                op: op.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
            },
            guard: None,
            priority,
            then,
            why: None,
            origin: RuleOrigin::default(),
        }
    }

    pub fn with_guard<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guard = Some(Guard {
            requires: requires
                .into_iter()
                .map(|c| Capability(c.into()))
                .collect(),
        });
        self
    }

    pub fn with_why(mut self, why: &str) -> Self {
        self.why = Some(why.to_string());
        self
    }

    /// True when the guard is absent or fully covered by `effective`.
    pub fn guard_allows(&self, effective: &BTreeSet<Capability>) -> bool {
        self.guard
            .as_ref()
            .is_none_or(|guard| guard.is_satisfied_by(effective))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn caps(items: &[&str]) -> BTreeSet<Capability> {
        items.iter().map(|c| Capability::from(*c)).collect()
    }

    #[test]
    fn pattern_is_order_and_arity_sensitive() {
        let pattern = Pattern {
            op: "ALIGN".to_string(),
            args: vec!["A".to_string(), "B".to_string()],
        };
        let ab = vec!["A".to_string(), "B".to_string()];
        let ba = vec!["B".to_string(), "A".to_string()];
        let a = vec!["A".to_string()];
        let abc = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert!(pattern.matches("ALIGN", &ab));
        assert!(!pattern.matches("ALIGN", &ba));
        assert!(!pattern.matches("ALIGN", &a));
        assert!(!pattern.matches("ALIGN", &abc));
        assert!(!pattern.matches("align", &ab));
        assert_eq!(pattern.to_string(), "ALIGN(A, B)");
    }

    #[test]
    fn guard_requires_superset() {
        let rule = Rule::new("LIFT", &["A"], 1, json!("ok")).with_guard(["flies", "light"]);
        assert!(!rule.guard_allows(&caps(&["flies"])));
        assert!(rule.guard_allows(&caps(&["flies", "light", "fast"])));
        let guard = rule.guard.as_ref().unwrap();
        assert_eq!(guard.missing(&caps(&["light"])), vec![Capability::from("flies")]);
    }

    #[test]
    fn empty_guard_always_allows() {
        let rule = Rule::new("LIFT", &["A"], 1, json!("ok")).with_guard(Vec::<String>::new());
        assert!(rule.guard_allows(&BTreeSet::new()));
        assert!(Rule::new("LIFT", &["A"], 1, json!("ok")).guard_allows(&BTreeSet::new()));
    }

    #[test]
    fn serializes_without_origin() {
        let rule = Rule::new("EXPAND", &["HEX"], 3, json!({"pattern": "lattice"})).with_why("tiles");
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            value,
            json!({
                "when": {"op": "EXPAND", "args": ["HEX"]},
                "priority": 3,
                "then": {"pattern": "lattice"},
                "why": "tiles"
            })
        );
    }
}
