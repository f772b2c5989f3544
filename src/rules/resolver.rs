//! First-match rule resolution.
//!
//! The subject of a query is `args[0]`. Its capabilities (empty when the
//! subject is not a known entity) plus the caller's extra capabilities form
//! the effective set that guards are checked against. Rules are scanned in
//! priority order and the first whose pattern and guard both match wins;
//! there is no scoring among equal-priority matches, load order decides.

use crate::ontology::{Capability, EntityId, EntityStore};
use crate::rules::model::Rule;
use crate::rules::store::RuleSet;
use serde::Serialize;
use std::collections::BTreeSet;

/// Outcome of a query. `NoMatch` is an ordinary answer, not an error.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution<'a> {
    Match(&'a Rule),
    NoMatch,
}

impl<'a> Resolution<'a> {
    pub fn rule(&self) -> Option<&'a Rule> {
        match self {
            Resolution::Match(rule) => Some(rule),
            Resolution::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Resolution::Match(_))
    }
}

/// A rule whose pattern matched but whose guard did not.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GuardMiss<'a> {
    pub rule: &'a Rule,
    pub missing: Vec<Capability>,
}

impl RuleSet {
    /// Resolve `op(args)` against this rule set.
    pub fn resolve(
        &self,
        op: &str,
        args: &[String],
        entities: &EntityStore,
        extra_capabilities: &BTreeSet<Capability>,
    ) -> Resolution<'_> {
        let effective = effective_capabilities(args, entities, extra_capabilities);
        for rule in self.iter() {
            if !rule.when.matches(op, args) {
                continue;
            }
            if rule.guard_allows(&effective) {
                tracing::debug!(rule = %rule.origin, pattern = %rule.when, "rule matched");
                return Resolution::Match(rule);
            }
            tracing::debug!(rule = %rule.origin, pattern = %rule.when, "guard not satisfied");
        }
        Resolution::NoMatch
    }

    /// Rules whose pattern matches `op(args)` but whose guard rejects the
    /// effective capability set, with the capabilities that were missing.
    pub fn diagnose(
        &self,
        op: &str,
        args: &[String],
        entities: &EntityStore,
        extra_capabilities: &BTreeSet<Capability>,
    ) -> Vec<GuardMiss<'_>> {
        let effective = effective_capabilities(args, entities, extra_capabilities);
        self.iter()
            .filter(|rule| rule.when.matches(op, args))
            .filter_map(|rule| {
                let guard = rule.guard.as_ref()?;
                let missing = guard.missing(&effective);
                (!missing.is_empty()).then_some(GuardMiss { rule, missing })
            })
            .collect()
    }
}

/// Subject capabilities (from `args[0]`) united with the caller's extras.
pub fn effective_capabilities(
    args: &[String],
    entities: &EntityStore,
    extra_capabilities: &BTreeSet<Capability>,
) -> BTreeSet<Capability> {
    let mut effective = args
        .first()
        .map(|subject| entities.capabilities_of(&EntityId(subject.clone())))
        .unwrap_or_default();
    effective.extend(extra_capabilities.iter().cloned());
    effective
}
