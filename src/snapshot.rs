//! Immutable knowledge-base snapshots and the handle that swaps them.
//!
//! A `KnowledgeBase` owns one entity table and one rule set and is never
//! modified after it is built. Long-lived callers keep a
//! `SharedKnowledgeBase`: readers take an `Arc` to the current snapshot and
//! query it without holding any lock, and `reload` builds the replacement
//! completely before swapping it in.

use crate::error::LoadError;
use crate::layout::Layout;
use crate::ontology::{self, Capability, DanglingLink, EntityStore, LoadPolicy};
use crate::rules::{GuardMiss, Resolution, RuleSet};
use crate::schema::SchemaValidator;
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

/// Non-fatal problems collected while building a snapshot.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Documents skipped under [`LoadPolicy::Lenient`].
    pub skipped_documents: Vec<LoadError>,
    /// Rule records that were malformed.
    pub skipped_rules: Vec<LoadError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped_documents.is_empty() && self.skipped_rules.is_empty()
    }
}

/// Entity table plus rule set, loaded together.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    entities: EntityStore,
    rules: RuleSet,
}

impl KnowledgeBase {
    pub fn new(entities: EntityStore, rules: RuleSet) -> Self {
        Self { entities, rules }
    }

    /// Load ontology documents and rules from `layout`.
    ///
    /// Document failures abort under [`LoadPolicy::Strict`]; malformed rules
    /// never abort and land in the report instead.
    pub fn load(layout: &Layout, policy: LoadPolicy) -> Result<(Self, LoadReport), LoadError> {
        let validator = SchemaValidator::load_or_builtin(&layout.schema_path)?;
        let entity_load = EntityStore::load_dir(&layout.ontology_dir, &validator, policy)?;
        let rule_load = RuleSet::load_path(&layout.rules_path)?;
        tracing::debug!(
            entities = entity_load.store.len(),
            rules = rule_load.rules.len(),
            "knowledge base loaded"
        );
        let report = LoadReport {
            skipped_documents: entity_load.skipped,
            skipped_rules: rule_load.skipped,
        };
        Ok((Self::new(entity_load.store, rule_load.rules), report))
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn resolve(
        &self,
        op: &str,
        args: &[String],
        extra_capabilities: &BTreeSet<Capability>,
    ) -> Resolution<'_> {
        self.rules
            .resolve(op, args, &self.entities, extra_capabilities)
    }

    pub fn diagnose(
        &self,
        op: &str,
        args: &[String],
        extra_capabilities: &BTreeSet<Capability>,
    ) -> Vec<GuardMiss<'_>> {
        self.rules
            .diagnose(op, args, &self.entities, extra_capabilities)
    }

    pub fn check_integrity(&self) -> Vec<DanglingLink> {
        ontology::check(&self.entities)
    }
}

/// Shared, atomically replaceable snapshot.
#[derive(Debug, Default)]
pub struct SharedKnowledgeBase {
    current: RwLock<Arc<KnowledgeBase>>,
}

impl SharedKnowledgeBase {
    pub fn new(initial: KnowledgeBase) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// The snapshot in effect right now. Stays valid across later reloads.
    pub fn snapshot(&self) -> Arc<KnowledgeBase> {
        // The lock only guards a pointer swap, so a poisoned lock still holds
        // a complete snapshot.
        let guard = self.current.read().unwrap_or_else(|err| err.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the current snapshot wholesale.
    pub fn replace(&self, next: KnowledgeBase) {
        let mut guard = self.current.write().unwrap_or_else(|err| err.into_inner());
        *guard = Arc::new(next);
    }

    /// Build a fresh snapshot from `layout` and swap it in. On error the
    /// previous snapshot stays in place.
    pub fn reload(&self, layout: &Layout, policy: LoadPolicy) -> Result<LoadReport, LoadError> {
        let (next, report) = KnowledgeBase::load(layout, policy)?;
        self.replace(next);
        Ok(report)
    }
}
