//! Predicate mappings between normalized and original predicates.
//!
//! Normalization splits one original predicate into several post-normalization
//! variants (`hasAlbum` → `hasAlbum_1`, `hasAlbum_2`, ...) and records
//! constraint violations under negative variants. [`MappingTables`] holds the
//! two raw tables produced by the normalizer; [`PredicateMap`] scopes them to
//! one target predicate for a mining run.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::PredicateError;
use crate::graph::index::GraphIndex;
use crate::term::{self, Term};

/// The raw mapping tables plus a reverse index, shared by all targets.
#[derive(Debug, Clone, Default)]
pub struct MappingTables {
    /// normalized predicate → original predicate.
    predicate_mappings: HashMap<Term, Term>,
    /// negative normalized predicate → normalized predicate.
    neg_predicate_mappings: HashMap<Term, Term>,
    /// original predicate → its normalized variants, sorted.
    variants: HashMap<Term, Vec<Term>>,
}

impl MappingTables {
    /// Build the tables and their reverse index.
    pub fn new(
        predicate_mappings: HashMap<Term, Term>,
        neg_predicate_mappings: HashMap<Term, Term>,
    ) -> Self {
        let mut variants: BTreeMap<Term, Vec<Term>> = BTreeMap::new();
        for (normalized, original) in &predicate_mappings {
            variants
                .entry(original.clone())
                .or_default()
                .push(normalized.clone());
        }
        let variants = variants
            .into_iter()
            .map(|(original, mut preds)| {
                preds.sort();
                (original, preds)
            })
            .collect();

        Self {
            predicate_mappings,
            neg_predicate_mappings,
            variants,
        }
    }

    /// Every original predicate, sorted.
    pub fn original_predicates(&self) -> BTreeSet<Term> {
        self.predicate_mappings.values().cloned().collect()
    }

    /// Number of normalized predicates.
    pub fn len(&self) -> usize {
        self.predicate_mappings.len()
    }

    /// Whether no mapping is known.
    pub fn is_empty(&self) -> bool {
        self.predicate_mappings.is_empty()
    }

    /// Check that every predicate used in `graph` maps back to an original
    /// predicate. Run once before mining; the search assumes it holds.
    pub fn check_resolvable(&self, graph: &GraphIndex) -> Result<(), PredicateError> {
        let mut unresolved: Vec<&Term> = graph
            .predicates()
            .filter(|p| self.original_pred(p.as_str()).is_none())
            .collect();
        unresolved.sort();
        match unresolved.first() {
            Some(p) => Err(PredicateError::Unresolved {
                predicate: p.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Normalized → original. Negative variants resolve through the negative
    /// mapping first; `=` and `<` map to themselves.
    pub fn original_pred<'a>(&'a self, predicate: &'a str) -> Option<&'a str> {
        if term::is_comparison(predicate) {
            return Some(predicate);
        }
        let normalized = self
            .neg_predicate_mappings
            .get(predicate)
            .map(Term::as_str)
            .unwrap_or(predicate);
        self.predicate_mappings.get(normalized).map(Term::as_str)
    }

    /// Original → normalized variants.
    pub fn new_preds(&self, original: &str) -> &[Term] {
        self.variants.get(original).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Negative variants of any of the given normalized predicates.
    pub fn neg_preds<'a>(&self, new_preds: impl IntoIterator<Item = &'a Term>) -> BTreeSet<Term> {
        let wanted: BTreeSet<&Term> = new_preds.into_iter().collect();
        self.neg_predicate_mappings
            .iter()
            .filter(|(_, normalized)| wanted.contains(normalized))
            .map(|(neg, _)| neg.clone())
            .collect()
    }

    /// Whether `predicate` is a negative-constraint variant.
    pub fn is_negative(&self, predicate: &str) -> bool {
        self.neg_predicate_mappings.contains_key(predicate)
    }
}

/// Read-only predicate lookup scoped to one target predicate.
#[derive(Debug, Clone)]
pub struct PredicateMap {
    target: Term,
    predicates: BTreeSet<Term>,
    neg_predicates: BTreeSet<Term>,
    tables: Arc<MappingTables>,
}

impl PredicateMap {
    /// Scope the shared tables to `target` (an original predicate).
    pub fn for_target(tables: Arc<MappingTables>, target: impl Into<Term>) -> Self {
        let target = target.into();
        let predicates: BTreeSet<Term> = tables.new_preds(target.as_str()).iter().cloned().collect();
        let neg_predicates = tables.neg_preds(&predicates);
        Self {
            target,
            predicates,
            neg_predicates,
            tables,
        }
    }

    /// The original target predicate.
    pub fn target(&self) -> &Term {
        &self.target
    }

    /// Post-normalization variants of the target.
    pub fn predicates(&self) -> &BTreeSet<Term> {
        &self.predicates
    }

    /// Negative-constraint variants of the target.
    pub fn neg_predicates(&self) -> &BTreeSet<Term> {
        &self.neg_predicates
    }

    /// The shared tables.
    pub fn tables(&self) -> &MappingTables {
        &self.tables
    }

    /// See [`MappingTables::original_pred`].
    pub fn original_pred<'a>(&'a self, predicate: &'a str) -> Option<&'a str> {
        self.tables.original_pred(predicate)
    }

    /// The original predicate, or `predicate` itself when unmapped.
    ///
    /// Graph predicates are checked with [`MappingTables::check_resolvable`]
    /// before mining, so the fallback only triggers for caller-made labels.
    pub fn original_or_self<'a>(&'a self, predicate: &'a str) -> &'a str {
        self.original_pred(predicate).unwrap_or(predicate)
    }

    /// See [`MappingTables::new_preds`].
    pub fn new_preds(&self, original: &str) -> &[Term] {
        self.tables.new_preds(original)
    }

    /// See [`MappingTables::neg_preds`].
    pub fn neg_preds<'a>(&self, new_preds: impl IntoIterator<Item = &'a Term>) -> BTreeSet<Term> {
        self.tables.neg_preds(new_preds)
    }

    /// Every post-normalization predicate sharing the original of `predicate`.
    /// Empty for the comparison pseudo-predicates.
    pub fn variants(&self, predicate: &str) -> &[Term] {
        if term::is_comparison(predicate) {
            return &[];
        }
        self.new_preds(self.original_or_self(predicate))
    }

    /// See [`MappingTables::is_negative`].
    pub fn is_negative(&self, predicate: &str) -> bool {
        self.tables.is_negative(predicate)
    }
}
