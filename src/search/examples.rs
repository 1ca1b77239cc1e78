//! Generation and validation example selection for one target.
//!
//! The generation set G holds pairs the target relation is known to hold
//! for. The validation set V holds pairs it should not hold for: first the
//! constraint violations recorded under negative predicates, then arbitrary
//! other related pairs to fill up to the requested size.

use std::collections::{BTreeSet, HashSet};

use rand::SeedableRng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::graph::index::GraphIndex;
use crate::graph::{Example, Triple};
use crate::predicate::PredicateMap;
use crate::term::Term;

/// Example sets for one search run.
#[derive(Debug, Clone, Default)]
pub struct ExampleSets {
    pub generation: Vec<Example>,
    pub validation: Vec<Example>,
    /// Normalized predicates a generation pair may be stated with.
    pub head_predicates: BTreeSet<Term>,
}

impl ExampleSets {
    /// Whether either set is empty, in which case the target is skipped.
    pub fn is_insufficient(&self) -> bool {
        self.generation.is_empty() || self.validation.is_empty()
    }

    /// One head triple per generation example, stated with the first head
    /// predicate that holds for it in the graph.
    pub fn seed_heads(&self, graph: &GraphIndex) -> Vec<Triple> {
        self.generation
            .iter()
            .filter_map(|example| {
                let predicate = self
                    .head_predicates
                    .iter()
                    .find(|p| graph.contains(&example.subject, p.as_str(), &example.object));
                if predicate.is_none() {
                    debug!(%example, "generation example not stated in graph");
                }
                predicate.map(|p| {
                    Triple::new(example.subject.clone(), p.clone(), example.object.clone())
                })
            })
            .collect()
    }
}

/// Selects example sets of bounded size.
#[derive(Debug, Clone, Copy)]
pub struct ExampleSelector<'a> {
    graph: &'a GraphIndex,
    set_size: usize,
    shuffle_seed: Option<u64>,
}

impl<'a> ExampleSelector<'a> {
    pub fn new(graph: &'a GraphIndex, set_size: usize, shuffle_seed: Option<u64>) -> Self {
        Self {
            graph,
            set_size,
            shuffle_seed,
        }
    }

    /// Build G and V for `pmap`'s target.
    ///
    /// With `negative` set the roles swap: G holds the constraint violations
    /// and V the positive facts, so the mined rules predict violations.
    pub fn select(&self, pmap: &PredicateMap, negative: bool) -> ExampleSets {
        let predicate = pmap.target();
        let positives = pmap.predicates();
        let violations = pmap.neg_predicates();

        let sets = if negative {
            ExampleSets {
                generation: self.take(self.pairs(violations), self.set_size),
                validation: self.take(self.pairs(positives), self.set_size),
                head_predicates: violations.clone(),
            }
        } else {
            let generation = self.take(self.pairs(positives), self.set_size);
            let mut validation = self.take(self.pairs(violations), self.set_size);
            if validation.len() < self.set_size {
                warn!(
                    %predicate,
                    violations = validation.len(),
                    missing = self.set_size - validation.len(),
                    "not enough constraint violations, filling validation set from graph"
                );
                let excluded: BTreeSet<&Term> = positives.iter().chain(violations).collect();
                let seen: HashSet<Example> = validation.iter().cloned().collect();
                let fill: Vec<Example> = self
                    .others(&excluded)
                    .into_iter()
                    .filter(|e| !seen.contains(e))
                    .collect();
                validation.extend(self.take(fill, self.set_size - validation.len()));
            }
            ExampleSets {
                generation,
                validation,
                head_predicates: positives.clone(),
            }
        };

        if sets.generation.len() < self.set_size {
            warn!(
                %predicate,
                negative,
                found = sets.generation.len(),
                wanted = self.set_size,
                "not enough generation examples"
            );
        }
        if sets.validation.len() < self.set_size {
            warn!(
                %predicate,
                negative,
                found = sets.validation.len(),
                wanted = self.set_size,
                "not enough validation examples"
            );
        }
        sets
    }

    /// Distinct pairs stated with any of `predicates`, sorted.
    fn pairs(&self, predicates: &BTreeSet<Term>) -> Vec<Example> {
        let pairs: BTreeSet<Example> = predicates
            .iter()
            .flat_map(|p| self.graph.pairs(p.as_str()))
            .map(|(s, o)| Example::new(s.clone(), o.clone()))
            .collect();
        pairs.into_iter().collect()
    }

    /// Distinct pairs stated with any predicate outside `excluded`, sorted.
    fn others(&self, excluded: &BTreeSet<&Term>) -> Vec<Example> {
        let predicates: BTreeSet<Term> = self
            .graph
            .predicates()
            .filter(|p| !excluded.contains(p))
            .cloned()
            .collect();
        self.pairs(&predicates)
    }

    /// Shuffle (when seeded) and truncate to `limit`.
    fn take(&self, mut pairs: Vec<Example>, limit: usize) -> Vec<Example> {
        if let Some(seed) = self.shuffle_seed {
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
            pairs.shuffle(&mut rng);
        }
        pairs.truncate(limit);
        pairs
    }
}
