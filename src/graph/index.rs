//! In-memory graph index keyed by predicate and by entity.
//!
//! Built once per mining run from the normalized knowledge graph and read-only
//! while the search runs, so a shared reference can be handed to parallel
//! scoring workers. Lookups of unknown entities or predicates yield empty
//! results rather than errors.

use std::collections::{HashMap, HashSet};

use crate::term::Term;

use super::Triple;

type Adjacency = HashMap<Term, HashMap<Term, HashSet<Term>>>;

/// Predicate-indexed knowledge graph with undirected per-entity adjacency.
///
/// Invariant: every `(s, o)` in `edges[p]` implies `p ∈ nodes[s]` and
/// `p ∈ nodes[o]`.
#[derive(Default, Clone)]
pub struct GraphIndex {
    /// Predicate → set of (subject, object) pairs.
    edges: HashMap<Term, HashSet<(Term, Term)>>,
    /// Entity → predicates incident to it in either direction.
    nodes: HashMap<Term, HashSet<Term>>,
    /// Subject → predicate → objects.
    outgoing: Adjacency,
    /// Object → predicate → subjects.
    incoming: Adjacency,
    triple_count: usize,
}

impl GraphIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a sequence of triples.
    pub fn from_triples<'a>(triples: impl IntoIterator<Item = &'a Triple>) -> Self {
        let mut index = Self::new();
        for t in triples {
            index.insert_triple(t);
        }
        index
    }

    /// Insert a triple. Idempotent: returns `false` if it was already present.
    pub fn add(&mut self, subject: Term, predicate: Term, object: Term) -> bool {
        let inserted = self
            .edges
            .entry(predicate.clone())
            .or_default()
            .insert((subject.clone(), object.clone()));
        if !inserted {
            return false;
        }

        self.nodes
            .entry(subject.clone())
            .or_default()
            .insert(predicate.clone());
        self.nodes
            .entry(object.clone())
            .or_default()
            .insert(predicate.clone());
        self.outgoing
            .entry(subject.clone())
            .or_default()
            .entry(predicate.clone())
            .or_default()
            .insert(object.clone());
        self.incoming
            .entry(object)
            .or_default()
            .entry(predicate)
            .or_default()
            .insert(subject);
        self.triple_count += 1;
        true
    }

    /// Insert a borrowed triple.
    pub fn insert_triple(&mut self, triple: &Triple) -> bool {
        self.add(
            triple.subject.clone(),
            triple.predicate.clone(),
            triple.object.clone(),
        )
    }

    /// Remove every edge carrying `predicate`. Returns the number of edges removed.
    pub fn delete(&mut self, predicate: &Term) -> usize {
        let Some(pairs) = self.edges.remove(predicate) else {
            return 0;
        };

        for (s, o) in &pairs {
            for entity in [s, o] {
                if let Some(preds) = self.nodes.get_mut(entity) {
                    preds.remove(predicate);
                    if preds.is_empty() {
                        self.nodes.remove(entity);
                    }
                }
            }
            remove_adjacent(&mut self.outgoing, s, predicate);
            remove_adjacent(&mut self.incoming, o, predicate);
        }

        self.triple_count -= pairs.len();
        pairs.len()
    }

    /// All entities adjacent to `entity`, ignoring predicate and direction.
    pub fn neighbors(&self, entity: &Term) -> HashSet<Term> {
        [&self.outgoing, &self.incoming]
            .into_iter()
            .filter_map(|adj| adj.get(entity))
            .flat_map(|by_pred| by_pred.values())
            .flatten()
            .cloned()
            .collect()
    }

    /// Materialize all triples.
    pub fn triples(&self) -> Vec<Triple> {
        self.edges
            .iter()
            .flat_map(|(p, pairs)| {
                pairs
                    .iter()
                    .map(move |(s, o)| Triple::new(s.clone(), p.clone(), o.clone()))
            })
            .collect()
    }

    /// Predicates incident to `entity` in either direction.
    pub fn predicates_of(&self, entity: &Term) -> impl Iterator<Item = &Term> {
        self.nodes.get(entity).into_iter().flatten()
    }

    /// All (subject, object) pairs carrying `predicate`.
    pub fn pairs(&self, predicate: &str) -> impl Iterator<Item = &(Term, Term)> {
        self.edges.get(predicate).into_iter().flatten()
    }

    /// Objects of `subject` under `predicate`.
    pub fn objects_of(&self, subject: &Term, predicate: &str) -> impl Iterator<Item = &Term> {
        self.outgoing
            .get(subject)
            .and_then(|by_pred| by_pred.get(predicate))
            .into_iter()
            .flatten()
    }

    /// Subjects with `object` under `predicate`.
    pub fn subjects_of(&self, predicate: &str, object: &Term) -> impl Iterator<Item = &Term> {
        self.incoming
            .get(object)
            .and_then(|by_pred| by_pred.get(predicate))
            .into_iter()
            .flatten()
    }

    /// Every edge with `predicate` that has `entity` as subject or object.
    pub fn edges_touching(&self, entity: &Term, predicate: &Term) -> Vec<Triple> {
        let mut out: Vec<Triple> = self
            .objects_of(entity, predicate.as_str())
            .map(|o| Triple::new(entity.clone(), predicate.clone(), o.clone()))
            .collect();
        out.extend(
            self.subjects_of(predicate.as_str(), entity)
                .filter(|s| *s != entity)
                .map(|s| Triple::new(s.clone(), predicate.clone(), entity.clone())),
        );
        out
    }

    /// Check whether `(subject, predicate, object)` is present.
    pub fn contains(&self, subject: &Term, predicate: &str, object: &Term) -> bool {
        self.outgoing
            .get(subject)
            .and_then(|by_pred| by_pred.get(predicate))
            .is_some_and(|objs| objs.contains(object))
    }

    /// Check whether the entity occurs in any triple.
    pub fn has_node(&self, entity: &Term) -> bool {
        self.nodes.contains_key(entity)
    }

    /// All predicates with at least one edge.
    pub fn predicates(&self) -> impl Iterator<Item = &Term> {
        self.edges.keys()
    }

    /// Number of distinct entities.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct triples.
    pub fn triple_count(&self) -> usize {
        self.triple_count
    }
}

fn remove_adjacent(adj: &mut Adjacency, entity: &Term, predicate: &Term) {
    if let Some(by_pred) = adj.get_mut(entity) {
        by_pred.remove(predicate);
        if by_pred.is_empty() {
            adj.remove(entity);
        }
    }
}

impl std::fmt::Debug for GraphIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphIndex")
            .field("nodes", &self.node_count())
            .field("predicates", &self.edges.len())
            .field("triples", &self.triple_count())
            .finish()
    }
}
