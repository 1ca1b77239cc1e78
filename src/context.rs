//! Read-only structures shared by every step of one target's search.

use crate::graph::index::GraphIndex;
use crate::ontology::Ontology;
use crate::predicate::PredicateMap;

/// Borrowed view over the graph, ontology and predicate map of one mining
/// run. Cheap to copy and `Sync`, so scoring workers can each hold one.
#[derive(Debug, Clone, Copy)]
pub struct MiningContext<'a> {
    pub graph: &'a GraphIndex,
    pub ontology: &'a Ontology,
    pub pmap: &'a PredicateMap,
    pub type_predicate: &'a str,
}

impl<'a> MiningContext<'a> {
    pub fn new(
        graph: &'a GraphIndex,
        ontology: &'a Ontology,
        pmap: &'a PredicateMap,
        type_predicate: &'a str,
    ) -> Self {
        Self {
            graph,
            ontology,
            pmap,
            type_predicate,
        }
    }

    /// Whether edges under `predicate` must never enter a rule body: type
    /// assertions and negative-constraint variants.
    pub fn is_excluded_predicate(&self, predicate: &str) -> bool {
        predicate == self.type_predicate
            || self.pmap.original_pred(predicate) == Some(self.type_predicate)
            || self.pmap.is_negative(predicate)
    }
}
