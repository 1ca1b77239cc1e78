//! The candidate pool and the single-edge path growth operator.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::context::MiningContext;
use crate::error::SearchError;
use crate::term::Term;

use super::Rule;
use super::path::Path;

/// Candidate rules, each with every distinct path that canonicalizes to it.
///
/// The paths double as the rule's support on the generation set: their head
/// pairs are exactly the generation examples the rule was grown from.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    entries: HashMap<Rule, HashSet<Path>>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` under `rule`. Returns `false` if it was already there.
    pub fn insert(&mut self, rule: Rule, path: Path) -> bool {
        self.entries.entry(rule).or_default().insert(path)
    }

    /// Remove a rule and hand back its paths.
    pub fn remove(&mut self, rule: &Rule) -> Option<HashSet<Path>> {
        self.entries.remove(rule)
    }

    pub fn paths(&self, rule: &Rule) -> Option<&HashSet<Path>> {
        self.entries.get(rule)
    }

    pub fn contains(&self, rule: &Rule) -> bool {
        self.entries.contains_key(rule)
    }

    /// Number of distinct rules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of paths over all rules.
    pub fn path_count(&self) -> usize {
        self.entries.values().map(HashSet::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Rule, &HashSet<Path>)> {
        self.entries.iter()
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.entries.keys()
    }

    /// Borrow the underlying map, e.g. for parallel iteration.
    pub fn entries(&self) -> &HashMap<Rule, HashSet<Path>> {
        &self.entries
    }

    /// Drop every rule for which `keep` returns `false`.
    pub fn retain(&mut self, mut keep: impl FnMut(&Rule, &HashSet<Path>) -> bool) {
        self.entries.retain(|rule, paths| keep(rule, paths));
    }
}

/// Grow `path` by one edge at its frontier in every admissible way and file
/// each grown path under its canonical rule.
///
/// Skipped edges: type assertions, negative-constraint predicates, edges
/// already in the path, and edges whose far end re-enters the chain (self-loops
/// on the frontier itself are allowed). The far end must pass the ontology's
/// domain/range guard. Returns the number of new paths added to the pool.
pub fn expand_path_rudik(
    pool: &mut CandidatePool,
    path: &Path,
    ctx: MiningContext<'_>,
) -> Result<usize, SearchError> {
    let frontier = path.frontier().ok_or_else(|| SearchError::ClosedPath {
        subject: path.head().subject.to_string(),
        predicate: path.head().predicate.to_string(),
        object: path.head().object.to_string(),
    })?;

    let mut predicates: Vec<&Term> = ctx
        .graph
        .predicates_of(frontier)
        .filter(|p| !ctx.is_excluded_predicate(p.as_str()))
        .collect();
    predicates.sort();

    let mut added = 0;
    for predicate in predicates {
        for edge in ctx.graph.edges_touching(frontier, predicate) {
            if path.contains(&edge) {
                continue;
            }
            let Some(far) = edge.other_end(frontier) else {
                continue;
            };
            if far != frontier && path.occurs(far) {
                continue;
            }
            if !ctx
                .ontology
                .fits_domain_range(far, &edge, ctx.graph, ctx.pmap, ctx.type_predicate)
            {
                continue;
            }
            let grown = path.with_edge(edge);
            let rule = grown.to_rule(ctx.pmap);
            if pool.insert(rule, grown) {
                added += 1;
            }
        }
    }

    trace!(path = %path, frontier = %frontier, added, "expanded path");
    Ok(added)
}
