//! Coverage of example pairs by rules.
//!
//! A rule *covers* an example `(a, b)` when its body can be satisfied in the
//! graph with the head subject bound to `a` and the head object bound to `b`.
//! Coverage is existential: one satisfying assignment is enough.

pub mod matcher;

use std::collections::{HashMap, HashSet};

use crate::graph::Example;
use crate::graph::index::GraphIndex;
use crate::predicate::PredicateMap;
use crate::rule::{Rule, Var};
use crate::term::Term;

pub use matcher::CompiledRule;

/// Whether `rule` covers `example`.
pub fn covers(rule: &Rule, graph: &GraphIndex, example: &Example, pmap: &PredicateMap) -> bool {
    CompiledRule::new(rule, pmap).covers(graph, example)
}

/// Whether `rule`'s body can be satisfied starting from the given variable
/// bindings. Variables sharing a connection must agree; an empty binding map
/// asks whether the body has any match at all.
pub fn instantiable(
    rule: &Rule,
    graph: &GraphIndex,
    pmap: &PredicateMap,
    bindings: &HashMap<Var, Term>,
) -> bool {
    let compiled = CompiledRule::new(rule, pmap);
    let mut knots = compiled.empty_bindings();

    let mut ordered: Vec<(&Var, &Term)> = bindings.iter().collect();
    ordered.sort();
    for (var, entity) in ordered {
        let Some(knot) = compiled.knot_of(*var) else {
            continue;
        };
        if !compiled.bind(&mut knots, knot, entity, graph) {
            return false;
        }
    }
    compiled.instantiable(graph, &mut knots)
}

/// Examples covered by a rule set.
///
/// Rules are tried in order and each only checks the examples no earlier
/// rule covered, so the result is the union of the per-rule coverages.
pub fn cov<'r>(
    rules: impl IntoIterator<Item = &'r Rule>,
    graph: &GraphIndex,
    examples: &[Example],
    pmap: &PredicateMap,
) -> HashSet<Example> {
    let mut covered: HashSet<Example> = HashSet::new();
    let mut remaining: Vec<&Example> = examples.iter().collect();
    for rule in rules {
        if remaining.is_empty() {
            break;
        }
        let compiled = CompiledRule::new(rule, pmap);
        remaining.retain(|example| {
            if compiled.covers(graph, example) {
                covered.insert((*example).clone());
                false
            } else {
                true
            }
        });
    }
    covered
}

/// Coverage of the existentially generalized rules (see [`Rule::unbind`]).
pub fn uncov<'r>(
    rules: impl IntoIterator<Item = &'r Rule>,
    graph: &GraphIndex,
    examples: &[Example],
    pmap: &PredicateMap,
) -> HashSet<Example> {
    let unbound: Vec<Rule> = rules.into_iter().map(Rule::unbind).collect();
    cov(&unbound, graph, examples, pmap)
}
