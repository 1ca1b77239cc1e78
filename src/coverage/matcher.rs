//! Iterative backtracking matcher over a rule body.
//!
//! Variables are grouped into entity knots (see [`Rule::connections`]); a
//! binding assigns one graph entity per knot. The matcher repeatedly picks a
//! body atom with exactly one bound side, enumerates the graph edges that
//! could bind the other side, and backtracks through an explicit frame stack
//! instead of the call stack.

use std::collections::BTreeSet;

use crate::graph::Example;
use crate::graph::index::GraphIndex;
use crate::ontology::literal::is_valid_comp;
use crate::predicate::PredicateMap;
use crate::rule::{Knots, Rule, Var};
use crate::term::Term;

/// A body atom resolved to knot ids.
#[derive(Debug, Clone)]
struct KnotAtom {
    subject: usize,
    object: usize,
    predicate: Term,
    /// Graph predicates the atom may match. Empty for comparisons.
    variants: Vec<Term>,
    comparison: bool,
}

/// Knot bindings, indexed by knot id.
pub type Bindings = Vec<Option<Term>>;

/// A rule prepared for repeated matching against one graph.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    knots: Knots,
    head_subject: usize,
    head_object: usize,
    atoms: Vec<KnotAtom>,
    atoms_by_knot: Vec<Vec<usize>>,
}

enum Step {
    /// Every atom is satisfied.
    Done,
    /// Some atom can never be satisfied under the current bindings.
    Dead,
    /// Bind `knot` to one of `candidates`.
    Branch { knot: usize, candidates: Vec<Term> },
}

struct Frame {
    knot: usize,
    candidates: Vec<Term>,
    next: usize,
}

impl CompiledRule {
    pub fn new(rule: &Rule, pmap: &PredicateMap) -> Self {
        let knots = Knots::new(rule);
        let atoms: Vec<KnotAtom> = rule
            .body()
            .iter()
            .map(|atom| {
                let comparison = atom.predicate.is_comparison();
                let variants = if comparison {
                    Vec::new()
                } else {
                    match pmap.variants(atom.predicate.as_str()) {
                        [] => vec![atom.predicate.clone()],
                        found => found.to_vec(),
                    }
                };
                KnotAtom {
                    subject: knots.of(atom.subject),
                    object: knots.of(atom.object),
                    predicate: atom.predicate.clone(),
                    variants,
                    comparison,
                }
            })
            .collect();

        let mut atoms_by_knot = vec![Vec::new(); knots.len()];
        for (i, atom) in atoms.iter().enumerate() {
            atoms_by_knot[atom.subject].push(i);
            if atom.object != atom.subject {
                atoms_by_knot[atom.object].push(i);
            }
        }

        Self {
            head_subject: knots.of(rule.head().subject),
            head_object: knots.of(rule.head().object),
            knots,
            atoms,
            atoms_by_knot,
        }
    }

    /// Empty bindings sized for this rule.
    pub fn empty_bindings(&self) -> Bindings {
        vec![None; self.knots.len()]
    }

    /// Knot id of `var`, if the rule mentions it.
    pub fn knot_of(&self, var: Var) -> Option<usize> {
        self.knots.get(var)
    }

    /// Whether the body is satisfiable with the head bound to `example`.
    pub fn covers(&self, graph: &GraphIndex, example: &Example) -> bool {
        if self.head_subject == self.head_object && example.subject != example.object {
            return false;
        }
        let mut bindings = self.empty_bindings();
        if !self.bind(&mut bindings, self.head_subject, &example.subject, graph) {
            return false;
        }
        if self.head_object != self.head_subject
            && !self.bind(&mut bindings, self.head_object, &example.object, graph)
        {
            return false;
        }
        self.instantiable(graph, &mut bindings)
    }

    /// Bind `knot` to `entity` if that is consistent with every atom whose
    /// other side is already bound.
    pub fn bind(&self, bindings: &mut Bindings, knot: usize, entity: &Term, graph: &GraphIndex) -> bool {
        match &bindings[knot] {
            Some(bound) => bound == entity,
            None => {
                if !self.valid_entity_instanciation(knot, entity, bindings, graph) {
                    return false;
                }
                bindings[knot] = Some(entity.clone());
                true
            }
        }
    }

    /// Whether binding `knot` to `entity` keeps every atom of that knot
    /// satisfiable, given the current bindings of the other knots.
    fn valid_entity_instanciation(
        &self,
        knot: usize,
        entity: &Term,
        bindings: &Bindings,
        graph: &GraphIndex,
    ) -> bool {
        self.atoms_by_knot[knot].iter().all(|&i| {
            let atom = &self.atoms[i];
            let subject = if atom.subject == knot {
                Some(entity)
            } else {
                bindings[atom.subject].as_ref()
            };
            let object = if atom.object == knot {
                Some(entity)
            } else {
                bindings[atom.object].as_ref()
            };
            match (subject, object) {
                (Some(s), Some(o)) => self.holds(atom, s, o, graph),
                _ => true,
            }
        })
    }

    fn holds(&self, atom: &KnotAtom, subject: &Term, object: &Term, graph: &GraphIndex) -> bool {
        if atom.comparison {
            is_valid_comp(subject, atom.predicate.as_str(), object)
        } else {
            atom.variants
                .iter()
                .any(|p| graph.contains(subject, p.as_str(), object))
        }
    }

    /// Decide the next knot to bind.
    fn next_step(&self, bindings: &Bindings, graph: &GraphIndex) -> Step {
        let relational = || self.atoms.iter().filter(|a| !a.comparison);

        for atom in relational() {
            match (&bindings[atom.subject], &bindings[atom.object]) {
                (Some(s), None) => {
                    let candidates: BTreeSet<&Term> = atom
                        .variants
                        .iter()
                        .flat_map(|p| graph.objects_of(s, p.as_str()))
                        .collect();
                    return Step::Branch {
                        knot: atom.object,
                        candidates: candidates.into_iter().cloned().collect(),
                    };
                }
                (None, Some(o)) => {
                    let candidates: BTreeSet<&Term> = atom
                        .variants
                        .iter()
                        .flat_map(|p| graph.subjects_of(p.as_str(), o))
                        .collect();
                    return Step::Branch {
                        knot: atom.subject,
                        candidates: candidates.into_iter().cloned().collect(),
                    };
                }
                _ => {}
            }
        }

        if let Some(atom) = relational().find(|a| bindings[a.subject].is_none()) {
            let candidates: BTreeSet<&Term> = atom
                .variants
                .iter()
                .flat_map(|p| graph.pairs(p.as_str()).map(|(s, _)| s))
                .collect();
            return Step::Branch {
                knot: atom.subject,
                candidates: candidates.into_iter().cloned().collect(),
            };
        }

        // Only comparisons can remain; their operands cannot be enumerated.
        let unbound = self
            .atoms
            .iter()
            .any(|a| bindings[a.subject].is_none() || bindings[a.object].is_none());
        if unbound { Step::Dead } else { Step::Done }
    }

    /// Search for a full consistent extension of `bindings`.
    ///
    /// Returns `true` on the first complete assignment. On success the
    /// bindings hold that assignment; on failure they are restored.
    pub fn instantiable(&self, graph: &GraphIndex, bindings: &mut Bindings) -> bool {
        let mut stack: Vec<Frame> = Vec::new();
        loop {
            match self.next_step(bindings, graph) {
                Step::Done => return true,
                Step::Dead => {}
                Step::Branch { knot, candidates } => stack.push(Frame {
                    knot,
                    candidates,
                    next: 0,
                }),
            }

            // Advance the innermost frame with candidates left, popping
            // exhausted frames.
            loop {
                let Some(frame) = stack.last_mut() else {
                    return false;
                };
                bindings[frame.knot] = None;
                let mut bound = false;
                while frame.next < frame.candidates.len() {
                    let candidate = &frame.candidates[frame.next];
                    frame.next += 1;
                    if self.valid_entity_instanciation(frame.knot, candidate, bindings, graph) {
                        bindings[frame.knot] = Some(candidate.clone());
                        bound = true;
                        break;
                    }
                }
                if bound {
                    break;
                }
                stack.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Triple;
    use crate::predicate::MappingTables;
    use crate::rule::Atom;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn v(n: u32) -> Var {
        Var::new(n)
    }

    fn pmap() -> PredicateMap {
        let mappings = HashMap::from([
            (Term::new("hasAlbum_1"), Term::new("hasAlbum")),
            (Term::new("hasAlbum_2"), Term::new("hasAlbum")),
            (Term::new("collaboratedWith_1"), Term::new("collaboratedWith")),
            (Term::new("isGenre_1"), Term::new("isGenre")),
            (Term::new("releaseYear_1"), Term::new("releaseYear")),
        ]);
        PredicateMap::for_target(Arc::new(MappingTables::new(mappings, HashMap::new())), "isGenre")
    }

    fn graph() -> GraphIndex {
        GraphIndex::from_triples(&[
            Triple::new("Dire_Straits", "hasAlbum_1", "Making_Movies"),
            Triple::new("Sting", "collaboratedWith_1", "Dire_Straits"),
            Triple::new("Sting", "hasAlbum_2", "Tens_Tales"),
            Triple::new("Making_Movies", "isGenre_1", "Pop"),
            Triple::new("Tens_Tales", "isGenre_1", "Pop"),
            Triple::new("Making_Movies", "releaseYear_1", "\"1980\"^^xsd:gYear"),
            Triple::new("Tens_Tales", "releaseYear_1", "\"1999\"^^xsd:gYear"),
        ])
    }

    /// isGenre(V1,V2) <= hasAlbum(V3,V4) & collaboratedWith(V5,V6) & hasAlbum(V7,V8) & isGenre(V9,V10)
    fn chain() -> Rule {
        Rule::new(
            Atom::new(v(1), "isGenre", v(2)),
            vec![
                Atom::new(v(3), "hasAlbum_1", v(4)),
                Atom::new(v(5), "collaboratedWith_1", v(6)),
                Atom::new(v(7), "hasAlbum_1", v(8)),
                Atom::new(v(9), "isGenre_1", v(10)),
            ],
            vec![
                vec![v(1), v(4)],
                vec![v(3), v(5)],
                vec![v(6), v(7)],
                vec![v(8), v(9)],
                vec![v(2), v(10)],
            ],
        )
    }

    #[test]
    fn chain_covers_through_variants() {
        let c = CompiledRule::new(&chain(), &pmap());
        let g = graph();
        assert!(c.covers(&g, &Example::new("Tens_Tales", "Pop")));
        assert!(!c.covers(&g, &Example::new("Making_Movies", "Pop")));
        assert!(!c.covers(&g, &Example::new("Tens_Tales", "Rock")));
    }

    #[test]
    fn seeds_when_nothing_is_bound() {
        let c = CompiledRule::new(&chain(), &pmap());
        let mut bindings = c.empty_bindings();
        assert!(c.instantiable(&graph(), &mut bindings));
        assert!(bindings.iter().all(Option::is_some));
    }

    #[test]
    fn failure_restores_bindings() {
        let c = CompiledRule::new(&chain(), &pmap());
        let g = GraphIndex::from_triples(&[Triple::new("Sting", "hasAlbum_1", "Tens_Tales")]);
        let mut bindings = c.empty_bindings();
        assert!(!c.instantiable(&g, &mut bindings));
        assert!(bindings.iter().all(Option::is_none));
    }

    #[test]
    fn comparison_atoms_are_checked_on_values() {
        // releaseYear(V3,V4) & releaseYear(V5,V6) & <(V7,V8) with V4=V7, V6=V8
        let rule = Rule::new(
            Atom::new(v(1), "isGenre", v(2)),
            vec![
                Atom::new(v(3), "releaseYear_1", v(4)),
                Atom::new(v(5), "releaseYear_1", v(6)),
                Atom::new(v(7), "<", v(8)),
            ],
            vec![vec![v(1), v(3)], vec![v(2), v(5)], vec![v(4), v(7)], vec![v(6), v(8)]],
        );
        let c = CompiledRule::new(&rule, &pmap());
        let g = graph();
        assert!(c.covers(&g, &Example::new("Making_Movies", "Tens_Tales")));
        assert!(!c.covers(&g, &Example::new("Tens_Tales", "Making_Movies")));
    }

    #[test]
    fn shared_head_knot_requires_equal_pair() {
        let rule = Rule::new(
            Atom::new(v(1), "isGenre", v(2)),
            vec![Atom::new(v(3), "hasAlbum_1", v(4))],
            vec![vec![v(1), v(2), v(3)]],
        );
        let c = CompiledRule::new(&rule, &pmap());
        assert!(!c.covers(&graph(), &Example::new("Dire_Straits", "Pop")));
        assert!(c.covers(&graph(), &Example::new("Dire_Straits", "Dire_Straits")));
    }
}
