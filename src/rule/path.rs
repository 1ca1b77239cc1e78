//! Growing instance paths and their canonical rule projection.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use crate::graph::{Example, Triple};
use crate::predicate::PredicateMap;
use crate::term::Term;

use super::{Atom, Rule, Var};

/// A head triple plus the body edges grown from its subject.
///
/// The body is a single chain starting at `head.subject`, decorated with
/// self-loops at chain nodes. Each expansion step copies the path and adds
/// one edge; a path is never shared between candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    head: Triple,
    edges: BTreeSet<Triple>,
}

impl Path {
    /// A zero-length path consisting of the head alone.
    pub fn new(head: Triple) -> Self {
        Self {
            head,
            edges: BTreeSet::new(),
        }
    }

    pub fn head(&self) -> &Triple {
        &self.head
    }

    /// Body edges, excluding the head.
    pub fn edges(&self) -> &BTreeSet<Triple> {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// The `(subject, object)` pair of the head.
    pub fn example(&self) -> Example {
        self.head.example()
    }

    /// Whether `triple` is the head or one of the body edges.
    pub fn contains(&self, triple: &Triple) -> bool {
        &self.head == triple || self.edges.contains(triple)
    }

    /// Whether `entity` is already part of the chain: the head subject or an
    /// endpoint of a body edge. The head object only joins once the chain
    /// closes on it.
    pub fn occurs(&self, entity: &Term) -> bool {
        &self.head.subject == entity || self.edges.iter().any(|e| e.touches(entity))
    }

    /// The unique node the next edge may attach to, or `None` once the chain
    /// has reached the head object.
    pub fn frontier(&self) -> Option<&Term> {
        let mut degree: BTreeMap<&Term, usize> = BTreeMap::new();
        for edge in self.edges.iter().filter(|e| !e.is_reflexive()) {
            *degree.entry(&edge.subject).or_default() += 1;
            *degree.entry(&edge.object).or_default() += 1;
        }
        if degree.is_empty() {
            return Some(&self.head.subject);
        }
        let end = degree
            .into_iter()
            .find(|(node, d)| *d == 1 && **node != self.head.subject)
            .map(|(node, _)| node)?;
        (*end != self.head.object).then_some(end)
    }

    /// Copy of this path with `edge` added to the body.
    pub fn with_edge(&self, edge: Triple) -> Path {
        let mut grown = self.clone();
        grown.edges.insert(edge);
        debug_assert!(grown.is_connected(), "path body detached from head subject: {grown}");
        grown
    }

    /// Whether every body edge is reachable from the head subject through
    /// body edges.
    pub fn is_connected(&self) -> bool {
        let mut reached: HashSet<&Term> = HashSet::from([&self.head.subject]);
        let mut remaining: Vec<&Triple> = self.edges.iter().collect();
        loop {
            let before = remaining.len();
            remaining.retain(|edge| {
                if reached.contains(&edge.subject) || reached.contains(&edge.object) {
                    reached.insert(&edge.subject);
                    reached.insert(&edge.object);
                    false
                } else {
                    true
                }
            });
            if remaining.is_empty() {
                return true;
            }
            if remaining.len() == before {
                return false;
            }
        }
    }

    /// Canonical rule of this path. See [`rule_rudik`].
    pub fn to_rule(&self, pmap: &PredicateMap) -> Rule {
        rule_rudik(self, pmap)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <=", self.head)?;
        for (i, edge) in self.edges.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{edge}")?;
        }
        Ok(())
    }
}

/// Canonicalize `path` by walking its chain from the head subject.
///
/// At each node the self-loops come first, ordered by original predicate,
/// each taking two fresh variables. Then the forward edge takes a subject
/// variable and an object variable and the walk moves to its far end. The
/// head uses `?V1`/`?V2` and the original target predicate; body atoms keep
/// the graph predicate. Variables that meet at one entity form a connection.
pub fn rule_rudik(path: &Path, pmap: &PredicateMap) -> Rule {
    let head = path.head();
    let mut knots: BTreeMap<&Term, Vec<Var>> = BTreeMap::new();
    knots.entry(&head.subject).or_default().push(Var::HEAD_SUBJECT);
    knots.entry(&head.object).or_default().push(Var::HEAD_OBJECT);

    let mut fresh = Var::FIRST_BODY;
    let mut take = || {
        let v = fresh;
        fresh = fresh.next();
        v
    };

    let mut visited: HashSet<&Triple> = HashSet::new();
    let mut body: Vec<Atom> = Vec::with_capacity(path.len());
    let mut current = &head.subject;

    loop {
        let mut loops: Vec<&Triple> = path
            .edges()
            .iter()
            .filter(|e| e.is_reflexive() && &e.subject == current)
            .collect();
        loops.sort_by(|a, b| {
            let ka = (pmap.original_or_self(a.predicate.as_str()), a.predicate.as_str());
            let kb = (pmap.original_or_self(b.predicate.as_str()), b.predicate.as_str());
            ka.cmp(&kb)
        });
        for edge in loops {
            if !visited.insert(edge) {
                continue;
            }
            let (s, o) = (take(), take());
            knots.entry(current).or_default().extend([s, o]);
            body.push(Atom::new(s, edge.predicate.clone(), o));
        }

        let forward = path
            .edges()
            .iter()
            .find(|e| !e.is_reflexive() && e.touches(current) && !visited.contains(e));
        let Some(edge) = forward else {
            break;
        };
        visited.insert(edge);
        let (s, o) = (take(), take());
        knots.entry(&edge.subject).or_default().push(s);
        knots.entry(&edge.object).or_default().push(o);
        body.push(Atom::new(s, edge.predicate.clone(), o));

        match edge.other_end(current) {
            Some(next) => current = next,
            None => break,
        }
    }
    debug_assert_eq!(visited.len(), path.len(), "unreached edges in {path}");

    let head_atom = Atom::new(
        Var::HEAD_SUBJECT,
        pmap.original_or_self(head.predicate.as_str()),
        Var::HEAD_OBJECT,
    );
    Rule::new(head_atom, body, knots.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::MappingTables;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn pmap() -> PredicateMap {
        let mappings = HashMap::from([
            (Term::new("hasAlbum_1"), Term::new("hasAlbum")),
            (Term::new("collaboratedWith_1"), Term::new("collaboratedWith")),
            (Term::new("isGenre_1"), Term::new("isGenre")),
            (Term::new("sameAs_1"), Term::new("sameAs")),
            (Term::new("alias_1"), Term::new("alias")),
        ]);
        PredicateMap::for_target(Arc::new(MappingTables::new(mappings, HashMap::new())), "isGenre")
    }

    fn dire_straits_path() -> Path {
        Path::new(Triple::new("Tens_Tales", "isGenre_1", "Pop"))
            .with_edge(Triple::new("Sting", "hasAlbum_1", "Tens_Tales"))
            .with_edge(Triple::new("Sting", "collaboratedWith_1", "Dire_Straits"))
    }

    #[test]
    fn frontier_of_bare_head_is_subject() {
        let p = Path::new(Triple::new("Tens_Tales", "isGenre_1", "Pop"));
        assert_eq!(p.frontier(), Some(&Term::new("Tens_Tales")));
    }

    #[test]
    fn frontier_follows_chain_end() {
        let p = dire_straits_path();
        assert_eq!(p.frontier(), Some(&Term::new("Dire_Straits")));
        assert!(p.occurs(&Term::new("Sting")));
        assert!(!p.occurs(&Term::new("Pop")));
    }

    #[test]
    fn frontier_ignores_self_loops() {
        let p = Path::new(Triple::new("a", "isGenre_1", "b"))
            .with_edge(Triple::new("a", "sameAs_1", "a"));
        assert_eq!(p.frontier(), Some(&Term::new("a")));
        let p = p.with_edge(Triple::new("a", "hasAlbum_1", "c"));
        let p = p.with_edge(Triple::new("c", "sameAs_1", "c"));
        assert_eq!(p.frontier(), Some(&Term::new("c")));
    }

    #[test]
    fn chain_reaching_head_object_is_closed() {
        let p = dire_straits_path()
            .with_edge(Triple::new("Dire_Straits", "hasAlbum_1", "Making_Movies"))
            .with_edge(Triple::new("Making_Movies", "isGenre_1", "Pop"));
        assert_eq!(p.frontier(), None);
        assert!(p.is_connected());
    }

    #[test]
    fn detached_edge_is_not_connected() {
        let mut p = dire_straits_path();
        p.edges.insert(Triple::new("x", "hasAlbum_1", "y"));
        assert!(!p.is_connected());
    }

    #[test]
    fn canonical_rule_numbers_by_traversal() {
        let rule = dire_straits_path().to_rule(&pmap());
        assert_eq!(rule.head(), &Atom::new(Var::new(1), "isGenre", Var::new(2)));
        assert_eq!(
            rule.body(),
            &[
                Atom::new(Var::new(3), "hasAlbum_1", Var::new(4)),
                Atom::new(Var::new(5), "collaboratedWith_1", Var::new(6)),
            ]
        );
        assert_eq!(
            rule.connections(),
            &[vec![Var::new(1), Var::new(4)], vec![Var::new(3), Var::new(5)]]
        );
    }

    #[test]
    fn isomorphic_paths_share_a_rule() {
        let other = Path::new(Triple::new("Brothers_In_Arms", "isGenre_1", "Rock"))
            .with_edge(Triple::new("Knopfler", "hasAlbum_1", "Brothers_In_Arms"))
            .with_edge(Triple::new("Knopfler", "collaboratedWith_1", "Clapton"));
        let pmap = pmap();
        assert_ne!(dire_straits_path(), other);
        assert_eq!(dire_straits_path().to_rule(&pmap), other.to_rule(&pmap));
    }

    #[test]
    fn direction_changes_the_rule() {
        let reversed = Path::new(Triple::new("Tens_Tales", "isGenre_1", "Pop"))
            .with_edge(Triple::new("Sting", "hasAlbum_1", "Tens_Tales"))
            .with_edge(Triple::new("Dire_Straits", "collaboratedWith_1", "Sting"));
        let pmap = pmap();
        assert_ne!(dire_straits_path().to_rule(&pmap), reversed.to_rule(&pmap));
    }

    #[test]
    fn self_loops_take_variables_before_forward_edge() {
        let p = Path::new(Triple::new("a", "isGenre_1", "b"))
            .with_edge(Triple::new("a", "sameAs_1", "a"))
            .with_edge(Triple::new("a", "alias_1", "a"))
            .with_edge(Triple::new("a", "hasAlbum_1", "c"));
        let rule = p.to_rule(&pmap());
        let by_pred: HashMap<&str, &Atom> =
            rule.body().iter().map(|a| (a.predicate.as_str(), a)).collect();
        assert_eq!(by_pred["alias_1"].subject, Var::new(3));
        assert_eq!(by_pred["sameAs_1"].subject, Var::new(5));
        assert_eq!(by_pred["hasAlbum_1"].subject, Var::new(7));
        assert_eq!(
            rule.connections(),
            &[vec![Var::new(1), Var::new(3), Var::new(4), Var::new(5), Var::new(6), Var::new(7)]]
        );
    }
}
