//! Horn rules: canonical, hashable projections of growing graph paths.
//!
//! A [`Rule`] has a head atom, a body of atoms and a set of *connections*:
//! groups of variables that denote the same original graph entity (entity
//! knots). Every atom carries its own two variables; the connections are
//! what ties the body together. Variables are numbered in traversal order
//! (see [`path::Path::to_rule`]), so two structurally identical paths
//! produce equal rules regardless of entity labels.

pub mod expand;
pub mod path;

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::term::{EQUAL, Term};

/// A rule variable, displayed `?V<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Var(u32);

impl Var {
    /// The head subject variable.
    pub const HEAD_SUBJECT: Var = Var(1);
    /// The head object variable.
    pub const HEAD_OBJECT: Var = Var(2);
    /// First variable available to body atoms.
    pub const FIRST_BODY: Var = Var(3);

    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn index(self) -> u32 {
        self.0
    }

    /// Whether this is one of the two head variables.
    pub fn is_head(self) -> bool {
        self == Self::HEAD_SUBJECT || self == Self::HEAD_OBJECT
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?V{}", self.0)
    }
}

/// A rule atom `predicate(subject, object)` over variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Atom {
    pub subject: Var,
    pub predicate: Term,
    pub object: Var,
}

impl Atom {
    pub fn new(subject: Var, predicate: impl Into<Term>, object: Var) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }

    /// Whether `var` is the subject or the object.
    pub fn mentions(&self, var: Var) -> bool {
        self.subject == var || self.object == var
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{})", self.predicate, self.subject, self.object)
    }
}

/// An immutable Horn rule in canonical form.
///
/// Body atoms and connections are kept sorted, so the derived `Eq`/`Hash`
/// are structural equality and a structural hash over
/// `(head, sorted body, sorted connections)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rule {
    head: Atom,
    body: Vec<Atom>,
    connections: Vec<Vec<Var>>,
}

impl Rule {
    /// Build a rule, normalizing body and connection order.
    ///
    /// Connection tuples with fewer than two variables carry no information
    /// and are dropped.
    pub fn new(head: Atom, mut body: Vec<Atom>, connections: Vec<Vec<Var>>) -> Self {
        body.sort();
        body.dedup();
        let mut connections: Vec<Vec<Var>> = connections
            .into_iter()
            .map(|mut knot| {
                knot.sort();
                knot.dedup();
                knot
            })
            .filter(|knot| knot.len() > 1)
            .collect();
        connections.sort();
        connections.dedup();
        Self {
            head,
            body,
            connections,
        }
    }

    pub fn head(&self) -> &Atom {
        &self.head
    }

    /// Body atoms in traversal order.
    pub fn body(&self) -> &[Atom] {
        &self.body
    }

    /// Entity knots: each tuple lists the variables bound to one entity.
    pub fn connections(&self) -> &[Vec<Var>] {
        &self.connections
    }

    /// Number of body atoms.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Whether the rule may still grow: `len(body) < max_depth`.
    pub fn fits_max_depth(&self, max_depth: usize) -> bool {
        self.body.len() < max_depth
    }

    /// Whether the rule is acceptable as output.
    ///
    /// The head object must be tied to the body, every `=` atom must compare
    /// variables of one entity knot, and fusing knots along the body atoms
    /// must leave a single connected component.
    pub fn is_valid(&self) -> bool {
        let head_object = self.head.object;
        if !self.connections.iter().any(|knot| knot.contains(&head_object)) {
            return false;
        }

        let knots = Knots::new(self);
        let mut fused = UnionFind::new(knots.len());
        for atom in &self.body {
            let s = knots.of(atom.subject);
            let o = knots.of(atom.object);
            if atom.predicate.as_str() == EQUAL && s != o {
                return false;
            }
            fused.union(s, o);
        }

        let mut roots: HashSet<usize> = HashSet::new();
        roots.insert(fused.find(knots.of(self.head.subject)));
        roots.insert(fused.find(knots.of(head_object)));
        for atom in &self.body {
            roots.insert(fused.find(knots.of(atom.subject)));
        }
        roots.len() == 1
    }

    /// Existential generalization: keep only the knots touching a head
    /// variable and the body atoms that reach into them.
    pub fn unbind(&self) -> Rule {
        let connections: Vec<Vec<Var>> = self
            .connections
            .iter()
            .filter(|knot| knot.iter().any(|v| v.is_head()))
            .cloned()
            .collect();
        let mut surviving: HashSet<Var> = connections.iter().flatten().copied().collect();
        surviving.insert(Var::HEAD_SUBJECT);
        surviving.insert(Var::HEAD_OBJECT);

        let body = self
            .body
            .iter()
            .filter(|a| surviving.contains(&a.subject) || surviving.contains(&a.object))
            .cloned()
            .collect();
        Rule::new(self.head.clone(), body, connections)
    }

    /// All variables in head, body and connections.
    pub fn variables(&self) -> impl Iterator<Item = Var> + '_ {
        [self.head.subject, self.head.object]
            .into_iter()
            .chain(self.body.iter().flat_map(|a| [a.subject, a.object]))
            .chain(self.connections.iter().flatten().copied())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <=", self.head)?;
        for (i, atom) in self.body.iter().enumerate() {
            let sep = if i == 0 { " " } else { " & " };
            write!(f, "{sep}{atom}")?;
        }
        for knot in &self.connections {
            let vars: Vec<String> = knot.iter().map(Var::to_string).collect();
            write!(f, " [{}]", vars.join("="))?;
        }
        Ok(())
    }
}

/// Dense numbering of entity knots: one id per connection tuple, plus a
/// fresh id for every variable outside all tuples.
#[derive(Debug, Clone)]
pub(crate) struct Knots {
    ids: HashMap<Var, usize>,
    count: usize,
}

impl Knots {
    pub(crate) fn new(rule: &Rule) -> Self {
        let mut ids = HashMap::new();
        let mut count = 0;
        for knot in &rule.connections {
            for &v in knot {
                ids.entry(v).or_insert(count);
            }
            count += 1;
        }
        for v in rule.variables() {
            ids.entry(v).or_insert_with(|| {
                count += 1;
                count - 1
            });
        }
        Self { ids, count }
    }

    /// Knot id of a variable of the rule this was built from.
    pub(crate) fn of(&self, var: Var) -> usize {
        self.ids[&var]
    }

    /// Knot id of `var`, if the rule mentions it.
    pub(crate) fn get(&self, var: Var) -> Option<usize> {
        self.ids.get(&var).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(n: u32) -> Var {
        Var::new(n)
    }

    fn chain_rule() -> Rule {
        // album <- artist -> album' -> genre, closing on the head object
        Rule::new(
            Atom::new(v(1), "isGenre", v(2)),
            vec![
                Atom::new(v(3), "hasAlbum_1", v(4)),
                Atom::new(v(5), "hasAlbum_1", v(6)),
                Atom::new(v(7), "isGenre_1", v(8)),
            ],
            vec![vec![v(4), v(1)], vec![v(3), v(5)], vec![v(6), v(7)], vec![v(8), v(2)]],
        )
    }

    #[test]
    fn canonical_ordering_is_normalized() {
        let a = Rule::new(
            Atom::new(v(1), "p", v(2)),
            vec![Atom::new(v(5), "q", v(6)), Atom::new(v(3), "r", v(4))],
            vec![vec![v(4), v(5)], vec![v(1), v(3)], vec![v(7)]],
        );
        let b = Rule::new(
            Atom::new(v(1), "p", v(2)),
            vec![Atom::new(v(3), "r", v(4)), Atom::new(v(5), "q", v(6))],
            vec![vec![v(3), v(1)], vec![v(5), v(4)]],
        );
        assert_eq!(a, b);
        assert_eq!(a.connections(), &[vec![v(1), v(3)], vec![v(4), v(5)]]);
    }

    #[test]
    fn closed_chain_is_valid() {
        assert!(chain_rule().is_valid());
    }

    #[test]
    fn dangling_head_object_is_invalid() {
        let r = Rule::new(
            Atom::new(v(1), "isGenre", v(2)),
            vec![Atom::new(v(3), "hasAlbum_1", v(4))],
            vec![vec![v(1), v(4)]],
        );
        assert!(!r.is_valid());
    }

    #[test]
    fn disconnected_body_atom_is_invalid() {
        let mut body = chain_rule().body().to_vec();
        body.push(Atom::new(v(9), "collaboratedWith", v(10)));
        let r = Rule::new(
            Atom::new(v(1), "isGenre", v(2)),
            body,
            chain_rule().connections().to_vec(),
        );
        assert!(!r.is_valid());
    }

    #[test]
    fn equality_between_distinct_knots_is_invalid() {
        let r = Rule::new(
            Atom::new(v(1), "p", v(2)),
            vec![Atom::new(v(3), "=", v(4))],
            vec![vec![v(1), v(3)], vec![v(4), v(2)]],
        );
        assert!(!r.is_valid());

        let reflexive = Rule::new(
            Atom::new(v(1), "p", v(2)),
            vec![Atom::new(v(3), "q", v(4)), Atom::new(v(5), "=", v(6))],
            vec![vec![v(1), v(3)], vec![v(4), v(5), v(6), v(2)]],
        );
        assert!(reflexive.is_valid());
    }

    #[test]
    fn unbind_keeps_head_knots_only() {
        let u = chain_rule().unbind();
        assert_eq!(u.connections(), &[vec![v(1), v(4)], vec![v(2), v(8)]]);
        let preds: Vec<&str> = u.body().iter().map(|a| a.predicate.as_str()).collect();
        assert_eq!(preds, vec!["hasAlbum_1", "isGenre_1"]);
    }

    #[test]
    fn depth_bound() {
        let r = chain_rule();
        assert!(!r.fits_max_depth(3));
        assert!(r.fits_max_depth(4));
    }

    #[test]
    fn display_lists_atoms_and_knots() {
        let r = Rule::new(
            Atom::new(v(1), "p", v(2)),
            vec![Atom::new(v(3), "q", v(4))],
            vec![vec![v(1), v(3)], vec![v(2), v(4)]],
        );
        assert_eq!(r.to_string(), "p(?V1,?V2) <= q(?V3,?V4) [?V1=?V3] [?V2=?V4]");
    }
}
