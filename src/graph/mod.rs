//! Knowledge graph data model and the predicate-indexed adjacency index.
//!
//! - [`Triple`]: a `(subject, predicate, object)` statement over [`Term`]s
//! - [`Example`]: a `(subject, object)` pair of the relation being mined
//! - [`index::GraphIndex`]: the read-only index the rule search runs against

pub mod index;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::term::Term;

/// A triple (subject, predicate, object) in the normalized knowledge graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    /// The subject; never a literal.
    pub subject: Term,
    /// The (post-normalization) predicate.
    pub predicate: Term,
    /// The object; a resource or a typed literal.
    pub object: Term,
}

impl Triple {
    /// Create a new triple.
    pub fn new(subject: impl Into<Term>, predicate: impl Into<Term>, object: impl Into<Term>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Whether subject and object are the same entity.
    pub fn is_reflexive(&self) -> bool {
        self.subject == self.object
    }

    /// Whether `entity` is the subject or the object.
    pub fn touches(&self, entity: &Term) -> bool {
        &self.subject == entity || &self.object == entity
    }

    /// The endpoint opposite to `entity`, or `None` if `entity` is not an endpoint.
    pub fn other_end(&self, entity: &Term) -> Option<&Term> {
        if &self.subject == entity {
            Some(&self.object)
        } else if &self.object == entity {
            Some(&self.subject)
        } else {
            None
        }
    }

    /// The `(subject, object)` pair of this triple.
    pub fn example(&self) -> Example {
        Example::new(self.subject.clone(), self.object.clone())
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.predicate, self.object)
    }
}

/// A subject/object pair for the target relation.
///
/// Generation-set examples are known facts; validation-set examples are
/// pairs the target relation should not hold for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Example {
    pub subject: Term,
    pub object: Term,
}

impl Example {
    pub fn new(subject: impl Into<Term>, object: impl Into<Term>) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for Example {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.subject, self.object)
    }
}
