//! Ontology: class hierarchy, property domain/range, and the type guard used
//! when growing rule paths.
//!
//! The ontology is loaded once per run and never mutated. A candidate edge is
//! only added to a path if the entity it reaches fits the declared domain or
//! range of the edge's property. Missing type assertions and properties
//! without a signature simply fail the check.

pub mod literal;

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::graph::Triple;
use crate::graph::index::GraphIndex;
use crate::predicate::PredicateMap;
use crate::term::{Term, local_type_name};

use literal::{LiteralHierarchy, derivable, is_valid_comp};

/// Declared domain and range classes of a property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySignature {
    #[serde(default)]
    pub domain: HashSet<Term>,
    #[serde(default)]
    pub range: HashSet<Term>,
}

/// Class hierarchy plus property signatures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ontology {
    /// Class → direct superclasses.
    #[serde(default)]
    pub classes: HashMap<Term, HashSet<Term>>,
    /// Property → declared domain/range.
    #[serde(default)]
    pub properties: HashMap<Term, PropertySignature>,
    /// Built-in datatype hierarchy for literal ranges.
    #[serde(skip)]
    pub literal_hierarchy: LiteralHierarchy,
}

impl Ontology {
    /// Create an ontology from explicit tables with the default XSD hierarchy.
    pub fn new(
        classes: HashMap<Term, HashSet<Term>>,
        properties: HashMap<Term, PropertySignature>,
    ) -> Self {
        Self {
            classes,
            properties,
            literal_hierarchy: LiteralHierarchy::default(),
        }
    }

    /// Declare `class` with the given direct superclasses.
    pub fn add_class<I, S>(&mut self, class: impl Into<Term>, superclasses: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<Term>,
    {
        self.classes
            .entry(class.into())
            .or_default()
            .extend(superclasses.into_iter().map(Into::into));
    }

    /// Declare the domain and range of `property`.
    pub fn add_property<D, R>(&mut self, property: impl Into<Term>, domain: D, range: R)
    where
        D: IntoIterator,
        D::Item: Into<Term>,
        R: IntoIterator,
        R::Item: Into<Term>,
    {
        self.properties.insert(
            property.into(),
            PropertySignature {
                domain: domain.into_iter().map(Into::into).collect(),
                range: range.into_iter().map(Into::into).collect(),
            },
        );
    }

    /// Reflexive-transitive superclass closure of `classes`.
    pub fn superclass_closure<'a>(&self, classes: impl IntoIterator<Item = &'a Term>) -> HashSet<Term> {
        let mut closure: HashSet<Term> = HashSet::new();
        let mut queue: VecDeque<Term> = VecDeque::new();
        for class in classes {
            if closure.insert(class.clone()) {
                queue.push_back(class.clone());
            }
        }
        while let Some(current) = queue.pop_front() {
            if let Some(parents) = self.classes.get(&current) {
                for parent in parents {
                    if closure.insert(parent.clone()) {
                        queue.push_back(parent.clone());
                    }
                }
            }
        }
        closure
    }

    /// Domain/range entry for `predicate`, looked up under its
    /// post-normalization name first and its original name second.
    pub fn signature(&self, predicate: &str, pmap: &PredicateMap) -> Option<&PropertySignature> {
        self.properties
            .get(predicate)
            .or_else(|| self.properties.get(pmap.original_or_self(predicate)))
    }

    /// Classes asserted for `entity` through any variant of `type_predicate`.
    pub fn types_of(
        &self,
        entity: &Term,
        graph: &GraphIndex,
        pmap: &PredicateMap,
        type_predicate: &str,
    ) -> HashSet<Term> {
        let mut types: HashSet<Term> = graph.objects_of(entity, type_predicate).cloned().collect();
        for variant in pmap.new_preds(type_predicate) {
            types.extend(graph.objects_of(entity, variant.as_str()).cloned());
        }
        types
    }

    /// Whether `entity` may occupy its position(s) in `triple`.
    ///
    /// Comparison triples defer to [`is_valid_comp`] regardless of `entity`.
    /// Literals may only be objects and must derive one of the declared range
    /// datatypes. Resources must have a declared type whose superclass
    /// closure meets the domain (as subject) or range (as object).
    pub fn fits_domain_range(
        &self,
        entity: &Term,
        triple: &Triple,
        graph: &GraphIndex,
        pmap: &PredicateMap,
        type_predicate: &str,
    ) -> bool {
        if triple.predicate.is_comparison() {
            return is_valid_comp(&triple.subject, triple.predicate.as_str(), &triple.object);
        }

        let is_subject = &triple.subject == entity;
        let is_object = &triple.object == entity;
        if !is_subject && !is_object {
            return false;
        }

        let Some(signature) = self.signature(triple.predicate.as_str(), pmap) else {
            return false;
        };

        if let Some(lit) = entity.literal() {
            if is_subject {
                return false;
            }
            return signature.range.iter().any(|range| {
                derivable(lit.datatype, local_type_name(range.as_str()), &self.literal_hierarchy)
            });
        }

        let declared = self.types_of(entity, graph, pmap, type_predicate);
        if declared.is_empty() {
            return false;
        }
        let closure = self.superclass_closure(&declared);

        let meets = |required: &HashSet<Term>| required.iter().any(|c| closure.contains(c));
        (!is_subject || meets(&signature.domain)) && (!is_object || meets(&signature.range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::MappingTables;
    use std::sync::Arc;

    const TYPE: &str = "rdf:type";

    fn pmap() -> PredicateMap {
        let mappings = HashMap::from([
            (Term::new("hasAlbum_1"), Term::new("hasAlbum")),
            (Term::new("releaseYear_1"), Term::new("releaseYear")),
            (Term::new("type_1"), Term::new(TYPE)),
        ]);
        PredicateMap::for_target(Arc::new(MappingTables::new(mappings, HashMap::new())), "hasAlbum")
    }

    fn ontology() -> Ontology {
        let mut o = Ontology::default();
        o.add_class("Band", ["Artist"]);
        o.add_class("Artist", ["Agent"]);
        o.add_class("Album", ["Work"]);
        o.add_property("hasAlbum", ["Artist"], ["Album"]);
        o.add_property("releaseYear", ["Album"], ["xsd:decimal"]);
        o
    }

    fn graph() -> GraphIndex {
        GraphIndex::from_triples(&[
            Triple::new("Dire_Straits", "type_1", "Band"),
            Triple::new("Making_Movies", "type_1", "Album"),
            Triple::new("Dire_Straits", "hasAlbum_1", "Making_Movies"),
            Triple::new("Making_Movies", "releaseYear_1", "\"1980\"^^xsd:integer"),
        ])
    }

    #[test]
    fn closure_is_reflexive_and_transitive() {
        let o = ontology();
        let closure = o.superclass_closure(&[Term::new("Band")]);
        assert_eq!(
            closure,
            HashSet::from([Term::new("Band"), Term::new("Artist"), Term::new("Agent")])
        );
    }

    #[test]
    fn resource_fits_through_superclass() {
        let o = ontology();
        let t = Triple::new("Dire_Straits", "hasAlbum_1", "Making_Movies");
        assert!(o.fits_domain_range(&Term::new("Dire_Straits"), &t, &graph(), &pmap(), TYPE));
        assert!(o.fits_domain_range(&Term::new("Making_Movies"), &t, &graph(), &pmap(), TYPE));
    }

    #[test]
    fn resource_in_wrong_position_fails() {
        let o = ontology();
        let t = Triple::new("Making_Movies", "hasAlbum_1", "Dire_Straits");
        assert!(!o.fits_domain_range(&Term::new("Dire_Straits"), &t, &graph(), &pmap(), TYPE));
    }

    #[test]
    fn missing_type_or_signature_fails() {
        let o = ontology();
        let t = Triple::new("Nobody", "hasAlbum_1", "Making_Movies");
        assert!(!o.fits_domain_range(&Term::new("Nobody"), &t, &graph(), &pmap(), TYPE));

        let t = Triple::new("Dire_Straits", "unknownProp", "Making_Movies");
        assert!(!o.fits_domain_range(&Term::new("Dire_Straits"), &t, &graph(), &pmap(), TYPE));
    }

    #[test]
    fn literal_object_checks_datatype_derivation() {
        let o = ontology();
        let lit = Term::new("\"1980\"^^xsd:integer");
        let t = Triple::new(Term::new("Making_Movies"), Term::new("releaseYear_1"), lit.clone());
        assert!(o.fits_domain_range(&lit, &t, &graph(), &pmap(), TYPE));

        let date = Term::new("\"1980-01-01\"^^xsd:date");
        let t = Triple::new(Term::new("Making_Movies"), Term::new("releaseYear_1"), date.clone());
        assert!(!o.fits_domain_range(&date, &t, &graph(), &pmap(), TYPE));
    }

    #[test]
    fn comparison_ignores_entity() {
        let o = ontology();
        let a = Term::new("\"1\"^^xsd:integer");
        let b = Term::new("\"2\"^^xsd:integer");
        let t = Triple::new(a.clone(), Term::new("<"), b.clone());
        assert!(o.fits_domain_range(&Term::new("anything"), &t, &graph(), &pmap(), TYPE));
        let t = Triple::new(b, Term::new("<"), a);
        assert!(!o.fits_domain_range(&Term::new("anything"), &t, &graph(), &pmap(), TYPE));
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "classes": {"Band": ["Artist"]},
            "properties": {"hasAlbum": {"domain": ["Artist"], "range": ["Album"]}}
        }"#;
        let o: Ontology = serde_json::from_str(json).unwrap();
        assert!(o.classes[&Term::new("Band")].contains("Artist"));
        assert!(o.properties[&Term::new("hasAlbum")].range.contains("Album"));
        assert!(derivable("integer", "decimal", &o.literal_hierarchy));
    }
}
