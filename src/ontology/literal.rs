//! Fixed XSD datatype hierarchy and literal comparisons.

use std::collections::{HashMap, HashSet};

use crate::term::{EQUAL, LESS, Term};

/// Built-in datatype derivations (parent → direct children), following the
/// XML Schema 1.1 datatype tree with `rdfs:Literal` at the root.
const XSD_HIERARCHY: &[(&str, &[&str])] = &[
    ("Literal", &["anySimpleType", "langString"]),
    (
        "anySimpleType",
        &[
            "string",
            "boolean",
            "decimal",
            "float",
            "double",
            "duration",
            "dateTime",
            "time",
            "date",
            "gYearMonth",
            "gYear",
            "gMonthDay",
            "gDay",
            "gMonth",
            "hexBinary",
            "base64Binary",
            "anyURI",
            "QName",
        ],
    ),
    ("string", &["normalizedString"]),
    ("normalizedString", &["token"]),
    ("token", &["language", "Name", "NMTOKEN"]),
    ("Name", &["NCName"]),
    ("NCName", &["ID", "IDREF", "ENTITY"]),
    ("decimal", &["integer"]),
    ("integer", &["nonPositiveInteger", "long", "nonNegativeInteger"]),
    ("nonPositiveInteger", &["negativeInteger"]),
    ("long", &["int"]),
    ("int", &["short"]),
    ("short", &["byte"]),
    ("nonNegativeInteger", &["unsignedLong", "positiveInteger"]),
    ("unsignedLong", &["unsignedInt"]),
    ("unsignedInt", &["unsignedShort"]),
    ("unsignedShort", &["unsignedByte"]),
    ("dateTime", &["dateTimeStamp"]),
    ("duration", &["dayTimeDuration", "yearMonthDuration"]),
];

/// Datatype → direct child datatypes.
#[derive(Debug, Clone)]
pub struct LiteralHierarchy {
    children: HashMap<String, HashSet<String>>,
}

impl LiteralHierarchy {
    /// An empty hierarchy where every type only derives itself.
    pub fn empty() -> Self {
        Self {
            children: HashMap::new(),
        }
    }

    /// Direct children of `datatype`.
    pub fn children(&self, datatype: &str) -> impl Iterator<Item = &str> {
        self.children
            .get(datatype)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Register `child` as a direct subtype of `parent`.
    pub fn insert(&mut self, parent: impl Into<String>, child: impl Into<String>) {
        self.children
            .entry(parent.into())
            .or_default()
            .insert(child.into());
    }
}

impl Default for LiteralHierarchy {
    fn default() -> Self {
        let mut h = Self::empty();
        for (parent, children) in XSD_HIERARCHY {
            for child in *children {
                h.insert(*parent, *child);
            }
        }
        h
    }
}

/// Whether `datatype` equals `ancestor` or is (transitively) derived from it.
pub fn derivable(datatype: &str, ancestor: &str, hierarchy: &LiteralHierarchy) -> bool {
    let mut stack = vec![ancestor];
    let mut seen = HashSet::new();
    while let Some(current) = stack.pop() {
        if current == datatype {
            return true;
        }
        if seen.insert(current) {
            stack.extend(hierarchy.children(current));
        }
    }
    false
}

/// Check a literal comparison `(subject, predicate, object)`.
///
/// Both sides must be literals of the same datatype. `=` needs equal payloads,
/// `<` a strictly smaller payload in lexicographic order. Any other predicate
/// is not a comparison and fails.
pub fn is_valid_comp(subject: &Term, predicate: &str, object: &Term) -> bool {
    let (Some(s), Some(o)) = (subject.literal(), object.literal()) else {
        return false;
    };
    if s.datatype != o.datatype {
        return false;
    }
    match predicate {
        EQUAL => s.value == o.value,
        LESS => s.value < o.value,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_derives_decimal_not_reverse() {
        let h = LiteralHierarchy::default();
        assert!(derivable("integer", "decimal", &h));
        assert!(!derivable("decimal", "integer", &h));
    }

    #[test]
    fn derivation_is_reflexive_and_transitive() {
        let h = LiteralHierarchy::default();
        assert!(derivable("string", "string", &h));
        assert!(derivable("byte", "decimal", &h));
        assert!(derivable("unsignedByte", "Literal", &h));
        assert!(!derivable("date", "decimal", &h));
    }

    #[test]
    fn unknown_types_only_derive_themselves() {
        let h = LiteralHierarchy::default();
        assert!(derivable("myType", "myType", &h));
        assert!(!derivable("myType", "Literal", &h));
    }

    #[test]
    fn custom_hierarchy() {
        let mut h = LiteralHierarchy::empty();
        h.insert("number", "money");
        assert!(derivable("money", "number", &h));
        assert!(!derivable("integer", "decimal", &h));
    }

    #[test]
    fn equality_comparison() {
        let a = Term::new("\"5\"^^xsd:integer");
        let b = Term::new("\"5\"^^<http://www.w3.org/2001/XMLSchema#integer>");
        let c = Term::new("\"6\"^^xsd:integer");
        assert!(is_valid_comp(&a, "=", &b));
        assert!(!is_valid_comp(&a, "=", &c));
    }

    #[test]
    fn order_comparison_is_lexicographic() {
        let a = Term::new("\"1990\"^^xsd:gYear");
        let b = Term::new("\"2001\"^^xsd:gYear");
        assert!(is_valid_comp(&a, "<", &b));
        assert!(!is_valid_comp(&b, "<", &a));
        assert!(!is_valid_comp(&a, "<", &a));
    }

    #[test]
    fn comparison_requires_same_type_literals() {
        let int = Term::new("\"5\"^^xsd:integer");
        let dec = Term::new("\"5\"^^xsd:decimal");
        assert!(!is_valid_comp(&int, "=", &dec));
        assert!(!is_valid_comp(&Term::new("Sting"), "=", &int));
        assert!(!is_valid_comp(&int, "hasAlbum", &int));
    }
}
