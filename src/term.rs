//! Terms: the opaque labels that name entities and predicates.
//!
//! A [`Term`] is a cheap-to-clone, reference-counted string. Resources are
//! plain identifiers (prefixes are stripped upstream), literals are written
//! `"value"^^type`. The two comparison pseudo-predicates `=` and `<` are also
//! terms, but they describe value comparisons and never name graph edges.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Literal-equality pseudo-predicate.
pub const EQUAL: &str = "=";
/// Literal strict-order pseudo-predicate.
pub const LESS: &str = "<";

/// An entity or predicate label.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Term(Arc<str>);

impl Term {
    /// Create a term from any string-like value.
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(Arc::from(label.as_ref()))
    }

    /// The raw label.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this term is a typed literal (`"value"^^type`).
    pub fn is_literal(&self) -> bool {
        self.literal().is_some()
    }

    /// Split a typed literal into its payload and its XSD local type name.
    ///
    /// Returns `None` for resources.
    pub fn literal(&self) -> Option<Literal<'_>> {
        Literal::parse(&self.0)
    }

    /// Whether this term is one of the comparison pseudo-predicates.
    pub fn is_comparison(&self) -> bool {
        is_comparison(&self.0)
    }
}

/// Whether a predicate label is `=` or `<`.
pub fn is_comparison(predicate: &str) -> bool {
    predicate == EQUAL || predicate == LESS
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl AsRef<str> for Term {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Term {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Term {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Term::from)
    }
}

/// Borrowed view of a typed literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Literal<'a> {
    /// The lexical payload between the quotes.
    pub value: &'a str,
    /// The local XSD type name (`integer`, `decimal`, ...).
    pub datatype: &'a str,
}

impl<'a> Literal<'a> {
    /// Parse `"value"^^type`, where `type` may be `<full-uri>`, `xsd:name`
    /// or a bare name. Untyped quoted strings are `string` literals.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let rest = raw.strip_prefix('"')?;
        let close = rest.rfind('"')?;
        let value = &rest[..close];
        let suffix = &rest[close + 1..];
        if suffix.is_empty() || suffix.starts_with('@') {
            return Some(Self {
                value,
                datatype: "string",
            });
        }
        let datatype = suffix.strip_prefix("^^")?;
        Some(Self {
            value,
            datatype: local_type_name(datatype),
        })
    }
}

/// Reduce a datatype reference to its local name.
///
/// `<http://www.w3.org/2001/XMLSchema#integer>`, `xsd:integer` and `integer`
/// all reduce to `integer`. Some exports write `XMLSchema#/int`; the stray
/// slash is dropped too.
pub fn local_type_name(datatype: &str) -> &str {
    let trimmed = datatype.trim_start_matches('<').trim_end_matches('>');
    let local = match trimmed.rfind(['#', ':']) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    };
    let local = local.trim_start_matches('/');
    match local.rfind('/') {
        Some(idx) => &local[idx + 1..],
        None => local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resources_are_not_literals() {
        assert!(!Term::new("Dire_Straits").is_literal());
        assert!(!Term::new("http://example.org/Sting").is_literal());
    }

    #[test]
    fn typed_literal_with_full_uri() {
        let t = Term::new("\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>");
        let lit = t.literal().unwrap();
        assert_eq!(lit.value, "42");
        assert_eq!(lit.datatype, "integer");
    }

    #[test]
    fn typed_literal_with_prefix() {
        let lit = Literal::parse("\"1.5\"^^xsd:decimal").unwrap();
        assert_eq!(lit.value, "1.5");
        assert_eq!(lit.datatype, "decimal");
    }

    #[test]
    fn plain_and_language_tagged_strings() {
        assert_eq!(Literal::parse("\"abc\"").unwrap().datatype, "string");
        assert_eq!(Literal::parse("\"abc\"@en").unwrap().datatype, "string");
    }

    #[test]
    fn quoted_payload_may_contain_quotes() {
        let lit = Literal::parse("\"say \"hi\"\"^^xsd:string").unwrap();
        assert_eq!(lit.value, "say \"hi\"");
    }

    #[test]
    fn local_names() {
        assert_eq!(local_type_name("<http://www.w3.org/2001/XMLSchema#/int>"), "int");
        assert_eq!(local_type_name("xsd:date"), "date");
        assert_eq!(local_type_name("gYear"), "gYear");
    }

    #[test]
    fn comparison_predicates() {
        assert!(Term::new("=").is_comparison());
        assert!(Term::new("<").is_comparison());
        assert!(!Term::new("hasAlbum").is_comparison());
    }

    #[test]
    fn borrow_as_str_for_lookups() {
        let mut set = std::collections::HashSet::new();
        set.insert(Term::new("x"));
        assert!(set.contains("x"));
    }
}
