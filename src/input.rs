//! Loaders for the miner's input files.
//!
//! - the normalized graph: one triple per line, N-Triples style
//!   (`<s> <p> <o> .`) or plain whitespace-separated terms
//! - predicate mapping tables: flat JSON objects of strings
//! - the ontology: JSON with `classes` and `properties`

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::error::InputError;
use crate::graph::Triple;
use crate::graph::index::GraphIndex;
use crate::ontology::Ontology;
use crate::term::Term;

/// One term: an `<IRI>`, a quoted literal with optional `^^type` or
/// `@lang`, or a bare token.
const TERM: &str = r#"(<[^>]*>|"(?:[^"\\]|\\.)*"(?:\^\^(?:<[^>]*>|\S+)|@[A-Za-z0-9-]+)?|[^\s"<#]\S*)"#;

static RE_TRIPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*{TERM}\s+{TERM}\s+{TERM}\s*\.?\s*$")).unwrap()
});

/// Strip the angle brackets of an IRI; literals and bare tokens stay as
/// written.
fn clean_term(raw: &str) -> Term {
    match raw.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
        Some(iri) => Term::new(iri),
        None => Term::new(raw),
    }
}

/// Parse one line. `None` if it is not a triple.
pub fn parse_triple_line(line: &str) -> Option<Triple> {
    let caps = RE_TRIPLE.captures(line)?;
    let subject = clean_term(caps.get(1)?.as_str());
    let predicate = clean_term(caps.get(2)?.as_str());
    let object = clean_term(caps.get(3)?.as_str());
    Some(Triple::new(subject, predicate, object))
}

/// Parse a whole graph file. Blank lines and `#` comments are skipped;
/// `origin` names the source in errors.
pub fn parse_triples(content: &str, origin: &str) -> Result<Vec<Triple>, InputError> {
    let mut triples = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let triple = parse_triple_line(trimmed).ok_or_else(|| InputError::MalformedTriple {
            path: origin.to_string(),
            line: i + 1,
            content: trimmed.to_string(),
        })?;
        triples.push(triple);
    }
    Ok(triples)
}

fn read(path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|e| InputError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load triples from a graph file.
pub fn load_triples(path: &Path) -> Result<Vec<Triple>, InputError> {
    parse_triples(&read(path)?, &path.display().to_string())
}

/// Load a graph file straight into an index.
pub fn load_graph(path: &Path) -> Result<GraphIndex, InputError> {
    let triples = load_triples(path)?;
    let graph = GraphIndex::from_triples(&triples);
    info!(
        path = %path.display(),
        triples = graph.triple_count(),
        nodes = graph.node_count(),
        "loaded graph"
    );
    Ok(graph)
}

/// Parse a mapping table `{ "from": "to", ... }`.
pub fn parse_mappings(content: &str, origin: &str) -> Result<HashMap<Term, Term>, InputError> {
    serde_json::from_str(content).map_err(|e| InputError::Json {
        path: origin.to_string(),
        message: e.to_string(),
    })
}

/// Load a mapping table from a JSON file.
pub fn load_mappings(path: &Path) -> Result<HashMap<Term, Term>, InputError> {
    parse_mappings(&read(path)?, &path.display().to_string())
}

/// Parse an ontology document.
pub fn parse_ontology(content: &str, origin: &str) -> Result<Ontology, InputError> {
    serde_json::from_str(content).map_err(|e| InputError::Json {
        path: origin.to_string(),
        message: e.to_string(),
    })
}

/// Load an ontology from a JSON file.
pub fn load_ontology(path: &Path) -> Result<Ontology, InputError> {
    let ontology = parse_ontology(&read(path)?, &path.display().to_string())?;
    info!(
        path = %path.display(),
        classes = ontology.classes.len(),
        properties = ontology.properties.len(),
        "loaded ontology"
    );
    Ok(ontology)
}
