//! Rich diagnostic error types for the rule miner.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so users know what went wrong before
//! any mining starts. Lookup misses during the search itself (missing types,
//! missing domain/range entries) are not errors: they reject a candidate edge.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the miner.
#[derive(Debug, Error, Diagnostic)]
pub enum MineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Predicate(#[from] PredicateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Search(#[from] SearchError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("alpha must lie in [0, 1], got {alpha}")]
    #[diagnostic(
        code(horn::config::alpha_range),
        help(
            "alpha weighs generation-set coverage against validation-set coverage; \
             beta is derived as 1 - alpha. Pick a value between 0 and 1."
        )
    )]
    AlphaOutOfRange { alpha: f64 },

    #[error("max_depth must be at least 1")]
    #[diagnostic(
        code(horn::config::max_depth),
        help("max_depth bounds the number of body atoms of a mined rule. Use 1 or more.")
    )]
    ZeroMaxDepth,

    #[error("unknown rule type: {rule_type}")]
    #[diagnostic(
        code(horn::config::rule_type),
        help("The only supported rule type is \"rudik\".")
    )]
    UnknownRuleType { rule_type: String },

    #[error("the config has no [inputs] table")]
    #[diagnostic(
        code(horn::config::inputs),
        help("Add an [inputs] table naming the graph, predicate_mappings and ontology files.")
    )]
    MissingInputs,

    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(horn::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(horn::config::parse),
        help("Check the TOML syntax and the field names of the mining config.")
    )]
    Parse { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum InputError {
    #[error("failed to read {path}")]
    #[diagnostic(
        code(horn::input::io),
        help("Check that the file exists and that the path in the config is correct.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed triple at {path}:{line}: {content}")]
    #[diagnostic(
        code(horn::input::triple),
        help(
            "Each line must hold a subject, a predicate and an object, optionally \
             followed by '.'. Literals are written \"value\"^^type."
        )
    )]
    MalformedTriple {
        path: String,
        line: usize,
        content: String,
    },

    #[error("malformed JSON in {path}: {message}")]
    #[diagnostic(
        code(horn::input::json),
        help(
            "Predicate mappings are flat JSON objects of strings. The ontology \
             needs a \"classes\" object and a \"properties\" object."
        )
    )]
    Json { path: String, message: String },
}

// ---------------------------------------------------------------------------
// Predicate mapping errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum PredicateError {
    #[error("predicate {predicate} has no original predicate")]
    #[diagnostic(
        code(horn::predicate::unresolved),
        help(
            "Every predicate in the normalized graph must appear in the predicate \
             mapping table, either directly or through the negative mapping. \
             Re-run the normalizer or fix the mapping files."
        )
    )]
    Unresolved { predicate: String },
}

// ---------------------------------------------------------------------------
// Search errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SearchError {
    #[error("cannot expand a closed path with head ({subject}, {predicate}, {object})")]
    #[diagnostic(
        code(horn::search::closed_path),
        help("A path that already reaches its head object has no frontier to grow from.")
    )]
    ClosedPath {
        subject: String,
        predicate: String,
        object: String,
    },

    #[error("the generation set is empty")]
    #[diagnostic(
        code(horn::search::empty_generation),
        help("Rule search needs at least one positive example of the target predicate.")
    )]
    EmptyGenerationSet,
}

/// Convenience alias for functions returning miner results.
pub type MineResult<T> = std::result::Result<T, MineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_mine_error() {
        let err = ConfigError::AlphaOutOfRange { alpha: 1.5 };
        let mine: MineError = err.into();
        assert!(matches!(
            mine,
            MineError::Config(ConfigError::AlphaOutOfRange { .. })
        ));
    }

    #[test]
    fn search_error_converts_to_mine_error() {
        let mine: MineError = SearchError::EmptyGenerationSet.into();
        assert!(matches!(mine, MineError::Search(SearchError::EmptyGenerationSet)));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = PredicateError::Unresolved {
            predicate: "hasAlbum_3".into(),
        };
        assert!(format!("{err}").contains("hasAlbum_3"));

        let err = InputError::MalformedTriple {
            path: "kg.nt".into(),
            line: 7,
            content: "broken".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("kg.nt:7"));
    }
}
