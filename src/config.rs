//! Mining configuration, persisted as TOML.
//!
//! ```toml
//! targets = ["isGenre"]
//! max_depth = 3
//! alpha = 0.5
//!
//! [inputs]
//! graph = "transformed_kg.nt"
//! predicate_mappings = "predicate_mappings.json"
//! neg_predicate_mappings = "no_predicate_mappings.json"
//! ontology = "ontology.json"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::search::SearchParams;
use crate::search::weight::WeightParams;

/// Default type predicate (`rdf:type`).
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Rule languages the miner can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleType {
    /// Linear chains from the head subject, with self-loops at chain nodes.
    #[default]
    Rudik,
}

impl FromStr for RuleType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rudik" => Ok(Self::Rudik),
            other => Err(ConfigError::UnknownRuleType {
                rule_type: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rudik => f.write_str("rudik"),
        }
    }
}

/// Input file locations. Relative paths are resolved against the config
/// file's directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPaths {
    /// Normalized knowledge graph, one triple per line.
    pub graph: PathBuf,
    /// JSON object: normalized predicate → original predicate.
    pub predicate_mappings: PathBuf,
    /// JSON object: negative predicate → normalized predicate.
    #[serde(default)]
    pub neg_predicate_mappings: Option<PathBuf>,
    /// JSON ontology with `classes` and `properties`.
    pub ontology: PathBuf,
}

impl InputPaths {
    fn resolve(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.graph);
        join(&mut self.predicate_mappings);
        join(&mut self.ontology);
        if let Some(p) = self.neg_predicate_mappings.as_mut() {
            join(p);
        }
    }
}

/// Parameters of a mining run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Original predicates to mine rules for. Empty means every original
    /// predicate in the mapping table.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Maximum number of body atoms.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Requested size of the generation and validation sets.
    #[serde(default = "default_set_size")]
    pub set_size: usize,
    /// Weight of generation coverage; `beta = 1 - alpha`.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Predicate carrying class assertions.
    #[serde(default = "default_type_predicate")]
    pub type_predicate: String,
    /// Rule language, only `"rudik"` is known.
    #[serde(default = "default_rule_type")]
    pub rule_type: String,
    /// Also mine rules predicting constraint violations.
    #[serde(default)]
    pub mine_negative_rules: bool,
    /// Cap on search-loop rounds per target.
    #[serde(default)]
    pub max_iterations: Option<usize>,
    /// Shuffle candidate examples with this seed before truncating.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
    #[serde(default)]
    pub inputs: Option<InputPaths>,
}

fn default_max_depth() -> usize {
    3
}
fn default_set_size() -> usize {
    100
}
fn default_alpha() -> f64 {
    0.5
}
fn default_type_predicate() -> String {
    RDF_TYPE.into()
}
fn default_rule_type() -> String {
    RuleType::Rudik.to_string()
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            max_depth: default_max_depth(),
            set_size: default_set_size(),
            alpha: default_alpha(),
            type_predicate: default_type_predicate(),
            rule_type: default_rule_type(),
            mine_negative_rules: false,
            max_iterations: None,
            shuffle_seed: None,
            inputs: None,
        }
    }
}

impl MiningConfig {
    /// Check every parameter; run before any mining starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ConfigError::AlphaOutOfRange { alpha: self.alpha });
        }
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroMaxDepth);
        }
        self.rule_type()?;
        Ok(())
    }

    pub fn rule_type(&self) -> Result<RuleType, ConfigError> {
        self.rule_type.parse()
    }

    /// `1 - alpha`.
    pub fn beta(&self) -> f64 {
        1.0 - self.alpha
    }

    /// Search parameters derived from this config.
    pub fn search_params(&self) -> SearchParams {
        SearchParams {
            max_depth: self.max_depth,
            weights: WeightParams::from_alpha(self.alpha),
            max_iterations: self.max_iterations,
        }
    }

    /// The `[inputs]` table, required to load data from files.
    pub fn inputs(&self) -> Result<&InputPaths, ConfigError> {
        self.inputs.as_ref().ok_or(ConfigError::MissingInputs)
    }

    /// Parse from TOML text. Relative input paths stay as written.
    pub fn from_toml(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Load from a TOML file, resolving input paths against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config = Self::from_toml(&content, &path.display().to_string())?;
        if let (Some(inputs), Some(base)) = (config.inputs.as_mut(), path.parent()) {
            inputs.resolve(base);
        }
        Ok(config)
    }
}
