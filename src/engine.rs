//! Engine facade: top-level API of the rule miner.
//!
//! The `Engine` owns the graph index, the predicate mapping tables and the
//! ontology for a whole run, and mines every target predicate against them.
//! Targets are independent: one failing or being skipped never affects the
//! others.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::config::MiningConfig;
use crate::context::MiningContext;
use crate::error::MineResult;
use crate::export::RuleRecord;
use crate::graph::index::GraphIndex;
use crate::input;
use crate::ontology::Ontology;
use crate::predicate::{MappingTables, PredicateMap};
use crate::rule::Rule;
use crate::search::examples::ExampleSelector;
use crate::search::{RuleSearch, StopReason};
use crate::term::Term;

/// What happened to one target run.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetStatus {
    /// The search ran to completion.
    Mined { iterations: usize, stop: StopReason },
    /// The generation or validation set came out empty.
    Skipped,
    /// The run failed; the message is the rendered error.
    Failed(String),
}

/// Result of mining one target, positive or negative.
#[derive(Debug, Clone)]
pub struct TargetReport {
    pub target: Term,
    pub negative: bool,
    pub rules: Vec<Rule>,
    pub status: TargetStatus,
}

impl TargetReport {
    fn skipped(target: &Term, negative: bool) -> Self {
        Self {
            target: target.clone(),
            negative,
            rules: Vec::new(),
            status: TargetStatus::Skipped,
        }
    }

    /// Output rows for the accepted rules.
    pub fn records(&self) -> Vec<RuleRecord> {
        self.rules
            .iter()
            .map(|r| RuleRecord::from_rule(r, self.target.as_str(), self.negative))
            .collect()
    }
}

/// Reports of a whole run, in target order.
#[derive(Debug, Clone, Default)]
pub struct MineReport {
    pub targets: Vec<TargetReport>,
}

impl MineReport {
    /// All output rows, target by target.
    pub fn records(&self) -> Vec<RuleRecord> {
        self.targets.iter().flat_map(TargetReport::records).collect()
    }

    pub fn rule_count(&self) -> usize {
        self.targets.iter().map(|t| t.rules.len()).sum()
    }
}

/// The rule miner.
pub struct Engine {
    config: MiningConfig,
    graph: Arc<GraphIndex>,
    tables: Arc<MappingTables>,
    ontology: Arc<Ontology>,
}

impl Engine {
    /// Create an engine over already loaded data.
    ///
    /// Fails if the config is invalid or a graph predicate has no original
    /// predicate.
    pub fn new(
        config: MiningConfig,
        graph: GraphIndex,
        tables: MappingTables,
        ontology: Ontology,
    ) -> MineResult<Self> {
        config.validate()?;
        tables.check_resolvable(&graph)?;
        info!(
            triples = graph.triple_count(),
            nodes = graph.node_count(),
            mappings = tables.len(),
            max_depth = config.max_depth,
            alpha = config.alpha,
            "initializing rule miner"
        );
        Ok(Self {
            config,
            graph: Arc::new(graph),
            tables: Arc::new(tables),
            ontology: Arc::new(ontology),
        })
    }

    /// Validate the config, then load every input it names.
    pub fn from_config(config: MiningConfig) -> MineResult<Self> {
        config.validate()?;
        let inputs = config.inputs()?.clone();
        let graph = input::load_graph(&inputs.graph)?;
        let mappings = input::load_mappings(&inputs.predicate_mappings)?;
        let neg_mappings = match &inputs.neg_predicate_mappings {
            Some(path) => input::load_mappings(path)?,
            None => Default::default(),
        };
        let ontology = input::load_ontology(&inputs.ontology)?;
        Self::new(config, graph, MappingTables::new(mappings, neg_mappings), ontology)
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    pub fn graph(&self) -> &GraphIndex {
        &self.graph
    }

    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    pub fn tables(&self) -> &MappingTables {
        &self.tables
    }

    /// Target predicates of this run: the configured ones, or every original
    /// predicate except the type predicate.
    pub fn targets(&self) -> Vec<Term> {
        if self.config.targets.is_empty() {
            self.tables
                .original_predicates()
                .into_iter()
                .filter(|p| p.as_str() != self.config.type_predicate)
                .collect()
        } else {
            self.config.targets.iter().map(Term::new).collect()
        }
    }

    /// Mine rules for one target. With `negative` set, the rules predict the
    /// target's constraint violations instead of its facts.
    pub fn mine_target(&self, target: &Term, negative: bool) -> MineResult<TargetReport> {
        let pmap = PredicateMap::for_target(Arc::clone(&self.tables), target.clone());
        let selector = ExampleSelector::new(&self.graph, self.config.set_size, self.config.shuffle_seed);
        let sets = selector.select(&pmap, negative);
        if sets.is_insufficient() {
            warn!(
                predicate = %target,
                negative,
                generation = sets.generation.len(),
                validation = sets.validation.len(),
                "skipping target: empty example set"
            );
            return Ok(TargetReport::skipped(target, negative));
        }

        info!(
            predicate = %target,
            negative,
            generation = sets.generation.len(),
            validation = sets.validation.len(),
            "mining target"
        );
        let ctx = MiningContext::new(&self.graph, &self.ontology, &pmap, &self.config.type_predicate);
        let heads = sets.seed_heads(&self.graph);
        let mut search = RuleSearch::new(ctx, self.config.search_params(), sets.generation, sets.validation)?;
        search.seed(heads)?;
        let outcome = search.run()?;

        Ok(TargetReport {
            target: target.clone(),
            negative,
            rules: outcome.rules,
            status: TargetStatus::Mined {
                iterations: outcome.iterations,
                stop: outcome.stop,
            },
        })
    }

    /// Mine every target in parallel. Failures are logged and recorded in
    /// the report; the remaining targets still run.
    pub fn mine(&self) -> MineReport {
        let mut runs: Vec<(Term, bool)> = Vec::new();
        for target in self.targets() {
            if self.config.mine_negative_rules {
                runs.push((target.clone(), true));
            }
            runs.push((target, false));
        }
        runs.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let targets = runs
            .par_iter()
            .map(|(target, negative)| {
                self.mine_target(target, *negative).unwrap_or_else(|e| {
                    error!(predicate = %target, negative, error = %e, "target failed");
                    TargetReport {
                        target: target.clone(),
                        negative: *negative,
                        rules: Vec::new(),
                        status: TargetStatus::Failed(e.to_string()),
                    }
                })
            })
            .collect();
        let report = MineReport { targets };
        info!(
            targets = report.targets.len(),
            rules = report.rule_count(),
            "mining finished"
        );
        report
    }

    /// Summary statistics of the loaded data.
    pub fn info(&self) -> EngineInfo {
        let negative_predicates = self
            .graph
            .predicates()
            .filter(|p| self.tables.is_negative(p.as_str()))
            .count();
        EngineInfo {
            triples: self.graph.triple_count(),
            nodes: self.graph.node_count(),
            predicates: self.graph.predicates().count(),
            negative_predicates,
            original_predicates: self.tables.original_predicates().len(),
            classes: self.ontology.classes.len(),
            properties: self.ontology.properties.len(),
            targets: self.targets().len(),
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("graph", &self.graph)
            .field("mappings", &self.tables.len())
            .field("max_depth", &self.config.max_depth)
            .finish()
    }
}

/// Summary of the data an engine was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    pub triples: usize,
    pub nodes: usize,
    pub predicates: usize,
    pub negative_predicates: usize,
    pub original_predicates: usize,
    pub classes: usize,
    pub properties: usize,
    pub targets: usize,
}

impl fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "horn-miner input summary")?;
        writeln!(f, "  triples:             {}", self.triples)?;
        writeln!(f, "  nodes:               {}", self.nodes)?;
        writeln!(f, "  predicates:          {}", self.predicates)?;
        writeln!(f, "  negative predicates: {}", self.negative_predicates)?;
        writeln!(f, "  original predicates: {}", self.original_predicates)?;
        writeln!(f, "  ontology classes:    {}", self.classes)?;
        writeln!(f, "  ontology properties: {}", self.properties)?;
        write!(f, "  targets:             {}", self.targets)
    }
}
