//! Greedy weighted rule search for one target predicate.
//!
//! The search keeps a pool of candidate rules, each backed by the paths it
//! was grown from. Every round scores the whole pool in parallel against the
//! current accepted set, then takes the lowest-weight rule and either
//! accepts it, grows its paths by one edge, or drops it.
//!
//! ```text
//! seed  ──► score pool ──► best rule valid? ──► accept, clear caches
//!              ▲                │ no
//!              │                ├──► fits depth? ──► expand its paths
//!              └────────────────┴──► otherwise drop
//! ```

pub mod examples;
pub mod weight;

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::context::MiningContext;
use crate::error::SearchError;
use crate::graph::{Example, Triple};
use crate::rule::Rule;
use crate::rule::expand::{CandidatePool, expand_path_rudik};
use crate::rule::path::Path;

use weight::{AcceptedCoverage, WeightCache, WeightParams, generation_support};

/// Tuning knobs for one search run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    /// Rules only grow while `len(body) < max_depth`.
    pub max_depth: usize,
    pub weights: WeightParams,
    /// Optional cap on search-loop rounds.
    pub max_iterations: Option<usize>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_depth: 3,
            weights: WeightParams::from_alpha(0.5),
            max_iterations: None,
        }
    }
}

/// Why a search run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No candidate rules remain.
    PoolExhausted,
    /// Every generation example is supported by an accepted rule.
    GenerationCovered,
    /// The best remaining rule would not improve the accepted set.
    NoImprovement,
    /// The iteration budget ran out.
    IterationBudget,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PoolExhausted => "pool exhausted",
            Self::GenerationCovered => "generation set covered",
            Self::NoImprovement => "no improving rule",
            Self::IterationBudget => "iteration budget reached",
        };
        f.write_str(s)
    }
}

/// Result of a finished search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Accepted rules in acceptance order.
    pub rules: Vec<Rule>,
    pub iterations: usize,
    pub stop: StopReason,
}

#[derive(Debug, Clone)]
struct Scored {
    rule: Rule,
    weight: f64,
    valid: bool,
}

impl Scored {
    /// Lower weight first; on ties valid rules first, then rule order.
    fn rank(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| other.valid.cmp(&self.valid))
            .then_with(|| self.rule.cmp(&other.rule))
    }
}

/// State of one greedy search.
pub struct RuleSearch<'a> {
    ctx: MiningContext<'a>,
    params: SearchParams,
    generation: Vec<Example>,
    generation_set: HashSet<Example>,
    validation: Vec<Example>,
    pool: CandidatePool,
    accepted: Vec<Rule>,
    coverage: AcceptedCoverage,
    cache: WeightCache,
    iterations: usize,
}

impl<'a> RuleSearch<'a> {
    /// Create a search over the given example sets. The generation set must
    /// not be empty.
    pub fn new(
        ctx: MiningContext<'a>,
        params: SearchParams,
        generation: Vec<Example>,
        validation: Vec<Example>,
    ) -> Result<Self, SearchError> {
        if generation.is_empty() {
            return Err(SearchError::EmptyGenerationSet);
        }
        let generation_set = generation.iter().cloned().collect();
        Ok(Self {
            ctx,
            params,
            generation,
            generation_set,
            validation,
            pool: CandidatePool::new(),
            accepted: Vec::new(),
            coverage: AcceptedCoverage::default(),
            cache: WeightCache::new(),
            iterations: 0,
        })
    }

    /// Expand one zero-length path per head triple into the pool. Returns
    /// the number of paths added.
    pub fn seed(&mut self, heads: impl IntoIterator<Item = Triple>) -> Result<usize, SearchError> {
        let mut added = 0;
        for head in heads {
            added += expand_path_rudik(&mut self.pool, &Path::new(head), self.ctx)?;
        }
        debug!(
            predicate = %self.ctx.pmap.target(),
            rules = self.pool.len(),
            paths = added,
            "seeded candidate pool"
        );
        Ok(added)
    }

    pub fn pool(&self) -> &CandidatePool {
        &self.pool
    }

    /// Rules accepted so far, in acceptance order.
    pub fn accepted(&self) -> &[Rule] {
        &self.accepted
    }

    /// Generation examples supported by accepted rules.
    pub fn covered_generation(&self) -> &HashSet<Example> {
        &self.coverage.generation
    }

    pub fn generation(&self) -> &[Example] {
        &self.generation
    }

    pub fn validation(&self) -> &[Example] {
        &self.validation
    }

    /// Run rounds until a stop condition holds.
    pub fn run(mut self) -> Result<SearchOutcome, SearchError> {
        let stop = loop {
            if let Some(stop) = self.step()? {
                break stop;
            }
        };
        info!(
            predicate = %self.ctx.pmap.target(),
            accepted = self.accepted.len(),
            iterations = self.iterations,
            %stop,
            "search finished"
        );
        Ok(SearchOutcome {
            rules: self.accepted,
            iterations: self.iterations,
            stop,
        })
    }

    /// Run one round. Returns the stop reason once the search is over.
    pub fn step(&mut self) -> Result<Option<StopReason>, SearchError> {
        if self
            .params
            .max_iterations
            .is_some_and(|budget| self.iterations >= budget)
        {
            return Ok(Some(StopReason::IterationBudget));
        }
        if self.generation_set.is_subset(&self.coverage.generation) {
            return Ok(Some(StopReason::GenerationCovered));
        }
        if self.pool.is_empty() {
            return Ok(Some(StopReason::PoolExhausted));
        }
        self.iterations += 1;

        let scores = self.score_pool();
        let max_depth = self.params.max_depth;
        let (dead, live): (Vec<Scored>, Vec<Scored>) = scores
            .into_iter()
            .partition(|s| !s.rule.fits_max_depth(max_depth) && (s.weight >= 0.0 || !s.valid));
        for s in &dead {
            self.pool.remove(&s.rule);
        }

        let Some(best) = live.into_iter().min_by(Scored::rank) else {
            return Ok(Some(StopReason::PoolExhausted));
        };
        debug!(
            iteration = self.iterations,
            pool = self.pool.len(),
            pruned = dead.len(),
            rule = %best.rule,
            weight = best.weight,
            valid = best.valid,
            "best candidate"
        );
        if best.weight >= 0.0 {
            return Ok(Some(StopReason::NoImprovement));
        }

        if best.valid {
            self.accept(best.rule);
        } else if best.rule.fits_max_depth(max_depth) {
            self.expand(&best.rule)?;
        } else {
            self.pool.remove(&best.rule);
        }
        Ok(None)
    }

    /// Score every pool entry against the current accepted snapshot.
    fn score_pool(&self) -> Vec<Scored> {
        let generation = &self.generation_set;
        let validation = self.validation.as_slice();
        let coverage = &self.coverage;
        let cache = &self.cache;
        let ctx = self.ctx;
        let params = self.params.weights;

        self.pool
            .entries()
            .par_iter()
            .map(|(rule, paths)| Scored {
                rule: rule.clone(),
                weight: cache.weight(rule, paths, coverage, generation, validation, ctx, params),
                valid: rule.is_valid(),
            })
            .collect()
    }

    fn accept(&mut self, rule: Rule) {
        let paths = self.pool.remove(&rule).unwrap_or_default();
        let gained = generation_support(&paths, &self.generation_set);
        let mut generation = std::mem::take(&mut self.coverage.generation);
        generation.extend(gained);

        info!(
            predicate = %self.ctx.pmap.target(),
            rule = %rule,
            covered = generation.len(),
            of = self.generation.len(),
            "accepted rule"
        );
        self.accepted.push(rule);
        self.coverage =
            AcceptedCoverage::compute(&self.accepted, generation, &self.validation, self.ctx);
        self.cache.clear();
    }

    fn expand(&mut self, rule: &Rule) -> Result<usize, SearchError> {
        let Some(paths) = self.pool.remove(rule) else {
            return Ok(0);
        };
        let mut added = 0;
        for path in paths.iter().filter(|p| p.frontier().is_some()) {
            added += expand_path_rudik(&mut self.pool, path, self.ctx)?;
        }
        debug!(rule = %rule, paths = paths.len(), added, "expanded rule");
        Ok(added)
    }
}
