//! Marginal weight of a candidate rule and the per-round caches behind it.
//!
//! ```text
//! Δcov_g   = |cov_g(rule) − cov_g(accepted)|
//! cov_v    = |cov(accepted, V)|
//! uncov_v0 = |uncov(accepted, V)|
//! uncov_v1 = |uncov(accepted ∪ {rule}, V)|
//! weight   = −α · Δcov_g / |G| + β · (cov_v / uncov_v1 − cov_v / uncov_v0)
//! ```
//!
//! A ratio with a zero denominator contributes zero. Negative weights improve
//! the accepted set.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::context::MiningContext;
use crate::coverage::{CompiledRule, cov, uncov};
use crate::graph::Example;
use crate::rule::Rule;
use crate::rule::path::Path;

/// Weighting between generation gain (`alpha`) and validation penalty (`beta`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightParams {
    pub alpha: f64,
    pub beta: f64,
}

impl WeightParams {
    /// `beta = 1 - alpha`.
    pub fn from_alpha(alpha: f64) -> Self {
        Self {
            alpha,
            beta: 1.0 - alpha,
        }
    }
}

/// Coverage of the accepted rules, fixed between two acceptances.
#[derive(Debug, Clone, Default)]
pub struct AcceptedCoverage {
    /// Generation examples supported by accepted rules' paths.
    pub generation: HashSet<Example>,
    /// `|cov(accepted, V)|`.
    pub validation: usize,
    /// `uncov(accepted, V)`.
    pub unbound_validation: HashSet<Example>,
}

impl AcceptedCoverage {
    /// Recompute validation coverage for `accepted`; `generation` is carried
    /// over from the accepted rules' paths.
    pub fn compute(
        accepted: &[Rule],
        generation: HashSet<Example>,
        validation: &[Example],
        ctx: MiningContext<'_>,
    ) -> Self {
        Self {
            generation,
            validation: cov(accepted, ctx.graph, validation, ctx.pmap).len(),
            unbound_validation: uncov(accepted, ctx.graph, validation, ctx.pmap),
        }
    }
}

/// Generation examples a rule is supported by: its paths' head pairs that
/// are in G.
pub fn generation_support(paths: &HashSet<Path>, generation: &HashSet<Example>) -> HashSet<Example> {
    paths
        .iter()
        .map(Path::example)
        .filter(|e| generation.contains(e))
        .collect()
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Validation examples outside `uncov(accepted, V)` that the generalized
/// rule picks up, i.e. `uncov_v1 - uncov_v0`.
fn unbound_gain(
    rule: &Rule,
    accepted: &AcceptedCoverage,
    validation: &[Example],
    ctx: MiningContext<'_>,
) -> usize {
    let unbound = CompiledRule::new(&rule.unbind(), ctx.pmap);
    validation
        .iter()
        .filter(|e| !accepted.unbound_validation.contains(*e))
        .filter(|e| unbound.covers(ctx.graph, e))
        .count()
}

fn combine(
    generation_gain: usize,
    generation_size: usize,
    validation_gain: usize,
    accepted: &AcceptedCoverage,
    params: WeightParams,
) -> f64 {
    let cov_v = accepted.validation;
    let uncov_v0 = accepted.unbound_validation.len();
    let uncov_v1 = uncov_v0 + validation_gain;
    let generation_term = ratio(generation_gain, generation_size);
    let validation_term = ratio(cov_v, uncov_v1) - ratio(cov_v, uncov_v0);
    -params.alpha * generation_term + params.beta * validation_term
}

/// Estimated marginal weight of adding `rule` (supported by `paths`) to the
/// accepted set.
pub fn est_m_weight(
    rule: &Rule,
    paths: &HashSet<Path>,
    accepted: &AcceptedCoverage,
    generation: &HashSet<Example>,
    validation: &[Example],
    ctx: MiningContext<'_>,
    params: WeightParams,
) -> f64 {
    let generation_gain = generation_support(paths, generation)
        .difference(&accepted.generation)
        .count();
    let validation_gain = if accepted.validation == 0 {
        0
    } else {
        unbound_gain(rule, accepted, validation, ctx)
    };
    combine(generation_gain, generation.len(), validation_gain, accepted, params)
}

#[derive(Debug, Clone, Copy)]
struct CachedScore {
    /// Path count the generation gain was computed from.
    support: usize,
    validation_gain: usize,
    weight: f64,
}

/// Per-round weight cache, safe to fill from parallel scoring workers.
///
/// The validation gain of a rule only depends on the accepted set, so it is
/// kept until [`WeightCache::clear`]. The generation gain is recomputed
/// whenever the rule has gained paths since it was last scored.
#[derive(Debug, Default)]
pub struct WeightCache {
    scores: DashMap<Rule, CachedScore>,
}

impl WeightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached or freshly computed weight of `rule`. Same value as
    /// [`est_m_weight`].
    pub fn weight(
        &self,
        rule: &Rule,
        paths: &HashSet<Path>,
        accepted: &AcceptedCoverage,
        generation: &HashSet<Example>,
        validation: &[Example],
        ctx: MiningContext<'_>,
        params: WeightParams,
    ) -> f64 {
        let cached = self.scores.get(rule).map(|entry| *entry);
        if let Some(score) = cached {
            if score.support == paths.len() {
                return score.weight;
            }
        }

        let validation_gain = match cached {
            Some(score) => score.validation_gain,
            None if accepted.validation == 0 => 0,
            None => unbound_gain(rule, accepted, validation, ctx),
        };
        let generation_gain = generation_support(paths, generation)
            .difference(&accepted.generation)
            .count();
        let weight = combine(generation_gain, generation.len(), validation_gain, accepted, params);
        self.scores.insert(
            rule.clone(),
            CachedScore {
                support: paths.len(),
                validation_gain,
                weight,
            },
        );
        weight
    }

    /// Forget every score. Called whenever the accepted set changes.
    pub fn clear(&self) {
        self.scores.clear();
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Triple;
    use crate::graph::index::GraphIndex;
    use crate::ontology::Ontology;
    use crate::predicate::{MappingTables, PredicateMap};
    use crate::rule::{Atom, Var};
    use crate::term::Term;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn v(n: u32) -> Var {
        Var::new(n)
    }

    struct Fixture {
        graph: GraphIndex,
        ontology: Ontology,
        pmap: PredicateMap,
    }

    impl Fixture {
        fn new() -> Self {
            let graph = GraphIndex::from_triples(&[
                Triple::new("Sting", "hasAlbum", "Tens_Tales"),
                Triple::new("Dire_Straits", "hasAlbum", "Making_Movies"),
                Triple::new("Tens_Tales", "isGenre", "Pop"),
                Triple::new("Making_Movies", "isGenre", "Pop"),
                Triple::new("Sting", "bornIn", "Wallsend"),
            ]);
            let mappings = ["hasAlbum", "isGenre", "bornIn"]
                .into_iter()
                .map(|p| (Term::new(p), Term::new(p)))
                .collect();
            let pmap = PredicateMap::for_target(
                Arc::new(MappingTables::new(mappings, HashMap::new())),
                "isGenre",
            );
            Self {
                graph,
                ontology: Ontology::default(),
                pmap,
            }
        }

        fn ctx(&self) -> MiningContext<'_> {
            MiningContext::new(&self.graph, &self.ontology, &self.pmap, "type")
        }
    }

    fn rule() -> Rule {
        Rule::new(
            Atom::new(v(1), "isGenre", v(2)),
            vec![Atom::new(v(3), "hasAlbum", v(4))],
            vec![vec![v(1), v(4)]],
        )
    }

    fn paths(heads: &[(&str, &str)]) -> HashSet<Path> {
        heads
            .iter()
            .map(|(s, o)| {
                Path::new(Triple::new(*s, "isGenre", *o)).with_edge(Triple::new("x", "hasAlbum", *s))
            })
            .collect()
    }

    fn generation() -> HashSet<Example> {
        HashSet::from([
            Example::new("Tens_Tales", "Pop"),
            Example::new("Making_Movies", "Pop"),
        ])
    }

    #[test]
    fn generation_gain_only_on_empty_accepted_set() {
        let fx = Fixture::new();
        let w = est_m_weight(
            &rule(),
            &paths(&[("Tens_Tales", "Pop")]),
            &AcceptedCoverage::default(),
            &generation(),
            &[Example::new("Sting", "Wallsend")],
            fx.ctx(),
            WeightParams::from_alpha(0.5),
        );
        assert!((w - (-0.25)).abs() < 1e-12);
    }

    #[test]
    fn zero_denominators_contribute_nothing() {
        let fx = Fixture::new();
        let w = est_m_weight(
            &rule(),
            &HashSet::new(),
            &AcceptedCoverage::default(),
            &HashSet::new(),
            &[],
            fx.ctx(),
            WeightParams::from_alpha(0.3),
        );
        assert_eq!(w, 0.0);
    }

    #[test]
    fn already_covered_examples_do_not_count() {
        let fx = Fixture::new();
        let accepted = AcceptedCoverage {
            generation: HashSet::from([Example::new("Tens_Tales", "Pop")]),
            ..AcceptedCoverage::default()
        };
        let w = est_m_weight(
            &rule(),
            &paths(&[("Tens_Tales", "Pop")]),
            &accepted,
            &generation(),
            &[],
            fx.ctx(),
            WeightParams::from_alpha(1.0),
        );
        assert_eq!(w, 0.0);
    }

    #[test]
    fn validation_term_uses_unbound_coverage() {
        let fx = Fixture::new();
        let validation = vec![Example::new("Tens_Tales", "Rock"), Example::new("Wallsend", "Rock")];
        let accepted = AcceptedCoverage {
            generation: HashSet::new(),
            validation: 1,
            unbound_validation: HashSet::from([Example::new("Wallsend", "Rock")]),
        };
        // the generalized rule also covers (Tens_Tales, Rock): uncov goes 1 -> 2
        let w = est_m_weight(
            &rule(),
            &HashSet::new(),
            &accepted,
            &generation(),
            &validation,
            fx.ctx(),
            WeightParams::from_alpha(0.0),
        );
        assert!((w - (0.5 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn cache_matches_direct_computation_and_tracks_support() {
        let fx = Fixture::new();
        let cache = WeightCache::new();
        let accepted = AcceptedCoverage::default();
        let params = WeightParams::from_alpha(0.5);
        let one = paths(&[("Tens_Tales", "Pop")]);
        let two = paths(&[("Tens_Tales", "Pop"), ("Making_Movies", "Pop")]);

        let direct = est_m_weight(&rule(), &one, &accepted, &generation(), &[], fx.ctx(), params);
        let cached = cache.weight(&rule(), &one, &accepted, &generation(), &[], fx.ctx(), params);
        assert_eq!(direct, cached);
        assert_eq!(cache.len(), 1);

        let grown = cache.weight(&rule(), &two, &accepted, &generation(), &[], fx.ctx(), params);
        assert!((grown - (-0.5)).abs() < 1e-12);

        cache.clear();
        assert!(cache.is_empty());
    }
}
