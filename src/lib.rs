// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # horn-miner
//!
//! Mines Horn rules such as
//! `hasAlbum(x, y) ∧ isGenre(y, z) ⇒ isGenre(x, z)` that explain a target
//! relation of a normalized knowledge graph, from positive examples,
//! constraint-violation examples, an ontology, and the normalizer's
//! predicate mapping tables.
//!
//! ## Architecture
//!
//! - **Graph index** (`graph`): predicate- and entity-indexed triples
//! - **Predicate map** (`predicate`): normalized ↔ original predicates, negative variants
//! - **Ontology** (`ontology`): class closure, domain/range guard, XSD literal hierarchy
//! - **Rules** (`rule`): growing paths, canonical rules, single-edge expansion
//! - **Coverage** (`coverage`): iterative backtracking matcher, set coverage
//! - **Search** (`search`): example selection, marginal weights, greedy loop
//! - **Engine** (`engine`): loads inputs and mines every target
//!
//! ## Library usage
//!
//! ```no_run
//! use std::path::Path;
//! use horn_miner::config::MiningConfig;
//! use horn_miner::engine::Engine;
//!
//! let config = MiningConfig::load(Path::new("mining.toml")).unwrap();
//! let engine = Engine::from_config(config).unwrap();
//! for record in engine.mine().records() {
//!     println!("{}", record.to_tsv_row());
//! }
//! ```

pub mod config;
pub mod context;
pub mod coverage;
pub mod engine;
pub mod error;
pub mod export;
pub mod graph;
pub mod input;
pub mod ontology;
pub mod predicate;
pub mod rule;
pub mod search;
pub mod term;
