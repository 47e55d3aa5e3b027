// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Extraction of closed error-tolerant n-sets from noisy n-ary relations.
//!
//! A relation over n dimensions assigns every cell (one element per
//! dimension) a membership in [0, 1]; its noise is one minus the membership.
//! An n-set picks a subset of elements in every dimension. It is
//! error-tolerant when the noise of the cells of each of its elements stays
//! within the tolerance of the element's dimension, and closed when no
//! element can be added without breaking that tolerance.
//!
//! # Architecture
//!
//! The implementation uses a two-tier memory model:
//!
//! ## Tier 1: Shared Data (Immutable)
//!
//! Built once before the search and only read afterwards:
//! - The relation: a trie of tubes with sparse or dense cell storage
//! - The search settings: quantized tolerances, constraints, heuristics
//!
//! ## Tier 2: Search State (Mutable)
//!
//! - Search nodes: per-dimension partitions of the elements into present,
//!   potential and absent ones, with incrementally maintained noise counters
//! - Statistics and the skyline of the run
//!
//! # Search Algorithm
//!
//! A depth-first branch and bound over an explicit stack of nodes:
//!
//! 1. **Settle**: withdraw the potential elements that can no longer join a
//!    pattern, until a fixed point
//! 2. **Prune**: on mere constraints, tau-contiguity, skyline dominance and
//!    unclosedness
//! 3. **Branch**: pick a potential element and explore the subtrees where it
//!    is present, then absent
//!
//! The closed patterns found may then be agglomerated into a dendrogram.

pub mod agglomeration;
pub mod attribute;
pub mod config;
pub mod context;
pub mod engine;
pub mod input;
pub mod measures;
pub mod miner;
pub mod pattern;
pub mod relation;
pub mod skyline;
pub mod state;

// Re-export commonly used types
pub use config::{MinerConfig, MinerError};
pub use context::SearchContext;
pub use engine::SearchEngine;
pub use input::{Dataset, NoisyTuple};
pub use miner::{Miner, MiningOutcome};
pub use pattern::Pattern;
