// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Depth-first search engine.
//!
//! The engine keeps an explicit stack of search nodes instead of recursing.
//! Each iteration pops a node and peels it (see [`Tree::peel`]):
//! 1. If Pruned: record the reason and backtrack
//! 2. If Leaf: hand the closed pattern to the skyline or to the caller
//! 3. If Branch: push the absent child, then the present child, so the
//!    present child is explored first
//!
//! Nodes own their state, so backtracking is simply popping the next node.
//!
//! # Example
//!
//! ```
//! use closed_nsets::context::SearchContext;
//! use closed_nsets::engine::{SearchEngine, Tree};
//! use closed_nsets::input::Dataset;
//! use closed_nsets::MinerConfig;
//!
//! let mut dataset = Dataset::with_cardinalities(&[2, 2]);
//! dataset.push_crisp(&[0, 0]).unwrap();
//! dataset.push_crisp(&[0, 1]).unwrap();
//! dataset.push_crisp(&[1, 0]).unwrap();
//!
//! let mut ctx = SearchContext::new(&dataset, &MinerConfig::default()).unwrap();
//! let root = Tree::root(&ctx.relation, &ctx.settings);
//! let mut patterns = Vec::new();
//! SearchEngine::new(root).search(&mut ctx, |leaf| patterns.push(leaf.pattern));
//! assert_eq!(patterns.len(), 2);
//! ```

pub mod propagation;
pub mod tree;

pub use tree::{Leaf, NodeOutcome, Tree};

use crate::context::SearchContext;
use crate::state::Counters;

/// Search engine exploring the subtree of a root node.
#[derive(Debug)]
pub struct SearchEngine {
    /// Nodes waiting to be peeled.
    stack: Vec<Tree>,

    /// Statistics: deepest stack reached.
    max_stack_size: usize,
}

impl SearchEngine {
    pub fn new(root: Tree) -> Self {
        Self {
            stack: vec![root],
            max_stack_size: 1,
        }
    }

    /// Run the search to exhaustion.
    ///
    /// Without skyline objectives every closed pattern is passed to `emit` as
    /// it is found. With them, patterns go to the context's skyline instead
    /// and `emit` is never called.
    pub fn search<F>(mut self, ctx: &mut SearchContext, mut emit: F) -> Self
    where
        F: FnMut(Leaf),
    {
        while let Some(node) = self.stack.pop() {
            match node.peel(ctx) {
                NodeOutcome::Pruned(reason) => {
                    log::trace!("Pruned: {reason}");
                    ctx.statistics.record_prune(reason);
                }
                NodeOutcome::Leaf(leaf) => {
                    ctx.statistics.increment_counter(Counters::ClosedPatterns);
                    log::debug!("Closed pattern {}", leaf.pattern);
                    match &mut ctx.skyline {
                        Some(skyline) => {
                            let values = skyline.values(&leaf.bounds);
                            skyline.insert(values, leaf.pattern);
                        }
                        None => emit(leaf),
                    }
                }
                NodeOutcome::Branch { present, absent } => {
                    self.stack.push(absent);
                    self.stack.push(present);
                    self.max_stack_size = self.max_stack_size.max(self.stack.len());
                }
            }
        }
        self
    }

    /// Get statistics about the search: the deepest stack reached.
    pub fn max_stack_size(&self) -> usize {
        self.max_stack_size
    }
}
