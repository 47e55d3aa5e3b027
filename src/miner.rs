// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Mining controller: validation, search, skyline and agglomeration.

use crate::agglomeration::{Agglomerator, Dendrogram};
use crate::config::{MinerConfig, MinerError};
use crate::context::SearchContext;
use crate::engine::{SearchEngine, Tree};
use crate::input::Dataset;
use crate::pattern::Pattern;
use crate::state::{Counters, Statistics};

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct MiningOutcome {
    /// Closed patterns in discovery order (the skyline's, with objectives).
    pub patterns: Vec<Pattern>,
    /// Hierarchy of the patterns, when agglomeration is enabled.
    pub dendrogram: Option<Dendrogram>,
    pub statistics: Statistics,
}

/// One mining run over a dataset.
///
/// # Example
///
/// ```
/// use closed_nsets::{Dataset, Miner, MinerConfig};
///
/// let mut dataset = Dataset::with_cardinalities(&[2, 2]);
/// dataset.push_crisp(&[0, 0]).unwrap();
/// dataset.push_crisp(&[0, 1]).unwrap();
/// dataset.push_crisp(&[1, 0]).unwrap();
///
/// let outcome = Miner::new(&dataset, &MinerConfig::default()).unwrap().run();
/// assert_eq!(outcome.patterns.len(), 2);
/// ```
#[derive(Debug)]
pub struct Miner {
    ctx: SearchContext,
    root: Tree,
    max_closed_nsets: usize,
}

impl Miner {
    /// Validate the configuration against the dataset and load the relation.
    pub fn new(dataset: &Dataset, config: &MinerConfig) -> Result<Self, MinerError> {
        config.validate(dataset)?;
        let ctx = SearchContext::new(dataset, config)?;
        let root = Tree::root(&ctx.relation, &ctx.settings);
        Ok(Self {
            ctx,
            root,
            max_closed_nsets: config.max_closed_nsets,
        })
    }

    /// Recompute every noise counter at every node and panic on mismatch.
    pub fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.ctx.settings.check_invariants = enabled;
        self
    }

    pub fn context(&self) -> &SearchContext {
        &self.ctx
    }

    /// Run the search to exhaustion.
    pub fn run(self) -> MiningOutcome {
        let Self {
            mut ctx,
            root,
            max_closed_nsets,
        } = self;

        let mut agglomerator = (max_closed_nsets > 0).then(|| Agglomerator::new(max_closed_nsets));
        let mut patterns = Vec::new();
        let engine = SearchEngine::new(root).search(&mut ctx, |leaf| {
            if let Some(agglomerator) = agglomerator.as_mut() {
                agglomerator.push(&leaf.pattern);
            }
            patterns.push(leaf.pattern);
        });
        if let Some(skyline) = ctx.skyline.take() {
            patterns = skyline.into_patterns();
            if let Some(agglomerator) = agglomerator.as_mut() {
                for pattern in &patterns {
                    agglomerator.push(pattern);
                }
            }
        }
        log::info!(
            "Search finished: {} closed n-sets, {} nodes, {} pruned, stack depth {}",
            patterns.len(),
            ctx.statistics.get(Counters::Nodes),
            ctx.statistics.total_pruned(),
            engine.max_stack_size()
        );

        let dendrogram = agglomerator.map(|agglomerator| agglomerator.build(&ctx.relation));

        MiningOutcome {
            patterns,
            dendrogram,
            statistics: ctx.statistics,
        }
    }
}
