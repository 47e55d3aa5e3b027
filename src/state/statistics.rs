// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Statistics
//!
//! Statistics are stored in the context and incremented by the engine as
//! nodes are explored, pruned or emitted.

use std::fmt;
use strum::EnumCount;
use strum_macros::EnumCount as EnumCountMacro;

#[derive(EnumCountMacro, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Counters {
    /// Search nodes explored.
    Nodes,
    /// Closed patterns satisfying every constraint.
    ClosedPatterns,
    /// Nodes whose potential elements were all made present at once.
    Finalizations,
    /// Potential values found irrelevant.
    IrrelevantValues,
    /// Absent values deleted once they could no longer extend a pattern.
    DeletedAbsentValues,
}

/// Why a search node was abandoned.
///
/// Pruning is the normal end of most branches: none of these is an error.
#[derive(EnumCountMacro, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum PruneReason {
    MinSize,
    MaxSize,
    MinArea,
    MaxArea,
    GroupCover,
    /// Bound on the sum of the memberships of the tuples.
    MembershipSum,
    /// Bound on the sum of the weights of the points.
    PointSum,
    /// The present elements of a tau-contiguous dimension cannot be chained.
    TauContiguity,
    /// Every pattern of the subtree is dominated by the skyline.
    Dominated,
    /// Every pattern of the subtree can be extended by an absent element.
    Unclosed,
}

impl fmt::Display for PruneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PruneReason::MinSize => "minimal size",
            PruneReason::MaxSize => "maximal size",
            PruneReason::MinArea => "minimal area",
            PruneReason::MaxArea => "maximal area",
            PruneReason::GroupCover => "group cover",
            PruneReason::MembershipSum => "membership sum",
            PruneReason::PointSum => "point sum",
            PruneReason::TauContiguity => "tau-contiguity",
            PruneReason::Dominated => "dominated",
            PruneReason::Unclosed => "unclosed",
        };
        f.write_str(text)
    }
}

const COUNT: usize = Counters::COUNT + PruneReason::COUNT;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Statistics {
    stats: [u64; COUNT],
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    /// Increment the specified counter by 1.
    pub fn increment_counter(&mut self, counter: Counters) {
        self.stats[counter as usize] += 1;
    }

    /// Increment the specified counter by `amount`.
    pub fn add(&mut self, counter: Counters, amount: u64) {
        self.stats[counter as usize] += amount;
    }

    /// Record a pruned node.
    pub fn record_prune(&mut self, reason: PruneReason) {
        self.stats[Counters::COUNT + reason as usize] += 1;
    }

    /// Get the current value of the specified counter.
    pub fn get(&self, counter: Counters) -> u64 {
        self.stats[counter as usize]
    }

    /// Number of nodes pruned for the given reason.
    pub fn pruned(&self, reason: PruneReason) -> u64 {
        self.stats[Counters::COUNT + reason as usize]
    }

    /// Number of pruned nodes, whatever the reason.
    pub fn total_pruned(&self) -> u64 {
        self.stats[Counters::COUNT..].iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_prunes_are_separate() {
        let mut statistics = Statistics::new();
        statistics.increment_counter(Counters::Nodes);
        statistics.increment_counter(Counters::Nodes);
        statistics.add(Counters::IrrelevantValues, 5);
        statistics.record_prune(PruneReason::MinSize);
        statistics.record_prune(PruneReason::Unclosed);
        statistics.record_prune(PruneReason::Unclosed);

        assert_eq!(statistics.get(Counters::Nodes), 2);
        assert_eq!(statistics.get(Counters::IrrelevantValues), 5);
        assert_eq!(statistics.get(Counters::ClosedPatterns), 0);
        assert_eq!(statistics.pruned(PruneReason::Unclosed), 2);
        assert_eq!(statistics.pruned(PruneReason::Dominated), 0);
        assert_eq!(statistics.total_pruned(), 3);
    }

    #[test]
    fn test_prune_reason_display() {
        assert_eq!(PruneReason::TauContiguity.to_string(), "tau-contiguity");
    }
}
