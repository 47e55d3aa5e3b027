// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Skyline of the patterns found so far.
//!
//! With skyline objectives, only the patterns no other pattern dominates are
//! reported. A pattern dominates another when it is at least as good on
//! every objective and strictly better on one. Patterns with identical
//! objective values are indistinguishable and kept together.
//!
//! Objectives come in three groups: measures to minimize, measures to
//! maximize, and measures to maximize per minimal size of a dimension. The
//! latter only let a pattern outrank patterns that are not larger in that
//! dimension, so the skyline keeps the best patterns for every minimal size.
//! They are compared as two maximized criteria: the measure and the size.
//!
//! During the search, a node is pruned when an entry of the skyline dominates
//! the best values any pattern of its subtree could reach: the upper bounds
//! of the maximized criteria and the lower bounds of the minimized ones.

use crate::measures::{Bounds, MeasureKind};

/// Ranking of an objective. Dimensions are internal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    Minimize,
    Maximize,
    MaximizePerMinSize(usize),
}

/// One skyline objective. Dimensions are internal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Objective {
    pub measure: MeasureKind,
    pub goal: Goal,
}

/// One compared quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Criterion {
    measure: MeasureKind,
    maximize: bool,
}

impl Criterion {
    /// Best value any pattern within the bounds may reach.
    fn optimistic(&self, bounds: &Bounds) -> u64 {
        if self.maximize {
            self.measure.upper(bounds)
        } else {
            self.measure.lower(bounds)
        }
    }

    /// Whether `first` is at least as good as `second`.
    fn at_least_as_good(&self, first: u64, second: u64) -> bool {
        if self.maximize {
            first >= second
        } else {
            first <= second
        }
    }
}

fn criteria(objectives: &[Objective]) -> Vec<Criterion> {
    let mut criteria = Vec::with_capacity(objectives.len());
    for objective in objectives {
        criteria.push(Criterion {
            measure: objective.measure,
            maximize: objective.goal != Goal::Minimize,
        });
        if let Goal::MaximizePerMinSize(dimension) = objective.goal {
            criteria.push(Criterion {
                measure: MeasureKind::Size(dimension),
                maximize: true,
            });
        }
    }
    criteria
}

/// Patterns sharing the same objective values.
#[derive(Debug, Clone, PartialEq)]
pub struct IndistinctSkyPatterns<P> {
    values: Vec<u64>,
    patterns: Vec<P>,
}

impl<P> IndistinctSkyPatterns<P> {
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn patterns(&self) -> &[P] {
        &self.patterns
    }
}

/// The current skyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Skyline<P> {
    objectives: Vec<Objective>,
    criteria: Vec<Criterion>,
    entries: Vec<IndistinctSkyPatterns<P>>,
}

impl<P> Skyline<P> {
    pub fn new(objectives: Vec<Objective>) -> Self {
        Self {
            criteria: criteria(&objectives),
            objectives,
            entries: Vec::new(),
        }
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Optimistic values of the compared criteria for the patterns within
    /// the bounds.
    pub fn values(&self, bounds: &Bounds) -> Vec<u64> {
        self.criteria.iter().map(|criterion| criterion.optimistic(bounds)).collect()
    }

    fn dominates(&self, first: &[u64], second: &[u64]) -> bool {
        first != second
            && self
                .criteria
                .iter()
                .zip(first.iter().zip(second))
                .all(|(criterion, (&a, &b))| criterion.at_least_as_good(a, b))
    }

    /// Whether an entry dominates the given values.
    pub fn dominated(&self, values: &[u64]) -> bool {
        self.entries.iter().any(|entry| self.dominates(&entry.values, values))
    }

    /// Add a pattern with the given objective values.
    ///
    /// A dominated pattern is rejected (returns false). Otherwise the entries
    /// it dominates are evicted and it joins or creates the entry with its
    /// values.
    pub fn insert(&mut self, values: Vec<u64>, pattern: P) -> bool {
        if self.dominated(&values) {
            return false;
        }
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.values == values) {
            entry.patterns.push(pattern);
            return true;
        }
        let before = self.entries.len();
        let entries = std::mem::take(&mut self.entries);
        let kept: Vec<_> = entries
            .into_iter()
            .filter(|entry| !self.dominates(&values, &entry.values))
            .collect();
        self.entries = kept;
        if self.entries.len() < before {
            log::debug!("Skyline: {} entries evicted by {:?}", before - self.entries.len(), values);
        }
        self.entries.push(IndistinctSkyPatterns {
            values,
            patterns: vec![pattern],
        });
        true
    }

    pub fn entries(&self) -> &[IndistinctSkyPatterns<P>] {
        &self.entries
    }

    /// Number of patterns in the skyline.
    pub fn pattern_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.patterns.len()).sum()
    }

    pub fn into_patterns(self) -> Vec<P> {
        self.entries.into_iter().flat_map(|entry| entry.patterns).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn skyline<P>() -> Skyline<P> {
        Skyline::new(vec![
            Objective {
                measure: MeasureKind::Area,
                goal: Goal::Maximize,
            },
            Objective {
                measure: MeasureKind::Size(0),
                goal: Goal::Minimize,
            },
        ])
    }

    #[test]
    fn test_dominated_patterns_are_rejected() {
        let mut skyline: Skyline<&str> = skyline();
        assert!(skyline.insert(vec![6, 2], "a"));
        assert!(!skyline.insert(vec![4, 2], "b"));
        assert!(!skyline.insert(vec![6, 3], "c"));
        assert!(skyline.insert(vec![8, 3], "d"));
        assert_eq!(skyline.entries().len(), 2);
    }

    #[test]
    fn test_dominating_pattern_evicts() {
        let mut skyline: Skyline<&str> = skyline();
        skyline.insert(vec![6, 2], "a");
        skyline.insert(vec![8, 3], "b");
        assert!(skyline.insert(vec![8, 1], "c"));
        assert_eq!(skyline.into_patterns(), vec!["c"]);
    }

    #[test]
    fn test_indistinct_patterns_are_grouped() {
        let mut skyline: Skyline<&str> = skyline();
        skyline.insert(vec![6, 2], "a");
        assert!(skyline.insert(vec![6, 2], "b"));
        assert_eq!(skyline.entries().len(), 1);
        assert_eq!(skyline.entries()[0].patterns(), &["a", "b"]);
        assert_eq!(skyline.pattern_count(), 2);
    }

    #[test]
    fn test_optimistic_values() {
        let bounds = Bounds {
            present_sizes: vec![1, 2],
            present_and_potential_sizes: vec![3, 4],
            ..Bounds::default()
        };
        let skyline: Skyline<()> = skyline();
        assert_eq!(skyline.values(&bounds), vec![12, 1]);
    }

    #[test]
    fn test_per_min_size_objective_keeps_the_best_of_every_size() {
        let mut skyline: Skyline<&str> = Skyline::new(vec![Objective {
            measure: MeasureKind::Area,
            goal: Goal::MaximizePerMinSize(1),
        }]);
        // Criteria: area, then the size of dimension 1.
        assert!(skyline.insert(vec![6, 2], "wide"));
        assert!(skyline.insert(vec![4, 4], "tall"));
        assert!(!skyline.insert(vec![3, 2], "small"));
        assert!(skyline.insert(vec![8, 4], "best"));
        assert_eq!(skyline.into_patterns(), vec!["best"]);

        let plain: Skyline<&str> = Skyline::new(vec![Objective {
            measure: MeasureKind::Area,
            goal: Goal::Maximize,
        }]);
        assert_eq!(plain.criteria.len(), 1);
    }

    proptest! {
        /// No entry of the skyline dominates another, and every rejected or
        /// evicted pattern is dominated by an entry.
        #[test]
        fn test_skyline_is_an_antichain(points in prop::collection::vec((0u64..6, 0u64..6), 1..30)) {
            let mut skyline: Skyline<usize> = skyline();
            for (index, &(area, size)) in points.iter().enumerate() {
                skyline.insert(vec![area, size], index);
            }
            let entries = skyline.entries();
            for first in entries {
                for second in entries {
                    prop_assert!(!skyline.dominates(first.values(), second.values()));
                }
            }
            for (index, &(area, size)) in points.iter().enumerate() {
                let kept = entries.iter().any(|entry| entry.patterns().contains(&index));
                prop_assert!(kept || skyline.dominated(&[area, size]));
            }
        }
    }
}
