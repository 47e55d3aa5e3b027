// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Common test utilities shared across integration tests.
//!
//! [`brute_force`] enumerates every n-set of a small relation and keeps the
//! closed error-tolerant ones, directly from the definitions.

#![allow(dead_code)]

use closed_nsets::config::{Direction, GroupConstraint, ObjectiveMeasure, PointConstraint};
use closed_nsets::{Dataset, Miner, MinerConfig, Pattern};
use std::collections::HashMap;

/// Slack absorbing the floating-point error of real-valued sums.
const SLACK: f64 = 1e-9;

/// An n-set as sorted element ids, one vector per dimension.
pub type NSet = Vec<Vec<u32>>;

/// A crisp dataset with numeric labels holding `cells`.
pub fn crisp_dataset(cardinalities: &[usize], cells: &[Vec<u32>]) -> Dataset {
    let mut dataset = Dataset::with_cardinalities(cardinalities);
    for cell in cells {
        dataset.push_crisp(cell).unwrap();
    }
    dataset
}

/// Run the miner with every invariant check on and return the sorted n-sets.
pub fn mine(dataset: &Dataset, config: &MinerConfig) -> Vec<NSet> {
    let outcome = Miner::new(dataset, config)
        .unwrap()
        .with_invariant_checks(true)
        .run();
    sorted(&outcome.patterns)
}

pub fn sorted(patterns: &[Pattern]) -> Vec<NSet> {
    let mut nsets: Vec<NSet> = patterns
        .iter()
        .map(|pattern| {
            (0..pattern.dimension_count())
                .map(|dimension| pattern.elements(dimension).to_vec())
                .collect()
        })
        .collect();
    nsets.sort();
    nsets
}

struct Oracle<'a> {
    cardinalities: Vec<usize>,
    memberships: HashMap<Vec<u32>, f64>,
    config: &'a MinerConfig,
}

impl Oracle<'_> {
    fn membership(&self, cell: &[u32]) -> f64 {
        if let Some((first, second)) = self.config.clique {
            if cell[first] == cell[second] {
                return 1.0;
            }
        }
        self.memberships.get(cell).copied().unwrap_or(0.0)
    }

    fn sum_over_cells(&self, sets: &[Vec<u32>], value: &impl Fn(&[u32]) -> f64) -> f64 {
        let mut total = 0.0;
        let mut cell = vec![0; sets.len()];
        Self::visit(sets, 0, &mut cell, value, &mut total);
        total
    }

    fn visit(
        sets: &[Vec<u32>],
        depth: usize,
        cell: &mut Vec<u32>,
        value: &impl Fn(&[u32]) -> f64,
        total: &mut f64,
    ) {
        if depth == sets.len() {
            *total += value(&cell[..]);
            return;
        }
        for &element in &sets[depth] {
            cell[depth] = element;
            Self::visit(sets, depth + 1, cell, value, total);
        }
    }

    fn product_noise(&self, sets: &[Vec<u32>]) -> f64 {
        self.sum_over_cells(sets, &|cell| 1.0 - self.membership(cell))
    }

    fn membership_sum(&self, nset: &NSet) -> f64 {
        self.sum_over_cells(nset, &|cell| self.membership(cell))
    }

    fn contiguous(&self, dimension: usize, elements: &[u32]) -> bool {
        let tau = self.config.tau(dimension);
        tau == 0.0 || elements.windows(2).all(|pair| f64::from(pair[1] - pair[0]) <= tau)
    }

    /// Every element within tolerance, tau-contiguity and the clique.
    fn is_valid(&self, nset: &NSet) -> bool {
        if let Some((first, second)) = self.config.clique {
            if nset[first] != nset[second] {
                return false;
            }
        }
        (0..nset.len()).all(|dimension| {
            self.contiguous(dimension, &nset[dimension])
                && nset[dimension].iter().all(|&element| {
                    let mut restricted = nset.clone();
                    restricted[dimension] = vec![element];
                    self.product_noise(&restricted) <= self.config.epsilon(dimension) + SLACK
                })
        })
    }

    fn extended(&self, nset: &NSet, dimension: usize, element: u32) -> NSet {
        let mut extended = nset.clone();
        let mut dimensions = vec![dimension];
        if let Some((first, second)) = self.config.clique {
            if dimension == first || dimension == second {
                dimensions = vec![first, second];
            }
        }
        for dimension in dimensions {
            extended[dimension].push(element);
            extended[dimension].sort_unstable();
        }
        extended
    }

    fn checks_closure(&self, dimension: usize) -> bool {
        let closed = |dimension: usize| self.config.is_closed(dimension);
        match self.config.clique {
            Some((first, second)) if dimension == first || dimension == second => {
                closed(first) || closed(second)
            }
            _ => closed(dimension),
        }
    }

    fn is_closed(&self, nset: &NSet) -> bool {
        (0..nset.len()).filter(|&d| self.checks_closure(d)).all(|dimension| {
            (0..self.cardinalities[dimension] as u32)
                .filter(|element| !nset[dimension].contains(element))
                .all(|element| !self.is_valid(&self.extended(nset, dimension, element)))
        })
    }

    fn group_cover(&self, nset: &NSet, group: usize) -> u32 {
        let spec = &self.config.groups[group];
        nset[spec.dimension]
            .iter()
            .filter(|element| spec.elements.contains(element))
            .count() as u32
    }

    fn point_sum(&self, nset: &NSet, points: usize) -> u64 {
        let spec = &self.config.points[points];
        nset[spec.dimension]
            .iter()
            .map(|&element| u64::from(spec.weights.get(element as usize).copied().unwrap_or(0)))
            .sum()
    }

    fn meets_constraints(&self, nset: &NSet) -> bool {
        let area: u64 = nset.iter().map(|set| set.len() as u64).product();
        let sizes = (0..nset.len()).all(|dimension| {
            let size = nset[dimension].len() as u32;
            size >= self.config.min_size(dimension)
                && self.config.max_size(dimension).map_or(true, |max| size <= max)
        });
        let covers = self.config.group_constraints.iter().all(|constraint| match *constraint {
            GroupConstraint::MinCover { group, count } => self.group_cover(nset, group) >= count,
            GroupConstraint::MaxCover { group, count } => self.group_cover(nset, group) <= count,
        });
        let point_sums = self.config.point_constraints.iter().all(|constraint| match *constraint {
            PointConstraint::MinSum { points, sum } => self.point_sum(nset, points) >= sum,
            PointConstraint::MaxSum { points, sum } => self.point_sum(nset, points) <= sum,
        });
        let memberships = self.membership_sum(nset);
        sizes
            && covers
            && point_sums
            && area >= self.config.min_area
            && self.config.max_area.map_or(true, |max| area <= max)
            && memberships >= self.config.min_membership_sum - SLACK
            && self.config.max_membership_sum.map_or(true, |max| memberships <= max + SLACK)
    }

    fn value(&self, nset: &NSet, measure: ObjectiveMeasure) -> f64 {
        match measure {
            ObjectiveMeasure::Size(dimension) => nset[dimension].len() as f64,
            ObjectiveMeasure::Area => nset.iter().map(|set| set.len() as f64).product(),
            ObjectiveMeasure::GroupCover(group) => f64::from(self.group_cover(nset, group)),
            ObjectiveMeasure::MembershipSum => self.membership_sum(nset),
            ObjectiveMeasure::PointSum(points) => self.point_sum(nset, points) as f64,
        }
    }

    /// Objective values, negated when minimized, so that larger is better.
    /// A per-minimal-size objective adds the size it is scoped to.
    fn scores(&self, nset: &NSet) -> Vec<f64> {
        let mut scores = Vec::new();
        for objective in self.config.skyline.iter().flat_map(|skyline| &skyline.objectives) {
            let value = self.value(nset, objective.measure);
            match objective.direction {
                Direction::Minimize => scores.push(-value),
                Direction::Maximize => scores.push(value),
                Direction::MaximizePerMinSize(dimension) => {
                    scores.push(value);
                    scores.push(nset[dimension].len() as f64);
                }
            }
        }
        scores
    }
}

fn dominates(first: &[f64], second: &[f64]) -> bool {
    first.iter().zip(second).all(|(a, b)| a >= b) && first.iter().zip(second).any(|(a, b)| a > b)
}

/// Nonempty subsets of `0..cardinality`, sorted.
fn subsets(cardinality: usize) -> Vec<Vec<u32>> {
    (1u32..1 << cardinality)
        .map(|mask| (0..cardinality as u32).filter(|&bit| mask & (1 << bit) != 0).collect())
        .collect()
}

/// Closed error-tolerant n-sets of a relation meeting every constraint,
/// sorted. With skyline objectives, only the undominated ones.
pub fn brute_force(dataset: &Dataset, config: &MinerConfig) -> Vec<NSet> {
    let mut memberships: HashMap<Vec<u32>, f64> = HashMap::new();
    for tuple in dataset.tuples() {
        let membership = memberships.entry(tuple.coordinates.clone()).or_insert(0.0);
        *membership = membership.max(tuple.membership);
    }
    let oracle = Oracle {
        cardinalities: dataset.cardinalities(),
        memberships,
        config,
    };
    let mut candidates: Vec<NSet> = vec![Vec::new()];
    for &cardinality in &oracle.cardinalities {
        let options = subsets(cardinality);
        candidates = candidates
            .into_iter()
            .flat_map(|prefix| {
                options.iter().map(move |set| {
                    let mut nset = prefix.clone();
                    nset.push(set.clone());
                    nset
                })
            })
            .collect();
    }
    let mut closed: Vec<NSet> = candidates
        .into_iter()
        .filter(|nset| oracle.meets_constraints(nset) && oracle.is_valid(nset) && oracle.is_closed(nset))
        .collect();
    if config.skyline.is_some() {
        let scores: Vec<Vec<f64>> = closed.iter().map(|nset| oracle.scores(nset)).collect();
        closed = closed
            .iter()
            .zip(&scores)
            .filter(|(_, score)| !scores.iter().any(|other| dominates(other, score)))
            .map(|(nset, _)| nset.clone())
            .collect();
    }
    closed.sort();
    closed
}
