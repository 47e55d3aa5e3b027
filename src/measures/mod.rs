// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Constraints and objectives on the shape of the patterns.
//!
//! A search node only knows bounds on the patterns of its subtree: every
//! pattern contains the present elements and is contained in the present and
//! potential ones. A [`Measure`] (a mere constraint) prunes the node when no
//! pattern between those bounds can satisfy it, so minima are checked on the
//! present and potential elements and maxima on the present ones. The skyline
//! ranks patterns with [`MeasureKind`]s evaluated on the same bounds.
//!
//! Every measure grows with the pattern: sizes, area, group covers, the sum
//! of the memberships of the pattern's tuples and the sum of the weights of
//! its points (elements carrying a caller-supplied weight).

use crate::relation::{BitSet, Encoding};
use crate::state::statistics::PruneReason;

/// Elements of one dimension, by data id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Internal dimension.
    pub dimension: usize,
    pub members: BitSet,
}

impl Group {
    /// A group given with the caller's dimension and element ids.
    pub fn from_caller(dimension: usize, elements: &[u32], cardinality: usize, encoding: &Encoding) -> Self {
        let internal = encoding.internal_dimension(dimension);
        let mut members = BitSet::new(cardinality);
        for &element in elements {
            members.insert(encoding.data_id(internal, element));
        }
        Self {
            dimension: internal,
            members,
        }
    }

    fn cover<'a>(&self, data_ids: impl IntoIterator<Item = &'a u32>) -> u32 {
        data_ids.into_iter().filter(|&&id| self.members.contains(id)).count() as u32
    }
}

/// Weights of the elements of one dimension, by data id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Points {
    /// Internal dimension.
    pub dimension: usize,
    pub weights: Vec<u32>,
}

impl Points {
    /// Weights given with the caller's dimension and element ids; missing
    /// weights are 0.
    pub fn from_caller(dimension: usize, weights: &[u32], cardinality: usize, encoding: &Encoding) -> Self {
        let internal = encoding.internal_dimension(dimension);
        let mut by_data_id = vec![0; cardinality];
        for (element, &weight) in weights.iter().enumerate() {
            by_data_id[encoding.data_id(internal, element as u32) as usize] = weight;
        }
        Self {
            dimension: internal,
            weights: by_data_id,
        }
    }

    fn sum<'a>(&self, data_ids: impl IntoIterator<Item = &'a u32>) -> u64 {
        data_ids
            .into_iter()
            .map(|&id| u64::from(self.weights[id as usize]))
            .sum()
    }
}

/// Measures of the smallest and largest patterns of a subtree.
///
/// Memberships are in noise counts: a tuple of the relation with no noise is
/// worth one unit of the relation's noise scale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bounds {
    pub present_sizes: Vec<usize>,
    pub present_and_potential_sizes: Vec<usize>,
    pub present_covers: Vec<u32>,
    pub present_and_potential_covers: Vec<u32>,
    pub present_memberships: u64,
    pub present_and_potential_memberships: u64,
    pub present_points: Vec<u64>,
    pub present_and_potential_points: Vec<u64>,
}

/// Data ids of the present and of the present and potential elements, and
/// the noise of the tuples they cover, for [`Bounds::new`].
#[derive(Debug, Clone, Copy)]
pub struct Extent<'a> {
    pub present: &'a [Vec<u32>],
    pub present_and_potential: &'a [Vec<u32>],
    pub present_noise: u64,
    pub present_and_potential_noise: u64,
}

impl Bounds {
    /// Measure both ends of a subtree.
    pub fn new(extent: Extent<'_>, unit: u32, groups: &[Group], points: &[Points]) -> Self {
        let sizes = |sets: &[Vec<u32>]| sets.iter().map(Vec::len).collect::<Vec<_>>();
        let memberships = |sets: &[Vec<u32>], noise: u64| {
            area(&sizes(sets)).saturating_mul(u64::from(unit)).saturating_sub(noise)
        };
        Self {
            present_sizes: sizes(extent.present),
            present_and_potential_sizes: sizes(extent.present_and_potential),
            present_covers: groups
                .iter()
                .map(|group| group.cover(&extent.present[group.dimension]))
                .collect(),
            present_and_potential_covers: groups
                .iter()
                .map(|group| group.cover(&extent.present_and_potential[group.dimension]))
                .collect(),
            present_memberships: memberships(extent.present, extent.present_noise),
            present_and_potential_memberships: memberships(
                extent.present_and_potential,
                extent.present_and_potential_noise,
            ),
            present_points: points
                .iter()
                .map(|points| points.sum(&extent.present[points.dimension]))
                .collect(),
            present_and_potential_points: points
                .iter()
                .map(|points| points.sum(&extent.present_and_potential[points.dimension]))
                .collect(),
        }
    }

    pub fn present_area(&self) -> u64 {
        area(&self.present_sizes)
    }

    pub fn present_and_potential_area(&self) -> u64 {
        area(&self.present_and_potential_sizes)
    }
}

fn area(sizes: &[usize]) -> u64 {
    sizes.iter().fold(1u64, |area, &size| area.saturating_mul(size as u64))
}

/// A mere constraint. Dimensions are internal, memberships in noise counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    MinSize { dimension: usize, size: usize },
    MaxSize { dimension: usize, size: usize },
    MinArea(u64),
    MaxArea(u64),
    MinGroupCover { group: usize, count: u32 },
    MaxGroupCover { group: usize, count: u32 },
    MinMembershipSum(u64),
    MaxMembershipSum(u64),
    MinPointSum { points: usize, sum: u64 },
    MaxPointSum { points: usize, sum: u64 },
}

impl Measure {
    /// Whether no pattern within the bounds satisfies the constraint.
    pub fn violated(&self, bounds: &Bounds) -> bool {
        match *self {
            Measure::MinSize { dimension, size } => bounds.present_and_potential_sizes[dimension] < size,
            Measure::MaxSize { dimension, size } => bounds.present_sizes[dimension] > size,
            Measure::MinArea(min) => bounds.present_and_potential_area() < min,
            Measure::MaxArea(max) => bounds.present_area() > max,
            Measure::MinGroupCover { group, count } => bounds.present_and_potential_covers[group] < count,
            Measure::MaxGroupCover { group, count } => bounds.present_covers[group] > count,
            Measure::MinMembershipSum(min) => bounds.present_and_potential_memberships < min,
            Measure::MaxMembershipSum(max) => bounds.present_memberships > max,
            Measure::MinPointSum { points, sum } => bounds.present_and_potential_points[points] < sum,
            Measure::MaxPointSum { points, sum } => bounds.present_points[points] > sum,
        }
    }

    /// Statistics bucket of a violation.
    pub fn reason(&self) -> PruneReason {
        match self {
            Measure::MinSize { .. } => PruneReason::MinSize,
            Measure::MaxSize { .. } => PruneReason::MaxSize,
            Measure::MinArea(_) => PruneReason::MinArea,
            Measure::MaxArea(_) => PruneReason::MaxArea,
            Measure::MinGroupCover { .. } | Measure::MaxGroupCover { .. } => PruneReason::GroupCover,
            Measure::MinMembershipSum(_) | Measure::MaxMembershipSum(_) => PruneReason::MembershipSum,
            Measure::MinPointSum { .. } | Measure::MaxPointSum { .. } => PruneReason::PointSum,
        }
    }

    /// The first violated constraint, if any.
    pub fn first_violated<'a>(measures: &'a [Measure], bounds: &Bounds) -> Option<&'a Measure> {
        measures.iter().find(|measure| measure.violated(bounds))
    }
}

/// Quantity a skyline objective is computed from. Dimensions are internal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureKind {
    Size(usize),
    Area,
    GroupCover(usize),
    /// Sum of the memberships of the tuples, in noise counts.
    MembershipSum,
    PointSum(usize),
}

impl MeasureKind {
    /// Value on the present elements, a lower bound for the subtree.
    pub fn lower(&self, bounds: &Bounds) -> u64 {
        match *self {
            MeasureKind::Size(dimension) => bounds.present_sizes[dimension] as u64,
            MeasureKind::Area => bounds.present_area(),
            MeasureKind::GroupCover(group) => u64::from(bounds.present_covers[group]),
            MeasureKind::MembershipSum => bounds.present_memberships,
            MeasureKind::PointSum(points) => bounds.present_points[points],
        }
    }

    /// Value on the present and potential elements, an upper bound for the
    /// subtree.
    pub fn upper(&self, bounds: &Bounds) -> u64 {
        match *self {
            MeasureKind::Size(dimension) => bounds.present_and_potential_sizes[dimension] as u64,
            MeasureKind::Area => bounds.present_and_potential_area(),
            MeasureKind::GroupCover(group) => u64::from(bounds.present_and_potential_covers[group]),
            MeasureKind::MembershipSum => bounds.present_and_potential_memberships,
            MeasureKind::PointSum(points) => bounds.present_and_potential_points[points],
        }
    }
}
