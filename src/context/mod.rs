// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Search context combining the shared relation and the run's mutable state.
//!
//! The SearchContext is the core data structure handed to every search node:
//! - Tier 1 (shared, immutable): the [`Relation`] and the [`SearchSettings`]
//!   derived once from the configuration, in internal dimension order
//! - Tier 2 (mutable): the statistics and, for skyline searches, the current
//!   skyline
//!
//! Search nodes own their attributes outright (a child is a clone of its
//! parent), so nothing in the context has to be restored on backtracking.
//! Independent searches in one process simply use independent contexts.

use crate::attribute::{AttributeKind, MetricAttribute};
use crate::config::{
    AppealFormula, Direction, GroupConstraint, MinerConfig, MinerError, ObjectiveMeasure, PointConstraint,
};
use crate::input::Dataset;
use crate::measures::{Group, Measure, MeasureKind, Points};
use crate::pattern::Pattern;
use crate::relation::Relation;
use crate::skyline::{Goal, Objective, Skyline};
use crate::state::Statistics;

/// Search parameters in internal dimension order (Tier 1).
///
/// Tolerances and membership bounds are quantized with the relation's noise
/// scale, element ids of the groups and points are data ids.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Tolerated noise per element of each dimension.
    pub epsilons: Vec<u32>,
    /// Whether patterns must be closed in each dimension.
    pub closed: Vec<bool>,
    /// Kind of each attribute of the root node.
    pub kinds: Vec<AttributeKind>,
    /// Minimal size of each dimension (at least 1).
    pub min_sizes: Vec<usize>,
    /// Mere constraints every pattern must satisfy.
    pub measures: Vec<Measure>,
    pub groups: Vec<Group>,
    pub points: Vec<Points>,
    /// Noise counts of a tuple with no noise.
    pub unit: u32,
    pub appeal: AppealFormula,
    pub prefer_dense_values: bool,
    pub min_size_element_pruning: bool,
    /// Recompute every noise counter at every node and panic on mismatch.
    pub check_invariants: bool,
}

impl SearchSettings {
    /// Translate a validated configuration to the relation's internal layout.
    pub fn new(dataset: &Dataset, config: &MinerConfig, relation: &Relation) -> Result<Self, MinerError> {
        let n = relation.dimension_count();
        let encoding = relation.encoding();
        let scale = relation.scale();

        let mut epsilons = Vec::with_capacity(n);
        let mut closed = Vec::with_capacity(n);
        let mut kinds = Vec::with_capacity(n);
        let mut min_sizes = Vec::with_capacity(n);
        let mut measures = Vec::new();
        for internal in 0..n {
            let caller = encoding.caller_dimension(internal);
            epsilons.push(scale.quantize_tolerance(config.epsilon(caller)));
            closed.push(config.is_closed(caller));
            let kind = match config.clique {
                Some((first, second)) if caller == first || caller == second => {
                    let other = if caller == first { second } else { first };
                    AttributeKind::Symmetric {
                        partner: encoding.internal_dimension(other),
                    }
                }
                _ if config.tau(caller) > 0.0 => {
                    let caller_timestamps = dataset.timestamps(caller)?;
                    let timestamps = (0..relation.cardinality(internal) as u32)
                        .map(|data_id| caller_timestamps[encoding.original_id(internal, data_id) as usize])
                        .collect();
                    AttributeKind::Metric(MetricAttribute::new(timestamps, config.tau(caller)))
                }
                _ => AttributeKind::Plain,
            };
            kinds.push(kind);

            let min_size = config.min_size(caller) as usize;
            min_sizes.push(min_size);
            measures.push(Measure::MinSize {
                dimension: internal,
                size: min_size,
            });
            if let Some(max) = config.max_size(caller) {
                measures.push(Measure::MaxSize {
                    dimension: internal,
                    size: max as usize,
                });
            }
        }
        if config.min_area > 0 {
            measures.push(Measure::MinArea(config.min_area));
        }
        if let Some(max) = config.max_area {
            measures.push(Measure::MaxArea(max));
        }

        let groups = config
            .groups
            .iter()
            .map(|spec| {
                let internal = encoding.internal_dimension(spec.dimension);
                Group::from_caller(spec.dimension, &spec.elements, relation.cardinality(internal), encoding)
            })
            .collect();
        for constraint in &config.group_constraints {
            measures.push(match *constraint {
                GroupConstraint::MinCover { group, count } => Measure::MinGroupCover { group, count },
                GroupConstraint::MaxCover { group, count } => Measure::MaxGroupCover { group, count },
            });
        }

        if config.min_membership_sum > 0.0 {
            measures.push(Measure::MinMembershipSum(scale.quantize_minimum(config.min_membership_sum)));
        }
        if let Some(max) = config.max_membership_sum {
            measures.push(Measure::MaxMembershipSum(scale.quantize_maximum(max)));
        }

        let points = config
            .points
            .iter()
            .map(|spec| {
                let internal = encoding.internal_dimension(spec.dimension);
                Points::from_caller(spec.dimension, &spec.weights, relation.cardinality(internal), encoding)
            })
            .collect();
        for constraint in &config.point_constraints {
            measures.push(match *constraint {
                PointConstraint::MinSum { points, sum } => Measure::MinPointSum { points, sum },
                PointConstraint::MaxSum { points, sum } => Measure::MaxPointSum { points, sum },
            });
        }

        Ok(Self {
            epsilons,
            closed,
            kinds,
            min_sizes,
            measures,
            groups,
            points,
            unit: scale.unit(),
            appeal: config.appeal,
            prefer_dense_values: config.prefer_dense_values,
            min_size_element_pruning: config.min_size_element_pruning,
            check_invariants: false,
        })
    }

    pub fn dimension_count(&self) -> usize {
        self.epsilons.len()
    }

    /// Whether patterns must be closed in every dimension.
    pub fn all_closed(&self) -> bool {
        self.closed.iter().all(|&closed| closed)
    }
}

/// Skyline objectives of a configuration, in internal dimension order.
pub fn objectives(config: &MinerConfig, relation: &Relation) -> Vec<Objective> {
    let encoding = relation.encoding();
    config
        .skyline
        .iter()
        .flat_map(|skyline| skyline.objectives.iter())
        .map(|spec| Objective {
            measure: match spec.measure {
                ObjectiveMeasure::Size(caller) => MeasureKind::Size(encoding.internal_dimension(caller)),
                ObjectiveMeasure::Area => MeasureKind::Area,
                ObjectiveMeasure::GroupCover(group) => MeasureKind::GroupCover(group),
                ObjectiveMeasure::MembershipSum => MeasureKind::MembershipSum,
                ObjectiveMeasure::PointSum(points) => MeasureKind::PointSum(points),
            },
            goal: match spec.direction {
                Direction::Minimize => Goal::Minimize,
                Direction::Maximize => Goal::Maximize,
                Direction::MaximizePerMinSize(caller) => {
                    Goal::MaximizePerMinSize(encoding.internal_dimension(caller))
                }
            },
        })
        .collect()
}

/// Search context combining the shared relation and the run's mutable state.
///
/// # Memory Model
///
/// ```text
/// SearchContext {
///     relation: Relation,               // Tier 1: immutable after loading
///     settings: SearchSettings,         // Tier 1: immutable
///     statistics: Statistics,           // Tier 2: mutable, owned
///     skyline: Option<Skyline<Pattern>> // Tier 2: mutable, owned
/// }
/// ```
#[derive(Debug)]
pub struct SearchContext {
    pub relation: Relation,
    pub settings: SearchSettings,
    pub statistics: Statistics,
    pub skyline: Option<Skyline<Pattern>>,
}

impl SearchContext {
    /// Load the dataset and derive the search settings.
    ///
    /// The configuration must have been validated against the dataset.
    pub fn new(dataset: &Dataset, config: &MinerConfig) -> Result<Self, MinerError> {
        let relation = Relation::build(dataset, config)?;
        let settings = SearchSettings::new(dataset, config, &relation)?;
        let skyline = config
            .skyline
            .as_ref()
            .map(|_| Skyline::new(objectives(config, &relation)));
        Ok(Self {
            relation,
            settings,
            statistics: Statistics::new(),
            skyline,
        })
    }
}
