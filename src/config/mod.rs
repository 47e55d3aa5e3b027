// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Miner configuration.
//!
//! [`MinerConfig`] carries the values the search consumes (tolerances, size
//! and area bounds, the clique, tau-contiguity thresholds, heuristics and the
//! agglomeration cap), always expressed in the caller's dimension order and
//! with the caller's element ids. Parsing option files or command lines is left
//! to the caller; the struct derives `serde` traits so it can be stored in any
//! serde format.
//!
//! Option vectors may be shorter than the number of dimensions: missing
//! entries take their neutral value (tolerance 0, minimum size 1, no maximum
//! size, tau 0). They may never be longer, which is reported by
//! [`MinerConfig::validate`].

pub mod error;

pub use error::MinerError;

use crate::input::Dataset;
use serde::{Deserialize, Serialize};

/// Default fraction of stored cells above which a sparse tube turns dense.
pub const DEFAULT_DENSITY_THRESHOLD: f64 = 0.1;

/// Scoring used to pick the attribute to branch on.
///
/// Both formulas estimate how much the branching choice will shrink the
/// search space. The default is selected at build time with the
/// `appeal-potential-volume` feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppealFormula {
    /// Potential count times the area of the present elements of the other
    /// dimensions: the number of already-decided cells the branch tests.
    TestedArea,
    /// Potential count times the present-and-potential area of the other
    /// dimensions.
    PotentialVolume,
}

impl Default for AppealFormula {
    #[cfg(appeal_potential_volume)]
    fn default() -> Self {
        AppealFormula::PotentialVolume
    }

    #[cfg(not(appeal_potential_volume))]
    fn default() -> Self {
        AppealFormula::TestedArea
    }
}

/// A named subset of the elements of one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Dimension of the group's elements (caller order).
    pub dimension: usize,
    /// Element ids (caller ids).
    pub elements: Vec<u32>,
}

/// Bound on the number of elements of a group a pattern covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupConstraint {
    /// At least `count` elements of `group` must be in the pattern.
    MinCover { group: usize, count: u32 },
    /// At most `count` elements of `group` may be in the pattern.
    MaxCover { group: usize, count: u32 },
}

/// Weights attached to the elements (points) of one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointSpec {
    /// Dimension of the points (caller order).
    pub dimension: usize,
    /// Weight of each element, by caller id. Missing weights are 0.
    pub weights: Vec<u32>,
}

/// Bound on the total weight of the points a pattern covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointConstraint {
    MinSum { points: usize, sum: u64 },
    MaxSum { points: usize, sum: u64 },
}

/// How a skyline objective ranks patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Minimize,
    Maximize,
    /// Maximize separately for every minimal size of a dimension (caller
    /// order): a pattern is only outranked on this objective by patterns at
    /// least as large in that dimension.
    MaximizePerMinSize(usize),
}

/// Quantity a skyline objective ranks patterns by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveMeasure {
    /// Number of elements in a dimension (caller order).
    Size(usize),
    /// Product of the sizes.
    Area,
    /// Number of elements of a declared group in the pattern.
    GroupCover(usize),
    /// Sum of the memberships of the pattern's tuples.
    MembershipSum,
    /// Total weight of the declared points in the pattern.
    PointSum(usize),
}

/// One skyline objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    pub measure: ObjectiveMeasure,
    pub direction: Direction,
}

/// Skyline (multi-objective) search settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkylineConfig {
    pub objectives: Vec<ObjectiveSpec>,
}

/// Everything the search consumes, in the caller's dimension order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Absolute noise tolerance per element, one value per dimension.
    pub epsilons: Vec<f64>,
    /// Minimal number of elements per dimension.
    pub min_sizes: Vec<u32>,
    /// Minimal area (product of the sizes).
    pub min_area: u64,
    /// Maximal number of elements per dimension.
    pub max_sizes: Vec<Option<u32>>,
    /// Maximal area.
    pub max_area: Option<u64>,
    /// Pair of dimensions holding the two endpoints of a symmetric relation.
    pub clique: Option<(usize, usize)>,
    /// Maximal gap between consecutive elements of a tau-contiguous dimension
    /// (0 = not contiguous).
    pub taus: Vec<f64>,
    /// Dimensions in which patterns need not be closed.
    pub unclosed_dimensions: Vec<usize>,
    /// Fraction of stored cells above which a sparse tube turns dense.
    pub density_threshold: f64,
    /// Branch first on the least noisy potential element.
    pub prefer_dense_values: bool,
    /// Attribute scoring used to choose the next branching dimension.
    pub appeal: AppealFormula,
    /// Purge elements that cannot meet the minimal sizes within tolerance.
    pub min_size_element_pruning: bool,
    /// Declared element groups.
    pub groups: Vec<GroupSpec>,
    /// Bounds on group covers.
    pub group_constraints: Vec<GroupConstraint>,
    /// Minimal sum of the memberships of a pattern's tuples.
    pub min_membership_sum: f64,
    /// Maximal sum of the memberships of a pattern's tuples.
    pub max_membership_sum: Option<f64>,
    /// Declared element weights.
    pub points: Vec<PointSpec>,
    /// Bounds on point weight sums.
    pub point_constraints: Vec<PointConstraint>,
    /// Skyline search objectives.
    pub skyline: Option<SkylineConfig>,
    /// Maximal number of closed n-sets kept for agglomeration (0 disables
    /// agglomeration).
    pub max_closed_nsets: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            epsilons: Vec::new(),
            min_sizes: Vec::new(),
            min_area: 0,
            max_sizes: Vec::new(),
            max_area: None,
            clique: None,
            taus: Vec::new(),
            unclosed_dimensions: Vec::new(),
            density_threshold: DEFAULT_DENSITY_THRESHOLD,
            prefer_dense_values: false,
            appeal: AppealFormula::default(),
            min_size_element_pruning: true,
            groups: Vec::new(),
            group_constraints: Vec::new(),
            min_membership_sum: 0.0,
            max_membership_sum: None,
            points: Vec::new(),
            point_constraints: Vec::new(),
            skyline: None,
            max_closed_nsets: 0,
        }
    }
}

impl MinerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epsilons(mut self, epsilons: Vec<f64>) -> Self {
        self.epsilons = epsilons;
        self
    }

    pub fn with_min_sizes(mut self, min_sizes: Vec<u32>) -> Self {
        self.min_sizes = min_sizes;
        self
    }

    pub fn with_min_area(mut self, min_area: u64) -> Self {
        self.min_area = min_area;
        self
    }

    pub fn with_max_sizes(mut self, max_sizes: Vec<Option<u32>>) -> Self {
        self.max_sizes = max_sizes;
        self
    }

    pub fn with_max_area(mut self, max_area: u64) -> Self {
        self.max_area = Some(max_area);
        self
    }

    pub fn with_clique(mut self, first: usize, second: usize) -> Self {
        self.clique = Some((first, second));
        self
    }

    pub fn with_taus(mut self, taus: Vec<f64>) -> Self {
        self.taus = taus;
        self
    }

    pub fn with_unclosed_dimensions(mut self, dimensions: Vec<usize>) -> Self {
        self.unclosed_dimensions = dimensions;
        self
    }

    pub fn with_density_threshold(mut self, threshold: f64) -> Self {
        self.density_threshold = threshold;
        self
    }

    pub fn with_prefer_dense_values(mut self, prefer: bool) -> Self {
        self.prefer_dense_values = prefer;
        self
    }

    pub fn with_appeal(mut self, appeal: AppealFormula) -> Self {
        self.appeal = appeal;
        self
    }

    pub fn with_min_size_element_pruning(mut self, enabled: bool) -> Self {
        self.min_size_element_pruning = enabled;
        self
    }

    pub fn with_group(mut self, group: GroupSpec) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_group_constraint(mut self, constraint: GroupConstraint) -> Self {
        self.group_constraints.push(constraint);
        self
    }

    pub fn with_min_membership_sum(mut self, sum: f64) -> Self {
        self.min_membership_sum = sum;
        self
    }

    pub fn with_max_membership_sum(mut self, sum: f64) -> Self {
        self.max_membership_sum = Some(sum);
        self
    }

    pub fn with_points(mut self, points: PointSpec) -> Self {
        self.points.push(points);
        self
    }

    pub fn with_point_constraint(mut self, constraint: PointConstraint) -> Self {
        self.point_constraints.push(constraint);
        self
    }

    pub fn with_objective(mut self, measure: ObjectiveMeasure, direction: Direction) -> Self {
        self.skyline
            .get_or_insert_with(SkylineConfig::default)
            .objectives
            .push(ObjectiveSpec { measure, direction });
        self
    }

    pub fn with_max_closed_nsets(mut self, cap: usize) -> Self {
        self.max_closed_nsets = cap;
        self
    }

    /// Tolerance of a dimension (0 when not given).
    pub fn epsilon(&self, dimension: usize) -> f64 {
        self.epsilons.get(dimension).copied().unwrap_or(0.0)
    }

    /// Minimal size of a dimension (at least 1).
    pub fn min_size(&self, dimension: usize) -> u32 {
        self.min_sizes.get(dimension).copied().unwrap_or(1).max(1)
    }

    /// Maximal size of a dimension, if bounded.
    pub fn max_size(&self, dimension: usize) -> Option<u32> {
        self.max_sizes.get(dimension).copied().flatten()
    }

    /// Tau of a dimension (0 = not tau-contiguous).
    pub fn tau(&self, dimension: usize) -> f64 {
        self.taus.get(dimension).copied().unwrap_or(0.0)
    }

    /// Whether patterns must be closed in a dimension.
    pub fn is_closed(&self, dimension: usize) -> bool {
        !self.unclosed_dimensions.contains(&dimension)
    }

    /// Check the configuration against the dataset it will be applied to.
    ///
    /// Every usage error is reported here, before any relation is built.
    pub fn validate(&self, dataset: &Dataset) -> Result<(), MinerError> {
        let n = dataset.dimension_count();
        if n < 2 {
            return Err(MinerError::TooFewDimensions(n));
        }

        check_length("epsilons", self.epsilons.len(), n)?;
        check_length("min_sizes", self.min_sizes.len(), n)?;
        check_length("max_sizes", self.max_sizes.len(), n)?;
        check_length("taus", self.taus.len(), n)?;

        for (dimension, &value) in self.epsilons.iter().enumerate() {
            check_threshold("epsilons", dimension, value)?;
        }
        for (dimension, &value) in self.taus.iter().enumerate() {
            check_threshold("taus", dimension, value)?;
        }
        for &dimension in &self.unclosed_dimensions {
            check_dimension("unclosed_dimensions", dimension, n)?;
        }

        if !(self.density_threshold > 0.0 && self.density_threshold <= 1.0) {
            return Err(MinerError::InvalidDensityThreshold(self.density_threshold));
        }

        if let Some((first, second)) = self.clique {
            check_dimension("clique", first, n)?;
            check_dimension("clique", second, n)?;
            if first == second {
                return Err(MinerError::CliqueOnSameDimension(first));
            }
            let first_cardinality = dataset.cardinality(first);
            let second_cardinality = dataset.cardinality(second);
            if first_cardinality != second_cardinality {
                return Err(MinerError::CliqueCardinalityMismatch {
                    first,
                    second,
                    first_cardinality,
                    second_cardinality,
                });
            }
            for element in 0..first_cardinality {
                if dataset.label(first, element) != dataset.label(second, element) {
                    return Err(MinerError::CliqueLabelMismatch {
                        first,
                        second,
                        element,
                    });
                }
            }
            for dimension in [first, second] {
                if self.tau(dimension) > 0.0 {
                    return Err(MinerError::SymmetricAndMetric(dimension));
                }
            }
        }

        for dimension in 0..n {
            if self.tau(dimension) > 0.0 {
                dataset.timestamps(dimension)?;
            }
        }

        for (group, spec) in self.groups.iter().enumerate() {
            check_dimension("groups", spec.dimension, n)?;
            let cardinality = dataset.cardinality(spec.dimension);
            if let Some(&element) = spec.elements.iter().find(|&&e| e as usize >= cardinality) {
                return Err(MinerError::GroupElementOutOfRange {
                    group,
                    dimension: spec.dimension,
                    element,
                    cardinality,
                });
            }
        }
        for constraint in &self.group_constraints {
            let group = match *constraint {
                GroupConstraint::MinCover { group, .. } | GroupConstraint::MaxCover { group, .. } => group,
            };
            self.check_group(group)?;
        }

        for sum in std::iter::once(self.min_membership_sum).chain(self.max_membership_sum) {
            if sum.is_nan() || sum < 0.0 {
                return Err(MinerError::InvalidMembershipSum(sum));
            }
        }
        for (points, spec) in self.points.iter().enumerate() {
            check_dimension("points", spec.dimension, n)?;
            let cardinality = dataset.cardinality(spec.dimension);
            if spec.weights.len() > cardinality {
                return Err(MinerError::TooManyPointWeights {
                    points,
                    given: spec.weights.len(),
                    cardinality,
                });
            }
        }
        for constraint in &self.point_constraints {
            let points = match *constraint {
                PointConstraint::MinSum { points, .. } | PointConstraint::MaxSum { points, .. } => points,
            };
            self.check_points(points)?;
        }

        if let Some(skyline) = &self.skyline {
            if skyline.objectives.is_empty() {
                return Err(MinerError::EmptySkyline);
            }
            for objective in &skyline.objectives {
                match objective.measure {
                    ObjectiveMeasure::Size(dimension) => {
                        check_dimension("skyline", dimension, n)?
                    }
                    ObjectiveMeasure::Area | ObjectiveMeasure::MembershipSum => {}
                    ObjectiveMeasure::GroupCover(group) => self.check_group(group)?,
                    ObjectiveMeasure::PointSum(points) => self.check_points(points)?,
                }
                if let Direction::MaximizePerMinSize(dimension) = objective.direction {
                    check_dimension("skyline", dimension, n)?;
                }
            }
        }

        Ok(())
    }

    fn check_group(&self, group: usize) -> Result<(), MinerError> {
        if group >= self.groups.len() {
            return Err(MinerError::UndeclaredGroup {
                group,
                declared: self.groups.len(),
            });
        }
        Ok(())
    }

    fn check_points(&self, points: usize) -> Result<(), MinerError> {
        if points >= self.points.len() {
            return Err(MinerError::UndeclaredPoints {
                points,
                declared: self.points.len(),
            });
        }
        Ok(())
    }
}

fn check_length(option: &'static str, given: usize, dimensions: usize) -> Result<(), MinerError> {
    if given > dimensions {
        return Err(MinerError::OptionTooLong {
            option,
            given,
            dimensions,
        });
    }
    Ok(())
}

fn check_threshold(option: &'static str, dimension: usize, value: f64) -> Result<(), MinerError> {
    if value.is_nan() || value < 0.0 {
        return Err(MinerError::InvalidThreshold {
            option,
            dimension,
            value,
        });
    }
    Ok(())
}

fn check_dimension(option: &'static str, dimension: usize, dimensions: usize) -> Result<(), MinerError> {
    if dimension >= dimensions {
        return Err(MinerError::DimensionOutOfRange {
            option,
            dimension,
            dimensions,
        });
    }
    Ok(())
}
