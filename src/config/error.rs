// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! MinerError: unified error type for the public API.
//!
//! Every variant is raised before the search begins, either while validating
//! the configuration (usage errors) or while loading the tuples (data errors).
//! Pruning during the search is never reported through this type.

use thiserror::Error;

/// Unified error type for configuration and input problems.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MinerError {
    /// The relation must have at least two dimensions.
    #[error("the relation has {0} dimension(s), at least 2 are required")]
    TooFewDimensions(usize),

    /// An option vector has more entries than the relation has dimensions.
    #[error("option `{option}` has {given} values but the relation only has {dimensions} dimensions")]
    OptionTooLong {
        option: &'static str,
        given: usize,
        dimensions: usize,
    },

    /// A tolerance or threshold is negative or not a number.
    #[error("option `{option}` has an invalid value {value} for dimension {dimension}")]
    InvalidThreshold {
        option: &'static str,
        dimension: usize,
        value: f64,
    },

    /// A dimension index is out of range.
    #[error("option `{option}` refers to dimension {dimension}, the relation only has {dimensions}")]
    DimensionOutOfRange {
        option: &'static str,
        dimension: usize,
        dimensions: usize,
    },

    /// The clique must pair two distinct dimensions.
    #[error("the clique dimensions must be distinct (got {0} twice)")]
    CliqueOnSameDimension(usize),

    /// The clique dimensions do not share the same domain.
    #[error("clique dimensions {first} and {second} have different cardinalities ({first_cardinality} and {second_cardinality})")]
    CliqueCardinalityMismatch {
        first: usize,
        second: usize,
        first_cardinality: usize,
        second_cardinality: usize,
    },

    /// The clique labels differ element by element.
    #[error("clique dimensions {first} and {second} disagree on the label of element {element}")]
    CliqueLabelMismatch {
        first: usize,
        second: usize,
        element: usize,
    },

    /// A dimension cannot be both symmetric and tau-contiguous.
    #[error("dimension {0} cannot be both in the clique and tau-contiguous")]
    SymmetricAndMetric(usize),

    /// A tau-contiguous dimension must be labelled with numbers.
    #[error("label `{label}` of tau-contiguous dimension {dimension} is not a number")]
    NonNumericLabel { dimension: usize, label: String },

    /// The sparse/dense density threshold must lie in (0, 1].
    #[error("the density threshold must lie in (0, 1], got {0}")]
    InvalidDensityThreshold(f64),

    /// A group constraint or objective refers to a group that was not declared.
    #[error("group {group} is referenced but only {declared} groups are declared")]
    UndeclaredGroup { group: usize, declared: usize },

    /// A group lists an element outside its dimension.
    #[error("group {group} lists element {element} but dimension {dimension} has {cardinality} elements")]
    GroupElementOutOfRange {
        group: usize,
        dimension: usize,
        element: u32,
        cardinality: usize,
    },

    /// A membership sum bound is negative or not a number.
    #[error("invalid membership sum bound {0}")]
    InvalidMembershipSum(f64),

    /// A point constraint or objective refers to weights that were not
    /// declared.
    #[error("points {points} are referenced but only {declared} are declared")]
    UndeclaredPoints { points: usize, declared: usize },

    /// Points give more weights than their dimension has elements.
    #[error("points {points} give {given} weights but their dimension has {cardinality} elements")]
    TooManyPointWeights {
        points: usize,
        given: usize,
        cardinality: usize,
    },

    /// Skyline search needs at least one objective.
    #[error("skyline search requires at least one objective")]
    EmptySkyline,

    /// A tuple does not have one coordinate per dimension.
    #[error("tuple {tuple} has {given} coordinates, expected {expected}")]
    CoordinateCountMismatch {
        tuple: usize,
        given: usize,
        expected: usize,
    },

    /// A tuple coordinate is not an element of its dimension.
    #[error("tuple {tuple} has coordinate {coordinate} in dimension {dimension} which only has {cardinality} elements")]
    CoordinateOutOfRange {
        tuple: usize,
        dimension: usize,
        coordinate: u32,
        cardinality: usize,
    },

    /// A membership degree must lie in (0, 1].
    #[error("tuple {tuple} has membership {membership}, expected a value in (0, 1]")]
    InvalidMembership { tuple: usize, membership: f64 },

    /// The largest hyperplane does not fit the fixed-point noise counters.
    #[error("a hyperplane has {0} cells, too many for the noise counters")]
    RelationTooLarge(u64),
}
