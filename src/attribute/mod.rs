// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Partition of one dimension's elements during the search.
//!
//! An [`Attribute`] keeps the values of a dimension in one vector split into
//! four contiguous segments:
//!
//! ```text
//! | present | potential | irrelevant | absent |
//! 0   potential_index   irrelevant_index   absent_index   len
//! ```
//!
//! - *present*: in every pattern of the subtree;
//! - *potential*: not decided yet;
//! - *irrelevant*: found unable to join any pattern of the subtree, waiting
//!   for their noise to be withdrawn from the counters before being dropped;
//! - *absent*: out of every pattern of the subtree but kept because they may
//!   extend one of them (closedness checks).
//!
//! Values that can neither join nor extend a pattern are deleted. Deleted
//! values are no longer tracked: their data id maps to [`NOT_TRACKED`].
//!
//! The noise counters of the values are maintained by the tree through
//! [`Attribute::value_mut`] and [`Attribute::intersections_mut`]; this module
//! only moves values between segments.

pub mod metric;
pub mod value;

pub use metric::{MetricAttribute, TauViolation};
pub use value::{IntersectionTable, Value};

use crate::config::AppealFormula;

/// Position of a value that is no longer tracked.
pub const NOT_TRACKED: u32 = u32::MAX;

/// The two sets noise is counted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    /// The present elements.
    Present,
    /// The present and potential elements.
    PresentAndPotential,
}

/// Behavior specific to a dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    Plain,
    /// One endpoint of the clique: the partition mirrors the partner's.
    Symmetric { partner: usize },
    /// Tau-contiguous dimension.
    Metric(MetricAttribute),
}

/// One dimension as seen by a search node.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    id: usize,
    kind: AttributeKind,
    epsilon: u32,
    closed: bool,
    values: Vec<Value>,
    /// Position of each data id in `values`, or [`NOT_TRACKED`].
    positions: Vec<u32>,
    potential_index: usize,
    irrelevant_index: usize,
    absent_index: usize,
    present_intersections: IntersectionTable,
    present_and_potential_intersections: IntersectionTable,
}

impl Attribute {
    /// An attribute whose elements are all potential, with zeroed counters.
    ///
    /// `cardinalities` are those of every dimension (internal order); `id`
    /// indexes them.
    pub fn new(id: usize, kind: AttributeKind, epsilon: u32, closed: bool, cardinalities: &[usize]) -> Self {
        let cardinality = cardinalities[id];
        Self {
            id,
            kind,
            epsilon,
            closed,
            values: (0..cardinality as u32).map(Value::new).collect(),
            positions: (0..cardinality as u32).collect(),
            potential_index: 0,
            irrelevant_index: cardinality,
            absent_index: cardinality,
            present_intersections: IntersectionTable::new(id, cardinalities),
            present_and_potential_intersections: IntersectionTable::new(id, cardinalities),
        }
    }

    /// Internal dimension of the attribute.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    /// Tolerated noise per element, in noise counts.
    pub fn epsilon(&self) -> u32 {
        self.epsilon
    }

    /// Whether patterns must be closed in this dimension.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The other clique dimension, for a symmetric attribute.
    pub fn partner(&self) -> Option<usize> {
        match self.kind {
            AttributeKind::Symmetric { partner } => Some(partner),
            _ => None,
        }
    }

    pub fn metric(&self) -> Option<&MetricAttribute> {
        match &self.kind {
            AttributeKind::Metric(metric) => Some(metric),
            _ => None,
        }
    }

    /// Number of elements of the dimension (tracked or not).
    pub fn cardinality(&self) -> usize {
        self.positions.len()
    }

    /// Every tracked value, segment after segment.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn present(&self) -> &[Value] {
        &self.values[..self.potential_index]
    }

    pub fn potential(&self) -> &[Value] {
        &self.values[self.potential_index..self.irrelevant_index]
    }

    pub fn present_and_potential(&self) -> &[Value] {
        &self.values[..self.irrelevant_index]
    }

    pub fn irrelevant(&self) -> &[Value] {
        &self.values[self.irrelevant_index..self.absent_index]
    }

    pub fn absent(&self) -> &[Value] {
        &self.values[self.absent_index..]
    }

    pub fn present_count(&self) -> usize {
        self.potential_index
    }

    pub fn potential_count(&self) -> usize {
        self.irrelevant_index - self.potential_index
    }

    pub fn present_and_potential_count(&self) -> usize {
        self.irrelevant_index
    }

    /// Position of a data id in [`Attribute::values`], if still tracked.
    pub fn position(&self, data_id: u32) -> Option<usize> {
        match self.positions[data_id as usize] {
            NOT_TRACKED => None,
            position => Some(position as usize),
        }
    }

    pub fn is_tracked(&self, data_id: u32) -> bool {
        self.positions[data_id as usize] != NOT_TRACKED
    }

    pub fn is_present(&self, data_id: u32) -> bool {
        (self.positions[data_id as usize] as usize) < self.potential_index
    }

    pub fn is_present_or_potential(&self, data_id: u32) -> bool {
        (self.positions[data_id as usize] as usize) < self.irrelevant_index
    }

    /// Whether a data id is in a partition.
    pub fn is_in(&self, partition: Partition, data_id: u32) -> bool {
        match partition {
            Partition::Present => self.is_present(data_id),
            Partition::PresentAndPotential => self.is_present_or_potential(data_id),
        }
    }

    /// The value of a tracked data id.
    ///
    /// # Panics
    ///
    /// Panics if the data id is no longer tracked.
    pub fn value(&self, data_id: u32) -> &Value {
        &self.values[self.positions[data_id as usize] as usize]
    }

    pub(crate) fn value_mut(&mut self, data_id: u32) -> &mut Value {
        let position = self.positions[data_id as usize] as usize;
        &mut self.values[position]
    }

    /// Noise of a value against the present (resp. present and potential)
    /// elements of `dimension` and the given partition of the others.
    pub fn intersections(&self, partition: Partition) -> &IntersectionTable {
        match partition {
            Partition::Present => &self.present_intersections,
            Partition::PresentAndPotential => &self.present_and_potential_intersections,
        }
    }

    pub(crate) fn intersections_mut(&mut self, partition: Partition) -> &mut IntersectionTable {
        match partition {
            Partition::Present => &mut self.present_intersections,
            Partition::PresentAndPotential => &mut self.present_and_potential_intersections,
        }
    }

    fn swap(&mut self, first: usize, second: usize) {
        if first == second {
            return;
        }
        self.values.swap(first, second);
        self.positions[self.values[first].data_id() as usize] = first as u32;
        self.positions[self.values[second].data_id() as usize] = second as u32;
    }

    /// Select the potential value to branch on and move it to the front of
    /// the potential segment. Returns its data id, or `None` without potential
    /// values.
    ///
    /// The noisiest value against the present elements is chosen (the densest
    /// one with `prefer_dense`), ties going to the noisiest value against the
    /// present and potential elements, then to the earliest position.
    pub fn choose_value(&mut self, prefer_dense: bool) -> Option<u32> {
        let mut best: Option<usize> = None;
        for position in self.potential_index..self.irrelevant_index {
            let candidate = &self.values[position];
            let better = match best {
                None => true,
                Some(best) => {
                    let best = &self.values[best];
                    let present_order = if prefer_dense {
                        best.present_noise().cmp(&candidate.present_noise())
                    } else {
                        candidate.present_noise().cmp(&best.present_noise())
                    };
                    present_order
                        .then(
                            candidate
                                .present_and_potential_noise()
                                .cmp(&best.present_and_potential_noise()),
                        )
                        .is_gt()
                }
            };
            if better {
                best = Some(position);
            }
        }
        let position = best?;
        self.swap(position, self.potential_index);
        Some(self.values[self.potential_index].data_id())
    }

    /// Move a potential value to the front of the potential segment (the
    /// mirror of a choice made on the clique partner).
    pub fn move_to_front_of_potential(&mut self, data_id: u32) {
        let position = self.positions[data_id as usize] as usize;
        debug_assert!(position >= self.potential_index && position < self.irrelevant_index);
        self.swap(position, self.potential_index);
    }

    /// Data id of the value at the front of the potential segment.
    pub fn chosen_value(&self) -> Option<u32> {
        self.potential().first().map(Value::data_id)
    }

    /// Make the chosen value present.
    pub fn set_chosen_value_present(&mut self) {
        debug_assert!(self.potential_index < self.irrelevant_index);
        self.potential_index += 1;
    }

    /// Make the chosen value absent.
    ///
    /// The value is kept in the absent segment when `keep` is set (it may
    /// still prevent the closedness of a pattern), and deleted otherwise.
    pub fn set_chosen_value_absent(&mut self, keep: bool) {
        debug_assert!(self.potential_index < self.irrelevant_index);
        self.swap(self.potential_index, self.irrelevant_index - 1);
        self.irrelevant_index -= 1;
        self.swap(self.irrelevant_index, self.absent_index - 1);
        self.absent_index -= 1;
        if !keep {
            self.remove_at(self.absent_index);
        }
    }

    /// Move a potential value to the irrelevant segment.
    pub fn set_irrelevant(&mut self, data_id: u32) {
        let position = self.positions[data_id as usize] as usize;
        debug_assert!(position >= self.potential_index && position < self.irrelevant_index);
        self.swap(position, self.irrelevant_index - 1);
        self.irrelevant_index -= 1;
    }

    /// Delete the irrelevant values. Returns how many were deleted.
    pub fn clear_irrelevant(&mut self) -> usize {
        let removed = self.absent_index - self.irrelevant_index;
        if removed == 0 {
            return 0;
        }
        for value in self.values.drain(self.irrelevant_index..self.absent_index) {
            self.positions[value.data_id() as usize] = NOT_TRACKED;
        }
        for position in self.irrelevant_index..self.values.len() {
            self.positions[self.values[position].data_id() as usize] = position as u32;
        }
        self.absent_index = self.irrelevant_index;
        removed
    }

    /// Delete an absent value that can no longer extend a pattern.
    pub fn remove_absent(&mut self, data_id: u32) {
        let position = self.positions[data_id as usize] as usize;
        debug_assert!(position >= self.absent_index && position < self.values.len());
        self.remove_at(position);
    }

    fn remove_at(&mut self, position: usize) {
        let last = self.values.len() - 1;
        self.swap(position, last);
        if let Some(value) = self.values.pop() {
            self.positions[value.data_id() as usize] = NOT_TRACKED;
        }
    }

    /// Make every potential value present at once.
    ///
    /// Only the partition moves: the counters against the present elements
    /// are left as they were.
    pub fn finalize(&mut self) {
        self.potential_index = self.irrelevant_index;
    }

    /// How attractive branching on this attribute is; `None` without
    /// potential values.
    ///
    /// `present_sizes` and `present_and_potential_sizes` hold the counts of
    /// every attribute.
    pub fn appeal(
        &self,
        formula: AppealFormula,
        present_sizes: &[usize],
        present_and_potential_sizes: &[usize],
    ) -> Option<u64> {
        let potential = self.potential_count();
        if potential == 0 {
            return None;
        }
        let sizes = match formula {
            AppealFormula::TestedArea => present_sizes,
            AppealFormula::PotentialVolume => present_and_potential_sizes,
        };
        let others = sizes
            .iter()
            .enumerate()
            .filter(|&(dimension, _)| dimension != self.id)
            .fold(1u64, |area, (_, &size)| area.saturating_mul(size as u64));
        Some((potential as u64).saturating_mul(others))
    }

    /// Potential values too far from the present ones along a tau-contiguous
    /// dimension. Other kinds of attribute have none.
    pub fn tau_far_values(&self) -> Result<Vec<u32>, TauViolation> {
        match &self.kind {
            AttributeKind::Metric(metric) => metric.tau_far_values(self.present(), self.potential()),
            _ => Ok(Vec::new()),
        }
    }

    /// Check that segments and positions agree.
    pub fn check_partition(&self) -> Result<(), String> {
        if !(self.potential_index <= self.irrelevant_index
            && self.irrelevant_index <= self.absent_index
            && self.absent_index <= self.values.len())
        {
            return Err(format!(
                "attribute {}: segment bounds {} {} {} {} out of order",
                self.id,
                self.potential_index,
                self.irrelevant_index,
                self.absent_index,
                self.values.len()
            ));
        }
        for (position, value) in self.values.iter().enumerate() {
            if self.positions[value.data_id() as usize] as usize != position {
                return Err(format!(
                    "attribute {}: value {} at position {} is indexed at {}",
                    self.id,
                    value.data_id(),
                    position,
                    self.positions[value.data_id() as usize]
                ));
            }
        }
        let tracked = self.positions.iter().filter(|&&position| position != NOT_TRACKED).count();
        if tracked != self.values.len() {
            return Err(format!(
                "attribute {}: {} tracked ids for {} values",
                self.id,
                tracked,
                self.values.len()
            ));
        }
        Ok(())
    }
}
