// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Values and their pairwise noise tables.
//!
//! A [`Value`] is one element of a dimension as seen by a search node: its
//! data id and two noise counters. For a value `v` of dimension `k`,
//! `present_noise` is the noise of the cells `{v} × Π_{j≠k} P_j` and
//! `present_and_potential_noise` the noise of `{v} × Π_{j≠k} (P_j ∪ V_j)`,
//! where `P` are the present and `V` the potential elements. Since `P_j ⊆ P_j
//! ∪ V_j`, `present_noise ≤ present_and_potential_noise` always holds.
//!
//! The pairwise tables refine these counters by one more element: for `v`
//! of dimension `k` and `w` of dimension `j ≠ k`, the entry `(v, j, w)` is
//! the noise of `{v} × {w} × Π_{i∉{j,k}} S_i`, with `S = P` in the present
//! table and `S = P ∪ V` in the present-and-potential table. They are kept in
//! an [`IntersectionTable`], one contiguous arena per attribute indexed by
//! data ids, so cloning a node copies a few large vectors rather than one
//! allocation per value.

use super::Partition;

/// One element of a dimension with its noise counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Value {
    data_id: u32,
    present_noise: u32,
    present_and_potential_noise: u32,
}

impl Value {
    /// A value with no noise counted yet.
    pub fn new(data_id: u32) -> Self {
        Self {
            data_id,
            present_noise: 0,
            present_and_potential_noise: 0,
        }
    }

    /// Id of the element in the relation.
    #[inline]
    pub fn data_id(&self) -> u32 {
        self.data_id
    }

    /// Noise against the present elements of the other dimensions.
    #[inline]
    pub fn present_noise(&self) -> u32 {
        self.present_noise
    }

    /// Noise against the present and potential elements of the other
    /// dimensions.
    #[inline]
    pub fn present_and_potential_noise(&self) -> u32 {
        self.present_and_potential_noise
    }

    /// Noise against the given partition of the other dimensions.
    #[inline]
    pub fn noise(&self, partition: Partition) -> u32 {
        match partition {
            Partition::Present => self.present_noise,
            Partition::PresentAndPotential => self.present_and_potential_noise,
        }
    }

    pub(crate) fn add_present_noise(&mut self, noise: u32) {
        self.present_noise += noise;
    }

    pub(crate) fn add_present_and_potential_noise(&mut self, noise: u32) {
        self.present_and_potential_noise += noise;
    }

    pub(crate) fn subtract_present_and_potential_noise(&mut self, noise: u32) {
        self.present_and_potential_noise -= noise;
    }

    /// Add noise to the counter of a partition.
    pub(crate) fn add(&mut self, partition: Partition, noise: u32) {
        match partition {
            Partition::Present => self.add_present_noise(noise),
            Partition::PresentAndPotential => self.add_present_and_potential_noise(noise),
        }
    }

    /// Withdraw noise from the counter of a partition. Only the present and
    /// potential elements ever shrink.
    pub(crate) fn subtract(&mut self, partition: Partition, noise: u32) {
        debug_assert_eq!(partition, Partition::PresentAndPotential);
        self.subtract_present_and_potential_noise(noise);
    }
}

/// Pairwise noise of every value of one attribute against every element of
/// the other dimensions.
///
/// Rows are indexed by data id; a row is the concatenation, over the other
/// dimensions, of one entry per element of that dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntersectionTable {
    /// Start of each dimension's entries inside a row (the attribute's own
    /// dimension has no entries).
    offsets: Vec<usize>,
    row_length: usize,
    cells: Vec<u32>,
}

impl IntersectionTable {
    /// An all-zero table for the attribute of dimension `own`.
    pub fn new(own: usize, cardinalities: &[usize]) -> Self {
        let mut offsets = Vec::with_capacity(cardinalities.len());
        let mut row_length = 0;
        for (dimension, &cardinality) in cardinalities.iter().enumerate() {
            offsets.push(row_length);
            if dimension != own {
                row_length += cardinality;
            }
        }
        Self {
            offsets,
            row_length,
            cells: vec![0; row_length * cardinalities[own]],
        }
    }

    #[inline]
    fn index(&self, data_id: u32, dimension: usize, other: u32) -> usize {
        data_id as usize * self.row_length + self.offsets[dimension] + other as usize
    }

    /// Noise of the cells shared by `data_id` and `other` (an element of
    /// `dimension`).
    #[inline]
    pub fn get(&self, data_id: u32, dimension: usize, other: u32) -> u32 {
        self.cells[self.index(data_id, dimension, other)]
    }

    #[inline]
    pub(crate) fn add(&mut self, data_id: u32, dimension: usize, other: u32, noise: u32) {
        let index = self.index(data_id, dimension, other);
        self.cells[index] += noise;
    }

    #[inline]
    pub(crate) fn subtract(&mut self, data_id: u32, dimension: usize, other: u32, noise: u32) {
        let index = self.index(data_id, dimension, other);
        self.cells[index] -= noise;
    }

    /// Entries of `data_id` against every element of `dimension`.
    pub fn row(&self, data_id: u32, dimension: usize, cardinality: usize) -> &[u32] {
        let start = self.index(data_id, dimension, 0);
        &self.cells[start..start + cardinality]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_counters() {
        let mut value = Value::new(3);
        value.add_present_and_potential_noise(5);
        value.add_present_noise(2);
        value.subtract_present_and_potential_noise(1);
        assert_eq!(value.data_id(), 3);
        assert_eq!(value.present_noise(), 2);
        assert_eq!(value.present_and_potential_noise(), 4);

        value.add(Partition::Present, 3);
        value.subtract(Partition::PresentAndPotential, 4);
        assert_eq!(value.present_noise(), 5);
        assert_eq!(value.present_and_potential_noise(), 0);
    }

    #[test]
    fn test_table_layout() {
        // Attribute of dimension 1 in a 2 x 3 x 4 relation: rows of 2 + 4 entries.
        let mut table = IntersectionTable::new(1, &[2, 3, 4]);
        table.add(2, 0, 1, 7);
        table.add(2, 2, 3, 9);
        table.add(0, 2, 0, 1);
        table.subtract(2, 2, 3, 4);
        assert_eq!(table.get(2, 0, 1), 7);
        assert_eq!(table.get(2, 2, 3), 5);
        assert_eq!(table.row(2, 2, 4), &[0, 0, 0, 5]);
        assert_eq!(table.row(0, 2, 4), &[1, 0, 0, 0]);
        assert_eq!(table.row(1, 0, 2), &[0, 0]);
    }
}
