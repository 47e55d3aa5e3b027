// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Tubes: the cells of one hyperplane along the last dimension.
//!
//! A tube records, for every element of the last dimension, how noisy the
//! cell is. Cells that were never loaded are entirely noisy (one unit).
//!
//! | Variant       | Storage                         | Used when                            |
//! |---------------|---------------------------------|--------------------------------------|
//! | `SparseCrisp` | hash set of fully present ids   | crisp relation, few stored cells     |
//! | `SparseFuzzy` | hash map id → noise             | fuzzy relation, few stored cells     |
//! | `DenseCrisp`  | bitset of fully present ids     | crisp relation, many stored cells    |
//! | `DenseFuzzy`  | noise per id                    | fuzzy relation, many stored cells    |
//! | `NoNoise`     | nothing                         | every cell of the tube is noise free |
//!
//! Sparse tubes turn dense once (see [`Tube::set_tuple`]), never back.

use super::bitset::BitSet;
use rustc_hash::{FxHashMap, FxHashSet};

/// Per-hyperplane cell storage.
#[derive(Debug, Clone, PartialEq)]
pub enum Tube {
    SparseCrisp(FxHashSet<u32>),
    SparseFuzzy(FxHashMap<u32, u32>),
    DenseCrisp(BitSet),
    DenseFuzzy(Vec<u32>),
    NoNoise,
}

/// What a tube needs to know about its dimension to store and convert cells.
#[derive(Debug, Clone, Copy)]
pub struct TubeLayout {
    /// Cardinality of the last dimension.
    pub cardinality: usize,
    /// Noise of a cell outside the relation.
    pub unit: u32,
    /// Stored fraction at which a sparse tube turns dense.
    pub density_threshold: f64,
}

impl Tube {
    /// An empty tube: every cell is entirely noisy.
    pub fn empty(fuzzy: bool) -> Self {
        if fuzzy {
            Tube::SparseFuzzy(FxHashMap::default())
        } else {
            Tube::SparseCrisp(FxHashSet::default())
        }
    }

    /// Noise of the cell at `id`.
    #[inline]
    pub fn noise(&self, id: u32, unit: u32) -> u32 {
        match self {
            Tube::SparseCrisp(present) => {
                if present.contains(&id) {
                    0
                } else {
                    unit
                }
            }
            Tube::SparseFuzzy(noises) => noises.get(&id).copied().unwrap_or(unit),
            Tube::DenseCrisp(present) => {
                if present.contains(id) {
                    0
                } else {
                    unit
                }
            }
            Tube::DenseFuzzy(noises) => noises[id as usize],
            Tube::NoNoise => 0,
        }
    }

    /// Sum of the noise of the cells at `ids`.
    pub fn noise_sum(&self, ids: &[u32], unit: u32) -> u64 {
        match self {
            Tube::NoNoise => 0,
            _ => ids.iter().map(|&id| u64::from(self.noise(id, unit))).sum(),
        }
    }

    /// Number of stored cells: the cells with less noise than `unit`.
    pub fn stored(&self, unit: u32) -> usize {
        match self {
            Tube::SparseCrisp(present) => present.len(),
            Tube::SparseFuzzy(noises) => noises.len(),
            Tube::DenseCrisp(present) => present.len(),
            Tube::DenseFuzzy(noises) => noises.iter().filter(|&&noise| noise < unit).count(),
            Tube::NoNoise => 0,
        }
    }

    /// Whether the tube uses a sparse representation.
    pub fn is_sparse(&self) -> bool {
        matches!(self, Tube::SparseCrisp(_) | Tube::SparseFuzzy(_))
    }

    /// Record the noise of a cell, keeping the smaller noise if the cell is
    /// already stored.
    ///
    /// Returns `true` when a sparse tube has grown dense enough that the
    /// caller should replace it with [`Tube::densified`].
    pub fn set_tuple(&mut self, id: u32, noise: u32, layout: &TubeLayout) -> bool {
        match self {
            Tube::SparseCrisp(present) => {
                debug_assert_eq!(noise, 0, "crisp tubes only store noise-free cells");
                present.insert(id);
                present.len() as f64 >= layout.density_threshold * layout.cardinality as f64
            }
            Tube::SparseFuzzy(noises) => {
                let stored = noises.entry(id).or_insert(noise);
                *stored = (*stored).min(noise);
                noises.len() as f64 >= layout.density_threshold * layout.cardinality as f64
            }
            Tube::DenseCrisp(present) => {
                debug_assert_eq!(noise, 0, "crisp tubes only store noise-free cells");
                present.insert(id);
                false
            }
            Tube::DenseFuzzy(noises) => {
                let stored = &mut noises[id as usize];
                *stored = (*stored).min(noise);
                false
            }
            Tube::NoNoise => false,
        }
    }

    /// The dense counterpart of a sparse tube (dense tubes are returned as is).
    pub fn densified(&self, layout: &TubeLayout) -> Tube {
        match self {
            Tube::SparseCrisp(present) => {
                let mut bits = BitSet::new(layout.cardinality);
                for &id in present {
                    bits.insert(id);
                }
                Tube::DenseCrisp(bits)
            }
            Tube::SparseFuzzy(noises) => {
                let mut dense = vec![layout.unit; layout.cardinality];
                for (&id, &noise) in noises {
                    dense[id as usize] = noise;
                }
                Tube::DenseFuzzy(dense)
            }
            other => other.clone(),
        }
    }

    /// Whether every cell of the tube is noise free.
    pub fn is_noise_free(&self, layout: &TubeLayout) -> bool {
        match self {
            Tube::SparseCrisp(present) => present.len() == layout.cardinality,
            Tube::SparseFuzzy(noises) => {
                noises.len() == layout.cardinality && noises.values().all(|&noise| noise == 0)
            }
            Tube::DenseCrisp(present) => present.len() == layout.cardinality,
            Tube::DenseFuzzy(noises) => noises.iter().all(|&noise| noise == 0),
            Tube::NoNoise => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn layout() -> TubeLayout {
        TubeLayout {
            cardinality: 10,
            unit: 4,
            density_threshold: 0.3,
        }
    }

    #[test]
    fn test_sparse_crisp_turns_dense_at_threshold() {
        let layout = layout();
        let mut tube = Tube::empty(false);
        assert!(!tube.set_tuple(1, 0, &layout));
        assert!(!tube.set_tuple(5, 0, &layout));
        assert!(tube.set_tuple(7, 0, &layout));
        let dense = tube.densified(&layout);
        assert!(!dense.is_sparse());
        for id in 0..10 {
            assert_eq!(tube.noise(id, layout.unit), dense.noise(id, layout.unit));
        }
    }

    #[test]
    fn test_fuzzy_keeps_smallest_noise() {
        let layout = layout();
        let mut tube = Tube::empty(true);
        tube.set_tuple(2, 3, &layout);
        tube.set_tuple(2, 1, &layout);
        tube.set_tuple(2, 2, &layout);
        assert_eq!(tube.noise(2, layout.unit), 1);
        assert_eq!(tube.noise(3, layout.unit), 4);
        assert_eq!(tube.noise_sum(&[2, 3], layout.unit), 5);
        let dense = tube.densified(&layout);
        assert_eq!(tube.stored(layout.unit), 1);
        assert_eq!(dense.stored(layout.unit), 1);
    }

    #[test]
    fn test_noise_free_detection() {
        let layout = TubeLayout {
            cardinality: 2,
            unit: 1,
            density_threshold: 1.0,
        };
        let mut tube = Tube::empty(false);
        tube.set_tuple(0, 0, &layout);
        assert!(!tube.is_noise_free(&layout));
        tube.set_tuple(1, 0, &layout);
        assert!(tube.is_noise_free(&layout));
        assert_eq!(Tube::NoNoise.noise(1, 1), 0);
    }

    /// Cells of a tube of up to 16 elements, with a noise below 4 when fuzzy.
    fn cells() -> impl Strategy<Value = (bool, usize, Vec<(u32, u32)>)> {
        (any::<bool>(), 1usize..16).prop_flat_map(|(fuzzy, cardinality)| {
            let noise = if fuzzy { 0u32..4 } else { 0u32..1 };
            let cells = prop::collection::vec((0..cardinality as u32, noise), 0..24);
            (Just(fuzzy), Just(cardinality), cells)
        })
    }

    proptest! {
        /// Sparse and dense tubes loaded with the same cells answer alike.
        #[test]
        fn test_sparse_and_dense_tubes_agree((fuzzy, cardinality, cells) in cells()) {
            let layout = TubeLayout {
                cardinality,
                unit: 4,
                density_threshold: 1.0,
            };
            let mut sparse = Tube::empty(fuzzy);
            let mut dense = Tube::empty(fuzzy).densified(&layout);
            let mut turned = Tube::empty(fuzzy);
            for &(id, noise) in &cells {
                sparse.set_tuple(id, noise, &layout);
                dense.set_tuple(id, noise, &layout);
                if turned.set_tuple(id, noise, &layout) {
                    turned = turned.densified(&layout);
                }
            }
            prop_assert!(sparse.is_sparse());
            prop_assert!(!dense.is_sparse());
            let ids: Vec<u32> = (0..cardinality as u32).collect();
            for tube in [&dense, &turned] {
                for &id in &ids {
                    prop_assert_eq!(sparse.noise(id, layout.unit), tube.noise(id, layout.unit));
                }
                prop_assert_eq!(sparse.noise_sum(&ids, layout.unit), tube.noise_sum(&ids, layout.unit));
                prop_assert_eq!(sparse.stored(layout.unit), tube.stored(layout.unit));
                prop_assert_eq!(sparse.is_noise_free(&layout), tube.is_noise_free(&layout));
            }
        }
    }
}
