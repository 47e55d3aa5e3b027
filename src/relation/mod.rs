// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Storage of the noisy n-ary relation.
//!
//! The relation is a trie mirroring the n dimensions: a node at depth k holds
//! one child per element of dimension k, and the nodes at depth n-2 hold
//! [`Tube`]s, the cells of the last dimension. The trie is the single source
//! of truth about cell noise. It is built once by [`Relation::build`]
//! (loading the tuples, then inserting the self-loops of the clique) and is
//! only read afterwards: the search walks it to update its noise counters.
//!
//! # Internal layout
//!
//! Dimensions are stored by ascending cardinality and, inside a dimension,
//! elements are relabelled by decreasing number of tuples. [`Encoding`] maps
//! internal dimensions and data ids back to the caller's.

pub mod bitset;
pub mod noise;
pub mod tube;

pub use bitset::BitSet;
pub use noise::NoiseScale;
pub use tube::{Tube, TubeLayout};

use crate::config::{MinerConfig, MinerError};
use crate::input::Dataset;
use std::ops::ControlFlow;

/// Child of a trie node.
#[derive(Debug, Clone, PartialEq)]
pub enum Hyperplane {
    Trie(Trie),
    Tube(Tube),
}

/// One level of the relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Trie {
    hyperplanes: Vec<Hyperplane>,
}

/// Values of one dimension a cell walk ranges over.
#[derive(Debug, Clone, Copy)]
pub struct CellDomain<'a> {
    /// Data ids to visit.
    pub ids: &'a [u32],
    /// For each id, whether it lies outside the set the walk is counting for.
    pub outside: &'a [bool],
}

/// Number of tubes of each kind, for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TubeCensus {
    pub sparse: usize,
    pub dense: usize,
    pub noise_free: usize,
}

impl Trie {
    fn new(cardinalities: &[usize], depth: usize, fuzzy: bool) -> Self {
        let last_trie_level = depth + 2 == cardinalities.len();
        let hyperplanes = (0..cardinalities[depth])
            .map(|_| {
                if last_trie_level {
                    Hyperplane::Tube(Tube::empty(fuzzy))
                } else {
                    Hyperplane::Trie(Trie::new(cardinalities, depth + 1, fuzzy))
                }
            })
            .collect();
        Self { hyperplanes }
    }

    fn set_tuple(&mut self, tuple: &[u32], noise: u32, layout: &TubeLayout) {
        match &mut self.hyperplanes[tuple[0] as usize] {
            Hyperplane::Trie(trie) => trie.set_tuple(&tuple[1..], noise, layout),
            Hyperplane::Tube(tube) => {
                if tube.set_tuple(tuple[1], noise, layout) {
                    log::debug!("tube with {} stored cells turns dense", tube.stored(layout.unit));
                    *tube = tube.densified(layout);
                }
            }
        }
    }

    fn noise(&self, tuple: &[u32], unit: u32) -> u32 {
        match &self.hyperplanes[tuple[0] as usize] {
            Hyperplane::Trie(trie) => trie.noise(&tuple[1..], unit),
            Hyperplane::Tube(tube) => tube.noise(tuple[1], unit),
        }
    }

    /// Replace the tubes without noise by the `NoNoise` flyweight.
    fn compact(&mut self, layout: &TubeLayout, census: &mut TubeCensus) {
        for hyperplane in &mut self.hyperplanes {
            match hyperplane {
                Hyperplane::Trie(trie) => trie.compact(layout, census),
                Hyperplane::Tube(tube) => {
                    if tube.is_noise_free(layout) {
                        *tube = Tube::NoNoise;
                        census.noise_free += 1;
                    } else if tube.is_sparse() {
                        census.sparse += 1;
                    } else {
                        census.dense += 1;
                    }
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn walk<F>(
        &self,
        depth: usize,
        domains: &[CellDomain<'_>],
        max_outside: usize,
        unit: u32,
        tuple: &mut Vec<u32>,
        outside: &mut Vec<usize>,
        visit: &mut F,
    ) -> ControlFlow<()>
    where
        F: FnMut(&[u32], &[usize], u32) -> ControlFlow<()>,
    {
        let domain = &domains[depth];
        for (index, &id) in domain.ids.iter().enumerate() {
            let is_outside = domain.outside[index];
            if is_outside {
                if outside.len() == max_outside {
                    continue;
                }
                outside.push(depth);
            }
            tuple.push(id);
            let flow = match &self.hyperplanes[id as usize] {
                Hyperplane::Trie(trie) => {
                    trie.walk(depth + 1, domains, max_outside, unit, tuple, outside, visit)
                }
                Hyperplane::Tube(tube) => {
                    walk_tube(tube, depth + 1, domains, max_outside, unit, tuple, outside, visit)
                }
            };
            tuple.pop();
            if is_outside {
                outside.pop();
            }
            flow?;
        }
        ControlFlow::Continue(())
    }
}

#[allow(clippy::too_many_arguments)]
fn walk_tube<F>(
    tube: &Tube,
    depth: usize,
    domains: &[CellDomain<'_>],
    max_outside: usize,
    unit: u32,
    tuple: &mut Vec<u32>,
    outside: &mut Vec<usize>,
    visit: &mut F,
) -> ControlFlow<()>
where
    F: FnMut(&[u32], &[usize], u32) -> ControlFlow<()>,
{
    if matches!(tube, Tube::NoNoise) {
        return ControlFlow::Continue(());
    }
    let domain = &domains[depth];
    for (index, &id) in domain.ids.iter().enumerate() {
        let noise = tube.noise(id, unit);
        if noise == 0 {
            continue;
        }
        let is_outside = domain.outside[index];
        if is_outside {
            if outside.len() == max_outside {
                continue;
            }
            outside.push(depth);
        }
        tuple.push(id);
        let flow = visit(tuple, outside, noise);
        tuple.pop();
        if is_outside {
            outside.pop();
        }
        flow?;
    }
    ControlFlow::Continue(())
}

/// Mapping between the internal layout and the caller's dimensions and ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    /// Internal dimension → caller dimension.
    caller_dimensions: Vec<usize>,
    /// Caller dimension → internal dimension.
    internal_dimensions: Vec<usize>,
    /// Per internal dimension, data id → caller id.
    original_ids: Vec<Vec<u32>>,
    /// Per internal dimension, caller id → data id.
    data_ids: Vec<Vec<u32>>,
}

impl Encoding {
    /// Caller dimension of an internal dimension.
    pub fn caller_dimension(&self, internal: usize) -> usize {
        self.caller_dimensions[internal]
    }

    /// Internal dimension of a caller dimension.
    pub fn internal_dimension(&self, caller: usize) -> usize {
        self.internal_dimensions[caller]
    }

    /// Caller id of a data id of an internal dimension.
    pub fn original_id(&self, internal: usize, data_id: u32) -> u32 {
        self.original_ids[internal][data_id as usize]
    }

    /// Data id of a caller id of an internal dimension.
    pub fn data_id(&self, internal: usize, original_id: u32) -> u32 {
        self.data_ids[internal][original_id as usize]
    }

    /// Convert a caller tuple into internal coordinates.
    pub fn encode_tuple(&self, coordinates: &[u32]) -> Vec<u32> {
        (0..coordinates.len())
            .map(|internal| {
                let caller = self.caller_dimensions[internal];
                self.data_id(internal, coordinates[caller])
            })
            .collect()
    }
}

/// The noisy relation the search reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    root: Trie,
    cardinalities: Vec<usize>,
    scale: NoiseScale,
    fuzzy: bool,
    encoding: Encoding,
    census: TubeCensus,
}

impl Relation {
    /// Load a dataset.
    ///
    /// Dimensions are reordered by ascending cardinality, elements by
    /// decreasing number of tuples (the two clique dimensions share one
    /// ordering), the tuples are stored, then every cell whose two clique
    /// coordinates coincide is made noise free.
    pub fn build(dataset: &Dataset, config: &MinerConfig) -> Result<Self, MinerError> {
        let n = dataset.dimension_count();
        if n < 2 {
            return Err(MinerError::TooFewDimensions(n));
        }
        let caller_cardinalities = dataset.cardinalities();

        let mut counts: Vec<Vec<u32>> = caller_cardinalities.iter().map(|&c| vec![0; c]).collect();
        for tuple in dataset.tuples() {
            for (dimension, &coordinate) in tuple.coordinates.iter().enumerate() {
                counts[dimension][coordinate as usize] += 1;
            }
        }
        if let Some((first, second)) = config.clique {
            let merged: Vec<u32> = counts[first]
                .iter()
                .zip(&counts[second])
                .map(|(a, b)| a + b)
                .collect();
            counts[first] = merged.clone();
            counts[second] = merged;
        }

        let mut caller_dimensions: Vec<usize> = (0..n).collect();
        caller_dimensions.sort_by_key(|&dimension| caller_cardinalities[dimension]);
        let mut internal_dimensions = vec![0; n];
        for (internal, &caller) in caller_dimensions.iter().enumerate() {
            internal_dimensions[caller] = internal;
        }

        let mut original_ids = Vec::with_capacity(n);
        let mut data_ids = Vec::with_capacity(n);
        for &caller in &caller_dimensions {
            let mut order: Vec<u32> = (0..caller_cardinalities[caller] as u32).collect();
            order.sort_by(|&a, &b| counts[caller][b as usize].cmp(&counts[caller][a as usize]).then(a.cmp(&b)));
            let mut inverse = vec![0; order.len()];
            for (data_id, &original) in order.iter().enumerate() {
                inverse[original as usize] = data_id as u32;
            }
            original_ids.push(order);
            data_ids.push(inverse);
        }
        let encoding = Encoding {
            caller_dimensions,
            internal_dimensions,
            original_ids,
            data_ids,
        };

        let cardinalities: Vec<usize> = (0..n)
            .map(|internal| caller_cardinalities[encoding.caller_dimension(internal)])
            .collect();
        let fuzzy = dataset.tuples().iter().any(|tuple| tuple.membership < 1.0);
        let scale = NoiseScale::for_relation(max_hyperplane_area(&cardinalities), fuzzy)?;
        log::debug!(
            "internal dimension order {:?}, {} noise counts per unit",
            encoding.caller_dimensions,
            scale.unit()
        );

        let mut relation = Self {
            root: Trie::new(&cardinalities, 0, fuzzy),
            cardinalities,
            scale,
            fuzzy,
            encoding,
            census: TubeCensus::default(),
        };
        let layout = relation.layout(config.density_threshold);

        for tuple in dataset.tuples() {
            let internal = relation.encoding.encode_tuple(&tuple.coordinates);
            let noise = relation.scale.quantize_membership(tuple.membership);
            relation.root.set_tuple(&internal, noise, &layout);
        }

        if let Some((first, second)) = config.clique {
            let first = relation.encoding.internal_dimension(first);
            let second = relation.encoding.internal_dimension(second);
            relation.insert_self_loops(first, second, &layout);
        }

        let mut census = TubeCensus::default();
        relation.root.compact(&layout, &mut census);
        relation.census = census;
        log::info!(
            "relation loaded: {} tuples, {} sparse, {} dense and {} noise-free tubes",
            dataset.tuples().len(),
            census.sparse,
            census.dense,
            census.noise_free
        );
        Ok(relation)
    }

    fn layout(&self, density_threshold: f64) -> TubeLayout {
        TubeLayout {
            cardinality: *self.cardinalities.last().unwrap_or(&0),
            unit: self.scale.unit(),
            density_threshold,
        }
    }

    /// Make every cell whose `first` and `second` coordinates coincide noise free.
    fn insert_self_loops(&mut self, first: usize, second: usize, layout: &TubeLayout) {
        let n = self.cardinalities.len();
        if self.cardinalities.contains(&0) {
            return;
        }
        let mut tuple = vec![0u32; n];
        let free: Vec<usize> = (0..n).filter(|&dimension| dimension != second).collect();
        loop {
            tuple[second] = tuple[first];
            self.root.set_tuple(&tuple, 0, layout);
            // Odometer over every dimension but `second`.
            let mut advanced = false;
            for &dimension in free.iter().rev() {
                tuple[dimension] += 1;
                if (tuple[dimension] as usize) < self.cardinalities[dimension] {
                    advanced = true;
                    break;
                }
                tuple[dimension] = 0;
            }
            if !advanced {
                break;
            }
        }
    }

    pub fn dimension_count(&self) -> usize {
        self.cardinalities.len()
    }

    /// Cardinalities in internal order.
    pub fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }

    pub fn cardinality(&self, dimension: usize) -> usize {
        self.cardinalities[dimension]
    }

    pub fn scale(&self) -> NoiseScale {
        self.scale
    }

    /// Noise of a cell outside the relation.
    pub fn unit(&self) -> u32 {
        self.scale.unit()
    }

    pub fn is_fuzzy(&self) -> bool {
        self.fuzzy
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn census(&self) -> TubeCensus {
        self.census
    }

    /// Noise of a cell given in internal coordinates.
    pub fn noise(&self, tuple: &[u32]) -> u32 {
        self.root.noise(tuple, self.scale.unit())
    }

    /// Visit every noisy cell of the product of `domains` that has at most
    /// `max_outside` coordinates flagged outside.
    ///
    /// The visitor receives the cell (internal coordinates), the dimensions of
    /// its outside coordinates (ascending) and its noise. It may stop the walk
    /// by returning `ControlFlow::Break`.
    pub fn walk_cells<F>(&self, domains: &[CellDomain<'_>], max_outside: usize, mut visit: F) -> ControlFlow<()>
    where
        F: FnMut(&[u32], &[usize], u32) -> ControlFlow<()>,
    {
        debug_assert_eq!(domains.len(), self.dimension_count());
        let mut tuple = Vec::with_capacity(domains.len());
        let mut outside = Vec::with_capacity(max_outside.min(domains.len()));
        self.root.walk(
            0,
            domains,
            max_outside,
            self.scale.unit(),
            &mut tuple,
            &mut outside,
            &mut visit,
        )
    }

    /// Visit every noisy cell of the product of `domains` with at most
    /// `max_outside` outside coordinates, without stopping early.
    pub fn for_each_cell<F>(&self, domains: &[CellDomain<'_>], max_outside: usize, mut visit: F)
    where
        F: FnMut(&[u32], &[usize], u32),
    {
        let flow = self.walk_cells(domains, max_outside, |tuple, outside, noise| {
            visit(tuple, outside, noise);
            ControlFlow::Continue(())
        });
        debug_assert!(flow.is_continue());
    }

    /// Visit every noisy cell of the product of `sets`, without stopping
    /// early.
    pub fn for_each_product_cell<F>(&self, sets: &[Vec<u32>], mut visit: F)
    where
        F: FnMut(&[u32], u32),
    {
        let flow = self.walk_product(sets, |tuple, noise| {
            visit(tuple, noise);
            ControlFlow::Continue(())
        });
        debug_assert!(flow.is_continue());
    }

    /// Visit every noisy cell of the product of `sets`.
    pub fn walk_product<F>(&self, sets: &[Vec<u32>], mut visit: F) -> ControlFlow<()>
    where
        F: FnMut(&[u32], u32) -> ControlFlow<()>,
    {
        let flags: Vec<Vec<bool>> = sets.iter().map(|set| vec![false; set.len()]).collect();
        let domains: Vec<CellDomain<'_>> = sets
            .iter()
            .zip(&flags)
            .map(|(ids, outside)| CellDomain { ids, outside })
            .collect();
        self.walk_cells(&domains, 0, |tuple, _, noise| visit(tuple, noise))
    }
}

/// Largest number of cells sharing one element (product of the other
/// cardinalities, maximized over the dimensions).
fn max_hyperplane_area(cardinalities: &[usize]) -> u64 {
    (0..cardinalities.len())
        .map(|skipped| {
            cardinalities
                .iter()
                .enumerate()
                .filter(|&(dimension, _)| dimension != skipped)
                .fold(1u64, |area, (_, &c)| area.saturating_mul(c as u64))
        })
        .max()
        .unwrap_or(0)
}
