// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Noise counter propagation.
//!
//! When an element `u` of dimension `l` enters the present elements, or
//! leaves the present and potential ones, only the cells containing `u` change
//! the counters. They are visited with dimension `l` fixed to `u` and every
//! other dimension ranging over its tracked values, each flagged outside when
//! it is not in the partition the counters are kept for.
//!
//! A cell `c` of noise `η` whose outside dimensions (other than `l`) form the
//! set `M` updates:
//!
//! | `|M|` | counters                           | pairwise tables                          |
//! |-------|------------------------------------|------------------------------------------|
//! | 0     | `c_k` for every `k ≠ l`            | `(c_k, j, c_j)` for every `k ≠ j`, both `≠ l` |
//! | 1     | `c_m`                              | `(c_m, j, c_j)` and `(c_j, m, c_m)` for every `j ∉ {m, l}` |
//! | 2     | none                               | `(c_m1, m2, c_m2)` and `(c_m2, m1, c_m1)` |
//!
//! Cells with three or more outside dimensions touch nothing and are never
//! visited. The walk runs before `u` is moved, so `u` itself is never flagged.

use crate::attribute::{Attribute, Partition};
use crate::relation::{CellDomain, Relation};

/// Whether a walk adds or withdraws the noise of the cells it visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Add,
    Subtract,
}

/// Count the cells of `data_id` (dimension `dimension`) against the present
/// elements. Call before making it present.
pub fn set_present(relation: &Relation, attributes: &mut [Attribute], dimension: usize, data_id: u32) {
    propagate(relation, attributes, dimension, data_id, Partition::Present, Direction::Add);
}

/// Withdraw the cells of `data_id` (dimension `dimension`) from the counters
/// against the present and potential elements. Call before making it absent
/// or irrelevant.
pub fn remove_from_present_and_potential(
    relation: &Relation,
    attributes: &mut [Attribute],
    dimension: usize,
    data_id: u32,
) {
    propagate(
        relation,
        attributes,
        dimension,
        data_id,
        Partition::PresentAndPotential,
        Direction::Subtract,
    );
}

/// Counters of a root node, where every element is potential.
///
/// The counters against the present elements stay at zero, except for the
/// pairwise tables of a 2-dimensional relation, whose entries are plain cells.
pub fn initialize_counters(relation: &Relation, attributes: &mut [Attribute]) {
    let n = attributes.len();
    let ids: Vec<Vec<u32>> = attributes
        .iter()
        .map(|attribute| attribute.values().iter().map(|value| value.data_id()).collect())
        .collect();
    relation.for_each_product_cell(&ids, |cell, noise| {
        for k in 0..n {
            attributes[k]
                .value_mut(cell[k])
                .add(Partition::PresentAndPotential, noise);
            for j in (0..n).filter(|&j| j != k) {
                attributes[k]
                    .intersections_mut(Partition::PresentAndPotential)
                    .add(cell[k], j, cell[j], noise);
                if n == 2 {
                    attributes[k]
                        .intersections_mut(Partition::Present)
                        .add(cell[k], j, cell[j], noise);
                }
            }
        }
    });
}

fn propagate(
    relation: &Relation,
    attributes: &mut [Attribute],
    fixed: usize,
    data_id: u32,
    partition: Partition,
    direction: Direction,
) {
    let mut ids = Vec::with_capacity(attributes.len());
    let mut outside = Vec::with_capacity(attributes.len());
    for attribute in attributes.iter() {
        if attribute.id() == fixed {
            ids.push(vec![data_id]);
            outside.push(vec![false]);
        } else {
            let values: Vec<u32> = attribute.values().iter().map(|value| value.data_id()).collect();
            outside.push(values.iter().map(|&id| !attribute.is_in(partition, id)).collect());
            ids.push(values);
        }
    }
    let domains: Vec<CellDomain<'_>> = ids
        .iter()
        .zip(&outside)
        .map(|(ids, outside)| CellDomain { ids, outside })
        .collect();

    relation.for_each_cell(&domains, 2, |cell, outside, noise| {
        apply(attributes, partition, direction, fixed, cell, outside, noise);
    });
}

fn apply(
    attributes: &mut [Attribute],
    partition: Partition,
    direction: Direction,
    fixed: usize,
    cell: &[u32],
    outside: &[usize],
    noise: u32,
) {
    let n = cell.len();
    let counter = |attributes: &mut [Attribute], k: usize| {
        let value = attributes[k].value_mut(cell[k]);
        match direction {
            Direction::Add => value.add(partition, noise),
            Direction::Subtract => value.subtract(partition, noise),
        }
    };
    let pair = |attributes: &mut [Attribute], k: usize, j: usize| {
        let table = attributes[k].intersections_mut(partition);
        match direction {
            Direction::Add => table.add(cell[k], j, cell[j], noise),
            Direction::Subtract => table.subtract(cell[k], j, cell[j], noise),
        }
    };

    match *outside {
        [] => {
            for k in (0..n).filter(|&k| k != fixed) {
                counter(attributes, k);
                for j in (0..n).filter(|&j| j != fixed && j != k) {
                    pair(attributes, k, j);
                }
            }
        }
        [m] => {
            counter(attributes, m);
            for j in (0..n).filter(|&j| j != fixed && j != m) {
                pair(attributes, m, j);
                pair(attributes, j, m);
            }
        }
        [first, second] => {
            pair(attributes, first, second);
            pair(attributes, second, first);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttributeKind;
    use crate::config::MinerConfig;
    use crate::input::Dataset;

    /// A 2 x 2 x 2 relation missing cells (0,0,1) and (1,1,0): every element
    /// is in exactly one noisy cell.
    fn relation() -> Relation {
        let mut dataset = Dataset::with_cardinalities(&[2, 2, 2]);
        for cell in [[0, 0, 0], [0, 1, 0], [0, 1, 1], [1, 0, 0], [1, 0, 1], [1, 1, 1]] {
            dataset.push_crisp(&cell).unwrap();
        }
        Relation::build(&dataset, &MinerConfig::default()).unwrap()
    }

    fn attributes(relation: &Relation) -> Vec<Attribute> {
        (0..3)
            .map(|id| Attribute::new(id, AttributeKind::Plain, 1, true, relation.cardinalities()))
            .collect()
    }

    fn make_present(relation: &Relation, attributes: &mut [Attribute], dimension: usize, data_id: u32) {
        set_present(relation, attributes, dimension, data_id);
        attributes[dimension].move_to_front_of_potential(data_id);
        attributes[dimension].set_chosen_value_present();
    }

    fn noisy_cells(relation: &Relation) -> Vec<Vec<u32>> {
        let mut cells = Vec::new();
        let all = vec![vec![0, 1]; 3];
        relation.for_each_product_cell(&all, |cell, _| cells.push(cell.to_vec()));
        cells
    }

    #[test]
    fn test_initial_counters() {
        let relation = relation();
        assert_eq!(noisy_cells(&relation).len(), 2);
        let mut attributes = attributes(&relation);
        initialize_counters(&relation, &mut attributes);
        for attribute in &attributes {
            for value in attribute.values() {
                // Each element is in exactly one of the two noisy cells.
                assert_eq!(value.present_and_potential_noise(), 1);
                assert_eq!(value.present_noise(), 0);
            }
        }
    }

    #[test]
    fn test_present_counters_follow_the_present_elements() {
        let relation = relation();
        let cells = noisy_cells(&relation);
        let mut attributes = attributes(&relation);
        initialize_counters(&relation, &mut attributes);

        let noisy = &cells[0];
        make_present(&relation, &mut attributes, 0, noisy[0]);
        // The pairwise entry of the noisy cell now counts it.
        assert_eq!(
            attributes[1]
                .intersections(Partition::Present)
                .get(noisy[1], 2, noisy[2]),
            1
        );
        assert_eq!(attributes[1].value(noisy[1]).present_noise(), 0);

        make_present(&relation, &mut attributes, 1, noisy[1]);
        assert_eq!(attributes[2].value(noisy[2]).present_noise(), 1);
        assert_eq!(attributes[2].value(1 - noisy[2]).present_noise(), 0);

        make_present(&relation, &mut attributes, 2, noisy[2]);
        for k in 0..3 {
            assert_eq!(attributes[k].value(noisy[k]).present_noise(), 1);
        }
    }

    #[test]
    fn test_removal_withdraws_noise() {
        let relation = relation();
        let cells = noisy_cells(&relation);
        let mut attributes = attributes(&relation);
        initialize_counters(&relation, &mut attributes);

        let noisy = &cells[0];
        remove_from_present_and_potential(&relation, &mut attributes, 0, noisy[0]);
        attributes[0].move_to_front_of_potential(noisy[0]);
        attributes[0].set_chosen_value_absent(true);

        assert_eq!(attributes[1].value(noisy[1]).present_and_potential_noise(), 0);
        assert_eq!(attributes[2].value(noisy[2]).present_and_potential_noise(), 0);
        // The absent element keeps its own count.
        assert_eq!(attributes[0].value(noisy[0]).present_and_potential_noise(), 1);
        assert_eq!(
            attributes[1]
                .intersections(Partition::PresentAndPotential)
                .get(noisy[1], 2, noisy[2]),
            0
        );
        assert_eq!(
            attributes[0]
                .intersections(Partition::PresentAndPotential)
                .get(noisy[0], 1, noisy[1]),
            1
        );
    }
}
