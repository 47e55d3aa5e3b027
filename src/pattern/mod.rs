// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Closed n-sets as reported to the caller.

use crate::input::Dataset;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An n-set in the caller's dimension order and element ids.
///
/// Each element comes with its absolute noise: the noise of the cells it
/// shares with the elements of the other dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    elements: Vec<Vec<u32>>,
    noise: Vec<Vec<f64>>,
}

impl Pattern {
    /// A pattern from `(element, noise)` pairs per dimension, in any order.
    pub fn new(dimensions: Vec<Vec<(u32, f64)>>) -> Self {
        let mut elements = Vec::with_capacity(dimensions.len());
        let mut noise = Vec::with_capacity(dimensions.len());
        for mut dimension in dimensions {
            dimension.sort_by_key(|&(element, _)| element);
            elements.push(dimension.iter().map(|&(element, _)| element).collect());
            noise.push(dimension.iter().map(|&(_, noise)| noise).collect());
        }
        Self { elements, noise }
    }

    /// A pattern whose elements are all noise free.
    pub fn noise_free(elements: Vec<Vec<u32>>) -> Self {
        Self::new(
            elements
                .into_iter()
                .map(|dimension| dimension.into_iter().map(|element| (element, 0.0)).collect())
                .collect(),
        )
    }

    pub fn dimension_count(&self) -> usize {
        self.elements.len()
    }

    /// Sorted element ids of a dimension.
    pub fn elements(&self, dimension: usize) -> &[u32] {
        &self.elements[dimension]
    }

    /// Absolute noise of each element of a dimension, aligned with
    /// [`Pattern::elements`].
    pub fn noise(&self, dimension: usize) -> &[f64] {
        &self.noise[dimension]
    }

    pub fn contains(&self, dimension: usize, element: u32) -> bool {
        self.elements[dimension].binary_search(&element).is_ok()
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.elements.iter().map(Vec::len).collect()
    }

    /// Number of cells covered.
    pub fn area(&self) -> u64 {
        self.elements
            .iter()
            .fold(1u64, |area, dimension| area.saturating_mul(dimension.len() as u64))
    }

    /// Number of cells of one element of `dimension`.
    pub fn hyperplane_area(&self, dimension: usize) -> u64 {
        self.elements
            .iter()
            .enumerate()
            .filter(|&(other, _)| other != dimension)
            .fold(1u64, |area, (_, elements)| area.saturating_mul(elements.len() as u64))
    }

    /// Noise of an element divided by its number of cells.
    pub fn relative_noise(&self, dimension: usize, index: usize) -> f64 {
        match self.hyperplane_area(dimension) {
            0 => 0.0,
            area => self.noise[dimension][index] / area as f64,
        }
    }

    /// Largest relative noise of the pattern's elements.
    pub fn intrinsic_distance(&self) -> f64 {
        (0..self.dimension_count())
            .flat_map(|dimension| (0..self.elements[dimension].len()).map(move |index| (dimension, index)))
            .map(|(dimension, index)| self.relative_noise(dimension, index))
            .fold(0.0, f64::max)
    }

    /// Element-wise union with another pattern, dimension by dimension.
    pub fn union_elements(&self, other: &Pattern) -> Vec<Vec<u32>> {
        self.elements
            .iter()
            .zip(&other.elements)
            .map(|(first, second)| {
                let mut union: Vec<u32> = first.iter().chain(second).copied().collect();
                union.sort_unstable();
                union.dedup();
                union
            })
            .collect()
    }

    /// Labels of the elements.
    pub fn labels<'a>(&self, dataset: &'a Dataset) -> Vec<Vec<&'a str>> {
        self.elements
            .iter()
            .enumerate()
            .map(|(dimension, elements)| {
                elements
                    .iter()
                    .map(|&element| dataset.label(dimension, element as usize))
                    .collect()
            })
            .collect()
    }
}

/// Element ids of each dimension separated by commas, dimensions by spaces.
impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (dimension, elements) in self.elements.iter().enumerate() {
            if dimension > 0 {
                f.write_str(" ")?;
            }
            for (index, element) in elements.iter().enumerate() {
                if index > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{element}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> Pattern {
        Pattern::new(vec![vec![(3, 0.5), (1, 0.0)], vec![(0, 1.0), (2, 0.0), (1, 0.5)]])
    }

    #[test]
    fn test_elements_are_sorted_with_their_noise() {
        let pattern = pattern();
        assert_eq!(pattern.elements(0), &[1, 3]);
        assert_eq!(pattern.noise(0), &[0.0, 0.5]);
        assert_eq!(pattern.elements(1), &[0, 1, 2]);
        assert_eq!(pattern.noise(1), &[1.0, 0.5, 0.0]);
        assert!(pattern.contains(1, 2));
        assert!(!pattern.contains(0, 2));
    }

    #[test]
    fn test_areas_and_distance() {
        let pattern = pattern();
        assert_eq!(pattern.sizes(), vec![2, 3]);
        assert_eq!(pattern.area(), 6);
        assert_eq!(pattern.hyperplane_area(0), 3);
        assert_eq!(pattern.relative_noise(1, 0), 0.5);
        assert_eq!(pattern.relative_noise(0, 1), 0.5 / 3.0);
        assert_eq!(pattern.intrinsic_distance(), 0.5);
        assert_eq!(Pattern::noise_free(vec![vec![0], vec![1]]).intrinsic_distance(), 0.0);
    }

    #[test]
    fn test_union_and_display() {
        let other = Pattern::noise_free(vec![vec![0, 1], vec![4]]);
        assert_eq!(pattern().union_elements(&other), vec![vec![0, 1, 3], vec![0, 1, 2, 4]]);
        assert_eq!(pattern().to_string(), "1,3 0,1,2");
    }

    #[test]
    fn test_labels() {
        let dataset = Dataset::new(vec![
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            vec!["x".into(), "y".into(), "z".into()],
        ]);
        assert_eq!(pattern().labels(&dataset), vec![vec!["b", "d"], vec!["x", "y", "z"]]);
    }

    #[test]
    fn test_serializes_to_json() {
        let json = serde_json::to_string(&Pattern::noise_free(vec![vec![1], vec![0, 2]])).unwrap();
        assert_eq!(json, r#"{"elements":[[1],[0,2]],"noise":[[0.0],[0.0,0.0]]}"#);
    }
}
