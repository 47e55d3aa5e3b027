// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Parsed input handed over by the tuple reader.
//!
//! Reading files and mapping labels to ids belongs to the caller. What the miner
//! receives is a [`Dataset`]: the labels of every dimension (their number is
//! the cardinality of the dimension) and a list of [`NoisyTuple`]s, each a
//! coordinate vector with a membership degree in (0, 1].

use crate::config::MinerError;

/// One tuple of the relation with its membership degree.
#[derive(Debug, Clone, PartialEq)]
pub struct NoisyTuple {
    /// One element id per dimension.
    pub coordinates: Vec<u32>,
    /// Degree to which the tuple belongs to the relation, in (0, 1].
    pub membership: f64,
}

impl NoisyTuple {
    pub fn new(coordinates: Vec<u32>, membership: f64) -> Self {
        Self {
            coordinates,
            membership,
        }
    }

    /// A tuple fully in the relation.
    pub fn crisp(coordinates: Vec<u32>) -> Self {
        Self::new(coordinates, 1.0)
    }
}

/// Labels and tuples of an n-ary relation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    labels: Vec<Vec<String>>,
    tuples: Vec<NoisyTuple>,
}

impl Dataset {
    /// Create a dataset without tuples.
    pub fn new(labels: Vec<Vec<String>>) -> Self {
        Self {
            labels,
            tuples: Vec::new(),
        }
    }

    /// Create a dataset whose dimensions are labelled `0..cardinality`.
    pub fn with_cardinalities(cardinalities: &[usize]) -> Self {
        Self::new(
            cardinalities
                .iter()
                .map(|&cardinality| (0..cardinality).map(|id| id.to_string()).collect())
                .collect(),
        )
    }

    /// Create a dataset from a tuple stream.
    ///
    /// The stream ends at the first tuple with a zero membership (the reader's
    /// end-of-input sentinel) or when the iterator is exhausted.
    pub fn from_stream<I>(labels: Vec<Vec<String>>, tuples: I) -> Result<Self, MinerError>
    where
        I: IntoIterator<Item = NoisyTuple>,
    {
        let mut dataset = Self::new(labels);
        for tuple in tuples {
            if tuple.membership == 0.0 {
                break;
            }
            dataset.push(tuple)?;
        }
        Ok(dataset)
    }

    /// Append a tuple after checking its shape and membership.
    pub fn push(&mut self, tuple: NoisyTuple) -> Result<(), MinerError> {
        let index = self.tuples.len();
        if tuple.coordinates.len() != self.labels.len() {
            return Err(MinerError::CoordinateCountMismatch {
                tuple: index,
                given: tuple.coordinates.len(),
                expected: self.labels.len(),
            });
        }
        for (dimension, &coordinate) in tuple.coordinates.iter().enumerate() {
            let cardinality = self.cardinality(dimension);
            if coordinate as usize >= cardinality {
                return Err(MinerError::CoordinateOutOfRange {
                    tuple: index,
                    dimension,
                    coordinate,
                    cardinality,
                });
            }
        }
        if !(tuple.membership > 0.0 && tuple.membership <= 1.0) {
            return Err(MinerError::InvalidMembership {
                tuple: index,
                membership: tuple.membership,
            });
        }
        self.tuples.push(tuple);
        Ok(())
    }

    /// Append a crisp tuple.
    pub fn push_crisp(&mut self, coordinates: &[u32]) -> Result<(), MinerError> {
        self.push(NoisyTuple::crisp(coordinates.to_vec()))
    }

    pub fn dimension_count(&self) -> usize {
        self.labels.len()
    }

    pub fn cardinality(&self, dimension: usize) -> usize {
        self.labels[dimension].len()
    }

    pub fn cardinalities(&self) -> Vec<usize> {
        self.labels.iter().map(Vec::len).collect()
    }

    pub fn label(&self, dimension: usize, element: usize) -> &str {
        &self.labels[dimension][element]
    }

    pub fn tuples(&self) -> &[NoisyTuple] {
        &self.tuples
    }

    /// Numeric labels of a dimension, used as timestamps by tau-contiguity.
    pub fn timestamps(&self, dimension: usize) -> Result<Vec<f64>, MinerError> {
        self.labels[dimension]
            .iter()
            .map(|label| {
                label
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| MinerError::NonNumericLabel {
                        dimension,
                        label: label.clone(),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_stops_at_sentinel() {
        let tuples = vec![
            NoisyTuple::crisp(vec![0, 0]),
            NoisyTuple::new(vec![1, 0], 0.5),
            NoisyTuple::new(vec![0, 0], 0.0),
            NoisyTuple::crisp(vec![1, 1]),
        ];
        let dataset = Dataset::from_stream(
            vec![vec!["a".into(), "b".into()], vec!["x".into(), "y".into()]],
            tuples,
        )
        .unwrap();
        assert_eq!(dataset.tuples().len(), 2);
        assert_eq!(dataset.cardinalities(), vec![2, 2]);
        assert_eq!(dataset.label(1, 1), "y");
    }

    #[test]
    fn test_rejects_bad_tuples() {
        let mut dataset = Dataset::with_cardinalities(&[2, 3]);
        assert!(matches!(
            dataset.push_crisp(&[0]),
            Err(MinerError::CoordinateCountMismatch { given: 1, .. })
        ));
        assert!(matches!(
            dataset.push_crisp(&[0, 3]),
            Err(MinerError::CoordinateOutOfRange { dimension: 1, .. })
        ));
        assert!(matches!(
            dataset.push(NoisyTuple::new(vec![0, 0], 1.5)),
            Err(MinerError::InvalidMembership { .. })
        ));
        assert!(dataset.tuples().is_empty());
    }

    #[test]
    fn test_timestamps() {
        let dataset = Dataset::new(vec![vec!["1".into(), " 2.5 ".into()], vec!["a".into()]]);
        assert_eq!(dataset.timestamps(0).unwrap(), vec![1.0, 2.5]);
        assert!(dataset.timestamps(1).is_err());
    }
}
