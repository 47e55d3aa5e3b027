// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Tau-contiguity on ordered dimensions.
//!
//! The elements of a metric dimension carry a timestamp (their numeric label).
//! A set of elements is tau-contiguous when, sorted by timestamp, no two
//! consecutive elements are more than tau apart.

use super::value::Value;

/// The present elements cannot be chained within tau through the present and
/// potential elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TauViolation {
    /// Timestamps around the unbridgeable gap.
    pub gap: (f64, f64),
}

/// Timestamps and tau of a metric dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricAttribute {
    /// Timestamp of each element, indexed by data id.
    timestamps: Vec<f64>,
    tau: f64,
}

impl MetricAttribute {
    pub fn new(timestamps: Vec<f64>, tau: f64) -> Self {
        Self { timestamps, tau }
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    #[inline]
    pub fn timestamp(&self, data_id: u32) -> f64 {
        self.timestamps[data_id as usize]
    }

    /// Smallest and largest timestamps of a set of values.
    pub fn range<'a>(&self, values: impl IntoIterator<Item = &'a Value>) -> Option<(f64, f64)> {
        values.into_iter().fold(None, |range, value| {
            let timestamp = self.timestamp(value.data_id());
            Some(match range {
                None => (timestamp, timestamp),
                Some((low, high)) => (low.min(timestamp), high.max(timestamp)),
            })
        })
    }

    /// Whether an element can join a tau-contiguous set spanning `range`.
    pub fn within_reach(&self, data_id: u32, range: (f64, f64)) -> bool {
        let timestamp = self.timestamp(data_id);
        timestamp >= range.0 - self.tau && timestamp <= range.1 + self.tau
    }

    /// Whether a set of values is tau-contiguous.
    pub fn is_contiguous<'a>(&self, values: impl IntoIterator<Item = &'a Value>) -> bool {
        let mut timestamps: Vec<f64> = values
            .into_iter()
            .map(|value| self.timestamp(value.data_id()))
            .collect();
        timestamps.sort_by(f64::total_cmp);
        timestamps.windows(2).all(|pair| pair[1] - pair[0] <= self.tau)
    }

    /// Potential values that no tau-contiguous pattern containing the present
    /// values can reach.
    ///
    /// With no present value every potential value may still start a pattern,
    /// so nothing is far. Otherwise the present values must be chained within
    /// tau through present and potential values (else a [`TauViolation`] is
    /// returned) and every potential value outside the chain extended from the
    /// smallest and the largest present timestamps is far.
    pub fn tau_far_values(&self, present: &[Value], potential: &[Value]) -> Result<Vec<u32>, TauViolation> {
        if present.is_empty() {
            return Ok(Vec::new());
        }
        let mut sorted: Vec<(f64, u32, bool)> = present
            .iter()
            .map(|value| (self.timestamp(value.data_id()), value.data_id(), true))
            .chain(
                potential
                    .iter()
                    .map(|value| (self.timestamp(value.data_id()), value.data_id(), false)),
            )
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let first_present = sorted.iter().position(|entry| entry.2).unwrap_or(0);
        let last_present = sorted.iter().rposition(|entry| entry.2).unwrap_or(0);
        for pair in sorted[first_present..=last_present].windows(2) {
            if pair[1].0 - pair[0].0 > self.tau {
                return Err(TauViolation {
                    gap: (pair[0].0, pair[1].0),
                });
            }
        }

        let mut low = first_present;
        while low > 0 && sorted[low].0 - sorted[low - 1].0 <= self.tau {
            low -= 1;
        }
        let mut high = last_present;
        while high + 1 < sorted.len() && sorted[high + 1].0 - sorted[high].0 <= self.tau {
            high += 1;
        }
        Ok(sorted[..low]
            .iter()
            .chain(&sorted[high + 1..])
            .map(|entry| entry.1)
            .collect())
    }
}
