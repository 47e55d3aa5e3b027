// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Fixed-point noise.
//!
//! Noise is counted with `u32` integers: one unit of noise (a cell entirely
//! outside the relation) is worth `per_unit` counts. The scale is chosen so
//! that the noise of a whole hyperplane still fits a `u32`.
//!
//! Cell noise is rounded down and tolerances are rounded down too (after a
//! tiny upward nudge absorbing the floating-point error of the product). For
//! cells with real noises `x_i` summing to at most `eps`:
//! `Σ floor(x_i·u) ≤ floor(Σ x_i·u) ≤ floor(eps·u)`, so every pattern valid
//! under real-valued noise stays valid under the quantized counters.

use crate::config::MinerError;

/// Counts per unit of noise used for fuzzy relations, when the hyperplanes are
/// small enough.
pub const DEFAULT_NOISE_PER_UNIT: u32 = 1 << 20;

/// Upward nudge applied before rounding a tolerance down.
const TOLERANCE_NUDGE: f64 = 1e-9;

/// Conversion between real noise and the integer counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseScale {
    per_unit: u32,
}

impl NoiseScale {
    /// Choose the scale for a relation.
    ///
    /// Crisp relations only need one count per cell. Fuzzy relations use as
    /// many counts per unit as the largest hyperplane allows, capped at
    /// [`DEFAULT_NOISE_PER_UNIT`].
    pub fn for_relation(max_hyperplane_area: u64, fuzzy: bool) -> Result<Self, MinerError> {
        if max_hyperplane_area > u64::from(u32::MAX) {
            return Err(MinerError::RelationTooLarge(max_hyperplane_area));
        }
        let per_unit = if fuzzy {
            let room = u64::from(u32::MAX) / max_hyperplane_area.max(1);
            room.min(u64::from(DEFAULT_NOISE_PER_UNIT)).max(1) as u32
        } else {
            1
        };
        Ok(Self { per_unit })
    }

    /// Scale with an explicit number of counts per unit.
    pub fn with_per_unit(per_unit: u32) -> Self {
        Self {
            per_unit: per_unit.max(1),
        }
    }

    /// Counts in one unit of noise (the noise of a cell outside the relation).
    pub fn unit(&self) -> u32 {
        self.per_unit
    }

    /// Noise of a cell with the given membership.
    pub fn quantize_membership(&self, membership: f64) -> u32 {
        let noise = (1.0 - membership.clamp(0.0, 1.0)) * f64::from(self.per_unit);
        (noise.floor() as u32).min(self.per_unit)
    }

    /// Integer tolerance for a real tolerance.
    pub fn quantize_tolerance(&self, tolerance: f64) -> u32 {
        let scaled = tolerance * f64::from(self.per_unit) + TOLERANCE_NUDGE;
        if scaled >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            scaled.floor().max(0.0) as u32
        }
    }

    /// Smallest count reaching a real minimum (memberships, noise).
    pub fn quantize_minimum(&self, minimum: f64) -> u64 {
        let scaled = minimum * f64::from(self.per_unit) - TOLERANCE_NUDGE;
        scaled.ceil().max(0.0) as u64
    }

    /// Largest count within a real maximum.
    pub fn quantize_maximum(&self, maximum: f64) -> u64 {
        let scaled = maximum * f64::from(self.per_unit) + TOLERANCE_NUDGE;
        scaled.floor().max(0.0) as u64
    }

    /// Real noise of a counter value.
    pub fn to_real(&self, noise: u64) -> f64 {
        noise as f64 / f64::from(self.per_unit)
    }
}
