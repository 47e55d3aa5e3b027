// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Mutable state of a run that outlives the search nodes.

pub mod statistics;

pub use statistics::{Counters, PruneReason, Statistics};
