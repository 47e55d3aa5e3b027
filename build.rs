// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Build script to emit custom cfg flags based on the appeal feature selection.
//!
//! This enables cleaner conditional compilation in tests and code:
//! - `#[cfg(appeal_potential_volume)]` instead of `#[cfg(feature = "appeal-potential-volume")]`

fn main() {
    // Declare the custom cfg names to avoid warnings
    println!("cargo:rustc-check-cfg=cfg(appeal_potential_volume)");

    #[cfg(feature = "appeal-potential-volume")]
    println!("cargo:rustc-cfg=appeal_potential_volume");
}
