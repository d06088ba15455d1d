//! Numerical constants and defaults used throughout the crate.

/// Lower bound of the copula-uniform grid.
pub const GRID_LOWER: f64 = 1.0e-4;

/// Upper bound of the copula-uniform grid.
pub const GRID_UPPER: f64 = 0.9999;

/// Default step of the return-level grid along each uniform axis.
pub const DEFAULT_GRID_STEP: f64 = 1.0e-4;

/// Default number of pooled copula draws for the kernel density estimate.
pub const DEFAULT_SIMULATION_DRAWS: usize = 5_000;

/// Default number of design events drawn along the isoline.
pub const DEFAULT_ENSEMBLE_SIZE: usize = 100;

/// Number of merge-grid points used when no explicit merge step is configured.
pub const DEFAULT_MERGE_POINTS: usize = 1_000;

/// Sentinel y-value closing the composite exceedance region at its right end.
///
/// Kept finite so the closure point serializes cleanly and its kernel
/// density underflows to zero instead of producing NaN.
pub const CLOSURE_FLOOR_Y: f64 = -1.0e9;

/// Exceedance rate used when inverting the GPD tail of an
/// already-conditioned sample.
pub const CONDITIONAL_EXCEEDANCE_RATE: f64 = 1.0;

/// Floor applied to the joint survival probability when converting it to a
/// return level, keeping the surface finite near the grid's upper corner.
pub const MIN_SURVIVAL: f64 = 1.0e-12;
