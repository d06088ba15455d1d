//! Result types for joint simulation and design-event estimation.

use serde::{Deserialize, Serialize};

use crate::types::{DataTable, Point, RegimeSource};

/// Result of the joint simulator: aligned uniform- and physical-scale
/// samples with column names taken from the input data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointSimulation {
    /// Copula-uniform sample, one row per simulated event.
    pub uniform: DataTable,
    /// The same events in each variable's physical units.
    pub physical: DataTable,
}

/// One point of the composite isoline with its density estimate, kept for
/// downstream consumers such as plotting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsolinePoint {
    /// First variable's value.
    pub x: f64,
    /// Second variable's value.
    pub y: f64,
    /// Which conditioning regime supplied this point.
    pub source: RegimeSource,
    /// Kernel density estimate at this point.
    pub density: f64,
}

/// Result of the design-event estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignEvents {
    /// Isoline point of maximum estimated density.
    pub most_likely: Point,

    /// Corner of the exceedance region: both variables simultaneously at
    /// their univariate return-period level.
    pub full_dependence: Point,

    /// Density-weighted sample of isoline points (with replacement).
    pub ensemble: Vec<Point>,

    /// The composite isoline with per-point density estimates, ordered and
    /// monotone in x; the first and last entries are the synthetic closure
    /// points of the exceedance region.
    pub isoline: Vec<IsolinePoint>,

    /// Echo of the first regime's conditional sample (for plotting).
    pub first_conditional: Vec<Point>,

    /// Echo of the second regime's conditional sample (for plotting).
    pub second_conditional: Vec<Point>,
}
