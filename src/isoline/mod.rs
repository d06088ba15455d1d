//! Joint return-level surfaces and their level-set geometry.

mod contour;
mod grid;
mod merge;

pub use grid::ReturnLevelGrid;
pub use merge::{merge_isolines, MergedPoint};

pub(crate) use contour::trace_level_set;

use crate::types::Point;

/// An ordered polyline of physical-unit points where the return-level
/// surface equals a requested return period.
///
/// Near its turning point the curve is not a function of either coordinate
/// alone, so both lookups interpolate segment-wise and resolve folds by
/// taking the outermost (largest) crossing.
#[derive(Debug, Clone, PartialEq)]
pub struct Isoline {
    points: Vec<Point>,
}

impl Isoline {
    /// Wraps an ordered point sequence.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// The ordered points of the isoline.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Largest finite x over the isoline, if any.
    pub fn max_x(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|p| p.x)
            .filter(|x| x.is_finite())
            .fold(None, |acc, x| Some(acc.map_or(x, |a: f64| a.max(x))))
    }

    /// y-value of the isoline at `x`: the maximum y over all segment
    /// crossings, or `None` when no segment spans `x`.
    pub fn y_at(&self, x: f64) -> Option<f64> {
        envelope(&self.points, x, |p| p.x, |p| p.y)
    }

    /// x-value of the isoline at `y`, solving x-from-y by the same
    /// segment-wise linear interpolation.
    pub fn x_at(&self, y: f64) -> Option<f64> {
        envelope(&self.points, y, |p| p.y, |p| p.x)
    }
}

/// Maximum interpolated `ordinate` over every polyline segment whose
/// `abscissa` range spans `at`.
fn envelope(
    points: &[Point],
    at: f64,
    abscissa: impl Fn(&Point) -> f64,
    ordinate: impl Fn(&Point) -> f64,
) -> Option<f64> {
    let mut best: Option<f64> = None;
    for pair in points.windows(2) {
        let (a0, a1) = (abscissa(&pair[0]), abscissa(&pair[1]));
        let (lo, hi) = if a0 <= a1 { (a0, a1) } else { (a1, a0) };
        if at < lo || at > hi {
            continue;
        }
        let value = if (a1 - a0).abs() < f64::EPSILON {
            ordinate(&pair[0]).max(ordinate(&pair[1]))
        } else {
            let t = (at - a0) / (a1 - a0);
            ordinate(&pair[0]) + t * (ordinate(&pair[1]) - ordinate(&pair[0]))
        };
        best = Some(best.map_or(value, |b: f64| b.max(value)));
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn y_lookup_interpolates_linearly() {
        let iso = Isoline::new(vec![
            Point::new(0.0, 10.0),
            Point::new(5.0, 5.0),
            Point::new(10.0, 0.0),
        ]);
        assert!((iso.y_at(2.5).unwrap() - 7.5).abs() < 1e-12);
        assert!(iso.y_at(11.0).is_none());
        assert!((iso.max_x().unwrap() - 10.0).abs() < 1e-12);
    }

    #[test]
    fn folded_curve_resolves_to_outer_crossing() {
        // A hook shape: x goes 0 -> 4 -> 2, so x = 3 is crossed twice.
        let iso = Isoline::new(vec![
            Point::new(0.0, 8.0),
            Point::new(4.0, 4.0),
            Point::new(2.0, 0.0),
        ]);
        // Crossings at y = 5 (descending branch) and y = 2 (return branch).
        assert!((iso.y_at(3.0).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn x_from_y_lookup_works() {
        let iso = Isoline::new(vec![Point::new(0.0, 10.0), Point::new(10.0, 0.0)]);
        assert!((iso.x_at(2.5).unwrap() - 7.5).abs() < 1e-12);
    }
}
