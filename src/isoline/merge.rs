//! Merging the two regime-specific isolines into one composite isoline.
//!
//! Both curves are resampled onto a common x-grid; at each x the composite
//! y is the maximum of the two regimes' values, the union of the two danger
//! regions. The composite curve is then closed into a bounded exceedance
//! region and de-duplicated, yielding a single monotone-in-x polyline.

use serde::{Deserialize, Serialize};

use crate::constants::{CLOSURE_FLOOR_Y, DEFAULT_MERGE_POINTS};
use crate::error::EstimationError;
use crate::isoline::Isoline;
use crate::types::RegimeSource;

/// One point of the composite isoline with its contributing regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergedPoint {
    /// First variable's value.
    pub x: f64,
    /// Second variable's value.
    pub y: f64,
    /// Which regime supplied the maximum at this x.
    pub source: RegimeSource,
}

/// Merges two regime isolines on a common x-grid spanning
/// `[0, max x over both]`.
///
/// Grid x-values where either regime has no value are dropped entirely
/// (the single available regime is *not* used as a fallback). The result
/// is closed by prepending `(0, max y of the curve)` and appending the
/// right end at the [`CLOSURE_FLOOR_Y`] sentinel, then removing exact
/// duplicate pairs.
///
/// # Errors
///
/// [`EstimationError::InvalidConfig`] for an explicit non-positive step or
/// a composite curve with non-positive x-extent;
/// [`EstimationError::InsufficientData`] when the regimes never overlap on
/// the grid.
pub fn merge_isolines(
    first: &Isoline,
    second: &Isoline,
    step: Option<f64>,
) -> Result<Vec<MergedPoint>, EstimationError> {
    let x_max = match (first.max_x(), second.max_x()) {
        (Some(a), Some(b)) => a.max(b),
        _ => {
            return Err(EstimationError::InsufficientData {
                context: "isoline merge",
                needed: 1,
                got: 0,
            })
        }
    };
    if !(x_max > 0.0) {
        return Err(EstimationError::InvalidConfig {
            reason: format!("composite isoline has non-positive x-extent ({})", x_max),
        });
    }
    let step = match step {
        Some(s) if s.is_finite() && s > 0.0 => s,
        Some(s) => {
            return Err(EstimationError::InvalidConfig {
                reason: format!("merge step must be finite and > 0, got {}", s),
            })
        }
        None => x_max / DEFAULT_MERGE_POINTS as f64,
    };

    let mut merged = Vec::new();
    let mut k = 0usize;
    loop {
        let x = k as f64 * step;
        if x > x_max + step * 1.0e-9 {
            break;
        }
        k += 1;
        // An x covered by exactly one regime contributes nothing to the
        // composite curve.
        let (y1, y2) = match (first.y_at(x), second.y_at(x)) {
            (Some(a), Some(b)) => (a, b),
            _ => continue,
        };
        let (y, source) = if y1 > y2 {
            (y1, RegimeSource::First)
        } else if y2 > y1 {
            (y2, RegimeSource::Second)
        } else {
            (y1, RegimeSource::Both)
        };
        merged.push(MergedPoint { x, y, source });
    }

    if merged.is_empty() {
        return Err(EstimationError::InsufficientData {
            context: "isoline merge",
            needed: 1,
            got: 0,
        });
    }

    let y_top = merged.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    let x_end = merged.last().map(|p| p.x).unwrap_or(x_max);
    let mut closed = Vec::with_capacity(merged.len() + 2);
    closed.push(MergedPoint {
        x: 0.0,
        y: y_top,
        source: RegimeSource::Both,
    });
    closed.extend(merged);
    closed.push(MergedPoint {
        x: x_end,
        y: CLOSURE_FLOOR_Y,
        source: RegimeSource::Both,
    });

    dedup_exact(&mut closed);
    Ok(closed)
}

/// Removes points whose `(x, y)` pair already occurred, keeping first
/// occurrences and their source tags.
fn dedup_exact(points: &mut Vec<MergedPoint>) {
    let mut seen = std::collections::HashSet::with_capacity(points.len());
    points.retain(|p| seen.insert((p.x.to_bits(), p.y.to_bits())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn line(from: (f64, f64), to: (f64, f64)) -> Isoline {
        Isoline::new(vec![Point::new(from.0, from.1), Point::new(to.0, to.1)])
    }

    #[test]
    fn merged_curve_is_the_pointwise_maximum() {
        // y1 = 10 - x, y2 = 8 - 0.6 x; they cross at x = 5.
        let first = line((0.0, 10.0), (10.0, 0.0));
        let second = line((0.0, 8.0), (10.0, 2.0));
        let merged = merge_isolines(&first, &second, Some(0.5)).unwrap();

        // Interior points (skip the two synthetic closure points).
        for p in &merged[1..merged.len() - 1] {
            let y1 = 10.0 - p.x;
            let y2 = 8.0 - 0.6 * p.x;
            let expected = y1.max(y2);
            assert!(
                (p.y - expected).abs() < 1e-9,
                "at x={}: {} vs {}",
                p.x,
                p.y,
                expected
            );
            assert!(p.y >= y1 - 1e-9 && p.y >= y2 - 1e-9);
            let expected_source = if p.x < 5.0 {
                RegimeSource::First
            } else if p.x > 5.0 {
                RegimeSource::Second
            } else {
                RegimeSource::Both
            };
            assert_eq!(p.source, expected_source, "at x={}", p.x);
        }
    }

    #[test]
    fn merged_curve_is_monotone_in_x() {
        let first = line((0.0, 10.0), (10.0, 0.0));
        let second = line((2.0, 9.0), (8.0, 1.0));
        let merged = merge_isolines(&first, &second, Some(0.25)).unwrap();
        for pair in merged.windows(2) {
            assert!(pair[1].x >= pair[0].x);
        }
    }

    #[test]
    fn non_overlapping_x_is_dropped() {
        // Second isoline only covers x in [2, 8]: grid points outside that
        // window are dropped even though the first isoline has values.
        let first = line((0.0, 10.0), (10.0, 0.0));
        let second = line((2.0, 9.0), (8.0, 1.0));
        let merged = merge_isolines(&first, &second, Some(0.5)).unwrap();
        let interior = &merged[1..merged.len() - 1];
        assert!(interior.iter().all(|p| p.x >= 2.0 && p.x <= 8.0));
    }

    #[test]
    fn closure_points_bound_the_region() {
        let first = line((0.0, 10.0), (10.0, 0.0));
        let second = line((0.0, 8.0), (10.0, 2.0));
        let merged = merge_isolines(&first, &second, Some(0.5)).unwrap();

        let head = merged.first().unwrap();
        assert_eq!(head.x, 0.0);
        // The prepended point carries the maximum of the whole curve.
        let y_top = merged[..merged.len() - 1]
            .iter()
            .map(|p| p.y)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((head.y - y_top).abs() < 1e-12);
        assert!(merged[1..].iter().all(|p| p.y <= head.y));

        let tail = merged.last().unwrap();
        assert_eq!(tail.y, CLOSURE_FLOOR_Y);
        assert!((tail.x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_pairs_are_removed() {
        let first = line((0.0, 5.0), (10.0, 5.0));
        let second = line((0.0, 5.0), (10.0, 5.0));
        let merged = merge_isolines(&first, &second, Some(1.0)).unwrap();
        let mut seen = std::collections::HashSet::new();
        for p in &merged {
            assert!(seen.insert((p.x.to_bits(), p.y.to_bits())), "duplicate at {:?}", p);
        }
    }

    #[test]
    fn disjoint_isolines_cannot_merge() {
        let first = line((0.0, 10.0), (2.0, 8.0));
        let second = line((5.0, 4.0), (9.0, 1.0));
        assert!(matches!(
            merge_isolines(&first, &second, Some(0.5)),
            Err(EstimationError::InsufficientData { .. })
        ));
    }
}
