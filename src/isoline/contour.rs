//! Level-set extraction from a gridded surface by marching squares.
//!
//! The surface is consumed one row at a time, so the full grid is never
//! materialized: a window of two adjacent rows is enough to classify every
//! cell between them. Cell-edge crossings are interpolated linearly,
//! collected as segments keyed by the grid edge they sit on, and stitched
//! into polylines afterwards.

use std::collections::{HashMap, VecDeque};

/// Identifies a unique grid edge: `H` runs along the u-axis at row `j`
/// between columns `i` and `i + 1`; `V` runs along the v-axis at column `i`
/// between rows `j` and `j + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EdgeKey {
    H { i: usize, j: usize },
    V { i: usize, j: usize },
}

/// The traced level set plus the range of surface values encountered.
#[derive(Debug, Clone)]
pub(crate) struct LevelSet {
    /// Polyline branches in `(u, v)` coordinates, ordered by first emission
    /// in the row-major scan: the first branch is the one a caller should
    /// treat as *the* isoline when several exist.
    pub branches: Vec<Vec<(f64, f64)>>,
    /// Smallest finite surface value seen on the grid.
    pub min_value: f64,
    /// Largest finite surface value seen on the grid.
    pub max_value: f64,
}

/// Traces the level set `f(u, v) == level` over the tensor grid
/// `us x vs`, where `row_values(j)` yields the surface values along `us`
/// at `vs[j]`.
///
/// Saddle cells are disambiguated by the cell-center average. Branches are
/// emitted in the order their first segment appears scanning rows bottom-up
/// and cells left-to-right.
///
/// # Panics
///
/// Panics when either axis has fewer than two points or a returned row has
/// the wrong length.
pub(crate) fn trace_level_set(
    us: &[f64],
    vs: &[f64],
    mut row_values: impl FnMut(usize) -> Vec<f64>,
    level: f64,
) -> LevelSet {
    assert!(
        us.len() >= 2 && vs.len() >= 2,
        "grid must have at least 2 points per axis"
    );

    let nu = us.len();
    let mut min_value = f64::INFINITY;
    let mut max_value = f64::NEG_INFINITY;

    let mut segments: Vec<(EdgeKey, EdgeKey)> = Vec::new();
    let mut crossings: HashMap<EdgeKey, (f64, f64)> = HashMap::new();

    let mut prev = row_values(0);
    assert_eq!(prev.len(), nu, "row 0 has wrong length");
    track_range(&prev, &mut min_value, &mut max_value);

    for j in 0..vs.len() - 1 {
        let cur = row_values(j + 1);
        assert_eq!(cur.len(), nu, "row {} has wrong length", j + 1);
        track_range(&cur, &mut min_value, &mut max_value);

        for i in 0..nu - 1 {
            let bl = prev[i];
            let br = prev[i + 1];
            let tl = cur[i];
            let tr = cur[i + 1];

            let mut case = 0u8;
            if bl >= level {
                case |= 1;
            }
            if br >= level {
                case |= 2;
            }
            if tr >= level {
                case |= 4;
            }
            if tl >= level {
                case |= 8;
            }
            if case == 0 || case == 15 {
                continue;
            }

            let bottom = EdgeKey::H { i, j };
            let top = EdgeKey::H { i, j: j + 1 };
            let left = EdgeKey::V { i, j };
            let right = EdgeKey::V { i: i + 1, j };

            let (first, second) = match case {
                1 => ((left, bottom), None),
                2 => ((bottom, right), None),
                3 => ((left, right), None),
                4 => ((right, top), None),
                5 => {
                    // Saddle: resolve by the cell-center average.
                    if 0.25 * (bl + br + tl + tr) >= level {
                        ((bottom, right), Some((left, top)))
                    } else {
                        ((left, bottom), Some((right, top)))
                    }
                }
                6 => ((bottom, top), None),
                7 => ((left, top), None),
                8 => ((left, top), None),
                9 => ((bottom, top), None),
                10 => {
                    if 0.25 * (bl + br + tl + tr) >= level {
                        ((left, bottom), Some((right, top)))
                    } else {
                        ((bottom, right), Some((left, top)))
                    }
                }
                11 => ((right, top), None),
                12 => ((left, right), None),
                13 => ((bottom, right), None),
                14 => ((left, bottom), None),
                _ => unreachable!("cases 0 and 15 are skipped"),
            };

            let crossing_point = |key: EdgeKey| -> (f64, f64) {
                if key == bottom {
                    let t = interp_t(bl, br, level);
                    (us[i] + t * (us[i + 1] - us[i]), vs[j])
                } else if key == top {
                    let t = interp_t(tl, tr, level);
                    (us[i] + t * (us[i + 1] - us[i]), vs[j + 1])
                } else if key == left {
                    let t = interp_t(bl, tl, level);
                    (us[i], vs[j] + t * (vs[j + 1] - vs[j]))
                } else {
                    let t = interp_t(br, tr, level);
                    (us[i + 1], vs[j] + t * (vs[j + 1] - vs[j]))
                }
            };

            for (a, b) in std::iter::once(first).chain(second) {
                crossings.entry(a).or_insert_with(|| crossing_point(a));
                crossings.entry(b).or_insert_with(|| crossing_point(b));
                segments.push((a, b));
            }
        }
        prev = cur;
    }

    let branches = stitch(&segments, &crossings);
    LevelSet {
        branches,
        min_value,
        max_value,
    }
}

fn track_range(row: &[f64], min_value: &mut f64, max_value: &mut f64) {
    for &v in row {
        if v.is_finite() {
            *min_value = min_value.min(v);
            *max_value = max_value.max(v);
        }
    }
}

/// Interpolation parameter of the level crossing between corner values
/// `a` and `b`.
fn interp_t(a: f64, b: f64, level: f64) -> f64 {
    if (b - a).abs() < f64::EPSILON {
        0.5
    } else {
        ((level - a) / (b - a)).clamp(0.0, 1.0)
    }
}

/// Chains undirected segments into polylines by shared edge keys.
fn stitch(
    segments: &[(EdgeKey, EdgeKey)],
    crossings: &HashMap<EdgeKey, (f64, f64)>,
) -> Vec<Vec<(f64, f64)>> {
    let mut adjacency: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
    for (idx, &(a, b)) in segments.iter().enumerate() {
        adjacency.entry(a).or_default().push(idx);
        adjacency.entry(b).or_default().push(idx);
    }

    let mut used = vec![false; segments.len()];
    let mut branches = Vec::new();

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (a, b) = segments[start];
        let mut chain = VecDeque::from([a, b]);

        // Extend forward from b, then backward from a.
        let mut cursor = b;
        while let Some(next) = next_unused(&adjacency, &mut used, cursor) {
            cursor = other_end(segments[next], cursor);
            chain.push_back(cursor);
        }
        cursor = a;
        while let Some(next) = next_unused(&adjacency, &mut used, cursor) {
            cursor = other_end(segments[next], cursor);
            chain.push_front(cursor);
        }

        branches.push(chain.iter().map(|key| crossings[key]).collect());
    }
    branches
}

fn next_unused(
    adjacency: &HashMap<EdgeKey, Vec<usize>>,
    used: &mut [bool],
    at: EdgeKey,
) -> Option<usize> {
    let candidates = adjacency.get(&at)?;
    for &idx in candidates {
        if !used[idx] {
            used[idx] = true;
            return Some(idx);
        }
    }
    None
}

fn other_end(segment: (EdgeKey, EdgeKey), from: EdgeKey) -> EdgeKey {
    if segment.0 == from {
        segment.1
    } else {
        segment.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 / (n - 1) as f64).collect()
    }

    #[test]
    fn plane_level_set_is_the_diagonal() {
        // f(u, v) = u + v; the level set at 1 is the anti-diagonal.
        let us = axis(11);
        let vs = axis(11);
        let us_row = us.clone();
        let vs_row = vs.clone();
        let level_set = trace_level_set(
            &us,
            &vs,
            |j| us_row.iter().map(|&u| u + vs_row[j]).collect::<Vec<_>>(),
            1.0,
        );
        assert_eq!(level_set.branches.len(), 1, "expected a single branch");
        let branch = &level_set.branches[0];
        assert!(branch.len() >= 10);
        for &(u, v) in branch {
            assert!(
                (u + v - 1.0).abs() < 1e-9,
                "point off contour: ({}, {})",
                u,
                v
            );
        }
    }

    #[test]
    fn branch_is_connected_and_ordered() {
        // Consecutive points on the traced branch are at most one cell apart.
        let us = axis(21);
        let vs = axis(21);
        let us_row = us.clone();
        let vs_row = vs.clone();
        let level_set = trace_level_set(
            &us,
            &vs,
            |j| us_row.iter().map(|&u| u + vs_row[j]).collect::<Vec<_>>(),
            0.7,
        );
        let branch = &level_set.branches[0];
        let cell = 1.0 / 20.0;
        for pair in branch.windows(2) {
            let du = (pair[1].0 - pair[0].0).abs();
            let dv = (pair[1].1 - pair[0].1).abs();
            assert!(du <= cell + 1e-12 && dv <= cell + 1e-12);
        }
    }

    #[test]
    fn out_of_range_level_yields_no_branch() {
        let us = axis(6);
        let vs = axis(6);
        let us_row = us.clone();
        let vs_row = vs.clone();
        let level_set = trace_level_set(
            &us,
            &vs,
            |j| us_row.iter().map(|&u| u + vs_row[j]).collect::<Vec<_>>(),
            5.0,
        );
        assert!(level_set.branches.is_empty());
        assert!((level_set.min_value - 0.0).abs() < 1e-12);
        assert!((level_set.max_value - 2.0).abs() < 1e-12);
    }

    #[test]
    fn two_disjoint_branches_are_emitted_in_scan_order() {
        // f = |v - 0.5|: a band surface whose level set splits into curves
        // near v = 0.2 and v = 0.8.
        let us = axis(9);
        let vs = axis(9);
        let vs_row = vs.clone();
        let level_set =
            trace_level_set(&us, &vs, |j| vec![(vs_row[j] - 0.5f64).abs(); 9], 0.3);
        assert_eq!(level_set.branches.len(), 2);
        // The lower band (smaller v) must come first in emission order.
        let first_mean_v: f64 = level_set.branches[0].iter().map(|p| p.1).sum::<f64>()
            / level_set.branches[0].len() as f64;
        let second_mean_v: f64 = level_set.branches[1].iter().map(|p| p.1).sum::<f64>()
            / level_set.branches[1].len() as f64;
        assert!(first_mean_v < second_mean_v);
    }
}
