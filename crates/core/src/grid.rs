//! Uniform grid partitioning of a bounding box.
//!
//! The exporter fans out one export job per grid cell, so the tiling
//! must be exact: adjacent cells share bit-identical edges and the
//! outermost edges are exactly the parent's bounds. To get that, every
//! edge coordinate is computed once and shared by both cells touching
//! it, and the final column/row reuse the parent's `east`/`north`
//! instead of an accumulated sum.

use crate::bbox::BoundingBox;
use crate::error::CoreError;

/// One rectangle of a partitioned region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Position in the generated sequence, `0..splits_x * splits_y`.
    /// Stable across runs for the same region and split counts; used to
    /// derive unique job names.
    pub index: usize,
    pub bounds: BoundingBox,
}

/// Split `region` into a `splits_x` x `splits_y` grid of equal-sized
/// cells.
///
/// Cells are produced column by column (all cells of the first
/// longitude band first), matching `index = i * splits_y + j` for
/// column `i` and row `j`. Both split counts must be at least 1.
pub fn partition(
    region: &BoundingBox,
    splits_x: usize,
    splits_y: usize,
) -> Result<Vec<Cell>, CoreError> {
    if splits_x == 0 || splits_y == 0 {
        return Err(CoreError::Validation(format!(
            "Split counts must be at least 1, got {splits_x}x{splits_y}"
        )));
    }

    let xs = edges(region.west, region.east, splits_x);
    let ys = edges(region.south, region.north, splits_y);

    let mut cells = Vec::with_capacity(splits_x * splits_y);
    for i in 0..splits_x {
        for j in 0..splits_y {
            let bounds = BoundingBox::new(xs[i], ys[j], xs[i + 1], ys[j + 1])?;
            cells.push(Cell {
                index: cells.len(),
                bounds,
            });
        }
    }

    Ok(cells)
}

/// Compute the `count + 1` edge coordinates of a uniform subdivision.
///
/// The first and last entries are exactly `min` and `max`.
fn edges(min: f64, max: f64, count: usize) -> Vec<f64> {
    let step = (max - min) / count as f64;
    let mut edges: Vec<f64> = (0..count).map(|k| min + k as f64 * step).collect();
    edges.push(max);
    edges
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::error::CoreError;

    fn region() -> BoundingBox {
        BoundingBox::new(73.85, 18.52, 73.86, 18.53).unwrap()
    }

    #[test]
    fn produces_expected_cell_count() {
        let cells = partition(&region(), 4, 4).unwrap();
        assert_eq!(cells.len(), 16);
    }

    #[test]
    fn single_cell_is_the_region() {
        let cells = partition(&region(), 1, 1).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].bounds, region());
    }

    #[test]
    fn indices_are_sequential() {
        let cells = partition(&region(), 3, 2).unwrap();
        let indices: Vec<usize> = cells.iter().map(|c| c.index).collect();
        assert_eq!(indices, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn outer_edges_match_parent_exactly() {
        let parent = region();
        let cells = partition(&parent, 7, 5).unwrap();

        let west = cells.iter().map(|c| c.bounds.west).fold(f64::MAX, f64::min);
        let east = cells.iter().map(|c| c.bounds.east).fold(f64::MIN, f64::max);
        let south = cells.iter().map(|c| c.bounds.south).fold(f64::MAX, f64::min);
        let north = cells.iter().map(|c| c.bounds.north).fold(f64::MIN, f64::max);

        // Bit-exact, not approximate: the tiling must never shrink or
        // overshoot the parent.
        assert_eq!(west, parent.west);
        assert_eq!(east, parent.east);
        assert_eq!(south, parent.south);
        assert_eq!(north, parent.north);
    }

    #[test]
    fn adjacent_cells_share_edges() {
        let (splits_x, splits_y) = (4, 3);
        let cells = partition(&region(), splits_x, splits_y).unwrap();
        let at = |i: usize, j: usize| &cells[i * splits_y + j].bounds;

        for i in 0..splits_x {
            for j in 0..splits_y {
                if i + 1 < splits_x {
                    assert_eq!(at(i, j).east, at(i + 1, j).west);
                }
                if j + 1 < splits_y {
                    assert_eq!(at(i, j).north, at(i, j + 1).south);
                }
            }
        }
    }

    #[test]
    fn cells_cover_interior_points() {
        let parent = region();
        let cells = partition(&parent, 4, 4).unwrap();

        // Sample a lattice of interior points; every one must fall in
        // at least one cell (no gaps).
        for a in 1..20 {
            for b in 1..20 {
                let lon = parent.west + parent.width() * a as f64 / 20.0;
                let lat = parent.south + parent.height() * b as f64 / 20.0;
                let covered = cells.iter().any(|c| {
                    lon >= c.bounds.west
                        && lon <= c.bounds.east
                        && lat >= c.bounds.south
                        && lat <= c.bounds.north
                });
                assert!(covered, "point ({lon}, {lat}) not covered by any cell");
            }
        }
    }

    #[test]
    fn cells_overlap_only_on_edges() {
        let cells = partition(&region(), 3, 3).unwrap();
        for a in &cells {
            for b in &cells {
                if a.index == b.index {
                    continue;
                }
                let overlap_w = a.bounds.east.min(b.bounds.east) - a.bounds.west.max(b.bounds.west);
                let overlap_h =
                    a.bounds.north.min(b.bounds.north) - a.bounds.south.max(b.bounds.south);
                // A positive overlap on both axes would mean a shared
                // interior, which the tiling forbids.
                assert!(
                    overlap_w <= 0.0 || overlap_h <= 0.0,
                    "cells {} and {} overlap",
                    a.index,
                    b.index
                );
            }
        }
    }

    #[test]
    fn zero_splits_rejected() {
        assert_matches!(partition(&region(), 0, 4), Err(CoreError::Validation(_)));
        assert_matches!(partition(&region(), 4, 0), Err(CoreError::Validation(_)));
    }
}
