use crate::types::{EPSILON, FreeSpace, Rect, rects_overlap};

/// Occupied rectangle handed to a [`SpaceFinder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

pub trait SpaceFinder {
    /// Empty rectangles of a `size` slab around `occupied`, largest first.
    fn free_spaces(&self, size: Rect, occupied: &[Footprint]) -> Vec<FreeSpace>;
}

/// Upper bound on grid cells; coarser steps are used for larger slabs.
const MAX_CELLS: f64 = 250_000.0;

/// Rasterizes a slab and grows rectangles out of free corner cells.
///
/// Cell boundaries are the slab edges plus every piece edge, so free spaces
/// start exactly where pieces end. Only when that grid would exceed the cell
/// cap does the scan fall back to uniform `step` cells, rounding pieces
/// outward. Only corner-anchored rectangles are found and the kept list is
/// capped, so some valid placements can still be missed.
#[derive(Debug, Clone, Copy)]
pub struct GridScan {
    step: f64,
    max_spaces: usize,
}

impl GridScan {
    pub fn new(step: f64, max_spaces: usize) -> Self {
        Self {
            step,
            max_spaces: max_spaces.max(1),
        }
    }

    fn step_for(&self, size: Rect) -> f64 {
        let cells = (size.w / self.step) * (size.h / self.step);
        if cells > MAX_CELLS {
            (size.area() / MAX_CELLS).sqrt()
        } else {
            self.step
        }
    }

    /// Cell boundaries along both axes, first and last at the slab edges.
    fn axes(&self, size: Rect, occupied: &[Footprint]) -> (Vec<f64>, Vec<f64>) {
        let xs = edges(size.w, occupied.iter().flat_map(|fp| [fp.x, fp.x + fp.w]));
        let ys = edges(size.h, occupied.iter().flat_map(|fp| [fp.y, fp.y + fp.h]));
        if ((xs.len() - 1) * (ys.len() - 1)) as f64 <= MAX_CELLS {
            return (xs, ys);
        }
        let step = self.step_for(size);
        (uniform(size.w, step), uniform(size.h, step))
    }
}

/// Sorted distinct coordinates in `[0, length]`, always including both ends.
fn edges(length: f64, coords: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = coords
        .filter(|&v| v > EPSILON && v < length - EPSILON)
        .chain([0.0, length])
        .collect();
    out.sort_by(f64::total_cmp);
    out.dedup_by(|a, b| (*a - *b).abs() <= EPSILON);
    out
}

/// `step` spaced boundaries; the last cell absorbs any remainder.
fn uniform(length: f64, step: f64) -> Vec<f64> {
    let cells = ((length / step + EPSILON).floor() as usize).max(1);
    (0..cells)
        .map(|i| i as f64 * step)
        .chain([length])
        .collect()
}

struct Grid {
    cols: usize,
    rows: usize,
    occupied: Vec<bool>,
}

impl Grid {
    fn is_free(&self, c: usize, r: usize) -> bool {
        !self.occupied[r * self.cols + c]
    }

    fn row_free(&self, r: usize, cols: std::ops::Range<usize>) -> bool {
        cols.into_iter().all(|c| self.is_free(c, r))
    }

    fn col_free(&self, c: usize, rows: std::ops::Range<usize>) -> bool {
        rows.into_iter().all(|r| self.is_free(c, r))
    }
}

impl SpaceFinder for GridScan {
    fn free_spaces(&self, size: Rect, occupied: &[Footprint]) -> Vec<FreeSpace> {
        if size.w <= EPSILON || size.h <= EPSILON {
            return Vec::new();
        }
        let (xs, ys) = self.axes(size, occupied);
        let cols = xs.len() - 1;
        let rows = ys.len() - 1;

        let mut grid = Grid {
            cols,
            rows,
            occupied: vec![false; cols * rows],
        };
        for r in 0..rows {
            for c in 0..cols {
                let cell = (xs[c], ys[r], xs[c + 1] - xs[c], ys[r + 1] - ys[r]);
                grid.occupied[r * cols + c] = occupied
                    .iter()
                    .any(|fp| rects_overlap(cell, (fp.x, fp.y, fp.w, fp.h)));
            }
        }

        let mut cells: Vec<(usize, usize, usize, usize)> = Vec::new();
        for r in 0..rows {
            for c in 0..cols {
                if !grid.is_free(c, r) {
                    continue;
                }
                // Only cells with a blocked (or edge) neighbour to the left
                // and above can anchor a maximal rectangle.
                if (c > 0 && grid.is_free(c - 1, r)) || (r > 0 && grid.is_free(c, r - 1)) {
                    continue;
                }

                // Widest first.
                let mut c2 = c;
                while c2 < grid.cols && grid.is_free(c2, r) {
                    c2 += 1;
                }
                let mut r2 = r + 1;
                while r2 < grid.rows && grid.row_free(r2, c..c2) {
                    r2 += 1;
                }
                cells.push((c, r, c2, r2));

                // Tallest first.
                let mut r2 = r;
                while r2 < grid.rows && grid.is_free(c, r2) {
                    r2 += 1;
                }
                let mut c2 = c + 1;
                while c2 < grid.cols && grid.col_free(c2, r..r2) {
                    c2 += 1;
                }
                cells.push((c, r, c2, r2));
            }
        }

        let mut spaces: Vec<FreeSpace> = cells
            .into_iter()
            .map(|(c, r, c2, r2)| FreeSpace::new(xs[c], ys[r], xs[c2] - xs[c], ys[r2] - ys[r]))
            .collect();
        spaces.sort_by(|a, b| b.area().total_cmp(&a.area()));

        let mut kept: Vec<FreeSpace> = Vec::new();
        for space in spaces {
            if kept.iter().any(|k| k.contains(&space)) {
                continue;
            }
            kept.push(space);
            if kept.len() == self.max_spaces {
                break;
            }
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan() -> GridScan {
        GridScan::new(1.0, 32)
    }

    #[test]
    fn test_empty_slab_is_one_space() {
        let spaces = scan().free_spaces(Rect::new(100.0, 50.0), &[]);
        assert_eq!(spaces, vec![FreeSpace::new(0.0, 0.0, 100.0, 50.0)]);
    }

    #[test]
    fn test_corner_piece_leaves_two_maximal_spaces() {
        let occupied = [Footprint {
            x: 0.0,
            y: 0.0,
            w: 80.0,
            h: 40.0,
        }];
        let spaces = scan().free_spaces(Rect::new(100.0, 100.0), &occupied);
        assert_eq!(spaces.len(), 2);
        assert!(spaces.contains(&FreeSpace::new(0.0, 40.0, 100.0, 60.0)));
        assert!(spaces.contains(&FreeSpace::new(80.0, 0.0, 20.0, 100.0)));
    }

    #[test]
    fn test_fractional_piece_edge_is_exact() {
        let occupied = [Footprint {
            x: 0.0,
            y: 0.0,
            w: 50.125,
            h: 100.0,
        }];
        let spaces = scan().free_spaces(Rect::new(100.0, 100.0), &occupied);
        assert_eq!(spaces, vec![FreeSpace::new(50.125, 0.0, 49.875, 100.0)]);
    }

    #[test]
    fn test_kerfed_quarters_leave_exact_spaces() {
        let occupied = [Footprint {
            x: 0.0,
            y: 0.0,
            w: 66.5,
            h: 39.0,
        }];
        let spaces = scan().free_spaces(Rect::new(133.0, 78.0), &occupied);
        assert_eq!(spaces.len(), 2);
        assert!(spaces.contains(&FreeSpace::new(66.5, 0.0, 66.5, 78.0)));
        assert!(spaces.contains(&FreeSpace::new(0.0, 39.0, 133.0, 39.0)));
    }

    #[test]
    fn test_uniform_fallback_rounds_outward() {
        assert_eq!(uniform(10.5, 1.0).len(), 11);
        assert_eq!(uniform(10.5, 1.0).last(), Some(&10.5));
        let xs = uniform(100.0, 1.0);
        let fp = (0.0, 0.0, 50.125, 100.0);
        let first_free = (0..xs.len() - 1)
            .find(|&c| !rects_overlap((xs[c], 0.0, xs[c + 1] - xs[c], 1.0), fp))
            .unwrap();
        assert_eq!(xs[first_free], 51.0);
    }

    #[test]
    fn test_full_slab_has_no_space() {
        let occupied = [Footprint {
            x: 0.0,
            y: 0.0,
            w: 100.0,
            h: 100.0,
        }];
        assert!(scan().free_spaces(Rect::new(100.0, 100.0), &occupied).is_empty());
    }

    #[test]
    fn test_cap_limits_space_count() {
        let occupied: Vec<Footprint> = (0..5)
            .map(|i| Footprint {
                x: i as f64 * 20.0,
                y: 0.0,
                w: 10.0,
                h: 10.0 + i as f64 * 10.0,
            })
            .collect();
        let all = scan().free_spaces(Rect::new(100.0, 100.0), &occupied);
        assert!(all.len() > 2);
        let capped = GridScan::new(1.0, 2).free_spaces(Rect::new(100.0, 100.0), &occupied);
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[0], all[0]);
    }

    #[test]
    fn test_spaces_never_cover_occupied_area() {
        let occupied = [
            Footprint { x: 0.0, y: 0.0, w: 30.0, h: 60.0 },
            Footprint { x: 30.0, y: 0.0, w: 45.5, h: 20.0 },
        ];
        let spaces = scan().free_spaces(Rect::new(100.0, 80.0), &occupied);
        for space in &spaces {
            for fp in &occupied {
                assert!(!crate::types::rects_overlap(
                    (space.x, space.y, space.width, space.height),
                    (fp.x, fp.y, fp.w, fp.h)
                ));
            }
        }
    }

    #[test]
    fn test_large_slab_uses_coarser_grid() {
        let finder = scan();
        let step = finder.step_for(Rect::new(2440.0, 1220.0));
        assert!(step > 1.0);
        assert_eq!(finder.step_for(Rect::new(133.0, 78.0)), 1.0);
    }
}
