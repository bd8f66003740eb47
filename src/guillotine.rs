use crate::error::{OptimizeError, Result};
use crate::orientation::select_orientation;
use crate::types::{FreeSpace, Piece, PlacedPiece, Rect, Slab};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStrategy {
    /// Take the first free space the piece fits.
    FirstFit,
    /// Take the free space with the lowest leftover score.
    BestFit,
}

#[derive(Debug, Clone)]
pub struct GuillotineBin {
    size: Rect,
    pub slab: Slab,
}

impl GuillotineBin {
    /// Opens a slab with `piece` in the top-left corner.
    pub fn open(id: usize, size: Rect, piece: Piece) -> Self {
        let mut slab = Slab::new(id, size);
        let whole = FreeSpace::new(0.0, 0.0, size.w, size.h);
        slab.spaces = split(whole, piece.effective());
        slab.pieces.push(PlacedPiece::new(piece, 0.0, 0.0));
        Self { size, slab }
    }

    pub fn find(&self, piece: &Piece, strategy: FitStrategy) -> Option<usize> {
        let eff = piece.effective();
        let mut best: Option<(usize, f64)> = None;

        for (idx, space) in self.slab.spaces.iter().enumerate() {
            if !eff.fits_in(&space.rect()) {
                continue;
            }
            match strategy {
                FitStrategy::FirstFit => return Some(idx),
                FitStrategy::BestFit => {
                    let score = Self::score(eff, space);
                    if best.is_none_or(|(_, s)| score < s) {
                        best = Some((idx, score));
                    }
                }
            }
        }

        best.map(|(idx, _)| idx)
    }

    fn score(piece: Rect, space: &FreeSpace) -> f64 {
        let width_waste = space.width - piece.w;
        let height_waste = space.height - piece.h;
        width_waste * piece.h + height_waste * space.width
    }

    pub fn place(&mut self, space_idx: usize, piece: Piece) {
        let space = self.slab.spaces.remove(space_idx);
        self.slab.spaces.extend(split(space, piece.effective()));
        // Smallest spaces first so later lookups favour tight spots.
        self.slab
            .spaces
            .sort_by(|a, b| a.area().total_cmp(&b.area()));
        self.slab
            .pieces
            .push(PlacedPiece::new(piece, space.x, space.y));
    }

    pub fn into_slab(mut self) -> Slab {
        self.slab.recompute_waste(self.size);
        self.slab
    }
}

/// Guillotine children of `space` once `placed` occupies its top-left
/// corner: a full-width strip below and a piece-high strip to the right.
fn split(space: FreeSpace, placed: Rect) -> Vec<FreeSpace> {
    let mut children = Vec::with_capacity(2);
    if space.height > placed.h {
        children.push(FreeSpace::new(
            space.x,
            space.y + placed.h,
            space.width,
            space.height - placed.h,
        ));
    }
    if space.width > placed.w {
        children.push(FreeSpace::new(
            space.x + placed.w,
            space.y,
            space.width - placed.w,
            placed.h,
        ));
    }
    children
}

/// Pieces whose effective rectangle fits an empty slab in neither orientation.
pub fn unplaceable(pieces: &[Piece], size: Rect) -> Vec<Piece> {
    pieces
        .iter()
        .filter(|p| !p.fits_slab(size))
        .cloned()
        .collect()
}

/// Largest pieces first, each into the first slab with room for it.
pub fn pack(pieces: &[Piece], size: Rect, strategy: FitStrategy) -> Result<Vec<Slab>> {
    let oversized = unplaceable(pieces, size);
    if !oversized.is_empty() {
        return Err(OptimizeError::Unplaceable { pieces: oversized });
    }

    let mut pieces = pieces.to_vec();
    for piece in &mut pieces {
        select_orientation(piece, size);
    }
    pieces.sort_by(|a, b| b.area.total_cmp(&a.area));

    let mut bins: Vec<GuillotineBin> = Vec::new();
    for piece in pieces {
        let target = bins
            .iter()
            .enumerate()
            .find_map(|(bi, bin)| bin.find(&piece, strategy).map(|si| (bi, si)));

        match target {
            Some((bi, si)) => bins[bi].place(si, piece),
            None => {
                let id = bins.len() + 1;
                bins.push(GuillotineBin::open(id, size, piece));
            }
        }
    }

    tracing::debug!(?strategy, slabs = bins.len(), "greedy packing finished");
    Ok(bins.into_iter().map(GuillotineBin::into_slab).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(id: &str, w: f64, h: f64) -> Piece {
        Piece::new(id, w, h, 0.0, format!("Piece {id}"))
    }

    #[test]
    fn test_open_seeds_two_children() {
        let bin = GuillotineBin::open(1, Rect::new(100.0, 100.0), piece("1", 80.0, 40.0));
        assert_eq!(
            bin.slab.spaces,
            vec![
                FreeSpace::new(0.0, 40.0, 100.0, 60.0),
                FreeSpace::new(80.0, 0.0, 20.0, 40.0),
            ]
        );
    }

    #[test]
    fn test_fill_exact() {
        let bin = GuillotineBin::open(1, Rect::new(100.0, 100.0), piece("1", 100.0, 100.0));
        assert!(bin.slab.spaces.is_empty());
        assert_eq!(bin.into_slab().waste_area, 0.0);
    }

    #[test]
    fn test_place_sorts_spaces_smallest_first() {
        let mut bin = GuillotineBin::open(1, Rect::new(100.0, 100.0), piece("1", 50.0, 50.0));
        let p = piece("2", 30.0, 30.0);
        let idx = bin.find(&p, FitStrategy::BestFit).unwrap();
        bin.place(idx, p);
        let areas: Vec<f64> = bin.slab.spaces.iter().map(FreeSpace::area).collect();
        let mut sorted = areas.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(areas, sorted);
    }

    #[test]
    fn test_first_fit_takes_first_space_best_fit_takes_tightest() {
        let mut bin = GuillotineBin::open(1, Rect::new(100.0, 100.0), piece("1", 60.0, 60.0));
        // spaces: below (0,60) 100x40, right (60,0) 40x60
        bin.slab.spaces = vec![
            FreeSpace::new(0.0, 60.0, 100.0, 40.0),
            FreeSpace::new(60.0, 0.0, 40.0, 60.0),
        ];
        let p = piece("2", 40.0, 40.0);
        assert_eq!(bin.find(&p, FitStrategy::FirstFit), Some(0));
        // below: 60*40 + 0*100 = 2400, right: 0*40 + 20*40 = 800
        assert_eq!(bin.find(&p, FitStrategy::BestFit), Some(1));
    }

    #[test]
    fn test_best_fit_three_bars() {
        let pieces = vec![piece("1", 80.0, 40.0), piece("2", 80.0, 40.0), piece("3", 80.0, 40.0)];
        let slabs = pack(&pieces, Rect::new(100.0, 100.0), FitStrategy::BestFit).unwrap();
        assert_eq!(slabs.len(), 2);
        assert_eq!(slabs[0].pieces.len(), 2);
        assert_eq!((slabs[0].pieces[1].x, slabs[0].pieces[1].y), (0.0, 40.0));
        assert_eq!(slabs[0].waste_area, 3600.0);
        assert_eq!(slabs[1].pieces.len(), 1);
        assert_eq!(slabs[1].waste_area, 6800.0);
    }

    #[test]
    fn test_rejects_piece_that_fits_neither_way() {
        let pieces = vec![piece("1", 50.0, 50.0), piece("2", 200.0, 200.0)];
        let err = pack(&pieces, Rect::new(100.0, 100.0), FitStrategy::FirstFit).unwrap_err();
        match err {
            OptimizeError::Unplaceable { pieces } => {
                assert_eq!(pieces.len(), 1);
                assert_eq!(pieces[0].id, "2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rotation_applied_before_packing() {
        let pieces = vec![piece("1", 50.0, 100.0)];
        let slabs = pack(&pieces, Rect::new(100.0, 50.0), FitStrategy::BestFit).unwrap();
        assert_eq!(slabs.len(), 1);
        assert!(slabs[0].pieces[0].piece.rotated);
        assert_eq!(slabs[0].pieces[0].piece.effective(), Rect::new(100.0, 50.0));
    }

    #[test]
    fn test_kerf_reduces_capacity() {
        let no_kerf: Vec<Piece> = (0..2)
            .map(|i| Piece::new(i.to_string(), 50.0, 100.0, 0.0, "Half"))
            .collect();
        let slabs = pack(&no_kerf, Rect::new(100.0, 100.0), FitStrategy::BestFit).unwrap();
        assert_eq!(slabs.len(), 1);

        let with_kerf: Vec<Piece> = (0..2)
            .map(|i| Piece::new(i.to_string(), 50.0, 100.0, 5.0, "Half"))
            .collect();
        let err = pack(&with_kerf, Rect::new(100.0, 100.0), FitStrategy::BestFit).unwrap_err();
        assert!(matches!(err, OptimizeError::Unplaceable { .. }));

        let with_kerf: Vec<Piece> = (0..2)
            .map(|i| Piece::new(i.to_string(), 50.0, 95.0, 5.0, "Half"))
            .collect();
        let slabs = pack(&with_kerf, Rect::new(100.0, 100.0), FitStrategy::BestFit).unwrap();
        assert_eq!(slabs.len(), 2);
    }
}
