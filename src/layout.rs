use crate::spaces::{Footprint, SpaceFinder};
use crate::types::{EPSILON, FreeSpace, Piece, PlacedPiece, Rect, Slab, rects_overlap};

/// A candidate placement. `bin == bins.len()` means "open a new slab".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Move {
    pub bin: usize,
    pub x: f64,
    pub y: f64,
    pub rotated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placed {
    pub piece: usize,
    pub x: f64,
    pub y: f64,
    pub rotated: bool,
    pub w: f64,
    pub h: f64,
}

impl Placed {
    fn footprint(&self) -> Footprint {
        Footprint {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }
}

/// Placements refer to pieces by index so cloning a layout never copies
/// piece data.
#[derive(Debug, Clone)]
pub struct Bin {
    pub placed: Vec<Placed>,
    pub spaces: Vec<FreeSpace>,
}

impl Bin {
    pub fn empty(size: Rect) -> Self {
        Self {
            placed: Vec::new(),
            spaces: vec![FreeSpace::new(0.0, 0.0, size.w, size.h)],
        }
    }

    pub fn used_area(&self) -> f64 {
        self.placed.iter().map(|p| p.w * p.h).sum()
    }

    /// Whether a `dims` rectangle at `(x, y)` stays on the slab and clear of
    /// every placed piece.
    pub fn accepts(&self, size: Rect, x: f64, y: f64, dims: Rect) -> bool {
        x >= -EPSILON
            && y >= -EPSILON
            && x + dims.w <= size.w + EPSILON
            && y + dims.h <= size.h + EPSILON
            && !self
                .placed
                .iter()
                .any(|p| rects_overlap((x, y, dims.w, dims.h), (p.x, p.y, p.w, p.h)))
    }

    pub fn place(&mut self, placed: Placed, size: Rect, finder: &dyn SpaceFinder) {
        self.placed.push(placed);
        let occupied: Vec<Footprint> = self.placed.iter().map(Placed::footprint).collect();
        self.spaces = finder.free_spaces(size, &occupied);
    }
}

/// Effective size of `piece` in the given orientation.
pub fn dims(piece: &Piece, rotated: bool) -> Rect {
    let eff = piece.effective();
    if rotated { eff.rotated() } else { eff }
}

/// Orientations worth trying; a square only needs one.
pub fn orientations(piece: &Piece) -> &'static [bool] {
    if piece.is_square() { &[false] } else { &[false, true] }
}

/// Every `(bin, space, orientation)` placement of `piece` in the open bins.
pub fn moves_into_open_bins(bins: &[Bin], piece: &Piece) -> Vec<Move> {
    let mut moves = Vec::new();
    for (bi, bin) in bins.iter().enumerate() {
        for space in &bin.spaces {
            for &rotated in orientations(piece) {
                if dims(piece, rotated).fits_in(&space.rect()) {
                    moves.push(Move {
                        bin: bi,
                        x: space.x,
                        y: space.y,
                        rotated,
                    });
                }
            }
        }
    }
    moves
}

/// Placements of `piece` at the corner of a fresh slab.
pub fn moves_into_new_bin(bins: &[Bin], piece: &Piece, size: Rect) -> Vec<Move> {
    orientations(piece)
        .iter()
        .filter(|&&rotated| dims(piece, rotated).fits_in(&size))
        .map(|&rotated| Move {
            bin: bins.len(),
            x: 0.0,
            y: 0.0,
            rotated,
        })
        .collect()
}

pub fn apply(bins: &mut Vec<Bin>, index: usize, piece: &Piece, mv: Move, size: Rect, finder: &dyn SpaceFinder) {
    if mv.bin == bins.len() {
        bins.push(Bin::empty(size));
    }
    let d = dims(piece, mv.rotated);
    bins[mv.bin].place(
        Placed {
            piece: index,
            x: mv.x,
            y: mv.y,
            rotated: mv.rotated,
            w: d.w,
            h: d.h,
        },
        size,
        finder,
    );
}

/// Materializes finished bins into slabs with true waste figures.
pub fn to_slabs(bins: &[Bin], pieces: &[Piece], size: Rect) -> Vec<Slab> {
    bins.iter()
        .filter(|bin| !bin.placed.is_empty())
        .enumerate()
        .map(|(i, bin)| {
            let mut slab = Slab::new(i + 1, size);
            slab.pieces = bin
                .placed
                .iter()
                .map(|p| PlacedPiece::new(pieces[p.piece].oriented(p.rotated), p.x, p.y))
                .collect();
            slab.spaces = bin.spaces.clone();
            slab.recompute_waste(size);
            slab
        })
        .collect()
}
