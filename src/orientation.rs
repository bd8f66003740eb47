use crate::types::{Piece, Rect};

/// Guillotine waste estimate for an `w`x`h` piece in the top-left corner of
/// an empty slab: the strip beside it plus the full-width strip below it.
fn corner_waste(slab: Rect, w: f64, h: f64) -> f64 {
    (slab.w - w) * h + (slab.h - h) * slab.w
}

/// Decides whether `piece` should be turned before greedy placement, and
/// turns it. Rotates when only the turned piece fits, or when both fit and
/// turning strictly lowers the corner waste estimate.
pub fn select_orientation(piece: &mut Piece, slab: Rect) {
    let eff = piece.effective();
    let normal_fits = eff.fits_in(&slab);
    let rotated_fits = eff.rotated().fits_in(&slab);

    let rotate = match (normal_fits, rotated_fits) {
        (false, true) => true,
        (true, true) => corner_waste(slab, eff.h, eff.w) < corner_waste(slab, eff.w, eff.h),
        _ => false,
    };

    if rotate {
        piece.rotate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotates_when_only_turned_fits() {
        let mut piece = Piece::new("1", 50.0, 100.0, 0.0, "Tall");
        select_orientation(&mut piece, Rect::new(100.0, 50.0));
        assert!(piece.rotated);
        assert_eq!(piece.effective(), Rect::new(50.0, 100.0).rotated());
    }

    #[test]
    fn test_keeps_orientation_on_tie() {
        let mut piece = Piece::new("1", 80.0, 40.0, 0.0, "Bar");
        select_orientation(&mut piece, Rect::new(100.0, 100.0));
        assert!(!piece.rotated);
    }

    #[test]
    fn test_estimate_reduces_to_slab_minus_piece_area() {
        // (W-w)h + (H-h)W == WH - wh, so both orientations score the same
        // and a piece that fits either way keeps its orientation.
        let slab = Rect::new(133.0, 78.0);
        assert_eq!(corner_waste(slab, 20.0, 70.0), 133.0 * 78.0 - 20.0 * 70.0);
        assert_eq!(corner_waste(slab, 20.0, 70.0), corner_waste(slab, 70.0, 20.0));

        let mut piece = Piece::new("1", 20.0, 70.0, 0.0, "Post");
        select_orientation(&mut piece, slab);
        assert!(!piece.rotated);
        assert_eq!((piece.width, piece.height), (20.0, 70.0));
    }

    #[test]
    fn test_unfit_piece_left_alone() {
        let mut piece = Piece::new("1", 200.0, 200.0, 0.0, "Huge");
        select_orientation(&mut piece, Rect::new(100.0, 100.0));
        assert!(!piece.rotated);
    }
}
