use serde::{Deserialize, Serialize};

/// Tolerance for fit comparisons, so fractional kerf sums don't reject exact fits.
pub const EPSILON: f64 = 1e-9;

/// Square inches per square foot; piece and slab units are inches.
const SQ_IN_PER_SQ_FT: f64 = 144.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.w <= other.w + EPSILON && self.h <= other.h + EPSILON
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// A raw cut request as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceRequest {
    pub id: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub label: String,
}

impl PieceRequest {
    pub fn new(id: impl Into<String>, width: f64, height: f64, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            label: label.into(),
        }
    }
}

/// A placement-ready piece. Effective dimensions include the kerf and are
/// what every packer measures against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<String>,
    pub width: f64,
    pub height: f64,
    pub effective_width: f64,
    pub effective_height: f64,
    pub area: f64,
    pub label: String,
    pub is_split: bool,
    pub rotated: bool,
}

impl Piece {
    pub fn new(id: impl Into<String>, width: f64, height: f64, kerf: f64, label: impl Into<String>) -> Self {
        let effective_width = width + kerf;
        let effective_height = height + kerf;
        Self {
            id: id.into(),
            original_id: None,
            width,
            height,
            effective_width,
            effective_height,
            area: effective_width * effective_height,
            label: label.into(),
            is_split: false,
            rotated: false,
        }
    }

    /// Builds the `n`th fragment of a split piece.
    pub fn fragment(original: &PieceRequest, n: usize, width: f64, height: f64, kerf: f64) -> Self {
        Self {
            original_id: Some(original.id.clone()),
            is_split: true,
            ..Self::new(
                format!("{}_{}", original.id, n),
                width,
                height,
                kerf,
                format!("{} (Part {})", original.label, n),
            )
        }
    }

    pub fn effective(&self) -> Rect {
        Rect::new(self.effective_width, self.effective_height)
    }

    pub fn nominal(&self) -> Rect {
        Rect::new(self.width, self.height)
    }

    /// Turns the piece 90°. Nominal and effective sizes always swap together.
    pub fn rotate(&mut self) {
        std::mem::swap(&mut self.width, &mut self.height);
        std::mem::swap(&mut self.effective_width, &mut self.effective_height);
        self.rotated = !self.rotated;
    }

    /// A copy of this piece in the requested orientation relative to its
    /// current one.
    pub fn oriented(&self, rotate: bool) -> Self {
        let mut piece = self.clone();
        if rotate {
            piece.rotate();
        }
        piece
    }

    /// Whether the effective rectangle fits an empty slab in either orientation.
    pub fn fits_slab(&self, slab: Rect) -> bool {
        let eff = self.effective();
        eff.fits_in(&slab) || eff.rotated().fits_in(&slab)
    }

    pub fn is_square(&self) -> bool {
        (self.effective_width - self.effective_height).abs() <= EPSILON
    }
}

/// An empty axis-aligned rectangle inside a slab.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeSpace {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FreeSpace {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.width, self.height)
    }

    pub fn contains(&self, other: &FreeSpace) -> bool {
        other.x + EPSILON >= self.x
            && other.y + EPSILON >= self.y
            && other.x + other.width <= self.x + self.width + EPSILON
            && other.y + other.height <= self.y + self.height + EPSILON
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedPiece {
    #[serde(flatten)]
    pub piece: Piece,
    pub x: f64,
    pub y: f64,
}

impl PlacedPiece {
    pub fn new(piece: Piece, x: f64, y: f64) -> Self {
        Self { piece, x, y }
    }

    pub fn right(&self) -> f64 {
        self.x + self.piece.effective_width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.piece.effective_height
    }

    pub fn overlaps(&self, other: &PlacedPiece) -> bool {
        rects_overlap(
            (self.x, self.y, self.piece.effective_width, self.piece.effective_height),
            (other.x, other.y, other.piece.effective_width, other.piece.effective_height),
        )
    }
}

/// Strict interior overlap of two `(x, y, w, h)` rectangles; shared edges don't count.
pub fn rects_overlap(a: (f64, f64, f64, f64), b: (f64, f64, f64, f64)) -> bool {
    a.0 + EPSILON < b.0 + b.2
        && b.0 + EPSILON < a.0 + a.2
        && a.1 + EPSILON < b.1 + b.3
        && b.1 + EPSILON < a.1 + a.3
}

/// One stock sheet and what has been cut from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slab {
    pub id: usize,
    pub pieces: Vec<PlacedPiece>,
    pub spaces: Vec<FreeSpace>,
    pub total_area: f64,
    pub waste_area: f64,
    pub waste_percentage: f64,
}

impl Slab {
    pub fn new(id: usize, size: Rect) -> Self {
        Self {
            id,
            pieces: Vec::new(),
            spaces: Vec::new(),
            total_area: size.area(),
            waste_area: size.area(),
            waste_percentage: 100.0,
        }
    }

    pub fn used_area(&self) -> f64 {
        self.pieces
            .iter()
            .map(|p| p.piece.effective_width * p.piece.effective_height)
            .sum()
    }

    /// Recomputes waste from the placed pieces.
    pub fn recompute_waste(&mut self, size: Rect) {
        self.total_area = size.area();
        self.waste_area = self.total_area - self.used_area();
        self.waste_percentage = if self.total_area > 0.0 {
            self.waste_area / self.total_area * 100.0
        } else {
            0.0
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitDirection {
    Horizontal,
    Vertical,
}

impl std::fmt::Display for SplitDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Vertical => write!(f, "vertical"),
        }
    }
}

/// Provenance of one oversized request that was cut into sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRecord {
    pub original_id: String,
    pub original_label: String,
    pub parts: usize,
    pub pieces: Vec<Piece>,
    pub direction: SplitDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    Guillotine,
    FirstFit,
    BestFit,
    BranchAndBound,
    Genetic,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Guillotine,
        Algorithm::FirstFit,
        Algorithm::BestFit,
        Algorithm::BranchAndBound,
        Algorithm::Genetic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guillotine => "guillotine",
            Self::FirstFit => "first_fit",
            Self::BestFit => "best_fit",
            Self::BranchAndBound => "branch_and_bound",
            Self::Genetic => "genetic",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "invalid algorithm '{}', expected: guillotine, first_fit, best_fit, branch_and_bound, or genetic",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SolutionStats {
    pub total_pieces: usize,
    pub total_slabs: usize,
    pub total_area_needed: f64,
    pub total_slab_area: f64,
    pub total_waste: f64,
    pub total_waste_percentage: f64,
    pub total_slab_sq_ft: f64,
    pub estimated_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub algorithm: Algorithm,
    /// Set only when the exhaustive search finished inside its budget.
    pub optimal: bool,
    pub slab_size: Rect,
    pub slabs: Vec<Slab>,
    pub stats: SolutionStats,
    pub split_pieces: Vec<SplitRecord>,
}

/// One row of the cutting list handed to reporting collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutLine {
    pub slab_id: usize,
    pub label: String,
    pub size: Rect,
    pub x: f64,
    pub y: f64,
    pub rotated: bool,
}

impl Solution {
    /// Assembles a solution from finished slabs, renumbering them and
    /// recomputing all waste figures.
    pub fn from_slabs(
        algorithm: Algorithm,
        slab_size: Rect,
        mut slabs: Vec<Slab>,
        split_pieces: Vec<SplitRecord>,
        price_per_sq_ft: f64,
    ) -> Self {
        slabs.retain(|s| !s.pieces.is_empty());
        for (i, slab) in slabs.iter_mut().enumerate() {
            slab.id = i + 1;
            slab.recompute_waste(slab_size);
        }

        let total_pieces = slabs.iter().map(|s| s.pieces.len()).sum();
        let total_area_needed: f64 = slabs.iter().map(Slab::used_area).sum();
        let total_slab_area = slabs.len() as f64 * slab_size.area();
        let total_waste = total_slab_area - total_area_needed;
        let total_waste_percentage = if total_slab_area > 0.0 {
            total_waste / total_slab_area * 100.0
        } else {
            0.0
        };
        let total_slab_sq_ft = total_slab_area / SQ_IN_PER_SQ_FT;

        Self {
            algorithm,
            optimal: false,
            slab_size,
            stats: SolutionStats {
                total_pieces,
                total_slabs: slabs.len(),
                total_area_needed,
                total_slab_area,
                total_waste,
                total_waste_percentage,
                total_slab_sq_ft,
                estimated_cost: total_slab_sq_ft * price_per_sq_ft,
            },
            slabs,
            split_pieces,
        }
    }

    pub fn slab_count(&self) -> usize {
        self.slabs.len()
    }

    pub fn total_waste_percent(&self) -> f64 {
        self.stats.total_waste_percentage
    }

    pub fn cut_list(&self) -> Vec<CutLine> {
        self.slabs
            .iter()
            .flat_map(|slab| {
                slab.pieces.iter().map(move |p| CutLine {
                    slab_id: slab.id,
                    label: p.piece.label.clone(),
                    size: p.piece.nominal(),
                    x: p.x,
                    y: p.y,
                    rotated: p.piece.rotated,
                })
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_effective_dimensions() {
        let piece = Piece::new("1", 50.0, 26.0, 0.125, "Stove Left");
        assert_eq!(piece.effective_width, 50.125);
        assert_eq!(piece.effective_height, 26.125);
        assert_eq!(piece.area, 50.125 * 26.125);
        assert!(!piece.is_split);
        assert!(piece.original_id.is_none());
    }

    #[test]
    fn test_rotate_swaps_nominal_and_effective_together() {
        let mut piece = Piece::new("1", 80.0, 40.0, 1.0, "Bar");
        piece.rotate();
        assert_eq!((piece.width, piece.height), (40.0, 80.0));
        assert_eq!((piece.effective_width, piece.effective_height), (41.0, 81.0));
        assert!(piece.rotated);
        piece.rotate();
        assert_eq!((piece.width, piece.height), (80.0, 40.0));
        assert_eq!((piece.effective_width, piece.effective_height), (81.0, 41.0));
        assert!(!piece.rotated);
    }

    #[test]
    fn test_fragment_naming() {
        let req = PieceRequest::new("7", 250.0, 30.0, "Long Countertop");
        let frag = Piece::fragment(&req, 2, 100.0, 30.0, 0.0);
        assert_eq!(frag.id, "7_2");
        assert_eq!(frag.original_id.as_deref(), Some("7"));
        assert_eq!(frag.label, "Long Countertop (Part 2)");
        assert!(frag.is_split);
    }

    #[test]
    fn test_waste_recompute_is_idempotent() {
        let size = Rect::new(100.0, 100.0);
        let mut slab = Slab::new(1, size);
        slab.pieces.push(PlacedPiece::new(Piece::new("1", 80.0, 40.0, 0.0, "a"), 0.0, 0.0));
        slab.pieces.push(PlacedPiece::new(Piece::new("2", 80.0, 40.0, 0.0, "b"), 0.0, 40.0));
        slab.recompute_waste(size);
        let first = (slab.waste_area, slab.waste_percentage);
        slab.recompute_waste(size);
        assert_eq!(first, (slab.waste_area, slab.waste_percentage));
        assert_eq!(slab.waste_area, 3600.0);
        assert!((slab.waste_percentage - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_shared_edges_do_not_overlap() {
        let a = PlacedPiece::new(Piece::new("1", 50.0, 50.0, 0.0, "a"), 0.0, 0.0);
        let b = PlacedPiece::new(Piece::new("2", 50.0, 50.0, 0.0, "b"), 50.0, 0.0);
        let c = PlacedPiece::new(Piece::new("3", 50.0, 50.0, 0.0, "c"), 25.0, 25.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn test_algorithm_round_trips_through_str() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.as_str().parse::<Algorithm>().unwrap(), algorithm);
        }
        assert!("simulated_annealing".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_solution_stats_and_cost() {
        let size = Rect::new(144.0, 100.0);
        let mut slab = Slab::new(9, size);
        slab.pieces.push(PlacedPiece::new(Piece::new("1", 72.0, 100.0, 0.0, "a"), 0.0, 0.0));
        let sol = Solution::from_slabs(Algorithm::BestFit, size, vec![slab, Slab::new(10, size)], vec![], 50.0);
        assert_eq!(sol.slab_count(), 1);
        assert_eq!(sol.slabs[0].id, 1);
        assert_eq!(sol.stats.total_pieces, 1);
        assert_eq!(sol.stats.total_slab_area, 14400.0);
        assert_eq!(sol.stats.total_waste, 7200.0);
        assert!((sol.total_waste_percent() - 50.0).abs() < 1e-9);
        assert!((sol.stats.total_slab_sq_ft - 100.0).abs() < 1e-9);
        assert!((sol.stats.estimated_cost - 5000.0).abs() < 1e-9);
        assert_eq!(sol.cut_list().len(), 1);
    }
}
