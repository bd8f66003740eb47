use serde::{Deserialize, Serialize};

use crate::types::{PieceRequest, Rect};

/// Built-in kitchen piece lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    Standard,
    Minimal,
}

const STANDARD: &[(f64, f64, &str)] = &[
    (137.0, 26.0, "Long Countertop"),
    (78.0, 44.0, "Island"),
    (50.0, 26.0, "Stove Left"),
    (24.0, 26.0, "Stove Right"),
    (72.0, 26.0, "Bar"),
    (110.0, 26.0, "Bathroom"),
    (110.0, 4.0, "Bathroom Back"),
    (42.0, 15.0, "Bathroom Bench"),
    (162.0, 18.0, "Long Backsplash"),
    (50.0, 18.0, "Stove Backsplash Left"),
    (30.0, 30.0, "Stove Backsplash Center"),
    (24.0, 18.0, "Stove Backsplash Right"),
];

const MINIMAL: &[(f64, f64, &str)] = &[
    (96.0, 26.0, "Main Counter"),
    (60.0, 36.0, "Island"),
    (96.0, 4.0, "Backsplash"),
];

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::Standard, Preset::Minimal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Minimal => "minimal",
        }
    }

    /// The preset's pieces with ids numbered from 1.
    pub fn pieces(&self) -> Vec<PieceRequest> {
        let list = match self {
            Self::Standard => STANDARD,
            Self::Minimal => MINIMAL,
        };
        list.iter()
            .enumerate()
            .map(|(i, &(w, h, label))| PieceRequest::new((i + 1).to_string(), w, h, label))
            .collect()
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("invalid preset '{}', expected: standard or minimal", s))
    }
}

/// Summary of the requested pieces, computed before optimizing.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PieceStats {
    pub piece_count: usize,
    /// Nominal area in square inches, without kerf.
    pub total_area: f64,
    pub largest_piece: Option<PieceRequest>,
    /// Pieces exceeding the slab in both dimensions in either orientation.
    /// Splitting cannot rescue these.
    pub oversized_count: usize,
}

impl PieceStats {
    pub fn of(requests: &[PieceRequest], slab: Rect) -> Self {
        let area = |r: &PieceRequest| r.width * r.height;
        let largest_piece = requests
            .iter()
            .fold(None::<&PieceRequest>, |best, r| match best {
                Some(b) if area(b) >= area(r) => Some(b),
                _ => Some(r),
            })
            .cloned();
        let oversized_count = requests
            .iter()
            .filter(|r| {
                (r.width > slab.w && r.height > slab.h) || (r.height > slab.w && r.width > slab.h)
            })
            .count();

        Self {
            piece_count: requests.len(),
            total_area: requests.iter().map(area).sum(),
            largest_piece,
            oversized_count,
        }
    }
}
