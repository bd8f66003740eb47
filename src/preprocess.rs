use crate::types::{EPSILON, Piece, PieceRequest, Rect, SplitDirection, SplitRecord};

#[derive(Debug, Clone, Copy)]
pub struct SplitPolicy {
    pub allow: bool,
    pub min_length: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Preprocessed {
    pub pieces: Vec<Piece>,
    pub splits: Vec<SplitRecord>,
}

/// Adds kerf and splits any request too long for the slab along exactly
/// one axis.
pub fn preprocess(requests: &[PieceRequest], slab: Rect, kerf: f64, policy: SplitPolicy) -> Preprocessed {
    let mut out = Preprocessed::default();

    for req in requests {
        let eff = Rect::new(req.width + kerf, req.height + kerf);
        let too_wide = eff.w > slab.w + EPSILON;
        let too_tall = eff.h > slab.h + EPSILON;

        let direction = match (too_wide, too_tall) {
            (true, false) => Some(SplitDirection::Horizontal),
            (false, true) => Some(SplitDirection::Vertical),
            _ => None,
        };

        match direction {
            Some(direction) if policy.allow => {
                let fragments = split(req, slab, kerf, direction, policy.min_length);
                if !fragments.is_empty() {
                    tracing::debug!(
                        piece = %req.label,
                        parts = fragments.len(),
                        %direction,
                        "split oversized piece"
                    );
                    out.pieces.extend(fragments.iter().cloned());
                    out.splits.push(SplitRecord {
                        original_id: req.id.clone(),
                        original_label: req.label.clone(),
                        parts: fragments.len(),
                        pieces: fragments,
                        direction,
                    });
                }
            }
            _ => out
                .pieces
                .push(Piece::new(req.id.clone(), req.width, req.height, kerf, req.label.clone())),
        }
    }

    out
}

/// Carves the long axis into slab-sized sections. Sections shorter than
/// `min_length` are dropped, so the kept sections may cover less than the
/// requested length.
fn split(req: &PieceRequest, slab: Rect, kerf: f64, direction: SplitDirection, min_length: f64) -> Vec<Piece> {
    let (mut remaining, max_segment) = match direction {
        SplitDirection::Horizontal => (req.width, slab.w - kerf),
        SplitDirection::Vertical => (req.height, slab.h - kerf),
    };
    if max_segment <= EPSILON {
        // Kerf swallows the whole slab; leave the piece whole and let the
        // oversize check reject it.
        return vec![Piece::new(req.id.clone(), req.width, req.height, kerf, req.label.clone())];
    }

    let mut fragments = Vec::new();
    while remaining > EPSILON {
        let segment = remaining.min(max_segment);
        if segment + EPSILON >= min_length {
            let n = fragments.len() + 1;
            let fragment = match direction {
                SplitDirection::Horizontal => Piece::fragment(req, n, segment, req.height, kerf),
                SplitDirection::Vertical => Piece::fragment(req, n, req.width, segment, kerf),
            };
            fragments.push(fragment);
        } else {
            tracing::warn!(
                piece = %req.label,
                length = segment,
                min_length,
                "discarding split section shorter than the minimum"
            );
        }
        remaining -= segment;
    }
    fragments
}
