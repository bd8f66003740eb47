use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::config::ExactConfig;
use crate::layout::{self, Bin, Move};
use crate::progress::{Cancellation, Progress};
use crate::spaces::SpaceFinder;
use crate::types::{Piece, Rect, Slab};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// Every branch was explored or pruned.
    Exhausted,
    TimedOut,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ExactOutcome {
    /// Best complete layout, if any was reached.
    pub slabs: Option<Vec<Slab>>,
    pub best_score: Option<f64>,
    pub nodes: u64,
    pub status: SearchStatus,
}

/// A pending branch. The parent's bins are shared until the branch is
/// actually expanded.
struct Node {
    index: usize,
    bins: Rc<Vec<Bin>>,
    pending: Option<Move>,
    score: f64,
}

/// Depth-first search over every `(slab, free space, orientation)` placement.
///
/// A partial layout scores the sum of `piece area × slab index`, so pieces
/// in later slabs cost more. The score only steers the search toward full
/// early slabs; true waste is computed for the reported layout.
pub struct BranchAndBound<'a> {
    pieces: &'a [Piece],
    size: Rect,
    max_bins: usize,
    config: &'a ExactConfig,
    finder: &'a dyn SpaceFinder,
}

impl<'a> BranchAndBound<'a> {
    pub fn new(
        pieces: &'a [Piece],
        size: Rect,
        max_bins: usize,
        config: &'a ExactConfig,
        finder: &'a dyn SpaceFinder,
    ) -> Self {
        Self {
            pieces,
            size,
            max_bins,
            config,
            finder,
        }
    }

    pub fn search(&self, progress: &dyn Fn(Progress), cancel: &Cancellation) -> ExactOutcome {
        let started = Instant::now();
        let deadline = started + Duration::from_millis(self.config.time_limit_ms);
        let interval = self.config.progress_interval.max(1);

        let mut stack = vec![Node {
            index: 0,
            bins: Rc::new(Vec::new()),
            pending: None,
            score: 0.0,
        }];
        let mut best: Option<(f64, Vec<Bin>)> = None;
        let mut nodes = 0u64;
        let mut status = SearchStatus::Exhausted;

        while let Some(node) = stack.pop() {
            nodes += 1;
            if nodes % interval == 0 {
                progress(Progress::Exact {
                    nodes,
                    depth: node.index,
                    best_score: best.as_ref().map(|(score, _)| *score),
                });
                if cancel.is_cancelled() {
                    status = SearchStatus::Cancelled;
                    break;
                }
                if Instant::now() >= deadline {
                    status = SearchStatus::TimedOut;
                    break;
                }
            }

            if let Some((best_score, _)) = &best
                && node.score >= *best_score
            {
                continue;
            }

            let bins = self.materialize(node.bins, node.pending, node.index);
            if bins.len() > self.max_bins {
                continue;
            }
            let index = node.index + node.pending.map_or(0, |_| 1);

            if index == self.pieces.len() {
                tracing::debug!(score = node.score, slabs = bins.len(), nodes, "new best layout");
                best = Some((node.score, bins));
                continue;
            }

            let piece = &self.pieces[index];
            let mut moves = layout::moves_into_open_bins(&bins, piece);
            if bins.len() < self.max_bins {
                moves.extend(layout::moves_into_new_bin(&bins, piece, self.size));
            }

            let shared = Rc::new(bins);
            // Reverse so the first move is explored first.
            for mv in moves.into_iter().rev() {
                stack.push(Node {
                    index,
                    bins: Rc::clone(&shared),
                    pending: Some(mv),
                    score: node.score + piece.area * mv.bin as f64,
                });
            }
        }

        match status {
            SearchStatus::Exhausted => {}
            _ => tracing::warn!(?status, nodes, found = best.is_some(), "search stopped early"),
        }
        tracing::debug!(nodes, elapsed_ms = started.elapsed().as_millis() as u64, "search finished");

        let best_score = best.as_ref().map(|(score, _)| *score);
        ExactOutcome {
            slabs: best.map(|(_, bins)| layout::to_slabs(&bins, self.pieces, self.size)),
            best_score,
            nodes,
            status,
        }
    }

    /// Applies a branch's pending move to a private copy of its parent's bins.
    /// `index` is the piece the move places.
    fn materialize(&self, bins: Rc<Vec<Bin>>, pending: Option<Move>, index: usize) -> Vec<Bin> {
        let mut bins = Rc::try_unwrap(bins).unwrap_or_else(|shared| (*shared).clone());
        if let Some(mv) = pending {
            layout::apply(&mut bins, index, &self.pieces[index], mv, self.size, self.finder);
        }
        bins
    }
}
