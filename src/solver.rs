use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crate::compare::{self, Comparison};
use crate::config::OptimizerConfig;
use crate::error::{OptimizeError, Result};
use crate::exact::{BranchAndBound, SearchStatus};
use crate::genetic::GeneticSolver;
use crate::guillotine::{self, FitStrategy};
use crate::preprocess::{Preprocessed, SplitPolicy, preprocess};
use crate::presets::PieceStats;
use crate::progress::{Cancellation, Progress, silent};
use crate::spaces::GridScan;
use crate::types::{Algorithm, PieceRequest, Slab, Solution};

pub struct Solver {
    config: OptimizerConfig,
    requests: Vec<PieceRequest>,
}

impl Solver {
    pub fn new(config: OptimizerConfig, requests: Vec<PieceRequest>) -> Self {
        Self { config, requests }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn piece_stats(&self) -> PieceStats {
        PieceStats::of(&self.requests, self.config.slab())
    }

    /// Solves with the configured algorithm.
    pub fn solve(&self) -> Result<Solution> {
        self.solve_with(self.config.algorithm, &silent, &Cancellation::new())
    }

    pub fn solve_with(
        &self,
        algorithm: Algorithm,
        progress: &dyn Fn(Progress),
        cancel: &Cancellation,
    ) -> Result<Solution> {
        let prepared = self.prepare()?;
        self.run(algorithm, &prepared, progress, cancel)
    }

    /// Runs every algorithm on the same preprocessed pieces and ranks them.
    pub fn compare(&self) -> Result<Comparison> {
        let prepared = self.prepare()?;
        let cancel = Cancellation::new();
        Ok(compare::compare(&Algorithm::ALL, |algorithm| {
            self.run(algorithm, &prepared, &silent, &cancel)
        }))
    }

    fn prepare(&self) -> Result<Preprocessed> {
        self.config.validate()?;
        if let Some(bad) = self
            .requests
            .iter()
            .find(|r| !(r.width > 0.0 && r.height > 0.0))
        {
            return Err(OptimizeError::InvalidInput(format!(
                "piece '{}' has non-positive dimensions {}x{}",
                bad.label, bad.width, bad.height
            )));
        }

        let slab = self.config.slab();
        let prepared = preprocess(
            &self.requests,
            slab,
            self.config.kerf,
            SplitPolicy {
                allow: self.config.allow_splitting,
                min_length: self.config.min_split_length,
            },
        );
        tracing::debug!(
            requests = self.requests.len(),
            pieces = prepared.pieces.len(),
            splits = prepared.splits.len(),
            "preprocessed pieces"
        );

        let oversized = guillotine::unplaceable(&prepared.pieces, slab);
        if !oversized.is_empty() {
            return Err(OptimizeError::Unplaceable { pieces: oversized });
        }
        Ok(prepared)
    }

    fn run(
        &self,
        algorithm: Algorithm,
        prepared: &Preprocessed,
        progress: &dyn Fn(Progress),
        cancel: &Cancellation,
    ) -> Result<Solution> {
        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.dispatch(algorithm, prepared, progress, cancel)
        }))
        .unwrap_or_else(|payload| Err(OptimizeError::Computation(panic_message(payload.as_ref()))));

        match &result {
            Ok(solution) => tracing::info!(
                %algorithm,
                slabs = solution.slab_count(),
                waste_percent = solution.total_waste_percent(),
                optimal = solution.optimal,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "optimization finished"
            ),
            Err(err) => tracing::info!(%algorithm, error = %err, "optimization failed"),
        }
        result
    }

    fn dispatch(
        &self,
        algorithm: Algorithm,
        prepared: &Preprocessed,
        progress: &dyn Fn(Progress),
        cancel: &Cancellation,
    ) -> Result<Solution> {
        let slab = self.config.slab();
        let finish = |slabs: Vec<Slab>, optimal: bool| {
            let mut solution = Solution::from_slabs(
                algorithm,
                slab,
                slabs,
                prepared.splits.clone(),
                self.config.price_per_sq_ft,
            );
            solution.optimal = optimal;
            solution
        };

        if prepared.pieces.is_empty() {
            return Ok(finish(Vec::new(), false));
        }

        let finder = GridScan::new(self.config.exact.grid_step, self.config.exact.max_spaces);
        match algorithm {
            Algorithm::Guillotine | Algorithm::BestFit => {
                let slabs = guillotine::pack(&prepared.pieces, slab, FitStrategy::BestFit)?;
                Ok(finish(slabs, false))
            }
            Algorithm::FirstFit => {
                let slabs = guillotine::pack(&prepared.pieces, slab, FitStrategy::FirstFit)?;
                Ok(finish(slabs, false))
            }
            Algorithm::BranchAndBound => {
                let mut pieces = prepared.pieces.clone();
                pieces.sort_by(|a, b| b.area.total_cmp(&a.area));
                let outcome = BranchAndBound::new(
                    &pieces,
                    slab,
                    self.config.max_slabs,
                    &self.config.exact,
                    &finder,
                )
                .search(progress, cancel);
                match outcome.slabs {
                    Some(slabs) => Ok(finish(slabs, outcome.status == SearchStatus::Exhausted)),
                    None => Err(OptimizeError::Infeasible {
                        max_slabs: self.config.max_slabs,
                    }),
                }
            }
            Algorithm::Genetic => {
                let outcome = GeneticSolver::new(
                    &prepared.pieces,
                    slab,
                    self.config.max_slabs,
                    &self.config.genetic,
                    &finder,
                )
                .run(progress, cancel);
                match outcome.slabs(&prepared.pieces, slab) {
                    Some(slabs) => Ok(finish(slabs, false)),
                    None => Err(OptimizeError::Infeasible {
                        max_slabs: self.config.max_slabs,
                    }),
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "solver panicked".to_string()
    }
}
