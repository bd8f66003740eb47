use std::time::Instant;

use serde::Serialize;

use crate::error::Result;
use crate::types::{Algorithm, Solution};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmRun {
    pub algorithm: Algorithm,
    pub elapsed_ms: f64,
    pub slab_count: Option<usize>,
    pub waste_percentage: Option<f64>,
    pub optimal: bool,
    pub error: Option<String>,
}

impl AlgorithmRun {
    fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recommendation {
    /// Every algorithm used the same number of slabs.
    Fastest { algorithm: Algorithm },
    /// `algorithm` saves `slabs_saved` slabs over the fastest run, `versus`.
    Best {
        algorithm: Algorithm,
        slabs_saved: usize,
        versus: Algorithm,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// Ranked by slab count, then waste. Failed runs come last.
    pub runs: Vec<AlgorithmRun>,
    pub recommendation: Option<Recommendation>,
}

/// Runs `solve` once per algorithm, in order, and ranks the results.
pub fn compare<F>(algorithms: &[Algorithm], mut solve: F) -> Comparison
where
    F: FnMut(Algorithm) -> Result<Solution>,
{
    let mut runs: Vec<AlgorithmRun> = algorithms
        .iter()
        .map(|&algorithm| {
            let started = Instant::now();
            let result = solve(algorithm);
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            match result {
                Ok(solution) => AlgorithmRun {
                    algorithm,
                    elapsed_ms,
                    slab_count: Some(solution.slab_count()),
                    waste_percentage: Some(solution.total_waste_percent()),
                    optimal: solution.optimal,
                    error: None,
                },
                Err(err) => {
                    tracing::info!(%algorithm, error = %err, "algorithm failed during comparison");
                    AlgorithmRun {
                        algorithm,
                        elapsed_ms,
                        slab_count: None,
                        waste_percentage: None,
                        optimal: false,
                        error: Some(err.to_string()),
                    }
                }
            }
        })
        .collect();

    rank(&mut runs);
    let recommendation = recommend(&runs);
    Comparison {
        runs,
        recommendation,
    }
}

fn rank(runs: &mut [AlgorithmRun]) {
    runs.sort_by(|a, b| match (a.succeeded(), b.succeeded()) {
        (true, true) => a
            .slab_count
            .cmp(&b.slab_count)
            .then(a.waste_percentage.unwrap_or(0.0).total_cmp(&b.waste_percentage.unwrap_or(0.0))),
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        (false, false) => std::cmp::Ordering::Equal,
    });
}

/// Expects `runs` already ranked.
fn recommend(runs: &[AlgorithmRun]) -> Option<Recommendation> {
    let ok: Vec<&AlgorithmRun> = runs.iter().filter(|r| r.succeeded()).collect();
    let best = *ok.first()?;
    let worst = *ok.last()?;
    let fastest = *ok
        .iter()
        .min_by(|a, b| a.elapsed_ms.total_cmp(&b.elapsed_ms))?;

    if best.slab_count == worst.slab_count {
        return Some(Recommendation::Fastest {
            algorithm: fastest.algorithm,
        });
    }

    // An exhaustive result wins when it matches the best slab count.
    let chosen = ok
        .iter()
        .find(|r| r.optimal && r.slab_count == best.slab_count)
        .copied()
        .unwrap_or(best);
    let slabs_saved = fastest
        .slab_count
        .unwrap_or(0)
        .saturating_sub(chosen.slab_count.unwrap_or(0));

    Some(Recommendation::Best {
        algorithm: chosen.algorithm,
        slabs_saved,
        versus: fastest.algorithm,
    })
}
