use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "solver", rename_all = "snake_case")]
pub enum Progress {
    Exact {
        nodes: u64,
        depth: usize,
        best_score: Option<f64>,
    },
    Genetic {
        generation: u32,
        best_fitness: f64,
    },
}

/// Progress sink that drops every report.
pub fn silent(_: Progress) {}

/// Shared cancel flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
