use serde::{Deserialize, Serialize};

use crate::error::{OptimizeError, Result};
use crate::types::{Algorithm, Rect};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub slab_width: f64,
    pub slab_height: f64,
    /// Blade width added to both dimensions of every piece.
    pub kerf: f64,
    pub allow_splitting: bool,
    /// Split sections shorter than this are dropped.
    pub min_split_length: f64,
    pub algorithm: Algorithm,
    /// Slab cap for the exact and genetic solvers.
    pub max_slabs: usize,
    pub price_per_sq_ft: f64,
    pub exact: ExactConfig,
    pub genetic: GeneticConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            slab_width: 133.0,
            slab_height: 78.0,
            kerf: 0.125,
            allow_splitting: true,
            min_split_length: 24.0,
            algorithm: Algorithm::Guillotine,
            max_slabs: 10,
            price_per_sq_ft: 50.0,
            exact: ExactConfig::default(),
            genetic: GeneticConfig::default(),
        }
    }
}

impl OptimizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slab(&self) -> Rect {
        Rect::new(self.slab_width, self.slab_height)
    }

    pub fn with_slab(mut self, width: f64, height: f64) -> Self {
        self.slab_width = width;
        self.slab_height = height;
        self
    }

    pub fn with_kerf(mut self, kerf: f64) -> Self {
        self.kerf = kerf;
        self
    }

    pub fn with_splitting(mut self, allow: bool, min_split_length: f64) -> Self {
        self.allow_splitting = allow;
        self.min_split_length = min_split_length;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_max_slabs(mut self, max_slabs: usize) -> Self {
        self.max_slabs = max_slabs;
        self
    }

    pub fn with_exact(mut self, exact: ExactConfig) -> Self {
        self.exact = exact;
        self
    }

    pub fn with_genetic(mut self, genetic: GeneticConfig) -> Self {
        self.genetic = genetic;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(OptimizeError::InvalidInput(msg.to_string()));
        if !(self.slab_width > 0.0 && self.slab_height > 0.0) {
            return invalid("slab dimensions must be positive");
        }
        if !(self.kerf >= 0.0) {
            return invalid("kerf must not be negative");
        }
        if !(self.min_split_length > 0.0) {
            return invalid("minimum split length must be positive");
        }
        if self.max_slabs == 0 {
            return invalid("slab limit must be at least 1");
        }
        if !(self.exact.grid_step > 0.0) {
            return invalid("grid step must be positive");
        }
        if self.genetic.population_size == 0 {
            return invalid("population size must be at least 1");
        }
        if self.genetic.elite_count > self.genetic.population_size {
            return invalid("elite count cannot exceed the population size");
        }
        Ok(())
    }
}

/// Settings for the branch-and-bound search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExactConfig {
    /// Wall-clock budget in milliseconds.
    pub time_limit_ms: u64,
    /// Cell size of the free-space scan grid.
    pub grid_step: f64,
    /// Free rectangles kept per slab after each rescan.
    pub max_spaces: usize,
    /// Nodes between progress reports and deadline checks.
    pub progress_interval: u64,
}

impl Default for ExactConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 10_000,
            grid_step: 1.0,
            max_spaces: 32,
            progress_interval: 10_000,
        }
    }
}

impl ExactConfig {
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    pub fn with_grid_step(mut self, step: f64) -> Self {
        self.grid_step = step;
        self
    }

    pub fn with_max_spaces(mut self, max: usize) -> Self {
        self.max_spaces = max.max(1);
        self
    }

    pub fn with_progress_interval(mut self, nodes: u64) -> Self {
        self.progress_interval = nodes.max(1);
        self
    }
}

/// Settings for the genetic solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub generations: u32,
    /// Individuals copied unchanged into the next generation.
    pub elite_count: usize,
    /// Parents are drawn from this many of the fittest individuals.
    pub parent_pool: usize,
    pub mutation_rate: f64,
    /// Fitness charge per slab used.
    pub bin_penalty: f64,
    /// Generations between progress reports.
    pub progress_interval: u32,
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 30,
            generations: 50,
            elite_count: 4,
            parent_pool: 10,
            mutation_rate: 0.1,
            bin_penalty: 1_000_000.0,
            progress_interval: 10,
            seed: None,
        }
    }
}

impl GeneticConfig {
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(1);
        self
    }

    pub fn with_generations(mut self, generations: u32) -> Self {
        self.generations = generations;
        self
    }

    pub fn with_elite_count(mut self, count: usize) -> Self {
        self.elite_count = count;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults_are_valid() {
        assert!(OptimizerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        let err = OptimizerConfig::new().with_slab(0.0, 78.0).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(OptimizerConfig::new().with_kerf(-0.1).validate().is_err());
        assert!(OptimizerConfig::new().with_max_slabs(0).validate().is_err());
        assert!(OptimizerConfig::new().with_splitting(true, 0.0).validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: OptimizerConfig =
            serde_json::from_str(r#"{"slab_width": 100, "algorithm": "best_fit", "exact": {"time_limit_ms": 50}}"#)
                .unwrap();
        assert_eq!(config.slab_width, 100.0);
        assert_eq!(config.slab_height, 78.0);
        assert_eq!(config.algorithm, Algorithm::BestFit);
        assert_eq!(config.exact.time_limit_ms, 50);
        assert_eq!(config.exact.max_spaces, 32);
        assert_eq!(config.genetic.population_size, 30);
    }
}
