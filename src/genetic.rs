use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::GeneticConfig;
use crate::layout::{self, Bin, Move};
use crate::progress::{Cancellation, Progress};
use crate::spaces::SpaceFinder;
use crate::types::{Piece, Rect, Slab};

/// Extra weight for each piece an individual could not place at all.
const UNPLACED_WEIGHT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gene {
    pub bin: usize,
    pub x: f64,
    pub y: f64,
    pub rotated: bool,
}

impl From<Move> for Gene {
    fn from(mv: Move) -> Self {
        Self {
            bin: mv.bin,
            x: mv.x,
            y: mv.y,
            rotated: mv.rotated,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Individual {
    /// `None` where the piece found no room within the slab cap.
    pub genes: Vec<Option<Gene>>,
    pub bins: Vec<Bin>,
    pub fitness: f64,
}

impl Individual {
    pub fn unplaced(&self) -> usize {
        self.genes.iter().filter(|g| g.is_none()).count()
    }
}

#[derive(Debug, Clone)]
pub struct GeneticOutcome {
    pub best: Individual,
    pub generations: u32,
}

impl GeneticOutcome {
    /// The best individual's slabs, or `None` if it left pieces unplaced.
    pub fn slabs(&self, pieces: &[Piece], size: Rect) -> Option<Vec<Slab>> {
        (self.best.unplaced() == 0).then(|| layout::to_slabs(&self.best.bins, pieces, size))
    }
}

/// Evolves placement sequences. Each individual holds one gene per piece,
/// in input order, naming the slab, position and orientation it went to.
/// Lower fitness is better: every slab costs a large penalty and each unit
/// of uncovered slab area adds one.
pub struct GeneticSolver<'a> {
    pieces: &'a [Piece],
    size: Rect,
    max_bins: usize,
    config: &'a GeneticConfig,
    finder: &'a dyn SpaceFinder,
}

impl<'a> GeneticSolver<'a> {
    pub fn new(
        pieces: &'a [Piece],
        size: Rect,
        max_bins: usize,
        config: &'a GeneticConfig,
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

    pub fn run(&self, progress: &dyn Fn(Progress), cancel: &Cancellation) -> GeneticOutcome {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.run_with_rng(&mut rng, progress, cancel)
    }

    pub fn run_with_rng<R: Rng>(
        &self,
        rng: &mut R,
        progress: &dyn Fn(Progress),
        cancel: &Cancellation,
    ) -> GeneticOutcome {
        let size = self.config.population_size.max(1);
        let mut population: Vec<Individual> = (0..size).map(|_| self.build(None, rng)).collect();
        sort_by_fitness(&mut population);

        let elite = self.config.elite_count.min(size);
        let pool = self.config.parent_pool.max(elite).clamp(1, size);
        let mutation_rate = self.config.mutation_rate.clamp(0.0, 1.0);
        let interval = self.config.progress_interval.max(1);

        let mut generations = 0;
        for generation in 1..=self.config.generations {
            if cancel.is_cancelled() {
                tracing::warn!(generation, "genetic search cancelled");
                break;
            }

            let mut next: Vec<Individual> = population[..elite].to_vec();
            while next.len() < size {
                let a = &population[rng.random_range(0..pool)];
                let b = &population[rng.random_range(0..pool)];
                let mut child = self.crossover(a, b, rng);
                if rng.random_bool(mutation_rate) {
                    child = self.mutate(child, rng);
                }
                next.push(child);
            }
            population = next;
            sort_by_fitness(&mut population);
            generations = generation;

            if generation % interval == 0 {
                let best_fitness = population[0].fitness;
                tracing::debug!(generation, best_fitness, "genetic progress");
                progress(Progress::Genetic {
                    generation,
                    best_fitness,
                });
            }
        }

        let best = population.swap_remove(0);
        tracing::debug!(
            generations,
            fitness = best.fitness,
            slabs = best.bins.len(),
            unplaced = best.unplaced(),
            "genetic search finished"
        );
        GeneticOutcome { best, generations }
    }

    /// Builds an individual piece by piece. A suggested gene is used when it
    /// still fits the partial layout; otherwise a random valid placement is
    /// drawn.
    fn build<R: Rng>(&self, suggested: Option<&[Option<Gene>]>, rng: &mut R) -> Individual {
        let mut bins: Vec<Bin> = Vec::new();
        let mut genes = Vec::with_capacity(self.pieces.len());

        for (index, piece) in self.pieces.iter().enumerate() {
            let hint = suggested.and_then(|genes| genes[index]);
            let mv = hint
                .and_then(|gene| self.replay(&bins, piece, gene))
                .or_else(|| self.random_move(&bins, piece, rng));

            match mv {
                Some(mv) => {
                    layout::apply(&mut bins, index, piece, mv, self.size, self.finder);
                    genes.push(Some(Gene::from(mv)));
                }
                None => genes.push(None),
            }
        }

        let fitness = self.fitness(&bins, &genes);
        Individual {
            genes,
            bins,
            fitness,
        }
    }

    fn replay(&self, bins: &[Bin], piece: &Piece, gene: Gene) -> Option<Move> {
        let dims = layout::dims(piece, gene.rotated);
        let valid = match gene.bin {
            b if b < bins.len() => bins[b].accepts(self.size, gene.x, gene.y, dims),
            b if b == bins.len() && b < self.max_bins => {
                Bin::empty(self.size).accepts(self.size, gene.x, gene.y, dims)
            }
            _ => false,
        };
        valid.then_some(Move {
            bin: gene.bin,
            x: gene.x,
            y: gene.y,
            rotated: gene.rotated,
        })
    }

    fn random_move<R: Rng>(&self, bins: &[Bin], piece: &Piece, rng: &mut R) -> Option<Move> {
        let mut moves = layout::moves_into_open_bins(bins, piece);
        if moves.is_empty() && bins.len() < self.max_bins {
            moves = layout::moves_into_new_bin(bins, piece, self.size);
        }
        if moves.is_empty() {
            return None;
        }
        Some(moves[rng.random_range(0..moves.len())])
    }

    fn crossover<R: Rng>(&self, a: &Individual, b: &Individual, rng: &mut R) -> Individual {
        let n = a.genes.len();
        let cut = if n > 1 { rng.random_range(1..n) } else { 0 };
        let genes: Vec<Option<Gene>> = a.genes[..cut]
            .iter()
            .chain(&b.genes[cut..])
            .copied()
            .collect();
        self.build(Some(&genes), rng)
    }

    /// Flips one gene's orientation, then rebuilds the individual from
    /// scratch. The rebuild ignores the old genes, so in effect mutation
    /// replaces the child with a fresh random individual.
    fn mutate<R: Rng>(&self, mut individual: Individual, rng: &mut R) -> Individual {
        if !individual.genes.is_empty() {
            let idx = rng.random_range(0..individual.genes.len());
            if let Some(gene) = individual.genes[idx].as_mut() {
                gene.rotated = !gene.rotated;
            }
        }
        self.build(None, rng)
    }

    fn fitness(&self, bins: &[Bin], genes: &[Option<Gene>]) -> f64 {
        let slab_area = self.size.area();
        let used: Vec<&Bin> = bins.iter().filter(|b| !b.placed.is_empty()).collect();
        let waste: f64 = used.iter().map(|b| slab_area - b.used_area()).sum();
        let unplaced = genes.iter().filter(|g| g.is_none()).count();
        waste
            + used.len() as f64 * self.config.bin_penalty
            + unplaced as f64 * self.config.bin_penalty * UNPLACED_WEIGHT
    }
}

fn sort_by_fitness(population: &mut [Individual]) {
    population.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
}
