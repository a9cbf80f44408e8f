// Import types we need
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chromosome::{Chromosome, ChromosomeId, CrossoverStrategy};
use crate::error::{EvolveError, Result};
use crate::genes::ShapeConfig;
use crate::population::{evaluate_all, key_by_id, lookup, scores, Population};
use crate::selection::{SelectionWeighting, SelectionWheel, DEFAULT_RESOLUTION};

/// How a new generation is composed
///
/// Relative shares, not probabilities: they don't need to add up to one.
/// Each slot of the next generation rolls a number in `[0, total)` and the
/// share it lands in decides how the slot is filled.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRatios {
    /// Children bred from two parents (the crossover rate)
    pub child: f64,

    /// Chromosomes carried over unchanged from the previous generation
    pub carry_over: f64,

    /// Brand new random chromosomes
    pub fresh: f64,
}

impl GenerationRatios {
    pub fn total(&self) -> f64 {
        self.child + self.carry_over + self.fresh
    }

    /// The shares must be non-negative and their total positive and finite
    pub fn validate(&self) -> Result<()> {
        let shares = [self.child, self.carry_over, self.fresh];
        if shares.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err(EvolveError::InvalidParams(format!(
                "ratios must be finite and non-negative: {self:?}"
            )));
        }
        let total = self.total();
        if !total.is_finite() {
            return Err(EvolveError::InvalidParams(format!(
                "ratios add up to {total}: {self:?}"
            )));
        }
        if total <= 0.0 {
            return Err(EvolveError::InvalidParams(
                "at least one ratio must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for GenerationRatios {
    fn default() -> Self {
        Self {
            child: 0.6,
            carry_over: 0.2,
            fresh: 0.2,
        }
    }
}

/// Parameters controlling the evolution process
///
/// These are the "knobs" you can turn to control how evolution works.
/// Different values lead to different evolutionary dynamics!
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolutionParams {
    /// Number of chromosomes in every generation
    pub population_size: usize,

    /// Number of shapes per drawing
    pub shape_count: usize,

    /// Point count and maximum size of each shape
    pub shape_config: ShapeConfig,

    /// Fraction of each generation made of mutated chromosomes (0.0-1.0)
    pub mutation_rate: f64,

    /// Of a mutated drawing, the fraction of shapes hit per mutation (0.0-1.0)
    pub mutation_amount: f64,

    /// Composition of the rest of each generation
    pub ratios: GenerationRatios,

    pub crossover: CrossoverStrategy,

    /// How fitness turns into reproduction chances
    pub weighting: SelectionWeighting,

    /// Number of roulette wheel slots
    pub selection_resolution: usize,

    /// Seed for a reproducible run; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            population_size: 50,
            shape_count: 150,
            shape_config: ShapeConfig::default(),
            mutation_rate: 0.02,
            mutation_amount: 0.2,
            ratios: GenerationRatios::default(),
            crossover: CrossoverStrategy::default(),
            weighting: SelectionWeighting::default(),
            selection_resolution: DEFAULT_RESOLUTION,
            seed: None,
        }
    }
}

impl EvolutionParams {
    /// Check the parameters before any work is done with them
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(EvolveError::InvalidParams(
                "population_size must be at least 1".into(),
            ));
        }
        if self.selection_resolution == 0 {
            return Err(EvolveError::InvalidParams(
                "selection_resolution must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(EvolveError::InvalidParams(format!(
                "mutation_rate {} is outside 0.0-1.0",
                self.mutation_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_amount) {
            return Err(EvolveError::InvalidParams(format!(
                "mutation_amount {} is outside 0.0-1.0",
                self.mutation_amount
            )));
        }
        self.ratios.validate()?;
        self.shape_config.point_count.validate()
    }

    /// Number of mutant slots in each generation
    pub fn mutant_count(&self) -> usize {
        let mutants = (self.mutation_rate * self.population_size as f64).floor() as usize;
        mutants.min(self.population_size)
    }
}

/// What one call to `evolve` produced
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub children: usize,
    pub carried_over: usize,
    pub fresh: usize,
    pub mutants: usize,

    /// Members that needed a new id because theirs was already taken
    pub renamed: usize,
}

impl Population {
    /// Evolve one generation using the configured ratios
    pub fn evolve(&mut self) -> Result<GenerationReport> {
        let ratios = self.params.ratios;
        self.evolve_with(&ratios)
    }

    /// Evolve the population for one generation
    ///
    /// **Genetic Algorithm Steps:**
    /// 1. Spin up a fresh roulette wheel from the current fitness values
    /// 2. Fill `size - mutants` slots: breed two parents, carry a parent
    ///    over, or spawn a random newcomer, as the ratios dictate
    /// 3. Fill the remaining `mutants` slots with mutated copies of members
    ///    picked uniformly (with replacement) from the current generation
    /// 4. Score everything new, in parallel
    /// 5. Swap the new generation in
    ///
    /// The new generation always has exactly `population_size` members.
    /// A chromosome carried over or mutated keeps its id; when the same one
    /// is picked twice, the second copy gets a fresh id.
    ///
    /// Nothing is changed until every step has succeeded: on error the
    /// current generation is left as it was.
    pub fn evolve_with(&mut self, ratios: &GenerationRatios) -> Result<GenerationReport> {
        ratios.validate()?;
        let size = self.params.population_size;
        let mutants = self.params.mutant_count();
        let (width, height) = self.target.dimensions();

        self.build_selection_structure(self.params.selection_resolution)?;

        let mut report = GenerationReport {
            mutants,
            ..GenerationReport::default()
        };
        let mut next: Vec<Chromosome> = Vec::with_capacity(size);

        for _ in 0..size - mutants {
            let roll = self.rng.gen_range(0.0..ratios.total());

            if roll < ratios.child {
                let mom = self.selection.sample(&mut self.rng)?;
                let dad = self.selection.sample(&mut self.rng)?;
                let child = Chromosome::crossover(
                    lookup(&self.members, mom)?,
                    lookup(&self.members, dad)?,
                    self.params.crossover,
                    &mut self.rng,
                )?;
                next.push(child);
                report.children += 1;
            } else if roll < ratios.child + ratios.carry_over {
                // Same id, same drawing, same (still valid) fitness
                let survivor = self.selection.sample(&mut self.rng)?;
                next.push(lookup(&self.members, survivor)?.clone());
                report.carried_over += 1;
            } else {
                next.push(Chromosome::unevaluated(
                    ChromosomeId::random(&mut self.rng),
                    width,
                    height,
                    self.params.shape_config,
                    self.params.shape_count,
                    &mut self.rng,
                )?);
                report.fresh += 1;
            }
        }

        // Mutants are drawn uniformly, not through the wheel
        let pool: Vec<ChromosomeId> = self.members.keys().copied().collect();
        for _ in 0..mutants {
            let picked = pool[self.rng.gen_range(0..pool.len())];
            let mut mutant = lookup(&self.members, picked)?.clone();
            mutant.mutate_shapes(self.params.mutation_amount, &mut self.rng)?;
            next.push(mutant);
        }

        evaluate_all(&mut next, &self.target)?;
        let (members, renamed) = key_by_id(next, &mut self.rng);
        report.renamed = renamed;
        let selection = SelectionWheel::build(
            scores(&members),
            self.params.weighting,
            self.params.selection_resolution,
        )?;

        // Commit
        self.members = members;
        self.selection = selection;
        self.generation += 1;

        let stats = self.statistics();
        debug!(
            generation = self.generation,
            children = report.children,
            carried_over = report.carried_over,
            fresh = report.fresh,
            mutants = report.mutants,
            renamed = report.renamed,
            min = stats.min,
            avg = stats.avg,
            max = stats.max,
            "generation complete"
        );

        Ok(report)
    }
}
