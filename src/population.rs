use std::collections::BTreeMap;

use image::RgbaImage;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::chromosome::{Chromosome, ChromosomeId};
use crate::drawing::Drawing;
use crate::error::{EvolveError, Result};
use crate::evolution::EvolutionParams;
use crate::selection::SelectionWheel;

/// Minimum, average and maximum fitness of a generation
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Statistics {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

/// Population of drawings evolving toward a target image
///
/// **Rust Concept: Struct with owned data**
/// The population owns its chromosomes, the target image and its random
/// number generator. Nothing is shared, so a generation can be swapped out
/// in one assignment and readers never see half of one.
///
/// Members are keyed by id. A `BTreeMap` rather than a `HashMap` so that
/// iteration order, and with it a seeded run, is reproducible.
pub struct Population {
    pub(crate) members: BTreeMap<ChromosomeId, Chromosome>,
    pub(crate) params: EvolutionParams,
    pub(crate) target: RgbaImage,
    pub(crate) selection: SelectionWheel,
    pub(crate) generation: usize,
    pub(crate) rng: ChaCha8Rng,
}

impl Population {
    /// Create a random, fully evaluated population
    ///
    /// # Arguments
    /// * `params` - Size, shape recipe and evolution settings
    /// * `target` - The image we're trying to recreate
    ///
    /// The population takes ownership of the target: every fitness score
    /// it computes is measured against it.
    ///
    /// # Errors
    /// `InvalidParams` for bad settings, `DegenerateFitness` if the first
    /// selection wheel can't be built.
    pub fn new(params: EvolutionParams, target: RgbaImage) -> Result<Self> {
        params.validate()?;
        let mut rng = match params.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let (width, height) = target.dimensions();

        let mut chromosomes = (0..params.population_size)
            .map(|_| {
                Chromosome::unevaluated(
                    ChromosomeId::random(&mut rng),
                    width,
                    height,
                    params.shape_config,
                    params.shape_count,
                    &mut rng,
                )
            })
            .collect::<Result<Vec<_>>>()?;
        evaluate_all(&mut chromosomes, &target)?;

        let (members, _) = key_by_id(chromosomes, &mut rng);
        let selection = SelectionWheel::build(
            scores(&members),
            params.weighting,
            params.selection_resolution,
        )?;

        info!(
            size = members.len(),
            shapes = params.shape_count,
            width,
            height,
            "population created"
        );

        Ok(Self {
            members,
            params,
            target,
            selection,
            generation: 0,
            rng,
        })
    }

    /// Rebuild the roulette wheel from the current fitness values
    pub fn build_selection_structure(&mut self, resolution: usize) -> Result<()> {
        self.selection =
            SelectionWheel::build(scores(&self.members), self.params.weighting, resolution)?;
        Ok(())
    }

    /// Spin the roulette wheel for one parent id
    pub fn sample_parent(&mut self) -> Result<ChromosomeId> {
        self.selection.sample(&mut self.rng)
    }

    /// Min, average and max fitness over the current members
    pub fn statistics(&self) -> Statistics {
        let (min, max, total) = scores(&self.members).fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, total), (_, f)| (min.min(f), max.max(f), total + f),
        );
        Statistics {
            min,
            avg: total / self.members.len().max(1) as f64,
            max,
        }
    }

    /// The chromosome with the lowest (best) fitness
    pub fn best_chromosome(&self) -> Option<&Chromosome> {
        self.members
            .values()
            .filter(|c| c.fitness().is_some())
            .min_by(|a, b| {
                let a = a.fitness().unwrap_or(f64::INFINITY);
                let b = b.fitness().unwrap_or(f64::INFINITY);
                a.total_cmp(&b)
            })
    }

    /// The drawing closest to the target
    pub fn best(&self) -> Option<&Drawing> {
        self.best_chromosome().map(Chromosome::drawing)
    }

    /// All current members, ordered by id
    pub fn chromosomes(&self) -> impl Iterator<Item = &Chromosome> {
        self.members.values()
    }

    pub fn get(&self, id: ChromosomeId) -> Option<&Chromosome> {
        self.members.get(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of completed generations
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn params(&self) -> &EvolutionParams {
        &self.params
    }

    pub fn selection(&self) -> &SelectionWheel {
        &self.selection
    }

    pub fn target(&self) -> &RgbaImage {
        &self.target
    }

    /// Get the target image dimensions
    pub fn target_dimensions(&self) -> (u32, u32) {
        self.target.dimensions()
    }
}

/// Score every chromosome that hasn't been scored yet, in parallel
///
/// **Why is this safe?**
/// `par_iter_mut` hands each rayon worker exclusive `&mut` access to
/// different chromosomes, and the target is only read.
pub(crate) fn evaluate_all(chromosomes: &mut [Chromosome], target: &RgbaImage) -> Result<()> {
    chromosomes
        .par_iter_mut()
        .filter(|c| c.fitness().is_none())
        .try_for_each(|c| c.evaluate(target).map(drop))
}

/// Key chromosomes by id
///
/// The first chromosome to claim an id keeps it; later ones with the same
/// id get a fresh one. Returns the map and how many were renamed.
pub(crate) fn key_by_id(
    chromosomes: Vec<Chromosome>,
    rng: &mut ChaCha8Rng,
) -> (BTreeMap<ChromosomeId, Chromosome>, usize) {
    let mut members = BTreeMap::new();
    let mut renamed = 0;
    for mut chromosome in chromosomes {
        while members.contains_key(&chromosome.id()) {
            chromosome.reassign_id(ChromosomeId::random(rng));
            renamed += 1;
        }
        members.insert(chromosome.id(), chromosome);
    }
    (members, renamed)
}

/// `(id, fitness)` of every evaluated member
pub(crate) fn scores(
    members: &BTreeMap<ChromosomeId, Chromosome>,
) -> impl Iterator<Item = (ChromosomeId, f64)> + '_ {
    members.values().filter_map(|c| c.fitness().map(|f| (c.id(), f)))
}

/// Look up a member picked from the wheel
///
/// The wheel is always rebuilt from the same members it is sampled
/// against, so a miss means it has no usable slots for this generation.
pub(crate) fn lookup(
    members: &BTreeMap<ChromosomeId, Chromosome>,
    id: ChromosomeId,
) -> Result<&Chromosome> {
    members.get(&id).ok_or(EvolveError::EmptySelection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::image_diff;
    use crate::genes::{PointCount, ShapeConfig};
    use crate::selection::SelectionWeighting;
    use image::Rgba;

    fn params(size: usize) -> EvolutionParams {
        EvolutionParams {
            population_size: size,
            shape_count: 8,
            shape_config: ShapeConfig {
                point_count: PointCount::Range { min: 3, max: 5 },
                max_shape_size: Some(10),
            },
            seed: Some(1234),
            ..EvolutionParams::default()
        }
    }

    fn target() -> RgbaImage {
        RgbaImage::from_pixel(32, 24, Rgba([30, 90, 200, 255]))
    }

    #[test]
    fn test_population_creation() {
        let pop = Population::new(params(12), target()).unwrap();

        assert_eq!(pop.len(), 12);
        assert_eq!(pop.generation(), 0);
        assert_eq!(pop.target_dimensions(), (32, 24));
        for c in pop.chromosomes() {
            assert_eq!(c.drawing().len(), 8);
            assert!(c.fitness().is_some());
        }
        assert!(!pop.selection().is_empty());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let err = Population::new(params(0), target()).err().unwrap();
        assert!(matches!(err, EvolveError::InvalidParams(_)));
    }

    #[test]
    fn test_statistics_and_best() {
        let pop = Population::new(params(10), target()).unwrap();
        let stats = pop.statistics();

        assert!(stats.min <= stats.avg && stats.avg <= stats.max);

        let manual_avg = pop.chromosomes().map(|c| c.fitness().unwrap()).sum::<f64>() / 10.0;
        assert!((stats.avg - manual_avg).abs() < 1e-6);

        let best = pop.best_chromosome().unwrap();
        assert_eq!(best.fitness(), Some(stats.min));

        // The best drawing really scores the reported minimum
        let rendered = pop.best().unwrap().render();
        assert_eq!(image_diff(&rendered, pop.target()).unwrap(), stats.min);
    }

    #[test]
    fn test_selection_and_sampling() {
        let mut pop = Population::new(params(6), target()).unwrap();
        pop.build_selection_structure(600).unwrap();

        let total: usize = pop.chromosomes().map(|c| pop.selection().slots_for(c.id())).sum();
        assert_eq!(total, pop.selection().len());
        assert!(total <= 600);

        for _ in 0..50 {
            let id = pop.sample_parent().unwrap();
            assert!(pop.get(id).is_some());
        }
    }

    #[test]
    fn test_all_perfect_is_degenerate_under_literal_weighting() {
        // No shapes and a white target: every drawing matches exactly, so
        // the literal weights add up to zero
        let params = EvolutionParams {
            shape_count: 0,
            weighting: SelectionWeighting::Distance,
            ..params(4)
        };
        let white = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));

        let err = Population::new(params, white).err().unwrap();
        assert!(matches!(err, EvolveError::DegenerateFitness(_)));
    }

    #[test]
    fn test_key_by_id_renames_duplicates() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let drawing = Drawing::empty(4, 4, ShapeConfig::default());
        let id = ChromosomeId(42);
        let chromosomes = vec![
            Chromosome::from_drawing(id, drawing.clone()),
            Chromosome::from_drawing(id, drawing.clone()),
            Chromosome::from_drawing(ChromosomeId(7), drawing),
        ];

        let (members, renamed) = key_by_id(chromosomes, &mut rng);
        assert_eq!(members.len(), 3);
        assert_eq!(renamed, 1);
        assert!(members.contains_key(&id));
        assert!(members.contains_key(&ChromosomeId(7)));
    }

    #[test]
    fn test_lookup_miss() {
        let members = BTreeMap::new();
        let err = lookup(&members, ChromosomeId(1)).unwrap_err();
        assert_eq!(err, EvolveError::EmptySelection);
    }
}
