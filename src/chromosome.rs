use std::fmt;

use image::RgbaImage;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::drawing::Drawing;
use crate::error::{EvolveError, Result};
use crate::fitness::image_diff;
use crate::genes::ShapeConfig;

/// 128-bit identity of a chromosome
///
/// Drawn at random when a chromosome is created. Collisions are possible
/// in theory but astronomically unlikely, so nothing checks for them here;
/// the population deals with the duplicates it creates itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChromosomeId(pub u128);

impl ChromosomeId {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen())
    }
}

impl fmt::Display for ChromosomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// How two parents' shape lists are combined
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossoverStrategy {
    /// Every index independently from either parent (coin flip)
    Uniform,

    /// One cut: everything before it from the first parent, the rest from
    /// the second. Keeps runs of neighboring shapes together, which
    /// matters because stacked translucent shapes only look right in their
    /// original order.
    #[default]
    SinglePoint,
}

/// One candidate solution: an identified drawing with a cached fitness
///
/// **Rust Concept: Option<T> for "not computed yet"**
/// `fitness` is `None` until the drawing has been compared with the
/// target. Every method that changes the shapes either recomputes it or
/// resets it to `None`, so a stale score can't be observed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chromosome {
    id: ChromosomeId,
    drawing: Drawing,

    /// Difference from the target (lower is better)
    fitness: Option<f64>,
}

impl Chromosome {
    /// Create a random chromosome and score it against `target`
    ///
    /// A chromosome with zero shapes is left unevaluated.
    pub fn new<R: Rng + ?Sized>(
        id: ChromosomeId,
        width: u32,
        height: u32,
        shape_config: ShapeConfig,
        shape_count: usize,
        target: &RgbaImage,
        rng: &mut R,
    ) -> Result<Self> {
        let mut chromosome = Self::unevaluated(id, width, height, shape_config, shape_count, rng)?;
        if !chromosome.drawing.is_empty() {
            chromosome.evaluate(target)?;
        }
        Ok(chromosome)
    }

    /// Create a random chromosome without scoring it
    ///
    /// The population builds whole generations this way and then evaluates
    /// them all at once in parallel.
    pub fn unevaluated<R: Rng + ?Sized>(
        id: ChromosomeId,
        width: u32,
        height: u32,
        shape_config: ShapeConfig,
        shape_count: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let drawing = Drawing::new(width, height, shape_config, shape_count, rng)?;
        Ok(Self::from_drawing(id, drawing))
    }

    /// Wrap an existing drawing (unevaluated)
    pub fn from_drawing(id: ChromosomeId, drawing: Drawing) -> Self {
        Self {
            id,
            drawing,
            fitness: None,
        }
    }

    pub fn id(&self) -> ChromosomeId {
        self.id
    }

    pub fn drawing(&self) -> &Drawing {
        &self.drawing
    }

    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub(crate) fn reassign_id(&mut self, id: ChromosomeId) {
        self.id = id;
    }

    /// Render the drawing, compare it with `target` and cache the result
    pub fn evaluate(&mut self, target: &RgbaImage) -> Result<f64> {
        let score = image_diff(&self.drawing.render(), target)?;
        self.fitness = Some(score);
        Ok(score)
    }

    /// Mutate the drawing and rescore it
    ///
    /// See `mutate_shapes` for what changes. The identity stays the same.
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        mutation_amount: f64,
        target: &RgbaImage,
        rng: &mut R,
    ) -> Result<()> {
        self.mutate_shapes(mutation_amount, rng)?;
        self.evaluate(target)?;
        Ok(())
    }

    /// Mutate the drawing without rescoring it
    ///
    /// Makes `floor(mutation_amount * shape_count)` draws from the shape
    /// list *with replacement*, so one shape may be hit twice while others
    /// are left alone. Each hit is a coin flip between a new color and one
    /// resampled point. Shape count and canvas never change.
    ///
    /// Leaves the fitness unevaluated, even when a draw fails halfway, and
    /// returns the number of draws.
    pub fn mutate_shapes<R: Rng + ?Sized>(
        &mut self,
        mutation_amount: f64,
        rng: &mut R,
    ) -> Result<usize> {
        let shape_count = self.drawing.len();
        let draws = (mutation_amount * shape_count as f64).floor() as usize;
        if shape_count == 0 || draws == 0 {
            return Ok(0);
        }

        self.fitness = None;
        for _ in 0..draws {
            let shape = &mut self.drawing.shapes[rng.gen_range(0..shape_count)];
            if rng.gen_bool(0.5) {
                shape.recolor(rng);
            } else {
                shape.replace_random_point(rng)?;
            }
        }
        Ok(draws)
    }

    /// Breed two chromosomes into a scored child with a fresh id
    ///
    /// # Errors
    /// `DimensionMismatch` if the parents' canvases differ,
    /// `ShapeCountMismatch` if their shape lists have different lengths.
    pub fn mate<R: Rng + ?Sized>(
        a: &Chromosome,
        b: &Chromosome,
        strategy: CrossoverStrategy,
        target: &RgbaImage,
        rng: &mut R,
    ) -> Result<Self> {
        let mut child = Self::crossover(a, b, strategy, rng)?;
        child.evaluate(target)?;
        Ok(child)
    }

    /// Breed two chromosomes into an unevaluated child with a fresh id
    ///
    /// The child owns copies of the parents' shapes, in their original
    /// positions, so mutating the child never touches a parent.
    pub fn crossover<R: Rng + ?Sized>(
        a: &Chromosome,
        b: &Chromosome,
        strategy: CrossoverStrategy,
        rng: &mut R,
    ) -> Result<Self> {
        if a.drawing.dimensions() != b.drawing.dimensions() {
            return Err(EvolveError::DimensionMismatch {
                left: a.drawing.dimensions(),
                right: b.drawing.dimensions(),
            });
        }
        if a.drawing.len() != b.drawing.len() {
            return Err(EvolveError::ShapeCountMismatch {
                left: a.drawing.len(),
                right: b.drawing.len(),
            });
        }

        let (width, height) = a.drawing.dimensions();
        let mut drawing = Drawing::empty(width, height, *a.drawing.shape_config());
        let pairs = a.drawing.shapes.iter().zip(&b.drawing.shapes);

        drawing.shapes = match strategy {
            CrossoverStrategy::Uniform => pairs
                .map(|(from_a, from_b)| {
                    let parent = if rng.gen_bool(0.5) { from_a } else { from_b };
                    parent.clone()
                })
                .collect(),
            CrossoverStrategy::SinglePoint => {
                let cut = rng.gen_range(0..=a.drawing.len());
                pairs
                    .enumerate()
                    .map(|(i, (from_a, from_b))| {
                        let parent = if i < cut { from_a } else { from_b };
                        parent.clone()
                    })
                    .collect()
            }
        };

        Ok(Self::from_drawing(ChromosomeId::random(rng), drawing))
    }
}
