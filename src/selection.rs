// Fitness-proportional parent selection: a quantized roulette wheel
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::chromosome::ChromosomeId;
use crate::error::{EvolveError, Result};

/// Number of slots the wheel is divided into by default
pub const DEFAULT_RESOLUTION: usize = 10_000;

/// Turns fitness scores into selection weights
///
/// Fitness is a distance, lower is better, so using it directly as a weight
/// hands *more* offspring to *worse* drawings. `Distance` keeps that
/// literal behavior for comparison runs; the other two favor drawings that
/// are closer to the target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionWeighting {
    /// weight = fitness
    Distance,

    /// weight = 1 / (1 + fitness); the +1 keeps a perfect match finite
    #[default]
    InverseDistance,

    /// weight = worst - fitness; the worst chromosome never reproduces
    WorstMinus,
}

impl SelectionWeighting {
    /// Weights for a list of fitness scores, same order
    pub fn weights(&self, fitness: &[f64]) -> Vec<f64> {
        match self {
            SelectionWeighting::Distance => fitness.to_vec(),
            SelectionWeighting::InverseDistance => {
                fitness.iter().map(|f| 1.0 / (1.0 + f)).collect()
            }
            SelectionWeighting::WorstMinus => {
                let worst = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                fitness.iter().map(|f| worst - f).collect()
            }
        }
    }
}

/// A roulette wheel with `resolution` slots shared out by weight
///
/// Each chromosome gets `floor(weight / total * resolution)` slots. Rather
/// than a flat list repeating every id once per slot, the wheel keeps a
/// running total of slots per chromosome; a sample is one uniform draw
/// over all slots plus a binary search.
#[derive(Clone, Debug, Default)]
pub struct SelectionWheel {
    ids: Vec<ChromosomeId>,

    /// `cumulative[i]` is the number of slots owned by `ids[..=i]`
    cumulative: Vec<usize>,
}

impl SelectionWheel {
    /// Build the wheel from `(id, fitness)` pairs
    ///
    /// # Errors
    /// `DegenerateFitness` if the weights don't add up to a positive finite
    /// total, or if every chromosome rounds down to zero slots.
    pub fn build<I>(entries: I, weighting: SelectionWeighting, resolution: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (ChromosomeId, f64)>,
    {
        let (ids, fitness): (Vec<ChromosomeId>, Vec<f64>) = entries.into_iter().unzip();
        let weights = weighting.weights(&fitness);

        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err(EvolveError::DegenerateFitness(
                "weights must be finite and non-negative".into(),
            ));
        }
        let total: f64 = weights.iter().sum();
        if !(total > 0.0 && total.is_finite()) {
            return Err(EvolveError::DegenerateFitness(format!("total weight is {total}")));
        }

        let mut wheel = Self::default();
        let mut running = 0;
        for (id, weight) in ids.into_iter().zip(weights) {
            // Multiply before dividing so integral weights quantize exactly
            let slots = (weight * resolution as f64 / total).floor() as usize;
            if slots == 0 {
                continue;
            }
            running += slots;
            wheel.ids.push(id);
            wheel.cumulative.push(running);
        }

        if wheel.is_empty() {
            return Err(EvolveError::DegenerateFitness(format!(
                "no chromosome earns a slot at resolution {resolution}"
            )));
        }

        trace!(slots = wheel.len(), chromosomes = wheel.ids.len(), "selection wheel built");
        Ok(wheel)
    }

    /// Total number of occupied slots
    pub fn len(&self) -> usize {
        self.cumulative.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many slots `id` owns (0 if it has none)
    pub fn slots_for(&self, id: ChromosomeId) -> usize {
        match self.ids.iter().position(|candidate| *candidate == id) {
            Some(0) => self.cumulative[0],
            Some(i) => self.cumulative[i] - self.cumulative[i - 1],
            None => 0,
        }
    }

    /// Ids that own at least one slot, in wheel order
    pub fn ids(&self) -> &[ChromosomeId] {
        &self.ids
    }

    /// Spin the wheel once
    ///
    /// # Errors
    /// `EmptySelection` if the wheel has no slots.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ChromosomeId> {
        if self.is_empty() {
            return Err(EvolveError::EmptySelection);
        }
        let slot = rng.gen_range(0..self.len());
        let index = self.cumulative.partition_point(|&end| end <= slot);
        Ok(self.ids[index])
    }
}
