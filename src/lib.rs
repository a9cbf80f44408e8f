// Library root for the genetic drawing algorithm
//
// A population of drawings made of translucent polygons evolves toward a
// target image. Each module is one layer of that:
//
//   genes       - points, boxes, colors and polygon shapes
//   render      - rasterizing polygons onto a white canvas
//   fitness     - distance between two images
//   drawing     - an ordered list of shapes on a canvas
//   chromosome  - a scored drawing with an identity, mutation and crossover
//   selection   - the fitness-weighted roulette wheel
//   population  - the current generation and its statistics
//   evolution   - parameters and the generational step

pub mod error;
pub mod genes;

pub mod fitness;
pub mod render;

pub mod chromosome;
pub mod drawing;

pub mod evolution;
pub mod population;
pub mod selection;

// Re-export commonly used types at the library root for convenience, so
// users can write `use genetic_drawing::Population;`
pub use chromosome::{Chromosome, ChromosomeId, CrossoverStrategy};
pub use drawing::Drawing;
pub use error::{EvolveError, Result};
pub use evolution::{EvolutionParams, GenerationRatios, GenerationReport};
pub use genes::{BoundingBox, Color, Point, PointCount, Shape, ShapeConfig};
pub use population::{Population, Statistics};
pub use selection::{SelectionWeighting, SelectionWheel};
