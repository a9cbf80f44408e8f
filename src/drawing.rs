use image::RgbaImage;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::genes::{BoundingBox, Polygon, Shape, ShapeConfig};
use crate::render::rasterize;

/// A drawing composed of translucent polygons
///
/// This is the genetic representation of one candidate image: an ordered
/// list of shapes plus the canvas they are drawn on.
///
/// **Order matters!** Shapes are rendered front to back in list order, so
/// a translucent shape early in the list is partly hidden by everything
/// drawn after it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    /// The shapes, in render order
    pub shapes: Vec<Shape>,

    /// Recipe for shapes added later by `append_shape`
    shape_config: ShapeConfig,

    /// Canvas dimensions, fixed for the drawing's lifetime
    width: u32,
    height: u32,
}

impl Drawing {
    /// Create a random drawing
    ///
    /// # Arguments
    /// * `width`, `height` - Canvas size in pixels
    /// * `shape_config` - Point count and maximum size of each shape
    /// * `shape_count` - How many shapes to generate
    ///
    /// Every shape is sampled independently over the full canvas.
    pub fn new<R: Rng + ?Sized>(
        width: u32,
        height: u32,
        shape_config: ShapeConfig,
        shape_count: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let mut drawing = Self::empty(width, height, shape_config);
        drawing.shapes.reserve(shape_count);
        for _ in 0..shape_count {
            drawing.append_shape(rng)?;
        }
        Ok(drawing)
    }

    /// A drawing with no shapes yet
    ///
    /// Crossover starts from one of these and fills it from the parents.
    pub fn empty(width: u32, height: u32, shape_config: ShapeConfig) -> Self {
        Self {
            shapes: Vec::new(),
            shape_config,
            width,
            height,
        }
    }

    /// Add one more random shape on top of the existing ones
    pub fn append_shape<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let canvas = self.canvas();
        let ShapeConfig {
            point_count,
            max_shape_size,
        } = self.shape_config;
        let shape = Shape::new(point_count, &canvas, max_shape_size, rng)?;
        self.shapes.push(shape);
        Ok(())
    }

    /// Render the drawing to an image
    ///
    /// Nothing is cached: every call rasterizes from scratch.
    pub fn render(&self) -> RgbaImage {
        rasterize(self.width, self.height, self.polygons())
    }

    /// The render descriptors of all shapes, in order
    pub fn polygons(&self) -> impl Iterator<Item = Polygon<'_>> {
        self.shapes.iter().map(Shape::to_polygon)
    }

    /// The box covering every pixel of the canvas
    pub fn canvas(&self) -> BoundingBox {
        BoundingBox::canvas(self.width, self.height)
    }

    pub fn shape_config(&self) -> &ShapeConfig {
        &self.shape_config
    }

    /// Get drawing dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Serialize the drawing to JSON for checkpointing
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Load a drawing saved by `to_json`
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
