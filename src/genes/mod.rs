// The genes of a drawing: bounded geometry, colors and the polygons built
// from them.
//
// Rust's module system:
// - `mod geometry;` tells Rust to look for geometry.rs in this directory
// - `pub use` re-exports items so callers can write `genes::Shape`
//   instead of `genes::shape::Shape`

mod color;
mod geometry;
mod shape;

pub use color::Color;
pub use geometry::{restriction_box, sample_point, BoundingBox, Point};
pub use shape::{PointCount, Polygon, Shape, ShapeConfig};
