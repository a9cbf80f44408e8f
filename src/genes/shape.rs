use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::geometry::{restriction_box, sample_point, BoundingBox, Point};
use crate::error::{EvolveError, Result};

/// How many points a new shape gets
///
/// Either always the same number, or a fresh uniform pick from an inclusive
/// range for every shape. It is resolved once, when the shape is built; the
/// shape never changes its point count afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointCount {
    Fixed(usize),
    Range { min: usize, max: usize },
}

impl PointCount {
    /// Reject counts that could produce a shape with no points
    pub fn validate(&self) -> Result<()> {
        match *self {
            PointCount::Fixed(0) => Err(EvolveError::InvalidSpec(
                "a shape needs at least one point".into(),
            )),
            PointCount::Fixed(_) => Ok(()),
            PointCount::Range { min, max } if min == 0 || min > max => {
                Err(EvolveError::InvalidSpec(format!(
                    "point range {min}-{max} must satisfy 1 <= min <= max"
                )))
            }
            PointCount::Range { .. } => Ok(()),
        }
    }

    /// Pick the point count for one shape
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize> {
        self.validate()?;
        Ok(match *self {
            PointCount::Fixed(n) => n,
            PointCount::Range { min, max } => rng.gen_range(min..=max),
        })
    }
}

impl Default for PointCount {
    fn default() -> Self {
        PointCount::Fixed(3)
    }
}

/// Parses `"3"` as `Fixed(3)` and `"3-6"` as `Range { min: 3, max: 6 }`
impl FromStr for PointCount {
    type Err = EvolveError;

    fn from_str(s: &str) -> Result<Self> {
        let parse = |part: &str| {
            part.trim().parse::<usize>().map_err(|_| {
                EvolveError::InvalidSpec(format!("'{s}' is not a count or a min-max range"))
            })
        };

        let spec = match s.split_once('-') {
            Some((min, max)) => PointCount::Range {
                min: parse(min)?,
                max: parse(max)?,
            },
            None => PointCount::Fixed(parse(s)?),
        };
        spec.validate()?;
        Ok(spec)
    }
}

impl fmt::Display for PointCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointCount::Fixed(n) => write!(f, "{n}"),
            PointCount::Range { min, max } => write!(f, "{min}-{max}"),
        }
    }
}

/// The recipe every shape of a drawing is built from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeConfig {
    pub point_count: PointCount,

    /// How far (in pixels) points may stray from the shape's origin.
    /// `None` lets a shape span the whole canvas.
    pub max_shape_size: Option<u32>,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            point_count: PointCount::default(),
            max_shape_size: Some(30),
        }
    }
}

/// Read-only view of a shape handed to the rasterizer
#[derive(Clone, Copy, Debug)]
pub struct Polygon<'a> {
    pub points: &'a [Point],
    pub color: Color,
}

impl<'a> Polygon<'a> {
    pub fn new(points: &'a [Point], color: Color) -> Self {
        Self { points, color }
    }
}

/// One translucent polygon
///
/// Points are kept in winding order. All of them lie inside `bounds`, the
/// restriction box computed from the origin when the shape was built, and
/// point mutations resample inside that same box.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    origin: Point,
    bounds: BoundingBox,
    points: Vec<Point>,
    color: Color,
}

impl Shape {
    /// Create a random shape on the canvas
    ///
    /// # Errors
    /// `InvalidSpec` for a malformed point count, `InvalidRange` for an
    /// empty canvas.
    pub fn new<R: Rng + ?Sized>(
        point_count: PointCount,
        canvas: &BoundingBox,
        max_shape_size: Option<u32>,
        rng: &mut R,
    ) -> Result<Self> {
        let count = point_count.resolve(rng)?;
        let origin = sample_point(canvas, rng)?;
        let bounds = restriction_box(origin, canvas, max_shape_size);

        let points = (0..count)
            .map(|_| sample_point(&bounds, rng))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            origin,
            bounds,
            points,
            color: Color::random(rng),
        })
    }

    /// Build a shape from known geometry
    ///
    /// The restriction box becomes the tightest box around `points` and the
    /// origin is the first point. Useful for checkpoints and hand-made
    /// drawings.
    pub fn from_polygon(points: Vec<Point>, color: Color) -> Result<Self> {
        let Some(&origin) = points.first() else {
            return Err(EvolveError::InvalidSpec(
                "a shape needs at least one point".into(),
            ));
        };
        let bounds = points.iter().fold(
            BoundingBox::new(origin.x, origin.y, origin.x, origin.y),
            |b, p| {
                BoundingBox::new(
                    b.min_x.min(p.x),
                    b.min_y.min(p.y),
                    b.max_x.max(p.x),
                    b.max_y.max(p.y),
                )
            },
        );
        Ok(Self {
            origin,
            bounds,
            points,
            color,
        })
    }

    /// Resample one randomly chosen point inside the restriction box
    pub fn replace_random_point<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        if self.points.is_empty() {
            return Ok(());
        }
        let index = rng.gen_range(0..self.points.len());
        self.points[index] = sample_point(&self.bounds, rng)?;
        Ok(())
    }

    /// Swap the color for a freshly sampled one
    pub fn recolor<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.color = Color::random(rng);
    }

    pub fn to_polygon(&self) -> Polygon<'_> {
        Polygon {
            points: &self.points,
            color: self.color,
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn color(&self) -> Color {
        self.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(0x5eed)
    }

    #[test]
    fn test_fixed_point_count() {
        let mut rng = rng();
        let canvas = BoundingBox::canvas(200, 100);
        let shape = Shape::new(PointCount::Fixed(5), &canvas, Some(20), &mut rng).unwrap();
        assert_eq!(shape.points().len(), 5);
    }

    #[test]
    fn test_ranged_point_count() {
        let mut rng = rng();
        let canvas = BoundingBox::canvas(200, 100);
        let spec = PointCount::Range { min: 3, max: 6 };

        let mut counts = std::collections::HashSet::new();
        for _ in 0..200 {
            let shape = Shape::new(spec, &canvas, Some(20), &mut rng).unwrap();
            assert!((3..=6).contains(&shape.points().len()));
            counts.insert(shape.points().len());
        }
        assert_eq!(counts.len(), 4);
    }

    #[test]
    fn test_malformed_point_count() {
        let mut rng = rng();
        let canvas = BoundingBox::canvas(10, 10);

        let malformed = [
            PointCount::Fixed(0),
            PointCount::Range { min: 5, max: 2 },
            PointCount::Range { min: 0, max: 2 },
        ];
        for spec in malformed {
            let err = Shape::new(spec, &canvas, None, &mut rng).unwrap_err();
            assert!(
                matches!(err, EvolveError::InvalidSpec(_)),
                "{spec:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_point_count_parsing() {
        assert_eq!("3".parse::<PointCount>().unwrap(), PointCount::Fixed(3));
        assert_eq!(
            "3-6".parse::<PointCount>().unwrap(),
            PointCount::Range { min: 3, max: 6 }
        );
        assert_eq!(
            " 4 - 4 ".parse::<PointCount>().unwrap(),
            PointCount::Range { min: 4, max: 4 }
        );
        assert!("x".parse::<PointCount>().is_err());
        assert!("6-3".parse::<PointCount>().is_err());
        assert!("0".parse::<PointCount>().is_err());
        assert_eq!(PointCount::Range { min: 3, max: 6 }.to_string(), "3-6");
    }

    #[test]
    fn test_points_stay_in_restriction_box() {
        let mut rng = rng();
        let canvas = BoundingBox::canvas(64, 48);

        for _ in 0..300 {
            let shape = Shape::new(PointCount::Fixed(4), &canvas, Some(10), &mut rng).unwrap();
            assert!(canvas.encloses(shape.bounds()));
            assert!(shape.bounds().contains(shape.origin()));
            assert!(shape.points().iter().all(|p| shape.bounds().contains(*p)));
        }
    }

    #[test]
    fn test_replace_random_point() {
        let mut rng = rng();
        let canvas = BoundingBox::canvas(100, 100);
        let mut shape = Shape::new(PointCount::Fixed(3), &canvas, Some(15), &mut rng).unwrap();
        let bounds = *shape.bounds();
        let before = shape.points().to_vec();

        let mut changed = false;
        for _ in 0..50 {
            shape.replace_random_point(&mut rng).unwrap();
            assert_eq!(shape.points().len(), 3);
            assert_eq!(*shape.bounds(), bounds);
            assert!(shape.points().iter().all(|p| bounds.contains(*p)));
            changed |= shape.points() != before.as_slice();
        }
        assert!(changed);
    }

    #[test]
    fn test_recolor_keeps_geometry() {
        let mut rng = rng();
        let canvas = BoundingBox::canvas(100, 100);
        let mut shape = Shape::new(PointCount::Fixed(3), &canvas, None, &mut rng).unwrap();
        let points = shape.points().to_vec();
        let color = shape.color();

        let mut changed = false;
        for _ in 0..10 {
            shape.recolor(&mut rng);
            changed |= shape.color() != color;
        }
        assert!(changed);
        assert_eq!(shape.points(), points.as_slice());
    }

    #[test]
    fn test_from_polygon() {
        let shape = Shape::from_polygon(
            vec![Point::new(3, 1), Point::new(0, 4), Point::new(5, 2)],
            Color::new(1, 2, 3, 255),
        )
        .unwrap();
        assert_eq!(shape.origin(), Point::new(3, 1));
        assert_eq!(*shape.bounds(), BoundingBox::new(0, 1, 5, 4));
        assert_eq!(shape.to_polygon().color.to_rgba(), [1, 2, 3, 255]);

        assert!(Shape::from_polygon(Vec::new(), Color::new(0, 0, 0, 255)).is_err());
    }
}
