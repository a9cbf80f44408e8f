// Bounded random geometry: points, boxes and the per-shape restriction box
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{EvolveError, Result};

/// A pixel coordinate
///
/// Signed on purpose: box arithmetic subtracts sizes from coordinates and
/// must not wrap around at zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned box, inclusive on both ends of both axes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl BoundingBox {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// The box covering every pixel of a `width x height` canvas
    ///
    /// The maximum is `width - 1`, not `width`: a point at `x == width`
    /// would sit one pixel off the right edge.
    pub fn canvas(width: u32, height: u32) -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            max_x: width as i32 - 1,
            max_y: height as i32 - 1,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        (self.min_x..=self.max_x).contains(&point.x) && (self.min_y..=self.max_y).contains(&point.y)
    }

    /// True when `other` lies completely inside this box
    pub fn encloses(&self, other: &BoundingBox) -> bool {
        other.min_x >= self.min_x
            && other.min_y >= self.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }

    /// Check both axes are non-empty
    pub fn validate(&self) -> Result<()> {
        if self.min_x > self.max_x {
            return Err(EvolveError::InvalidRange {
                axis: 'x',
                min: self.min_x,
                max: self.max_x,
            });
        }
        if self.min_y > self.max_y {
            return Err(EvolveError::InvalidRange {
                axis: 'y',
                min: self.min_y,
                max: self.max_y,
            });
        }
        Ok(())
    }

    // Written with max/min rather than `Ord::clamp`, which panics on an
    // inverted range.
    fn clamp(&self, point: Point) -> Point {
        Point {
            x: point.x.max(self.min_x).min(self.max_x),
            y: point.y.max(self.min_y).min(self.max_y),
        }
    }
}

/// Draw a point uniformly inside `bounds`, both ends inclusive
///
/// # Errors
/// `InvalidRange` if the box is inverted on either axis.
pub fn sample_point<R: Rng + ?Sized>(bounds: &BoundingBox, rng: &mut R) -> Result<Point> {
    bounds.validate()?;
    Ok(Point {
        x: rng.gen_range(bounds.min_x..=bounds.max_x),
        y: rng.gen_range(bounds.min_y..=bounds.max_y),
    })
}

/// The region a shape's points may occupy
///
/// A square reaching `max_size` pixels out from `origin` on every side,
/// with each side cut back at the canvas edge. Without a `max_size` the
/// shape may span the whole canvas.
pub fn restriction_box(origin: Point, canvas: &BoundingBox, max_size: Option<u32>) -> BoundingBox {
    let Some(max_size) = max_size else {
        return *canvas;
    };
    let reach = i32::try_from(max_size).unwrap_or(i32::MAX);
    let origin = canvas.clamp(origin);

    let left = (origin.x - canvas.min_x).min(reach);
    let up = (origin.y - canvas.min_y).min(reach);
    let right = (canvas.max_x - origin.x).min(reach);
    let down = (canvas.max_y - origin.y).min(reach);

    BoundingBox {
        min_x: origin.x - left,
        min_y: origin.y - up,
        max_x: origin.x + right,
        max_y: origin.y + down,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_sample_point_inclusive_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let bounds = BoundingBox::new(2, 3, 4, 5);

        let mut seen_min_x = false;
        let mut seen_max_x = false;
        for _ in 0..500 {
            let p = sample_point(&bounds, &mut rng).unwrap();
            assert!(bounds.contains(p));
            seen_min_x |= p.x == 2;
            seen_max_x |= p.x == 4;
        }
        // Both ends of a three-wide range show up within 500 draws
        assert!(seen_min_x && seen_max_x);
    }

    #[test]
    fn test_single_pixel_box() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let bounds = BoundingBox::new(9, 9, 9, 9);
        assert_eq!(sample_point(&bounds, &mut rng).unwrap(), Point::new(9, 9));
    }

    #[test]
    fn test_inverted_box_fails() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = sample_point(&BoundingBox::new(5, 0, 4, 10), &mut rng).unwrap_err();
        let expected = EvolveError::InvalidRange {
            axis: 'x',
            min: 5,
            max: 4,
        };
        assert_eq!(err, expected);

        let err = sample_point(&BoundingBox::new(0, 3, 4, 1), &mut rng).unwrap_err();
        assert!(matches!(err, EvolveError::InvalidRange { axis: 'y', .. }));
    }

    #[test]
    fn test_zero_sized_canvas_is_invalid() {
        assert!(BoundingBox::canvas(0, 10).validate().is_err());
        assert!(BoundingBox::canvas(1, 1).validate().is_ok());
    }

    #[test]
    fn test_restriction_box_unbounded_is_canvas() {
        let canvas = BoundingBox::canvas(100, 80);
        assert_eq!(restriction_box(Point::new(10, 10), &canvas, None), canvas);
    }

    #[test]
    fn test_restriction_box_in_the_middle() {
        let canvas = BoundingBox::canvas(100, 100);
        let b = restriction_box(Point::new(50, 50), &canvas, Some(10));
        assert_eq!(b, BoundingBox::new(40, 40, 60, 60));
    }

    #[test]
    fn test_restriction_box_at_corners() {
        let canvas = BoundingBox::canvas(100, 60);

        let top_left = restriction_box(Point::new(0, 0), &canvas, Some(30));
        assert_eq!(top_left, BoundingBox::new(0, 0, 30, 30));

        let bottom_right = restriction_box(Point::new(99, 59), &canvas, Some(30));
        assert_eq!(bottom_right, BoundingBox::new(69, 29, 99, 59));
    }

    proptest! {
        #[test]
        fn prop_restriction_box_stays_on_canvas(
            width in 1u32..400,
            height in 1u32..400,
            fx in 0.0f64..1.0,
            fy in 0.0f64..1.0,
            max_size in proptest::option::of(0u32..500),
            seed in any::<u64>(),
        ) {
            let canvas = BoundingBox::canvas(width, height);
            let origin = Point::new(
                (fx * width as f64) as i32,
                (fy * height as f64) as i32,
            );
            let bounds = restriction_box(origin, &canvas, max_size);

            prop_assert!(canvas.encloses(&bounds));
            prop_assert!(bounds.contains(origin));

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for _ in 0..8 {
                let p = sample_point(&bounds, &mut rng).unwrap();
                prop_assert!(bounds.contains(p));
                prop_assert!(canvas.contains(p));
            }
        }
    }
}
