// Import the random number generator trait from the rand crate
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Alpha never drops below this share of full opacity
const MIN_OPACITY: f64 = 0.2;

/// RGBA fill color of a shape
///
/// Colors are never edited channel by channel. A recolor mutation swaps the
/// whole value for a freshly sampled one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Sample a random color
    ///
    /// RGB is uniform over 0..=255. Alpha is `255 * max(u1 * u2, 0.2)`: the
    /// product of two uniforms leans toward small values, so most shapes
    /// come out see-through, and the floor keeps every shape at least about
    /// 20% opaque (alpha 51).
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let opacity = (rng.gen::<f64>() * rng.gen::<f64>()).max(MIN_OPACITY);
        Self {
            r: rng.gen_range(0..=255),
            g: rng.gen_range(0..=255),
            b: rng.gen_range(0..=255),
            a: (255.0 * opacity).round() as u8,
        }
    }

    /// The `[r, g, b, a]` array the image crate expects
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_alpha_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut translucent = 0;
        for _ in 0..5_000 {
            let c = Color::random(&mut rng);
            assert!(c.a >= 51, "alpha {} below floor", c.a);
            if c.a < 128 {
                translucent += 1;
            }
        }
        // P(u1 * u2 < 0.5) is roughly 0.85
        assert!(translucent > 3_500);
    }

    #[test]
    fn test_floor_is_exactly_51() {
        assert_eq!((255.0 * MIN_OPACITY).round() as u8, 51);
    }

    #[test]
    fn test_to_rgba_order() {
        assert_eq!(Color::new(1, 2, 3, 4).to_rgba(), [1, 2, 3, 4]);
    }
}
