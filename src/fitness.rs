// Image type for comparing pixels
use image::RgbaImage;

// Rayon provides parallel iterators for free performance!
// Just change .iter() to .par_iter() and it uses all CPU cores
use rayon::prelude::*;

use crate::error::{EvolveError, Result};

/// Bytes handed to each rayon task by `image_diff_parallel`
const CHUNK: usize = 64 * 1024;

/// Sum of absolute per-channel differences between two images
///
/// All four channels count, alpha included, so the worst possible score
/// for a `w x h` pair is `255 * 4 * w * h`. Lower is better; 0 means the
/// images are identical.
///
/// # Errors
/// `DimensionMismatch` when the images are not the same size.
pub fn image_diff(source: &RgbaImage, target: &RgbaImage) -> Result<f64> {
    check_dimensions(source, target)?;

    // **Why `abs_diff`?**
    // Pixels are `u8`; a plain `a - b` underflows when b > a.
    let total: u64 = source
        .as_raw()
        .iter()
        .zip(target.as_raw())
        .map(|(s, t)| s.abs_diff(*t) as u64)
        .sum();

    Ok(total as f64)
}

/// Parallel version of `image_diff` (faster for large images)
///
/// The buffers are split into fixed-size chunks and summed on rayon's
/// pool. Integer accumulation keeps the result identical to the
/// sequential version.
pub fn image_diff_parallel(source: &RgbaImage, target: &RgbaImage) -> Result<f64> {
    check_dimensions(source, target)?;

    let total: u64 = source
        .as_raw()
        .par_chunks(CHUNK)
        .zip(target.as_raw().par_chunks(CHUNK))
        .map(|(s, t)| s.iter().zip(t).map(|(a, b)| a.abs_diff(*b) as u64).sum::<u64>())
        .sum();

    Ok(total as f64)
}

/// Largest possible difference for an image of this size
pub fn worst_score(width: u32, height: u32) -> f64 {
    255.0 * 4.0 * width as f64 * height as f64
}

/// How close a score is to a perfect match, as a percentage
///
/// 100% is identical, 0% is the worst possible difference.
pub fn closeness_percent(score: f64, width: u32, height: u32) -> f64 {
    let worst = worst_score(width, height);
    if worst == 0.0 {
        return 100.0;
    }
    100.0 - (score / worst * 100.0)
}

fn check_dimensions(source: &RgbaImage, target: &RgbaImage) -> Result<()> {
    if source.dimensions() != target.dimensions() {
        return Err(EvolveError::DimensionMismatch {
            left: source.dimensions(),
            right: target.dimensions(),
        });
    }
    Ok(())
}
