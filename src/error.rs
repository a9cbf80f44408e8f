// Error taxonomy for the genetic engine
//
// Every fallible operation in the library returns `Result<T, EvolveError>`.
// Errors are detected at the point of the offending call and handed back to
// the caller untouched; nothing in the engine retries or swallows them.

use thiserror::Error;

/// Everything that can go wrong while building or evolving a population
///
/// **Rust Concept: thiserror**
/// `#[derive(Error)]` writes the `std::error::Error` and `Display`
/// implementations for us. The `#[error("...")]` attribute is the message,
/// and it can interpolate the variant's fields by name.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvolveError {
    /// A sampling box whose minimum lies past its maximum
    #[error("invalid sampling range: [{min}, {max}] on the {axis} axis")]
    InvalidRange { axis: char, min: i32, max: i32 },

    /// A point-count specification that cannot produce a shape
    #[error("invalid point count specification: {0}")]
    InvalidSpec(String),

    /// Two canvases (or pixel buffers) that should have the same size don't
    #[error("dimension mismatch: {left:?} vs {right:?}")]
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },

    /// Two parents with a different number of shapes
    #[error("shape count mismatch: {left} vs {right}")]
    ShapeCountMismatch { left: usize, right: usize },

    /// The roulette wheel cannot be built from the current fitness values
    #[error("degenerate fitness: {0}")]
    DegenerateFitness(String),

    /// Sampling from a wheel with no slots
    #[error("selection structure is empty")]
    EmptySelection,

    /// Evolution parameters that fail validation
    #[error("invalid evolution parameters: {0}")]
    InvalidParams(String),
}

/// Shorthand used across the crate
pub type Result<T> = std::result::Result<T, EvolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = EvolveError::InvalidRange {
            axis: 'x',
            min: 5,
            max: 2,
        };
        assert_eq!(err.to_string(), "invalid sampling range: [5, 2] on the x axis");

        let err = EvolveError::DimensionMismatch {
            left: (2, 2),
            right: (3, 2),
        };
        assert_eq!(err.to_string(), "dimension mismatch: (2, 2) vs (3, 2)");
    }
}
