//! Error types for simulation and control operations.

use thiserror::Error;

/// Errors that can occur while building or stepping a plant.
///
/// Every variant is a precondition violation: the caller supplied a value
/// the simulation cannot honor. Actuator saturation is not an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// `clamp` was called with `min > max`.
    #[error("invalid range: min {min} is greater than max {max}")]
    InvalidRange { min: f64, max: f64 },
    /// An actuation value was NaN or infinite.
    #[error("input must be finite")]
    InvalidInput,
    /// A state or gain vector had the wrong length.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// Mass must be positive and finite; moment must be non-negative.
    #[error("mass must be positive and finite")]
    InvalidMass,
    /// Timestep must be positive and finite.
    #[error("timestep must be positive and finite")]
    InvalidTimestep,
    /// A joint was built from degenerate geometry (e.g. a zero-length groove).
    #[error("degenerate joint geometry")]
    InvalidGeometry,
    /// Groove frames must be static bodies.
    #[error("groove frame must be a static body")]
    FrameNotStatic,
    /// Body handle does not belong to this world.
    #[error("body index {index} out of bounds (count: {count})")]
    BodyOutOfBounds { index: usize, count: usize },
    /// Desired poles must match the model order and come in conjugate pairs.
    #[error("desired poles must match the model order and come in conjugate pairs")]
    InvalidPoles,
    /// The controllability matrix is rank deficient.
    #[error("system is not controllable")]
    Uncontrollable,
}
