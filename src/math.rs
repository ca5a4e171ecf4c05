//! Scalar helpers shared by plants and controllers.

use crate::error::SimError;
use crate::float::Float;
use crate::vec::Vec2;

/// Reference axis for pendulum angles, in y-down screen coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Vertical {
    /// `(0, 1)`: hanging loads.
    Down,
    /// `(0, -1)`: balanced loads.
    Up,
}

impl Vertical {
    pub fn axis<F: Float>(self) -> Vec2<F> {
        match self {
            Vertical::Down => Vec2::new(F::zero(), F::one()),
            Vertical::Up => Vec2::new(F::zero(), -F::one()),
        }
    }
}

/// Bound `value` to `[min, max]` inclusive.
///
/// Fails with [`SimError::InvalidRange`] when `min > max`.
pub fn clamp<F: Float>(value: F, min: F, max: F) -> Result<F, SimError> {
    if min > max {
        return Err(SimError::InvalidRange { min: min.to_f64(), max: max.to_f64() });
    }
    Ok(value.max(min).min(max))
}

/// Signed angle that rotates `vertical` onto `v`, in `(-pi, pi]`.
///
/// Positive angles follow [`Vec2::rotate`], so rotating `v` by `theta` adds
/// `theta` to the result (mod 2pi). A zero vector yields `0`.
pub fn angle_from_vertical<F: Float>(v: Vec2<F>, vertical: Vertical) -> F {
    if v.length_sq() == F::zero() {
        return F::zero();
    }
    let axis = vertical.axis::<F>();
    F::atan2(axis.cross(v), axis.dot(v))
}

/// Time derivative of [`angle_from_vertical`] for an offset `r` moving at
/// `r_dot`: `(r x r_dot) / |r|^2`. Zero when `r` is zero.
pub fn angular_rate<F: Float>(r: Vec2<F>, r_dot: Vec2<F>) -> F {
    let len_sq = r.length_sq();
    if len_sq == F::zero() {
        return F::zero();
    }
    r.cross(r_dot) / len_sq
}

/// Wrap an angle into `(-pi, pi]`.
pub fn wrap_angle<F: Float>(angle: F) -> F {
    F::atan2(angle.sin(), angle.cos())
}
