//! Discrete-time linear controllers.
//!
//! Every controller maps a regulation error `e = reference - measured` to one
//! scalar actuation. Integrators have no anti-windup and outputs are not
//! clamped here; saturation belongs to the loop driver and the plant.

use crate::error::SimError;
use crate::float::Float;
use alloc::vec::Vec as AllocVec;
use nalgebra::RowVector4;

/// A feedback law driven by the error vector.
pub trait Controller<F: Float> {
    /// Compute the next actuation from the error vector.
    fn compute_control(&mut self, error: &[F]) -> Result<F, SimError>;

    /// Clear accumulated state, as if freshly constructed.
    fn reset(&mut self);
}

fn channel_error<F: Float>(error: &[F], channel: usize) -> Result<F, SimError> {
    error.get(channel).copied().ok_or(SimError::DimensionMismatch {
        expected: channel + 1,
        actual: error.len(),
    })
}

/// Proportional-integral controller on one error channel.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PiController<F: Float> {
    pub kp: F,
    pub ki: F,
    /// Sample time used for the integral.
    pub dt: F,
    /// Index into the error vector.
    pub channel: usize,
    integral: F,
}

impl<F: Float> PiController<F> {
    pub fn new(kp: F, ki: F, dt: F) -> Self {
        PiController { kp, ki, dt, channel: 0, integral: F::zero() }
    }

    pub fn with_channel(mut self, channel: usize) -> Self {
        self.channel = channel;
        self
    }

    /// `integral += e dt; u = kp e + ki integral`.
    pub fn update(&mut self, error: F) -> F {
        self.integral = self.integral + error * self.dt;
        self.kp * error + self.ki * self.integral
    }

    pub fn integral(&self) -> F {
        self.integral
    }
}

impl<F: Float> Controller<F> for PiController<F> {
    fn compute_control(&mut self, error: &[F]) -> Result<F, SimError> {
        let e = channel_error(error, self.channel)?;
        Ok(self.update(e))
    }

    fn reset(&mut self) {
        self.integral = F::zero();
    }
}

/// PID controller on one error channel. The derivative acts on the error,
/// so a reference step produces a one-tick kick.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PidController<F: Float> {
    pub kp: F,
    pub ki: F,
    pub kd: F,
    pub dt: F,
    pub channel: usize,
    integral: F,
    previous_error: F,
}

impl<F: Float> PidController<F> {
    pub fn new(kp: F, ki: F, kd: F, dt: F) -> Self {
        PidController {
            kp,
            ki,
            kd,
            dt,
            channel: 0,
            integral: F::zero(),
            previous_error: F::zero(),
        }
    }

    pub fn with_channel(mut self, channel: usize) -> Self {
        self.channel = channel;
        self
    }

    pub fn update(&mut self, error: F) -> F {
        self.integral = self.integral + error * self.dt;
        let derivative = if self.dt > F::zero() {
            (error - self.previous_error) / self.dt
        } else {
            F::zero()
        };
        self.previous_error = error;
        self.kp * error + self.ki * self.integral + self.kd * derivative
    }

    pub fn integral(&self) -> F {
        self.integral
    }

    pub fn previous_error(&self) -> F {
        self.previous_error
    }
}

impl<F: Float> Controller<F> for PidController<F> {
    fn compute_control(&mut self, error: &[F]) -> Result<F, SimError> {
        let e = channel_error(error, self.channel)?;
        Ok(self.update(e))
    }

    fn reset(&mut self) {
        self.integral = F::zero();
        self.previous_error = F::zero();
    }
}

/// Full state feedback `u = -K x`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateFeedback<F: Float> {
    gains: AllocVec<F>,
}

impl<F: Float> StateFeedback<F> {
    pub fn new(gains: AllocVec<F>) -> Self {
        StateFeedback { gains }
    }

    /// Gains from a 1x4 row computed by [`crate::linear`].
    pub fn from_row(row: &RowVector4<f64>) -> Self {
        StateFeedback { gains: row.iter().map(|&k| F::from_f64(k)).collect() }
    }

    pub fn gains(&self) -> &[F] {
        &self.gains
    }

    fn dot(&self, v: &[F]) -> Result<F, SimError> {
        if v.len() != self.gains.len() {
            return Err(SimError::DimensionMismatch {
                expected: self.gains.len(),
                actual: v.len(),
            });
        }
        Ok(self.gains.iter().zip(v).fold(F::zero(), |acc, (&k, &x)| acc + k * x))
    }

    /// `-K . state`.
    pub fn feedback(&self, state: &[F]) -> Result<F, SimError> {
        Ok(-self.dot(state)?)
    }
}

impl<F: Float> Controller<F> for StateFeedback<F> {
    /// With `e = r - x` this is `-K (x - r)`.
    fn compute_control(&mut self, error: &[F]) -> Result<F, SimError> {
        self.dot(error)
    }

    fn reset(&mut self) {}
}

/// Any of the built-in controllers, for hosts that switch laws at runtime.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnyController<F: Float> {
    Pi(PiController<F>),
    Pid(PidController<F>),
    StateFeedback(StateFeedback<F>),
}

impl<F: Float> Controller<F> for AnyController<F> {
    fn compute_control(&mut self, error: &[F]) -> Result<F, SimError> {
        match self {
            AnyController::Pi(c) => c.compute_control(error),
            AnyController::Pid(c) => c.compute_control(error),
            AnyController::StateFeedback(c) => c.compute_control(error),
        }
    }

    fn reset(&mut self) {
        match self {
            AnyController::Pi(c) => c.reset(),
            AnyController::Pid(c) => c.reset(),
            AnyController::StateFeedback(c) => c.reset(),
        }
    }
}

impl<F: Float> From<PiController<F>> for AnyController<F> {
    fn from(c: PiController<F>) -> Self {
        AnyController::Pi(c)
    }
}

impl<F: Float> From<PidController<F>> for AnyController<F> {
    fn from(c: PidController<F>) -> Self {
        AnyController::Pid(c)
    }
}

impl<F: Float> From<StateFeedback<F>> for AnyController<F> {
    fn from(c: StateFeedback<F>) -> Self {
        AnyController::StateFeedback(c)
    }
}
