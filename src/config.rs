//! Configuration types for the world integrator and the loop driver.

use crate::float::Float;
use crate::vec::Vec2;

/// Configuration for the fixed-step integrator.
///
/// # Builder Pattern
/// ```
/// use plantsim::config::WorldConfig;
/// use plantsim::vec::Vec2;
///
/// let config: WorldConfig<f64> = WorldConfig::new()
///     .with_gravity(Vec2::new(0.0, 900.0))
///     .with_damping(1.0)
///     .with_sub_steps(2);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldConfig<F: Float> {
    /// Gravity acceleration applied to dynamic bodies. Default: zero.
    /// Screen coordinates, so "down" is `+y`.
    pub gravity: Vec2<F>,
    /// Velocity retention factor per sub-step, in [0, 1]. 1.0 = no damping. Default: 1.0.
    pub damping: F,
    /// Number of sub-steps per `step` call. Default: 1.
    pub sub_steps: usize,
}

impl<F: Float> WorldConfig<F> {
    /// Create a new config with default values.
    pub fn new() -> Self {
        WorldConfig {
            gravity: Vec2::zero(),
            damping: F::one(),
            sub_steps: 1,
        }
    }

    /// Set the gravity vector.
    pub fn with_gravity(mut self, gravity: Vec2<F>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the damping factor.
    pub fn with_damping(mut self, damping: F) -> Self {
        self.damping = damping;
        self
    }

    /// Set the number of sub-steps.
    pub fn with_sub_steps(mut self, sub_steps: usize) -> Self {
        self.sub_steps = sub_steps.max(1);
        self
    }
}

impl<F: Float> Default for WorldConfig<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for a [`Driver`](crate::driver::Driver).
///
/// ```
/// use plantsim::config::DriverConfig;
///
/// let config: DriverConfig<f64> = DriverConfig::new(1.0 / 60.0)
///     .with_max_actuation(600.0)
///     .with_history(1000);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriverConfig<F: Float> {
    /// Fixed timestep handed to the plant every tick.
    pub dt: F,
    /// Symmetric actuation limit applied after the disturbance is added.
    pub max_actuation: Option<F>,
    /// Number of tick records to keep. Zero disables the log.
    pub history_capacity: usize,
    /// Whether the controller is consulted on the first tick.
    pub control_active: bool,
}

impl<F: Float> DriverConfig<F> {
    pub fn new(dt: F) -> Self {
        DriverConfig {
            dt,
            max_actuation: None,
            history_capacity: 0,
            control_active: true,
        }
    }

    pub fn with_max_actuation(mut self, limit: F) -> Self {
        self.max_actuation = Some(limit.abs());
        self
    }

    pub fn with_history(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_control_active(mut self, active: bool) -> Self {
        self.control_active = active;
        self
    }
}

impl<F: Float> Default for DriverConfig<F> {
    /// 60 Hz, unlimited actuation, no history.
    fn default() -> Self {
        Self::new(F::one() / F::from_f32(60.0))
    }
}
