//! Capability traits shared by every simulated plant.

use crate::error::SimError;
use crate::float::Float;
use crate::observer::{NoOpStepObserver, StepObserver};
use crate::world::World;
use alloc::vec::Vec as AllocVec;

/// One scalar actuation wrapped in a plant-specific record.
pub trait PlantInput<F: Float>: Copy + core::fmt::Debug {
    /// Build the input from the controller's scalar output.
    fn from_actuation(value: F) -> Self;

    fn actuation(&self) -> F;

    fn is_finite(&self) -> bool {
        self.actuation().is_finite()
    }
}

/// Snapshot of a plant, recomputed from its bodies on every read.
pub trait PlantState<F: Float>: Clone + core::fmt::Debug {
    /// Number of entries in [`to_vector`](Self::to_vector).
    const DIM: usize;

    /// Ordered state vector, as consumed by controllers.
    fn to_vector(&self) -> AllocVec<F>;
}

/// A physical system that accepts one input and can be stepped.
pub trait Plant<F: Float> {
    type Input: PlantInput<F>;
    type State: PlantState<F>;

    /// Replace the current input. A non-finite input fails with
    /// [`SimError::InvalidInput`], keeps the previous input and poisons the
    /// plant: every `step` fails the same way until a finite input arrives.
    fn set_input(&mut self, input: Self::Input) -> Result<(), SimError>;

    fn input(&self) -> Self::Input;

    /// Apply the current input and advance the world by `dt`. Nothing moves
    /// when `dt` is invalid or the last input was rejected.
    fn step_observed<O: StepObserver>(&mut self, dt: F, observer: &mut O) -> Result<(), SimError>;

    fn step(&mut self, dt: F) -> Result<(), SimError> {
        self.step_observed(dt, &mut NoOpStepObserver)
    }

    fn state(&self) -> Self::State;

    fn world(&self) -> &World<F>;
}
