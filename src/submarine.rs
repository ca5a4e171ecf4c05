//! Submarine hovering at a commanded depth. No gravity: buoyancy is assumed
//! to cancel it, so only thrust moves the hull.

use crate::body::{Body, BodyHandle, Shape};
use crate::config::WorldConfig;
use crate::error::SimError;
use crate::float::Float;
use crate::observer::StepObserver;
use crate::plant::{Plant, PlantInput, PlantState};
use crate::vec::Vec2;
use crate::world::{check_timestep, World};
use alloc::vec::Vec as AllocVec;

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubmarineParams<F: Float> {
    pub position: Vec2<F>,
    pub size: Vec2<F>,
    pub mass: F,
    /// Symmetric thrust limit. `None` leaves thrust unbounded.
    pub max_thrust: Option<F>,
}

impl<F: Float> Default for SubmarineParams<F> {
    fn default() -> Self {
        SubmarineParams {
            position: Vec2::from_f32(300.0, 400.0),
            size: Vec2::from_f32(50.0, 20.0),
            mass: F::from_f32(9.0),
            max_thrust: None,
        }
    }
}

/// Vertical thrust; positive pushes the hull deeper (`+y`).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubmarineInput<F: Float> {
    pub vertical_thrust: F,
}

impl<F: Float> PlantInput<F> for SubmarineInput<F> {
    fn from_actuation(value: F) -> Self {
        SubmarineInput { vertical_thrust: value }
    }

    fn actuation(&self) -> F {
        self.vertical_thrust
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubmarineState<F: Float> {
    pub depth: F,
    pub vertical_velocity: F,
}

impl<F: Float> SubmarineState<F> {
    pub const DEPTH: usize = 0;
    pub const VERTICAL_VELOCITY: usize = 1;
}

impl<F: Float> PlantState<F> for SubmarineState<F> {
    const DIM: usize = 2;

    fn to_vector(&self) -> AllocVec<F> {
        alloc::vec![self.depth, self.vertical_velocity]
    }
}

pub struct Submarine<F: Float> {
    world: World<F>,
    hull: BodyHandle,
    max_thrust: Option<F>,
    input: SubmarineInput<F>,
    input_rejected: bool,
}

impl<F: Float> Submarine<F> {
    pub fn new(params: SubmarineParams<F>) -> Result<Self, SimError> {
        let mut world = World::new(WorldConfig::new());
        let shape = Shape::Box { width: params.size.x, height: params.size.y };
        let hull = world.add_body(Body::dynamic(params.mass, F::zero(), params.position)?.with_shape(shape));
        tracing::debug!(mass = params.mass.to_f64(), "submarine assembled");
        Ok(Submarine {
            world,
            hull,
            max_thrust: params.max_thrust,
            input: SubmarineInput::default(),
            input_rejected: false,
        })
    }

    pub fn hull(&self) -> BodyHandle {
        self.hull
    }

    pub fn world_mut(&mut self) -> &mut World<F> {
        &mut self.world
    }
}

impl<F: Float> Plant<F> for Submarine<F> {
    type Input = SubmarineInput<F>;
    type State = SubmarineState<F>;

    fn set_input(&mut self, input: SubmarineInput<F>) -> Result<(), SimError> {
        if !input.is_finite() {
            self.input_rejected = true;
            return Err(SimError::InvalidInput);
        }
        self.input = input;
        self.input_rejected = false;
        Ok(())
    }

    fn input(&self) -> SubmarineInput<F> {
        self.input
    }

    fn step_observed<O: StepObserver>(&mut self, dt: F, observer: &mut O) -> Result<(), SimError> {
        check_timestep(dt)?;
        if self.input_rejected {
            return Err(SimError::InvalidInput);
        }
        let thrust = match self.max_thrust {
            Some(limit) => self.input.vertical_thrust.saturate(limit),
            None => self.input.vertical_thrust,
        };
        self.world
            .bodies
            .body_mut(self.hull)
            .apply_force_at_local_point(Vec2::new(F::zero(), thrust), Vec2::zero());
        self.world.step_observed(dt, observer)
    }

    fn state(&self) -> SubmarineState<F> {
        let hull = self.world.bodies.body(self.hull);
        SubmarineState {
            depth: hull.position.y,
            vertical_velocity: hull.velocity.y,
        }
    }

    fn world(&self) -> &World<F> {
        &self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_depth_without_thrust() {
        let mut sub: Submarine<f64> = Submarine::new(SubmarineParams::default()).unwrap();
        for _ in 0..10 {
            sub.step(0.1).unwrap();
        }
        assert_eq!(sub.state(), SubmarineState { depth: 400.0, vertical_velocity: 0.0 });
    }

    #[test]
    fn thrust_accelerates_downward() {
        let mut sub: Submarine<f64> = Submarine::new(SubmarineParams::default()).unwrap();
        sub.set_input(SubmarineInput { vertical_thrust: 90.0 }).unwrap();
        sub.step(0.5).unwrap();
        let state = sub.state();
        assert!((state.vertical_velocity - 5.0).abs() < 1e-12);
        assert!((state.depth - 402.5).abs() < 1e-12);
    }
}
