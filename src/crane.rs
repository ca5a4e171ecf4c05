//! Gantry crane: a runner on a horizontal rail with a load hanging from it.

use crate::body::{Body, BodyHandle, Shape};
use crate::config::WorldConfig;
use crate::error::SimError;
use crate::float::Float;
use crate::math::{angle_from_vertical, angular_rate, Vertical};
use crate::observer::StepObserver;
use crate::plant::{Plant, PlantInput, PlantState};
use crate::vec::Vec2;
use crate::world::{check_timestep, World};
use alloc::vec::Vec as AllocVec;

/// How the runner is driven along the rail.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CraneActuator<F: Float> {
    /// Kinematic runner; the input is its target horizontal velocity.
    Velocity { max_speed: F },
    /// Dynamic runner; the input is a horizontal force.
    Force { runner_mass: F, max_force: F },
}

/// Crane geometry and masses. Defaults describe a 1200x800 scene.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CraneParams<F: Float> {
    pub rail_start: Vec2<F>,
    pub rail_end: Vec2<F>,
    /// Initial runner x; the runner sits on the rail.
    pub runner_x: F,
    pub runner_size: Vec2<F>,
    /// Rope attachment, local to the runner.
    pub runner_anchor: Vec2<F>,
    pub rope_length: F,
    pub load_mass: F,
    pub load_radius: F,
    /// Initial swing, measured from hanging straight down.
    pub initial_angle: F,
    pub gravity: Vec2<F>,
    pub actuator: CraneActuator<F>,
    /// World sub-steps per `step`. A force-driven runner is dynamic and held
    /// by the rail, so the rope drifts by roughly `g (dt / sub_steps)^2`.
    pub sub_steps: usize,
}

impl<F: Float> Default for CraneParams<F> {
    fn default() -> Self {
        CraneParams {
            rail_start: Vec2::from_f32(50.0, 80.0),
            rail_end: Vec2::from_f32(1150.0, 80.0),
            runner_x: F::from_f32(600.0),
            runner_size: Vec2::from_f32(100.0, 20.0),
            runner_anchor: Vec2::from_f32(0.0, 10.0),
            rope_length: F::from_f32(510.0),
            load_mass: F::from_f32(90.0),
            load_radius: F::from_f32(15.0),
            initial_angle: F::zero(),
            gravity: Vec2::from_f32(0.0, 900.0),
            actuator: CraneActuator::Velocity { max_speed: F::from_f32(600.0) },
            sub_steps: 8,
        }
    }
}

impl<F: Float> CraneParams<F> {
    /// Force-driven runner with the reference mass and force scale.
    pub fn force_driven() -> Self {
        CraneParams {
            actuator: CraneActuator::Force {
                runner_mass: F::from_f32(1000.0),
                max_force: F::from_f32(1.0e6),
            },
            ..Self::default()
        }
    }

    pub fn with_initial_angle(mut self, angle: F) -> Self {
        self.initial_angle = angle;
        self
    }

    pub fn with_sub_steps(mut self, sub_steps: usize) -> Self {
        self.sub_steps = sub_steps.max(1);
        self
    }
}

/// Target velocity or force, depending on the [`CraneActuator`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CraneInput<F: Float> {
    pub command: F,
}

impl<F: Float> PlantInput<F> for CraneInput<F> {
    fn from_actuation(value: F) -> Self {
        CraneInput { command: value }
    }

    fn actuation(&self) -> F {
        self.command
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CraneState<F: Float> {
    pub runner_x: F,
    pub runner_velocity: F,
    /// Load angle from straight down; negative when the load is right of the runner.
    pub angle: F,
    pub angular_velocity: F,
}

impl<F: Float> CraneState<F> {
    pub const RUNNER_X: usize = 0;
    pub const RUNNER_VELOCITY: usize = 1;
    pub const ANGLE: usize = 2;
    pub const ANGULAR_VELOCITY: usize = 3;
}

impl<F: Float> PlantState<F> for CraneState<F> {
    const DIM: usize = 4;

    fn to_vector(&self) -> AllocVec<F> {
        alloc::vec![self.runner_x, self.runner_velocity, self.angle, self.angular_velocity]
    }
}

pub struct Crane<F: Float> {
    world: World<F>,
    runner: BodyHandle,
    load: BodyHandle,
    runner_anchor: Vec2<F>,
    rope_length: F,
    actuator: CraneActuator<F>,
    input: CraneInput<F>,
    input_rejected: bool,
}

impl<F: Float> Crane<F> {
    pub fn new(params: CraneParams<F>) -> Result<Self, SimError> {
        let config = WorldConfig::new()
            .with_gravity(params.gravity)
            .with_sub_steps(params.sub_steps);
        let mut world = World::new(config);
        let ground = world.ground();

        let rail_y = params.rail_start.y;
        let runner_pos = Vec2::new(params.runner_x, rail_y);
        let runner_shape = Shape::Box { width: params.runner_size.x, height: params.runner_size.y };
        let runner_body = match params.actuator {
            CraneActuator::Velocity { .. } => Body::kinematic(runner_pos),
            CraneActuator::Force { runner_mass, .. } => Body::dynamic(runner_mass, F::zero(), runner_pos)?,
        };
        let runner = world.add_body(runner_body.with_shape(runner_shape));

        let pivot = runner_pos + params.runner_anchor;
        let load_pos = pivot + Vec2::new(F::zero(), params.rope_length).rotate(params.initial_angle);
        let load_shape = Shape::Circle { radius: params.load_radius };
        let load_body = Body::dynamic(params.load_mass, load_shape.moment(params.load_mass), load_pos)?;
        let load = world.add_body(load_body.with_shape(load_shape));

        world.add_pin_joint(runner, load, params.runner_anchor, Vec2::zero())?;
        world.add_groove_joint(ground, params.rail_start, params.rail_end, runner, Vec2::zero())?;

        tracing::debug!(
            rope_length = params.rope_length.to_f64(),
            initial_angle = params.initial_angle.to_f64(),
            "crane assembled"
        );

        Ok(Crane {
            world,
            runner,
            load,
            runner_anchor: params.runner_anchor,
            rope_length: params.rope_length,
            actuator: params.actuator,
            input: CraneInput::default(),
            input_rejected: false,
        })
    }

    pub fn runner(&self) -> BodyHandle {
        self.runner
    }

    pub fn load(&self) -> BodyHandle {
        self.load
    }

    pub fn actuator(&self) -> CraneActuator<F> {
        self.actuator
    }

    pub fn world_mut(&mut self) -> &mut World<F> {
        &mut self.world
    }

    /// World position of the rope attachment on the runner.
    pub fn pivot(&self) -> Vec2<F> {
        self.world.bodies.body(self.runner).local_to_world(self.runner_anchor)
    }

    /// Current pivot-to-load distance.
    pub fn rope_length(&self) -> F {
        self.pivot().distance(self.world.bodies.position(self.load))
    }

    /// Rest length of the rope.
    pub fn nominal_rope_length(&self) -> F {
        self.rope_length
    }

    /// Move the load to `position` and stop it. The rope pulls it back to its
    /// rest length on the next step.
    pub fn displace_load(&mut self, position: Vec2<F>) {
        let bodies = &mut self.world.bodies;
        bodies.set_position(self.load, position);
        bodies.set_velocity(self.load, Vec2::zero());
        bodies.set_angular_velocity(self.load, F::zero());
    }

    /// Place the load on the rope circle at `angle` from straight down, at rest.
    pub fn swing_to(&mut self, angle: F) {
        let offset = Vec2::new(F::zero(), self.rope_length).rotate(angle);
        let position = self.pivot() + offset;
        self.displace_load(position);
    }
}

impl<F: Float> Plant<F> for Crane<F> {
    type Input = CraneInput<F>;
    type State = CraneState<F>;

    fn set_input(&mut self, input: CraneInput<F>) -> Result<(), SimError> {
        if !input.is_finite() {
            self.input_rejected = true;
            return Err(SimError::InvalidInput);
        }
        self.input = input;
        self.input_rejected = false;
        Ok(())
    }

    fn input(&self) -> CraneInput<F> {
        self.input
    }

    fn step_observed<O: StepObserver>(&mut self, dt: F, observer: &mut O) -> Result<(), SimError> {
        check_timestep(dt)?;
        if self.input_rejected {
            return Err(SimError::InvalidInput);
        }
        let runner = self.world.bodies.body_mut(self.runner);
        match self.actuator {
            CraneActuator::Velocity { max_speed } => {
                let vx = self.input.command.saturate(max_speed);
                runner.velocity = Vec2::new(vx, F::zero());
            }
            CraneActuator::Force { max_force, .. } => {
                let fx = self.input.command.saturate(max_force);
                runner.apply_force_at_local_point(Vec2::new(fx, F::zero()), Vec2::zero());
            }
        }
        self.world.step_observed(dt, observer)
    }

    fn state(&self) -> CraneState<F> {
        let bodies = &self.world.bodies;
        let runner = bodies.body(self.runner);
        let load = bodies.body(self.load);
        let offset = load.position - self.pivot();
        let relative_velocity = load.velocity - runner.velocity_at_local_point(self.runner_anchor);
        CraneState {
            runner_x: runner.position.x,
            runner_velocity: runner.velocity.x,
            angle: angle_from_vertical(offset, Vertical::Down),
            angular_velocity: angular_rate(offset, relative_velocity),
        }
    }

    fn world(&self) -> &World<F> {
        &self.world
    }
}
