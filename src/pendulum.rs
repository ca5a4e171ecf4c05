//! Inverted pendulum: a ball balanced on a rod above a cart on a rail.

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

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendulumParams<F: Float> {
    pub rail_start: Vec2<F>,
    pub rail_end: Vec2<F>,
    pub cart_x: F,
    pub cart_size: Vec2<F>,
    pub cart_mass: F,
    /// Rod attachment, local to the cart.
    pub cart_anchor: Vec2<F>,
    pub ball_mass: F,
    pub ball_radius: F,
    pub length: F,
    /// Initial lean from upright; positive leans toward `+x`.
    pub initial_angle: F,
    pub gravity: Vec2<F>,
    /// Symmetric force limit. `None` leaves the force unbounded.
    pub max_force: Option<F>,
    /// World sub-steps per `step`. The cart is a dynamic body held by the
    /// rail, so the rod length drifts by roughly `g (dt / sub_steps)^2`.
    pub sub_steps: usize,
}

impl<F: Float> Default for PendulumParams<F> {
    fn default() -> Self {
        PendulumParams {
            rail_start: Vec2::from_f32(50.0, 560.0),
            rail_end: Vec2::from_f32(1150.0, 560.0),
            cart_x: F::from_f32(600.0),
            cart_size: Vec2::from_f32(100.0, 20.0),
            cart_mass: F::from_f32(10000.0),
            cart_anchor: Vec2::from_f32(0.0, -10.0),
            ball_mass: F::from_f32(90.0),
            ball_radius: F::from_f32(15.0),
            length: F::from_f32(280.0),
            initial_angle: F::zero(),
            gravity: Vec2::from_f32(0.0, 981.0),
            max_force: None,
            sub_steps: 8,
        }
    }
}

impl<F: Float> PendulumParams<F> {
    pub fn with_initial_angle(mut self, angle: F) -> Self {
        self.initial_angle = angle;
        self
    }

    pub fn with_max_force(mut self, limit: F) -> Self {
        self.max_force = Some(limit.abs());
        self
    }

    pub fn with_sub_steps(mut self, sub_steps: usize) -> Self {
        self.sub_steps = sub_steps.max(1);
        self
    }

    /// Magnitude of the gravity vector.
    pub fn gravity_magnitude(&self) -> F {
        self.gravity.length()
    }
}

/// Horizontal force on the cart.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendulumInput<F: Float> {
    pub x_force: F,
}

impl<F: Float> PlantInput<F> for PendulumInput<F> {
    fn from_actuation(value: F) -> Self {
        PendulumInput { x_force: value }
    }

    fn actuation(&self) -> F {
        self.x_force
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendulumState<F: Float> {
    pub cart_x: F,
    pub cart_velocity: F,
    /// Lean from upright, positive toward `+x`.
    pub angle: F,
    pub angular_velocity: F,
}

impl<F: Float> PendulumState<F> {
    pub const CART_X: usize = 0;
    pub const CART_VELOCITY: usize = 1;
    pub const ANGLE: usize = 2;
    pub const ANGULAR_VELOCITY: usize = 3;
}

impl<F: Float> PlantState<F> for PendulumState<F> {
    const DIM: usize = 4;

    fn to_vector(&self) -> AllocVec<F> {
        alloc::vec![self.cart_x, self.cart_velocity, self.angle, self.angular_velocity]
    }
}

pub struct InvertedPendulum<F: Float> {
    world: World<F>,
    cart: BodyHandle,
    ball: BodyHandle,
    cart_anchor: Vec2<F>,
    max_force: Option<F>,
    input: PendulumInput<F>,
    input_rejected: bool,
}

impl<F: Float> InvertedPendulum<F> {
    pub fn new(params: PendulumParams<F>) -> Result<Self, SimError> {
        let config = WorldConfig::new()
            .with_gravity(params.gravity)
            .with_sub_steps(params.sub_steps);
        let mut world = World::new(config);
        let ground = world.ground();

        let cart_pos = Vec2::new(params.cart_x, params.rail_start.y);
        let cart_shape = Shape::Box { width: params.cart_size.x, height: params.cart_size.y };
        let cart = world.add_body(Body::dynamic(params.cart_mass, F::zero(), cart_pos)?.with_shape(cart_shape));

        let up = Vertical::Up.axis::<F>();
        let pivot = cart_pos + params.cart_anchor;
        let ball_pos = pivot + up.rotate(params.initial_angle).scale(params.length);
        let ball_shape = Shape::Circle { radius: params.ball_radius };
        let ball_body = Body::dynamic(params.ball_mass, ball_shape.moment(params.ball_mass), ball_pos)?;
        let ball = world.add_body(ball_body.with_shape(ball_shape));

        // Rail last, so the cart ends every step exactly on it.
        world.add_pin_joint(cart, ball, params.cart_anchor, Vec2::zero())?;
        world.add_groove_joint(ground, params.rail_start, params.rail_end, cart, Vec2::zero())?;

        tracing::debug!(
            length = params.length.to_f64(),
            initial_angle = params.initial_angle.to_f64(),
            "inverted pendulum assembled"
        );

        Ok(InvertedPendulum {
            world,
            cart,
            ball,
            cart_anchor: params.cart_anchor,
            max_force: params.max_force,
            input: PendulumInput::default(),
            input_rejected: false,
        })
    }

    pub fn cart(&self) -> BodyHandle {
        self.cart
    }

    pub fn ball(&self) -> BodyHandle {
        self.ball
    }

    pub fn world_mut(&mut self) -> &mut World<F> {
        &mut self.world
    }

    pub fn pivot(&self) -> Vec2<F> {
        self.world.bodies.body(self.cart).local_to_world(self.cart_anchor)
    }

    pub fn rod_length(&self) -> F {
        self.pivot().distance(self.world.bodies.position(self.ball))
    }
}

impl<F: Float> Plant<F> for InvertedPendulum<F> {
    type Input = PendulumInput<F>;
    type State = PendulumState<F>;

    fn set_input(&mut self, input: PendulumInput<F>) -> Result<(), SimError> {
        if !input.is_finite() {
            self.input_rejected = true;
            return Err(SimError::InvalidInput);
        }
        self.input = input;
        self.input_rejected = false;
        Ok(())
    }

    fn input(&self) -> PendulumInput<F> {
        self.input
    }

    fn step_observed<O: StepObserver>(&mut self, dt: F, observer: &mut O) -> Result<(), SimError> {
        check_timestep(dt)?;
        if self.input_rejected {
            return Err(SimError::InvalidInput);
        }
        let force = match self.max_force {
            Some(limit) => self.input.x_force.saturate(limit),
            None => self.input.x_force,
        };
        self.world
            .bodies
            .body_mut(self.cart)
            .apply_force_at_local_point(Vec2::new(force, F::zero()), Vec2::zero());
        self.world.step_observed(dt, observer)
    }

    fn state(&self) -> PendulumState<F> {
        let bodies = &self.world.bodies;
        let cart = bodies.body(self.cart);
        let ball = bodies.body(self.ball);
        let offset = ball.position - self.pivot();
        let relative_velocity = ball.velocity - cart.velocity_at_local_point(self.cart_anchor);
        PendulumState {
            cart_x: cart.position.x,
            cart_velocity: cart.velocity.x,
            angle: angle_from_vertical(offset, Vertical::Up),
            angular_velocity: angular_rate(offset, relative_velocity),
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
    fn ball_starts_above_pivot() {
        let plant: InvertedPendulum<f64> = InvertedPendulum::new(PendulumParams::default()).unwrap();
        assert_eq!(plant.pivot(), Vec2::new(600.0, 550.0));
        let ball = plant.world().bodies.position(plant.ball());
        assert!((ball.y - 270.0).abs() < 1e-9);
        assert!(plant.state().angle.abs() < 1e-12);
    }

    #[test]
    fn lean_right_is_positive() {
        let params = PendulumParams::default().with_initial_angle(0.2);
        let plant: InvertedPendulum<f64> = InvertedPendulum::new(params).unwrap();
        assert!((plant.state().angle - 0.2).abs() < 1e-12);
        assert!((plant.rod_length() - 280.0).abs() < 1e-9);
    }

    #[test]
    fn force_limit_is_applied() {
        let params = PendulumParams::default().with_max_force(1000.0);
        let mut plant: InvertedPendulum<f64> = InvertedPendulum::new(params).unwrap();
        plant.set_input(PendulumInput { x_force: 1.0e9 }).unwrap();
        plant.step(0.01).unwrap();
        // 1000 N on 10 t for 10 ms, ignoring the tiny rod coupling.
        assert!((plant.state().cart_velocity - 1.0e-3).abs() < 1e-4);
    }

    #[test]
    fn rejects_infinite_force() {
        let mut plant: InvertedPendulum<f64> = InvertedPendulum::new(PendulumParams::default()).unwrap();
        assert_eq!(
            plant.set_input(PendulumInput { x_force: f64::INFINITY }),
            Err(SimError::InvalidInput)
        );
    }
}
