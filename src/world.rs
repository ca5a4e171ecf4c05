//! Fixed-step rigid body world: body store, joints and integrator.

use crate::body::{Body, BodyHandle, BodyKind, BodySet};
use crate::config::WorldConfig;
use crate::constraint::{Constraint, GrooveJoint, PinJoint};
use crate::error::SimError;
use crate::float::Float;
use crate::observer::{NoOpStepObserver, StepObserver};
use crate::vec::Vec2;
use alloc::vec::Vec as AllocVec;

/// Bodies and joints advanced together by semi-implicit Euler.
#[derive(Clone, Debug)]
pub struct World<F: Float> {
    pub bodies: BodySet<F>,
    pub config: WorldConfig<F>,
    joints: AllocVec<Constraint<F>>,
    ground: BodyHandle,
    time: F,
}

impl<F: Float> World<F> {
    /// A world with a single static ground body at the origin.
    pub fn new(config: WorldConfig<F>) -> Self {
        let mut bodies = BodySet::new();
        let ground = bodies.insert(Body::fixed(Vec2::zero()));
        World {
            bodies,
            config,
            joints: AllocVec::new(),
            ground,
            time: F::zero(),
        }
    }

    /// The static body that anchors rails and pivots.
    pub fn ground(&self) -> BodyHandle {
        self.ground
    }

    pub fn time(&self) -> F {
        self.time
    }

    pub fn add_body(&mut self, body: Body<F>) -> BodyHandle {
        self.bodies.insert(body)
    }

    pub fn create_body(
        &mut self,
        kind: BodyKind,
        mass: F,
        moment: F,
        position: Vec2<F>,
    ) -> Result<BodyHandle, SimError> {
        self.bodies.create(kind, mass, moment, position)
    }

    /// Pin two bodies at their current anchor separation. Returns the joint index.
    pub fn add_pin_joint(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
        anchor_a: Vec2<F>,
        anchor_b: Vec2<F>,
    ) -> Result<usize, SimError> {
        let joint = PinJoint::new(&self.bodies, a, b, anchor_a, anchor_b)?;
        Ok(self.push_joint(Constraint::Pin(joint)))
    }

    /// Constrain `slider`'s `anchor` to the segment `start..end` of a static `frame`.
    pub fn add_groove_joint(
        &mut self,
        frame: BodyHandle,
        start: Vec2<F>,
        end: Vec2<F>,
        slider: BodyHandle,
        anchor: Vec2<F>,
    ) -> Result<usize, SimError> {
        let joint = GrooveJoint::new(&self.bodies, frame, slider, start, end, anchor)?;
        Ok(self.push_joint(Constraint::Groove(joint)))
    }

    fn push_joint(&mut self, joint: Constraint<F>) -> usize {
        self.joints.push(joint);
        self.joints.len() - 1
    }

    pub fn joints(&self) -> &[Constraint<F>] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> Option<&Constraint<F>> {
        self.joints.get(index)
    }

    pub fn step(&mut self, dt: F) -> Result<(), SimError> {
        self.step_observed(dt, &mut NoOpStepObserver)
    }

    /// Advance by `dt`, split into `config.sub_steps` equal sub-steps.
    pub fn step_observed<O: StepObserver>(&mut self, dt: F, observer: &mut O) -> Result<(), SimError> {
        check_timestep(dt)?;
        let sub_steps = self.config.sub_steps.max(1);
        let h = dt / F::from_f32(sub_steps as f32);
        let gravity = self.config.gravity;
        let damping = self.config.damping;

        for _ in 0..sub_steps {
            for body in self.bodies.iter_mut() {
                integrate(body, gravity, damping, h);
            }
            observer.on_integrate();

            for (i, joint) in self.joints.iter().enumerate() {
                joint.solve(&mut self.bodies);
                observer.on_constraint_solved(i);
            }
        }

        for body in self.bodies.iter_mut() {
            body.clear_forces();
            body.record_trajectory();
        }
        self.time = self.time + dt;
        tracing::trace!(time = self.time.to_f64(), sub_steps, "world step");
        observer.on_step_complete();
        Ok(())
    }
}

/// `dt` must be finite and positive.
pub fn check_timestep<F: Float>(dt: F) -> Result<(), SimError> {
    if dt.is_finite() && dt > F::zero() {
        Ok(())
    } else {
        Err(SimError::InvalidTimestep)
    }
}

fn integrate<F: Float>(body: &mut Body<F>, gravity: Vec2<F>, damping: F, h: F) {
    match body.kind {
        BodyKind::Static => return,
        BodyKind::Kinematic => {}
        BodyKind::Dynamic => {
            let accel = gravity + body.force.scale(body.inv_mass);
            body.velocity = (body.velocity + accel.scale(h)).scale(damping);
            body.angular_velocity =
                (body.angular_velocity + body.torque * body.inv_moment * h) * damping;
        }
    }
    body.position += body.velocity.scale(h);
    body.angle = body.angle + body.angular_velocity * h;
}
