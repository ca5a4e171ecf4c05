//! Rigid bodies and the handle-based body store.

use crate::error::SimError;
use crate::float::Float;
use crate::history::History;
use crate::vec::Vec2;
use alloc::vec::Vec as AllocVec;

/// How a body participates in integration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BodyKind {
    /// Never moves under integration. Position may still be set explicitly.
    Static,
    /// Moves with an externally set velocity; ignores forces and gravity.
    Kinematic,
    /// Integrates gravity, forces and torques.
    Dynamic,
}

/// Collision-free shape attached to a body for rendering and debug output.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape<F: Float> {
    Circle { radius: F },
    Box { width: F, height: F },
    Segment { a: Vec2<F>, b: Vec2<F> },
}

impl<F: Float> Shape<F> {
    /// Moment of inertia about the body origin for a uniform body of `mass`.
    pub fn moment(&self, mass: F) -> F {
        match *self {
            Shape::Circle { radius } => mass * radius.squared() * F::half(),
            Shape::Box { width, height } => {
                mass * (width.squared() + height.squared()) / F::from_f32(12.0)
            }
            Shape::Segment { a, b } => {
                // Thin rod about its midpoint, shifted to the body origin.
                let length_sq = (b - a).length_sq();
                let mid = a.lerp(b, F::half());
                mass * length_sq / F::from_f32(12.0) + mass * mid.length_sq()
            }
        }
    }
}

/// Index of a body inside a [`BodySet`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) usize);

impl BodyHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A planar rigid body.
#[derive(Clone, Debug)]
pub struct Body<F: Float> {
    pub kind: BodyKind,
    pub position: Vec2<F>,
    pub velocity: Vec2<F>,
    /// Radians.
    pub angle: F,
    pub angular_velocity: F,
    pub mass: F,
    pub moment: F,
    pub inv_mass: F,
    pub inv_moment: F,
    pub force: Vec2<F>,
    pub torque: F,
    pub shape: Option<Shape<F>>,
    trajectory: Option<History<Vec2<F>>>,
}

impl<F: Float> Body<F> {
    /// A dynamic body. A zero moment locks rotation.
    pub fn dynamic(mass: F, moment: F, position: Vec2<F>) -> Result<Self, SimError> {
        if !mass.is_finite() || mass <= F::zero() || !moment.is_finite() || moment < F::zero() {
            return Err(SimError::InvalidMass);
        }
        let inv_moment = if moment.is_near_zero(F::from_f32(1e-12)) {
            F::zero()
        } else {
            F::one() / moment
        };
        Ok(Body {
            inv_mass: F::one() / mass,
            inv_moment,
            ..Self::immovable(BodyKind::Dynamic, position, mass, moment)
        })
    }

    pub fn kinematic(position: Vec2<F>) -> Self {
        Self::immovable(BodyKind::Kinematic, position, F::zero(), F::zero())
    }

    pub fn fixed(position: Vec2<F>) -> Self {
        Self::immovable(BodyKind::Static, position, F::zero(), F::zero())
    }

    fn immovable(kind: BodyKind, position: Vec2<F>, mass: F, moment: F) -> Self {
        Body {
            kind,
            position,
            velocity: Vec2::zero(),
            angle: F::zero(),
            angular_velocity: F::zero(),
            mass,
            moment,
            inv_mass: F::zero(),
            inv_moment: F::zero(),
            force: Vec2::zero(),
            torque: F::zero(),
            shape: None,
            trajectory: None,
        }
    }

    pub fn with_shape(mut self, shape: Shape<F>) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.kind == BodyKind::Dynamic
    }

    /// Stop torques from spinning the body.
    pub fn lock_rotation(&mut self) {
        self.inv_moment = F::zero();
        self.angular_velocity = F::zero();
    }

    /// Body-local offset rotated into world orientation (not translated).
    pub fn rotated(&self, local: Vec2<F>) -> Vec2<F> {
        local.rotate(self.angle)
    }

    pub fn local_to_world(&self, local: Vec2<F>) -> Vec2<F> {
        self.position + self.rotated(local)
    }

    pub fn world_to_local(&self, world: Vec2<F>) -> Vec2<F> {
        (world - self.position).rotate(-self.angle)
    }

    pub fn velocity_at_local_point(&self, local: Vec2<F>) -> Vec2<F> {
        self.velocity + Vec2::cross_scalar(self.angular_velocity, self.rotated(local))
    }

    /// `force` and `point` are both in body-local coordinates.
    pub fn apply_force_at_local_point(&mut self, force: Vec2<F>, point: Vec2<F>) {
        if !self.is_dynamic() {
            return;
        }
        let world_force = self.rotated(force);
        let r = self.rotated(point);
        self.force += world_force;
        self.torque = self.torque + r.cross(world_force);
    }

    /// `force` and `point` are both in world coordinates.
    pub fn apply_force_at_world_point(&mut self, force: Vec2<F>, point: Vec2<F>) {
        if !self.is_dynamic() {
            return;
        }
        let r = point - self.position;
        self.force += force;
        self.torque = self.torque + r.cross(force);
    }

    pub fn apply_torque(&mut self, torque: F) {
        if self.is_dynamic() {
            self.torque = self.torque + torque;
        }
    }

    pub fn clear_forces(&mut self) {
        self.force = Vec2::zero();
        self.torque = F::zero();
    }

    /// Start recording positions after every world step.
    pub fn enable_trajectory(&mut self, capacity: usize) {
        self.trajectory = Some(History::new(capacity));
    }

    pub fn disable_trajectory(&mut self) {
        self.trajectory = None;
    }

    pub fn trajectory(&self) -> Option<&History<Vec2<F>>> {
        self.trajectory.as_ref()
    }

    pub(crate) fn record_trajectory(&mut self) {
        let position = self.position;
        if let Some(history) = self.trajectory.as_mut() {
            history.push(position);
        }
    }
}

/// Owning store of every body in a world. Handles are never invalidated:
/// bodies live as long as the store.
///
/// # Panics
///
/// The accessors taking a [`BodyHandle`] index directly and panic on a handle
/// minted by another store. Use [`get`](Self::get) for a checked lookup.
#[derive(Clone, Debug, Default)]
pub struct BodySet<F: Float> {
    bodies: AllocVec<Body<F>>,
}

impl<F: Float> BodySet<F> {
    pub fn new() -> Self {
        BodySet { bodies: AllocVec::new() }
    }

    pub fn insert(&mut self, body: Body<F>) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len());
        self.bodies.push(body);
        handle
    }

    /// Create a body of `kind`. `mass` and `moment` are ignored unless dynamic.
    pub fn create(
        &mut self,
        kind: BodyKind,
        mass: F,
        moment: F,
        position: Vec2<F>,
    ) -> Result<BodyHandle, SimError> {
        let body = match kind {
            BodyKind::Static => Body::fixed(position),
            BodyKind::Kinematic => Body::kinematic(position),
            BodyKind::Dynamic => Body::dynamic(mass, moment, position)?,
        };
        Ok(self.insert(body))
    }

    pub fn len(&self) -> usize { self.bodies.len() }
    pub fn is_empty(&self) -> bool { self.bodies.is_empty() }
    /// Panics when `handle` does not belong to this store.
    pub fn body(&self, handle: BodyHandle) -> &Body<F> { &self.bodies[handle.0] }
    pub fn body_mut(&mut self, handle: BodyHandle) -> &mut Body<F> { &mut self.bodies[handle.0] }

    pub fn get(&self, handle: BodyHandle) -> Result<&Body<F>, SimError> {
        self.bodies.get(handle.0).ok_or(SimError::BodyOutOfBounds {
            index: handle.0,
            count: self.bodies.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Body<F>> {
        self.bodies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Body<F>> {
        self.bodies.iter_mut()
    }

    /// Two distinct bodies mutably, in argument order.
    pub fn pair_mut(&mut self, a: BodyHandle, b: BodyHandle) -> (&mut Body<F>, &mut Body<F>) {
        assert_ne!(a.0, b.0, "a joint cannot connect a body to itself");
        if a.0 < b.0 {
            let (left, right) = self.bodies.split_at_mut(b.0);
            (&mut left[a.0], &mut right[0])
        } else {
            let (left, right) = self.bodies.split_at_mut(a.0);
            (&mut right[0], &mut left[b.0])
        }
    }

    pub fn position(&self, handle: BodyHandle) -> Vec2<F> { self.body(handle).position }
    pub fn velocity(&self, handle: BodyHandle) -> Vec2<F> { self.body(handle).velocity }
    pub fn angle(&self, handle: BodyHandle) -> F { self.body(handle).angle }
    pub fn angular_velocity(&self, handle: BodyHandle) -> F { self.body(handle).angular_velocity }

    pub fn set_position(&mut self, handle: BodyHandle, position: Vec2<F>) {
        self.body_mut(handle).position = position;
    }

    /// Static bodies keep a zero velocity.
    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec2<F>) {
        let body = self.body_mut(handle);
        if body.kind != BodyKind::Static {
            body.velocity = velocity;
        }
    }

    pub fn set_angle(&mut self, handle: BodyHandle, angle: F) {
        self.body_mut(handle).angle = angle;
    }

    pub fn set_angular_velocity(&mut self, handle: BodyHandle, angular_velocity: F) {
        let body = self.body_mut(handle);
        if body.kind != BodyKind::Static {
            body.angular_velocity = angular_velocity;
        }
    }
}
