//! Joint constraints between bodies: pin and groove.
//!
//! Each joint is resolved once per sub-step, after integration, with a
//! positional projection followed by a velocity projection. Plants in this
//! crate have at most one pin and one groove, so there is no iterative
//! solver: joints are applied in construction order and cross-joint
//! convergence is not attempted.

use crate::body::{Body, BodyHandle, BodyKind, BodySet};
use crate::error::SimError;
use crate::float::Float;
use crate::vec::Vec2;

/// A joint that can be resolved against a body store.
#[derive(Clone, Debug)]
pub enum Constraint<F: Float> {
    Pin(PinJoint<F>),
    Groove(GrooveJoint<F>),
}

impl<F: Float> Constraint<F> {
    pub fn solve(&self, bodies: &mut BodySet<F>) {
        match self {
            Constraint::Pin(c) => c.solve(bodies),
            Constraint::Groove(c) => c.solve(bodies),
        }
    }

    /// Remaining positional violation, in world units.
    pub fn violation(&self, bodies: &BodySet<F>) -> F {
        match self {
            Constraint::Pin(c) => c.violation(bodies),
            Constraint::Groove(c) => c.violation(bodies),
        }
    }
}

/// Holds an anchor on each of two bodies at a fixed separation.
#[derive(Clone, Debug)]
pub struct PinJoint<F: Float> {
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub anchor_a: Vec2<F>,
    pub anchor_b: Vec2<F>,
    pub rest_length: F,
}

/// Keeps the slider's anchor on a segment fixed to a static frame.
#[derive(Clone, Debug)]
pub struct GrooveJoint<F: Float> {
    pub frame: BodyHandle,
    pub slider: BodyHandle,
    /// Groove endpoints in the frame's local coordinates.
    pub groove_a: Vec2<F>,
    pub groove_b: Vec2<F>,
    /// Anchor in the slider's local coordinates.
    pub anchor: Vec2<F>,
}

fn eps<F: Float>() -> F {
    F::from_f32(1e-9)
}

impl<F: Float> PinJoint<F> {
    /// Rest length is taken from the current pose of both bodies.
    pub fn new(
        bodies: &BodySet<F>,
        a: BodyHandle,
        b: BodyHandle,
        anchor_a: Vec2<F>,
        anchor_b: Vec2<F>,
    ) -> Result<Self, SimError> {
        let body_a = bodies.get(a)?;
        let body_b = bodies.get(b)?;
        if a == b {
            return Err(SimError::InvalidGeometry);
        }
        let rest_length = body_a.local_to_world(anchor_a).distance(body_b.local_to_world(anchor_b));
        Ok(PinJoint { a, b, anchor_a, anchor_b, rest_length })
    }

    pub fn world_anchors(&self, bodies: &BodySet<F>) -> (Vec2<F>, Vec2<F>) {
        (
            bodies.body(self.a).local_to_world(self.anchor_a),
            bodies.body(self.b).local_to_world(self.anchor_b),
        )
    }

    pub fn separation(&self, bodies: &BodySet<F>) -> F {
        let (pa, pb) = self.world_anchors(bodies);
        pa.distance(pb)
    }

    pub fn violation(&self, bodies: &BodySet<F>) -> F {
        (self.separation(bodies) - self.rest_length).abs()
    }

    pub fn solve(&self, bodies: &mut BodySet<F>) {
        let (a, b) = bodies.pair_mut(self.a, self.b);
        if (a.inv_mass + b.inv_mass + a.inv_moment + b.inv_moment).is_near_zero(eps()) {
            return; // both immovable
        }
        if self.rest_length > eps() {
            self.solve_distance(a, b);
        } else {
            self.solve_point(a, b);
        }
    }

    fn solve_distance(&self, a: &mut Body<F>, b: &mut Body<F>) {
        let ra = a.rotated(self.anchor_a);
        let rb = b.rotated(self.anchor_b);
        let delta = (b.position + rb) - (a.position + ra);
        let dist = delta.length();
        if dist.is_near_zero(eps()) {
            return; // direction undefined
        }
        let n = delta.scale(F::one() / dist);

        let rna = ra.cross(n);
        let rnb = rb.cross(n);
        let k = a.inv_mass + b.inv_mass + a.inv_moment * rna.squared() + b.inv_moment * rnb.squared();
        if k.is_near_zero(eps()) {
            return;
        }

        // Position: pull the anchors back to the rest separation.
        let lambda = -(dist - self.rest_length) / k;
        a.position -= n.scale(lambda * a.inv_mass);
        a.angle = a.angle - a.inv_moment * rna * lambda;
        b.position += n.scale(lambda * b.inv_mass);
        b.angle = b.angle + b.inv_moment * rnb * lambda;

        // Velocity: remove relative motion along the link.
        let v_rel = b.velocity_at_local_point(self.anchor_b) - a.velocity_at_local_point(self.anchor_a);
        let impulse = n.scale(-v_rel.dot(n) / k);
        apply_impulse(a, ra, -impulse);
        apply_impulse(b, rb, impulse);
    }

    fn solve_point(&self, a: &mut Body<F>, b: &mut Body<F>) {
        let ra = a.rotated(self.anchor_a);
        let rb = b.rotated(self.anchor_b);

        // Position: drive the full violation vector to zero.
        let error = (b.position + rb) - (a.position + ra);
        if let Some(correction) = solve_point_mass(a, b, ra, rb, -error) {
            a.position -= correction.scale(a.inv_mass);
            a.angle = a.angle - a.inv_moment * ra.cross(correction);
            b.position += correction.scale(b.inv_mass);
            b.angle = b.angle + b.inv_moment * rb.cross(correction);
        }

        let v_rel = b.velocity_at_local_point(self.anchor_b) - a.velocity_at_local_point(self.anchor_a);
        if let Some(impulse) = solve_point_mass(a, b, ra, rb, -v_rel) {
            apply_impulse(a, ra, -impulse);
            apply_impulse(b, rb, impulse);
        }
    }
}

fn apply_impulse<F: Float>(body: &mut Body<F>, r: Vec2<F>, impulse: Vec2<F>) {
    body.velocity += impulse.scale(body.inv_mass);
    body.angular_velocity = body.angular_velocity + body.inv_moment * r.cross(impulse);
}

/// Solve `K p = rhs` for the 2x2 point-constraint effective mass `K`.
fn solve_point_mass<F: Float>(
    a: &Body<F>,
    b: &Body<F>,
    ra: Vec2<F>,
    rb: Vec2<F>,
    rhs: Vec2<F>,
) -> Option<Vec2<F>> {
    let m = a.inv_mass + b.inv_mass;
    let (ia, ib) = (a.inv_moment, b.inv_moment);
    let k11 = m + ia * ra.y.squared() + ib * rb.y.squared();
    let k12 = -ia * ra.x * ra.y - ib * rb.x * rb.y;
    let k22 = m + ia * ra.x.squared() + ib * rb.x.squared();
    let det = k11 * k22 - k12 * k12;
    if det.is_near_zero(F::from_f32(1e-18)) {
        return None;
    }
    let inv_det = F::one() / det;
    Some(Vec2::new(
        (k22 * rhs.x - k12 * rhs.y) * inv_det,
        (k11 * rhs.y - k12 * rhs.x) * inv_det,
    ))
}

impl<F: Float> GrooveJoint<F> {
    pub fn new(
        bodies: &BodySet<F>,
        frame: BodyHandle,
        slider: BodyHandle,
        groove_a: Vec2<F>,
        groove_b: Vec2<F>,
        anchor: Vec2<F>,
    ) -> Result<Self, SimError> {
        if bodies.get(frame)?.kind != BodyKind::Static {
            return Err(SimError::FrameNotStatic);
        }
        if bodies.get(slider)?.kind == BodyKind::Static || frame == slider {
            return Err(SimError::InvalidGeometry);
        }
        if (groove_b - groove_a).length_sq().is_near_zero(eps()) {
            return Err(SimError::InvalidGeometry);
        }
        Ok(GrooveJoint { frame, slider, groove_a, groove_b, anchor })
    }

    /// Groove endpoints in world coordinates.
    pub fn world_groove(&self, bodies: &BodySet<F>) -> (Vec2<F>, Vec2<F>) {
        let frame = bodies.body(self.frame);
        (frame.local_to_world(self.groove_a), frame.local_to_world(self.groove_b))
    }

    /// Signed offset of the slider anchor from the groove line.
    pub fn perpendicular_offset(&self, bodies: &BodySet<F>) -> F {
        let (ga, gb) = self.world_groove(bodies);
        let tangent = (gb - ga).normalize();
        let anchor = bodies.body(self.slider).local_to_world(self.anchor);
        tangent.perp().dot(anchor - ga)
    }

    pub fn violation(&self, bodies: &BodySet<F>) -> F {
        let (ga, gb) = self.world_groove(bodies);
        let anchor = bodies.body(self.slider).local_to_world(self.anchor);
        anchor.distance(closest_on_segment(ga, gb, anchor).0)
    }

    pub fn solve(&self, bodies: &mut BodySet<F>) {
        let (ga, gb) = self.world_groove(bodies);
        let tangent = (gb - ga).normalize();
        let normal = tangent.perp();
        let slider = bodies.body_mut(self.slider);

        let anchor = slider.local_to_world(self.anchor);
        let (target, stop) = closest_on_segment(ga, gb, anchor);
        slider.position += target - anchor;

        // The frame is static, so the whole correction lands on the slider.
        let v = slider.velocity_at_local_point(self.anchor);
        let mut removed = normal.scale(v.dot(normal));
        let along = v.dot(tangent);
        let into_stop = match stop {
            Stop::Start => along < F::zero(),
            Stop::End => along > F::zero(),
            Stop::None => false,
        };
        if into_stop {
            removed += tangent.scale(along);
            tracing::trace!(along = along.to_f64(), "groove end stop reached");
        }
        slider.velocity -= removed;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Stop {
    None,
    Start,
    End,
}

fn closest_on_segment<F: Float>(a: Vec2<F>, b: Vec2<F>, p: Vec2<F>) -> (Vec2<F>, Stop) {
    let ab = b - a;
    let t = (p - a).dot(ab) / ab.length_sq();
    if t <= F::zero() {
        (a, Stop::Start)
    } else if t >= F::one() {
        (b, Stop::End)
    } else {
        (a + ab.scale(t), Stop::None)
    }
}
