//! Linearized plant models and classic state-space design tools.
//!
//! Everything here runs in `f64`: gains are designed once, offline, and
//! handed to [`StateFeedback`](crate::controller::StateFeedback) in the
//! plant's own scalar type.

use crate::error::SimError;
use nalgebra::{Matrix2x4, Matrix4, Matrix5, RowVector4, SMatrix, Vector4};

const RANK_TOLERANCE: f64 = 1e-9;
const POLE_TOLERANCE: f64 = 1e-9;
/// Taylor terms used on the scaled matrix, whose norm is at most 1/2.
const EXP_TERMS: u32 = 18;

/// A point in the complex plane.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pole {
    pub re: f64,
    pub im: f64,
}

impl Pole {
    pub fn new(re: f64, im: f64) -> Self {
        Pole { re, im }
    }

    pub fn real(re: f64) -> Self {
        Pole { re, im: 0.0 }
    }

    pub fn conj(self) -> Self {
        Pole { re: self.re, im: -self.im }
    }

    /// Map a continuous-time pole to its sampled image `exp(s dt)`.
    pub fn to_discrete(self, dt: f64) -> Self {
        let magnitude = libm::exp(self.re * dt);
        let phase = self.im * dt;
        Pole {
            re: magnitude * libm::cos(phase),
            im: magnitude * libm::sin(phase),
        }
    }

    fn is_finite(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }

    fn is_real(self) -> bool {
        libm::fabs(self.im) <= POLE_TOLERANCE
    }

    fn close_to(self, other: Pole) -> bool {
        libm::fabs(self.re - other.re) <= POLE_TOLERANCE * (1.0 + libm::fabs(self.re))
            && libm::fabs(self.im - other.im) <= POLE_TOLERANCE * (1.0 + libm::fabs(self.im))
    }
}

/// Continuous-time single-input model `x' = A x + B u` with four states.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StateSpace {
    pub a: Matrix4<f64>,
    pub b: Vector4<f64>,
}

/// Zero-order-hold sampled model `x[k+1] = Phi x[k] + Gamma u[k]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DiscreteStateSpace {
    pub phi: Matrix4<f64>,
    pub gamma: Vector4<f64>,
    pub dt: f64,
}

impl StateSpace {
    pub fn new(a: Matrix4<f64>, b: Vector4<f64>) -> Self {
        StateSpace { a, b }
    }

    /// Cart-pole about the upright equilibrium, states `[x, x', theta, theta']`
    /// with theta positive toward `+x` and `u` a horizontal force on the cart.
    pub fn inverted_pendulum(
        cart_mass: f64,
        ball_mass: f64,
        length: f64,
        gravity: f64,
    ) -> Result<Self, SimError> {
        if !(cart_mass > 0.0 && ball_mass > 0.0) || !cart_mass.is_finite() || !ball_mass.is_finite() {
            return Err(SimError::InvalidMass);
        }
        if !(length > 0.0) || !length.is_finite() || !gravity.is_finite() {
            return Err(SimError::InvalidGeometry);
        }
        let (m_cart, m_ball, l, g) = (cart_mass, ball_mass, length, gravity);

        #[rustfmt::skip]
        let a = Matrix4::new(
            0.0, 1.0, 0.0,                                  0.0,
            0.0, 0.0, -m_ball * g / m_cart,                 0.0,
            0.0, 0.0, 0.0,                                  1.0,
            0.0, 0.0, (m_cart + m_ball) * g / (m_cart * l), 0.0,
        );
        let b = Vector4::new(0.0, 1.0 / m_cart, 0.0, -1.0 / (m_cart * l));
        Ok(StateSpace { a, b })
    }

    /// `[B, AB, A^2 B, A^3 B]`.
    pub fn controllability_matrix(&self) -> Matrix4<f64> {
        let mut ctrb = Matrix4::zeros();
        let mut column = self.b;
        for i in 0..4 {
            ctrb.set_column(i, &column);
            column = self.a * column;
        }
        ctrb
    }

    /// Full rank test on the column-normalized controllability matrix, so
    /// badly scaled models (heavy carts, long rods) are judged fairly.
    pub fn is_controllable(&self) -> bool {
        let mut ctrb = self.controllability_matrix();
        for mut column in ctrb.column_iter_mut() {
            let norm = column.norm();
            if norm > 0.0 {
                column /= norm;
            }
        }
        ctrb.rank(RANK_TOLERANCE) == 4
    }

    /// `[C; CA; CA^2; CA^3]` for a two-output measurement `y = C x`.
    pub fn observability_matrix(&self, c: &Matrix2x4<f64>) -> SMatrix<f64, 8, 4> {
        let mut obsv = SMatrix::<f64, 8, 4>::zeros();
        let mut block = *c;
        for i in 0..4 {
            obsv.fixed_view_mut::<2, 4>(2 * i, 0).copy_from(&block);
            block = block * self.a;
        }
        obsv
    }

    /// Whether the full state can be reconstructed from `y = C x`. Rows are
    /// normalized before the rank test, as in [`is_controllable`](Self::is_controllable).
    pub fn is_observable(&self, c: &Matrix2x4<f64>) -> bool {
        let mut obsv = self.observability_matrix(c);
        for mut row in obsv.row_iter_mut() {
            let norm = row.norm();
            if norm > 0.0 {
                row /= norm;
            }
        }
        obsv.rank(RANK_TOLERANCE) == 4
    }

    /// Cart position and rod angle, the two quantities a cart-pole rig measures.
    pub fn position_and_angle_output() -> Matrix2x4<f64> {
        #[rustfmt::skip]
        let c = Matrix2x4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
        );
        c
    }

    /// State feedback gain `K` placing the eigenvalues of `A - B K` at `poles`
    /// (Ackermann's formula).
    pub fn place_poles(&self, poles: &[Pole]) -> Result<RowVector4<f64>, SimError> {
        let coefficients = characteristic_polynomial(poles)?;
        if !self.is_controllable() {
            return Err(SimError::Uncontrollable);
        }
        let ctrb_inv = self
            .controllability_matrix()
            .try_inverse()
            .ok_or(SimError::Uncontrollable)?;

        // phi(A) = A^4 + c3 A^3 + c2 A^2 + c1 A + c0 I, by Horner's rule.
        let identity = Matrix4::identity();
        let mut phi = identity;
        for &c in coefficients.iter().skip(1) {
            phi = phi * self.a + identity * c;
        }

        let last_row = ctrb_inv.row(3).into_owned();
        let gain = last_row * phi;
        tracing::debug!(
            k0 = gain[0],
            k1 = gain[1],
            k2 = gain[2],
            k3 = gain[3],
            "poles placed"
        );
        Ok(gain)
    }

    /// Closed-loop dynamics `A - B K`.
    pub fn closed_loop(&self, gain: &RowVector4<f64>) -> Matrix4<f64> {
        self.a - self.b * gain
    }

    /// Sample with a zero-order hold: the exponential of `[[A, B], [0, 0]] dt`
    /// carries `Phi` in its top-left block and `Gamma` in its last column.
    pub fn discretize(&self, dt: f64) -> Result<DiscreteStateSpace, SimError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::InvalidTimestep);
        }
        let mut augmented = Matrix5::zeros();
        augmented.fixed_view_mut::<4, 4>(0, 0).copy_from(&(self.a * dt));
        augmented.fixed_view_mut::<4, 1>(0, 4).copy_from(&(self.b * dt));
        if augmented.iter().any(|x| !x.is_finite()) {
            return Err(SimError::InvalidInput);
        }
        let exp = exp_scaled_taylor(&augmented);
        Ok(DiscreteStateSpace {
            phi: exp.fixed_view::<4, 4>(0, 0).into_owned(),
            gamma: exp.fixed_view::<4, 1>(0, 4).into_owned(),
            dt,
        })
    }
}

impl DiscreteStateSpace {
    pub fn step(&self, state: &Vector4<f64>, input: f64) -> Vector4<f64> {
        self.phi * state + self.gamma * input
    }
}

/// Matrix exponential by scaling and squaring: `exp(M) = exp(M / 2^s)^(2^s)`
/// with `s` chosen so the scaled infinity norm is at most 1/2.
fn exp_scaled_taylor(m: &Matrix5<f64>) -> Matrix5<f64> {
    let mut norm = m
        .row_iter()
        .map(|row| row.iter().map(|x| libm::fabs(*x)).sum::<f64>())
        .fold(0.0f64, f64::max);
    let mut squarings = 0u32;
    let mut scale = 1.0f64;
    while norm > 0.5 {
        norm *= 0.5;
        scale *= 0.5;
        squarings += 1;
    }

    let scaled = m * scale;
    let mut term: Matrix5<f64> = Matrix5::identity();
    let mut sum = Matrix5::identity();
    for k in 1..=EXP_TERMS {
        term = term * scaled / f64::from(k);
        sum += term;
    }
    for _ in 0..squarings {
        sum = sum * sum;
    }
    sum
}

/// Monic coefficients `[1, c3, c2, c1, c0]` of `prod (s - p)`.
fn characteristic_polynomial(poles: &[Pole]) -> Result<[f64; 5], SimError> {
    if poles.len() != 4 || poles.iter().any(|p| !p.is_finite()) {
        return Err(SimError::InvalidPoles);
    }
    for pole in poles.iter().filter(|p| !p.is_real()) {
        let paired = poles.iter().any(|q| q.close_to(pole.conj()));
        if !paired {
            return Err(SimError::InvalidPoles);
        }
    }

    // Complex coefficients, highest power first.
    let mut re = [0.0f64; 5];
    let mut im = [0.0f64; 5];
    re[0] = 1.0;
    for (n, pole) in poles.iter().enumerate() {
        for k in (1..=n + 1).rev() {
            // c[k] -= p * c[k - 1]
            let (cr, ci) = (re[k - 1], im[k - 1]);
            re[k] -= pole.re * cr - pole.im * ci;
            im[k] -= pole.re * ci + pole.im * cr;
        }
    }
    let scale = re.iter().fold(1.0f64, |acc, &c| acc.max(libm::fabs(c)));
    if im.iter().any(|&c| libm::fabs(c) > POLE_TOLERANCE * scale) {
        return Err(SimError::InvalidPoles);
    }
    Ok(re)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pendulum() -> StateSpace {
        StateSpace::inverted_pendulum(10000.0, 90.0, 280.0, 981.0).unwrap()
    }

    /// det(s I - M), evaluated at a real `s`.
    fn char_poly_at(m: &Matrix4<f64>, s: f64) -> f64 {
        (Matrix4::identity() * s - m).determinant()
    }

    #[test]
    fn polynomial_from_real_and_complex_poles() {
        let poles = [Pole::real(-1.0), Pole::real(-2.0), Pole::new(-1.0, 1.0), Pole::new(-1.0, -1.0)];
        // (s^2 + 3s + 2)(s^2 + 2s + 2) = s^4 + 5s^3 + 10s^2 + 10s + 4
        let c = characteristic_polynomial(&poles).unwrap();
        assert_relative_eq!(c[1], 5.0, epsilon = 1e-12);
        assert_relative_eq!(c[2], 10.0, epsilon = 1e-12);
        assert_relative_eq!(c[3], 10.0, epsilon = 1e-12);
        assert_relative_eq!(c[4], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn unpaired_complex_pole_is_rejected() {
        let poles = [Pole::real(-1.0), Pole::real(-2.0), Pole::new(-1.0, 1.0), Pole::real(-3.0)];
        assert_eq!(pendulum().place_poles(&poles), Err(SimError::InvalidPoles));
        assert_eq!(pendulum().place_poles(&poles[..3]), Err(SimError::InvalidPoles));
    }

    #[test]
    fn cart_pole_is_controllable() {
        assert!(pendulum().is_controllable());
    }

    #[test]
    fn decoupled_input_is_uncontrollable() {
        let mut model = pendulum();
        model.b = Vector4::new(0.0, 1.0, 0.0, 0.0);
        model.a[(1, 2)] = 0.0;
        assert!(!model.is_controllable());
        let poles = [Pole::real(-1.0), Pole::real(-2.0), Pole::real(-3.0), Pole::real(-4.0)];
        assert_eq!(model.place_poles(&poles), Err(SimError::Uncontrollable));
    }

    #[test]
    fn placed_poles_are_closed_loop_eigenvalues() {
        let model = pendulum();
        let poles = [Pole::real(-1.0), Pole::real(-2.0), Pole::real(-3.0), Pole::real(-4.0)];
        let k = model.place_poles(&poles).unwrap();
        let closed = model.closed_loop(&k);
        for pole in poles {
            assert!(libm::fabs(char_poly_at(&closed, pole.re)) < 1e-6);
        }
        // Product of the eigenvalues.
        assert_relative_eq!(closed.determinant(), 24.0, max_relative = 1e-6);
    }

    #[test]
    fn zoh_of_double_integrator() {
        let mut a = Matrix4::zeros();
        a[(0, 1)] = 1.0;
        let model = StateSpace::new(a, Vector4::new(0.0, 1.0, 0.0, 0.0));
        let d = model.discretize(0.1).unwrap();
        assert_relative_eq!(d.phi, Matrix4::identity() + a * 0.1, epsilon = 1e-12);
        assert_relative_eq!(d.gamma, Vector4::new(0.005, 0.1, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn zoh_of_unstable_scalar_mode() {
        // x0' = 3 x0 + u: Phi = e^{3 dt}, Gamma = (e^{3 dt} - 1) / 3.
        let mut a = Matrix4::zeros();
        a[(0, 0)] = 3.0;
        let model = StateSpace::new(a, Vector4::new(1.0, 0.0, 0.0, 0.0));
        let d = model.discretize(0.5).unwrap();
        let growth = libm::exp(1.5);
        assert_relative_eq!(d.phi[(0, 0)], growth, max_relative = 1e-12);
        assert_relative_eq!(d.gamma[0], (growth - 1.0) / 3.0, max_relative = 1e-12);
        assert_eq!(d.phi[(1, 1)], 1.0);
    }

    #[test]
    fn discretized_pendulum_matches_small_step_euler() {
        let model = pendulum();
        let d = model.discretize(1.0 / 60.0).unwrap();
        let x0 = Vector4::new(0.0, 0.0, 0.05, 0.0);

        let mut x = x0;
        let h = 1.0 / 60.0 / 20_000.0;
        for _ in 0..20_000 {
            x += (model.a * x + model.b * 100.0) * h;
        }
        assert_relative_eq!(d.step(&x0, 100.0), x, max_relative = 1e-3);
    }

    #[test]
    fn pendulum_is_observable_from_position_and_angle() {
        let c = StateSpace::position_and_angle_output();
        assert!(pendulum().is_observable(&c));
    }

    #[test]
    fn cart_position_is_invisible_to_the_angle() {
        let c = Matrix2x4::new(0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!(!pendulum().is_observable(&c));
    }

    #[test]
    fn discretize_rejects_non_finite_model() {
        let mut model = pendulum();
        model.a[(0, 1)] = f64::NAN;
        assert_eq!(model.discretize(0.1), Err(SimError::InvalidInput));
    }

    #[test]
    fn discretize_rejects_bad_step() {
        assert_eq!(pendulum().discretize(0.0), Err(SimError::InvalidTimestep));
    }

    #[test]
    fn discrete_pole_mapping() {
        let z = Pole::real(-2.0).to_discrete(0.1);
        assert_relative_eq!(z.re, libm::exp(-0.2), epsilon = 1e-15);
        assert_eq!(z.im, 0.0);

        let z = Pole::new(0.0, core::f64::consts::PI).to_discrete(0.5);
        assert_relative_eq!(z.re, 0.0, epsilon = 1e-15);
        assert_relative_eq!(z.im, 1.0, epsilon = 1e-15);
    }

    #[test]
    fn invalid_model_parameters() {
        assert_eq!(StateSpace::inverted_pendulum(0.0, 1.0, 1.0, 9.81), Err(SimError::InvalidMass));
        assert_eq!(StateSpace::inverted_pendulum(1.0, 1.0, 0.0, 9.81), Err(SimError::InvalidGeometry));
    }
}
