use plantsim::{
    Crane, CraneInput, CraneParams, CraneState, Driver, DriverConfig, InvertedPendulum,
    PendulumInput, PendulumParams, PendulumState, PidController, PiController, Plant, Pole,
    Reference, SimError, StateFeedback, StateSpace, Submarine, SubmarineInput, SubmarineParams,
    SubmarineState,
};

const DT: f64 = 1.0 / 60.0;

fn assert_falls_open_loop(initial: f64) {
    let params = PendulumParams::default().with_initial_angle(initial);
    let mut plant: InvertedPendulum<f64> = InvertedPendulum::new(params).unwrap();
    let mut previous = plant.state().angle;
    for _ in 0..60 {
        plant.step(DT).unwrap();
        let angle = plant.state().angle;
        assert!(angle >= previous, "angle shrank: {} -> {}", previous, angle);
        previous = angle;
    }
    assert!(previous > 2.0 * initial, "final angle {}", previous);
}

#[test]
fn inverted_pendulum_falls_open_loop() {
    assert_falls_open_loop(0.01);
    assert_falls_open_loop(0.05);
}

#[test]
fn inverted_pendulum_leaning_left_falls_left() {
    let params = PendulumParams::default().with_initial_angle(-0.05);
    let mut plant: InvertedPendulum<f64> = InvertedPendulum::new(params).unwrap();
    for _ in 0..60 {
        plant.step(DT).unwrap();
    }
    assert!(plant.state().angle < -0.1);
    assert!(plant.state().angular_velocity < 0.0);
}

#[test]
fn crane_swing_decays_under_pi() {
    let initial = 5.0f64.to_radians();
    let crane: Crane<f64> = Crane::new(CraneParams::default().with_initial_angle(initial)).unwrap();
    let pi = PiController::new(500.0, 50.0, DT).with_channel(CraneState::<f64>::ANGLE);
    let mut driver = Driver::new(crane, pi, DriverConfig::new(DT).with_history(60)).unwrap();

    driver.run(300).unwrap();

    let last_second = driver.history().unwrap();
    let peak = last_second.iter().map(|r| r.state[CraneState::<f64>::ANGLE].abs()).fold(0.0, f64::max);
    assert!(peak < 0.5 * initial, "peak over the last second: {}", peak);
    assert!(driver.plant().state().angle.abs() < 0.5 * initial);
}

#[test]
fn crane_swings_freely_without_control() {
    let initial = 5.0f64.to_radians();
    let mut crane: Crane<f64> = Crane::new(CraneParams::default().with_initial_angle(initial)).unwrap();
    let mut peak: f64 = 0.0;
    for i in 0..300 {
        crane.step(DT).unwrap();
        if i >= 240 {
            peak = peak.max(crane.state().angle.abs());
        }
    }
    assert!(peak > 0.8 * initial, "undamped swing lost amplitude: {}", peak);
}

#[test]
fn crane_displace_load_resets_velocity() {
    let mut crane: Crane<f64> = Crane::new(CraneParams::default()).unwrap();
    for _ in 0..10 {
        crane.set_input(CraneInput { command: 300.0 }).unwrap();
        crane.step(DT).unwrap();
    }
    let pivot = crane.pivot();
    crane.displace_load(pivot + plantsim::Vec2::new(-510.0, 0.0));
    let load = crane.world().bodies.body(crane.load());
    assert_eq!(load.velocity, plantsim::Vec2::zero());
    assert!((crane.state().angle - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
}

#[test]
fn state_feedback_balances_the_pendulum() {
    let params = PendulumParams::default().with_initial_angle(0.1);
    let model = StateSpace::inverted_pendulum(
        params.cart_mass,
        params.ball_mass,
        params.length,
        params.gravity_magnitude(),
    )
    .unwrap();
    let gains = model
        .place_poles(&[Pole::real(-2.0), Pole::real(-2.5), Pole::real(-3.0), Pole::real(-3.5)])
        .unwrap();

    let plant: InvertedPendulum<f64> = InvertedPendulum::new(params).unwrap();
    let reference = Reference::constant(vec![params.cart_x, 0.0, 0.0, 0.0]);
    let mut driver = Driver::new(plant, StateFeedback::from_row(&gains), DriverConfig::new(DT))
        .unwrap()
        .with_reference(reference);

    for _ in 0..600 {
        driver.tick().unwrap();
        assert!(driver.plant().state().angle.abs() < 0.5, "pendulum fell over");
    }
    let state = driver.plant().state();
    assert!(state.angle.abs() < 0.02, "angle {}", state.angle);
    assert!((state.cart_x - params.cart_x).abs() < 20.0, "cart at {}", state.cart_x);
}

#[test]
fn submarine_reaches_commanded_depth() {
    let sub: Submarine<f64> = Submarine::new(SubmarineParams::default()).unwrap();
    let pid = PidController::new(50.0, 1.0, 20.0, DT).with_channel(SubmarineState::<f64>::DEPTH);
    let reference = Reference::schedule(vec![(0.0, vec![400.0, 0.0]), (1.0, vec![300.0, 0.0])]).unwrap();
    let mut driver = Driver::new(sub, pid, DriverConfig::new(DT)).unwrap().with_reference(reference);

    driver.run(60).unwrap();
    assert!((driver.plant().state().depth - 400.0).abs() < 1e-9);

    driver.run(600).unwrap();
    let state = driver.plant().state();
    assert!((state.depth - 300.0).abs() < 2.0, "depth {}", state.depth);
    assert!(state.vertical_velocity.abs() < 1.0);
}

#[test]
fn plants_reject_nan_input() {
    let mut crane: Crane<f64> = Crane::new(CraneParams::default()).unwrap();
    assert_eq!(crane.set_input(CraneInput { command: f64::NAN }), Err(SimError::InvalidInput));

    let mut pendulum: InvertedPendulum<f32> = InvertedPendulum::new(PendulumParams::default()).unwrap();
    assert_eq!(pendulum.set_input(PendulumInput { x_force: f32::NAN }), Err(SimError::InvalidInput));

    let mut sub: Submarine<f64> = Submarine::new(SubmarineParams::default()).unwrap();
    sub.set_input(SubmarineInput { vertical_thrust: 4.0 }).unwrap();
    assert_eq!(sub.set_input(SubmarineInput { vertical_thrust: f64::NEG_INFINITY }), Err(SimError::InvalidInput));
    assert_eq!(sub.input().vertical_thrust, 4.0);
}

#[test]
fn step_fails_after_rejected_input() {
    let mut crane: Crane<f64> = Crane::new(CraneParams::default()).unwrap();
    crane.set_input(CraneInput { command: 100.0 }).unwrap();
    crane.step(DT).unwrap();
    let before = crane.state();

    assert!(crane.set_input(CraneInput { command: f64::INFINITY }).is_err());
    assert_eq!(crane.step(DT), Err(SimError::InvalidInput));
    assert_eq!(crane.state(), before);

    crane.set_input(CraneInput { command: 0.0 }).unwrap();
    assert_eq!(crane.step(DT), Ok(()));

    let mut sub: Submarine<f64> = Submarine::new(SubmarineParams::default()).unwrap();
    assert!(sub.set_input(SubmarineInput { vertical_thrust: f64::NAN }).is_err());
    assert_eq!(sub.step(DT), Err(SimError::InvalidInput));

    let mut pendulum: InvertedPendulum<f64> = InvertedPendulum::new(PendulumParams::default()).unwrap();
    assert!(pendulum.set_input(PendulumInput { x_force: f64::NAN }).is_err());
    assert_eq!(pendulum.step(DT), Err(SimError::InvalidInput));
}

#[test]
fn plants_reject_bad_timestep() {
    let mut crane: Crane<f64> = Crane::new(CraneParams::default()).unwrap();
    let before = crane.state();
    assert_eq!(crane.step(0.0), Err(SimError::InvalidTimestep));
    assert_eq!(crane.state(), before);
}

#[test]
fn state_vectors_follow_index_constants() {
    let pendulum: InvertedPendulum<f64> = InvertedPendulum::new(PendulumParams::default().with_initial_angle(0.2)).unwrap();
    let state = pendulum.state();
    let v = plantsim::PlantState::to_vector(&state);
    assert_eq!(v.len(), 4);
    assert_eq!(v[PendulumState::<f64>::CART_X], state.cart_x);
    assert_eq!(v[PendulumState::<f64>::ANGLE], state.angle);
}

#[test]
fn invalid_mass_is_rejected() {
    let params = CraneParams { load_mass: -1.0, ..CraneParams::<f64>::default() };
    assert_eq!(Crane::new(params).err(), Some(SimError::InvalidMass));
}
