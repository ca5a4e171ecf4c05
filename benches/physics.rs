//! Benchmarks for plantsim plants and control loops.

use criterion::{criterion_group, criterion_main, Criterion};
use plantsim::*;

fn bench_crane_open_loop(c: &mut Criterion) {
    c.bench_function("crane_600_steps", |b| {
        b.iter(|| {
            let mut crane: Crane<f64> = Crane::new(CraneParams::default().with_initial_angle(0.3)).unwrap();
            for _ in 0..600 {
                crane.step(1.0 / 60.0).unwrap();
            }
            crane.state()
        });
    });
}

fn bench_crane_pi_loop(c: &mut Criterion) {
    c.bench_function("crane_pi_driver_600_ticks", |b| {
        b.iter(|| {
            let crane: Crane<f64> = Crane::new(CraneParams::default().with_initial_angle(0.1)).unwrap();
            let pi = PiController::new(500.0, 50.0, 1.0 / 60.0).with_channel(CraneState::<f64>::ANGLE);
            let mut driver = Driver::new(crane, pi, DriverConfig::new(1.0 / 60.0)).unwrap();
            driver.run(600).unwrap();
            driver.plant().state()
        });
    });
}

fn bench_pendulum_state_feedback(c: &mut Criterion) {
    let params = PendulumParams::<f32>::default().with_initial_angle(0.1);
    let model = StateSpace::inverted_pendulum(10000.0, 90.0, 280.0, 981.0).unwrap();
    let gains = model
        .place_poles(&[Pole::real(-2.0), Pole::real(-2.5), Pole::real(-3.0), Pole::real(-3.5)])
        .unwrap();

    c.bench_function("pendulum_state_feedback_600_ticks_f32", |b| {
        b.iter(|| {
            let plant = InvertedPendulum::new(params).unwrap();
            let reference = Reference::constant(vec![600.0f32, 0.0, 0.0, 0.0]);
            let mut driver = Driver::new(plant, StateFeedback::from_row(&gains), DriverConfig::new(1.0 / 60.0))
                .unwrap()
                .with_reference(reference);
            driver.run(600).unwrap();
            driver.plant().state()
        });
    });
}

fn bench_pole_placement(c: &mut Criterion) {
    let model = StateSpace::inverted_pendulum(10000.0, 90.0, 280.0, 981.0).unwrap();
    let poles = [Pole::new(-2.0, 1.0), Pole::new(-2.0, -1.0), Pole::real(-3.0), Pole::real(-4.0)];
    c.bench_function("place_poles_and_discretize", |b| {
        b.iter(|| {
            let k = model.place_poles(&poles).unwrap();
            let sampled = model.discretize(1.0 / 60.0).unwrap();
            (k, sampled.phi)
        });
    });
}

criterion_group!(
    benches,
    bench_crane_open_loop,
    bench_crane_pi_loop,
    bench_pendulum_state_feedback,
    bench_pole_placement
);
criterion_main!(benches);
