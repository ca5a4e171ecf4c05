use approx::assert_relative_eq;
use plantsim::{AnyController, Controller, PiController, PidController, SimError, StateFeedback};

fn error_sequence() -> Vec<f64> {
    (0..200).map(|i| (i as f64 * 0.13).sin() * 3.0 - 0.5).collect()
}

#[test]
fn pi_is_deterministic_across_instances() {
    let outputs: Vec<Vec<f64>> = (0..5).map(|_| {
        let mut pi = PiController::new(500.0, 50.0, 1.0 / 60.0);
        error_sequence().into_iter().map(|e| pi.compute_control(&[e]).unwrap()).collect()
    }).collect();

    for run in &outputs[1..] {
        assert_eq!(&outputs[0], run);
    }
}

#[test]
fn pid_holds_zero_on_zero_error() {
    let mut pid = PidController::new(12.0, 3.0, 0.7, 1.0 / 60.0);
    for _ in 0..500 {
        assert_eq!(pid.compute_control(&[0.0, 1.0]).unwrap(), 0.0);
    }
    assert_eq!(pid.integral(), 0.0);
}

#[test]
fn pi_integral_has_no_windup_limit() {
    let mut pi = PiController::new(0.0, 1.0, 0.5);
    for _ in 0..1000 {
        pi.update(10.0);
    }
    assert_relative_eq!(pi.integral(), 5000.0);
    assert_relative_eq!(pi.update(0.0), 5000.0);
}

#[test]
fn state_feedback_rejects_short_state() {
    let mut k = StateFeedback::new(vec![1.0, 2.0, 3.0, 4.0]);
    let expected = Err(SimError::DimensionMismatch { expected: 4, actual: 3 });
    assert_eq!(k.feedback(&[1.0, 2.0, 3.0]), expected);
    assert_eq!(k.compute_control(&[1.0, 2.0, 3.0]), expected);
}

#[test]
fn state_feedback_is_negative_dot_product() {
    let k = StateFeedback::new(vec![1.0, -2.0, 0.5, 4.0]);
    assert_relative_eq!(k.feedback(&[2.0, 1.0, 4.0, -1.0]).unwrap(), -(2.0 - 2.0 + 2.0 - 4.0));
}

#[test]
fn state_feedback_from_designed_row() {
    let row = nalgebra::RowVector4::new(1.5, 2.5, -3.5, 4.5);
    let k: StateFeedback<f32> = StateFeedback::from_row(&row);
    assert_eq!(k.gains(), &[1.5f32, 2.5, -3.5, 4.5]);
}

#[test]
fn reset_matches_fresh_controller() {
    let mut used = PidController::new(2.0, 1.0, 0.1, 0.01);
    for e in error_sequence() {
        used.update(e);
    }
    used.reset();
    let mut fresh = PidController::new(2.0, 1.0, 0.1, 0.01);
    for e in error_sequence() {
        assert_eq!(used.update(e), fresh.update(e));
    }
}

#[test]
fn any_controller_resets_inner_state() {
    let mut any: AnyController<f64> = PiController::new(1.0, 1.0, 1.0).into();
    any.compute_control(&[2.0]).unwrap();
    any.reset();
    match &any {
        AnyController::Pi(pi) => assert_eq!(pi.integral(), 0.0),
        other => panic!("unexpected variant {:?}", other),
    }
}

#[test]
fn pid_channel_out_of_range() {
    let mut pid = PidController::new(1.0, 1.0, 1.0, 0.1).with_channel(1);
    assert_eq!(
        pid.compute_control(&[1.0]),
        Err(SimError::DimensionMismatch { expected: 2, actual: 1 })
    );
}
