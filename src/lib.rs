//! Rigid-body control plants and discrete-time controllers.
//!
//! `plantsim` simulates small planar mechanisms (a gantry crane, an inverted
//! pendulum on a cart, a depth-holding submarine) with a fixed-step
//! integrator, and closes the loop around them with PI, PID or full state
//! feedback controllers. Designed for teaching and tuning control loops:
//! the host owns rendering and input, the crate owns the physics and the
//! control law.
//!
//! # Features
//!
//! - **Rigid bodies**: static, kinematic and dynamic bodies in a handle-based store
//! - **Joints**: pin joints (rods, ropes) and groove joints (rails with hard end stops)
//! - **Plants**: `Crane`, `InvertedPendulum`, `Submarine` behind one `Plant` trait
//! - **Controllers**: `PiController`, `PidController`, `StateFeedback`
//! - **Design tools**: linearization, pole placement and ZOH sampling via `nalgebra`
//! - **Driver**: deterministic sample/compute/actuate/step loop with tick history
//! - **Observable**: monitor world steps via the `StepObserver` trait
//! - **`no_std` compatible**: needs only `alloc`
//!
//! # Example
//!
//! ```
//! use plantsim::{Crane, CraneParams, Driver, DriverConfig, PiController, Plant};
//!
//! let crane = Crane::<f64>::new(CraneParams::default().with_initial_angle(0.1)).unwrap();
//! let pi = PiController::new(500.0, 50.0, 1.0 / 60.0).with_channel(2);
//! let mut driver = Driver::new(crane, pi, DriverConfig::new(1.0 / 60.0)).unwrap();
//! driver.run(60).unwrap();
//! assert!(driver.plant().state().angle.abs() < 0.1);
//! ```

#![no_std]

extern crate alloc;

pub mod float;
pub mod vec;
pub mod math;
pub mod error;
pub mod config;
pub mod observer;
pub mod history;
pub mod body;
pub mod constraint;
pub mod world;
pub mod plant;
pub mod crane;
pub mod pendulum;
pub mod submarine;
pub mod controller;
pub mod linear;
pub mod driver;

// Re-export primary API
pub use float::Float;
pub use vec::Vec2;
pub use math::{clamp, angle_from_vertical, angular_rate, Vertical};
pub use error::SimError;
pub use config::{WorldConfig, DriverConfig};
pub use observer::{StepObserver, NoOpStepObserver};
pub use history::History;
pub use body::{Body, BodyHandle, BodyKind, BodySet, Shape};
pub use constraint::{Constraint, PinJoint, GrooveJoint};
pub use world::World;
pub use plant::{Plant, PlantInput, PlantState};
pub use crane::{Crane, CraneActuator, CraneInput, CraneParams, CraneState};
pub use pendulum::{InvertedPendulum, PendulumInput, PendulumParams, PendulumState};
pub use submarine::{Submarine, SubmarineInput, SubmarineParams, SubmarineState};
pub use controller::{Controller, PiController, PidController, StateFeedback, AnyController};
pub use linear::{StateSpace, DiscreteStateSpace, Pole};
pub use driver::{Driver, Reference, TickRecord};
