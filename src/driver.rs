//! Closed-loop simulation driver.
//!
//! A [`Driver`] owns one plant and one controller and advances both in
//! lockstep. The host decides when to call [`Driver::tick`]; nothing here
//! reads a clock.

use core::cmp::Ordering;

use crate::config::DriverConfig;
use crate::controller::Controller;
use crate::error::SimError;
use crate::float::Float;
use crate::history::History;
use crate::plant::{Plant, PlantInput, PlantState};
use crate::world::check_timestep;
use alloc::vec::Vec as AllocVec;

/// Reference signal sampled at simulation time.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reference<F: Float> {
    Constant(AllocVec<F>),
    /// `(start_time, value)` pairs sorted by start time. Each value holds
    /// until the next start; before the first start the first value holds.
    Schedule(AllocVec<(F, AllocVec<F>)>),
}

impl<F: Float> Reference<F> {
    pub fn constant(value: AllocVec<F>) -> Self {
        Reference::Constant(value)
    }

    /// Regulate every state to zero.
    pub fn zeros(dim: usize) -> Self {
        Reference::Constant(alloc::vec![F::zero(); dim])
    }

    /// Piecewise-constant schedule. Every step must have the same length.
    pub fn schedule(mut steps: AllocVec<(F, AllocVec<F>)>) -> Result<Self, SimError> {
        if let Some(first) = steps.first() {
            let expected = first.1.len();
            if let Some((_, bad)) = steps.iter().find(|(_, v)| v.len() != expected) {
                return Err(SimError::DimensionMismatch { expected, actual: bad.len() });
            }
        }
        if steps.iter().any(|(t, _)| !t.is_finite()) {
            return Err(SimError::InvalidInput);
        }
        steps.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        Ok(Reference::Schedule(steps))
    }

    pub fn at(&self, time: F) -> &[F] {
        match self {
            Reference::Constant(value) => value,
            Reference::Schedule(steps) => {
                let mut current: &[F] = steps.first().map(|(_, v)| v.as_slice()).unwrap_or(&[]);
                for (start, value) in steps {
                    if *start > time {
                        break;
                    }
                    current = value;
                }
                current
            }
        }
    }
}

/// What happened during one tick.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickRecord<F: Float> {
    pub tick: u64,
    /// Simulation time at which the state was sampled.
    pub time: F,
    pub state: AllocVec<F>,
    pub error: AllocVec<F>,
    /// Actuation handed to the plant, after the disturbance and the limit.
    pub actuation: F,
    pub saturated: bool,
}

pub struct Driver<F: Float, P: Plant<F>, C: Controller<F>> {
    plant: P,
    controller: C,
    config: DriverConfig<F>,
    reference: Reference<F>,
    disturbance: F,
    control_active: bool,
    ticks: u64,
    time: F,
    history: Option<History<TickRecord<F>>>,
}

impl<F: Float, P: Plant<F>, C: Controller<F>> Driver<F, P, C> {
    /// Regulates to a zero reference until [`set_reference`](Self::set_reference).
    pub fn new(plant: P, controller: C, config: DriverConfig<F>) -> Result<Self, SimError> {
        check_timestep(config.dt)?;
        let history = (config.history_capacity > 0).then(|| History::new(config.history_capacity));
        Ok(Driver {
            plant,
            controller,
            reference: Reference::zeros(<P::State as PlantState<F>>::DIM),
            disturbance: F::zero(),
            control_active: config.control_active,
            ticks: 0,
            time: F::zero(),
            history,
            config,
        })
    }

    pub fn with_reference(mut self, reference: Reference<F>) -> Self {
        self.reference = reference;
        self
    }

    /// Sample, compute, actuate and step once.
    pub fn tick(&mut self) -> Result<TickRecord<F>, SimError> {
        let result = self.advance();
        if let Err(err) = &result {
            tracing::warn!(tick = self.ticks, error = %err, "tick failed");
        }
        result
    }

    fn advance(&mut self) -> Result<TickRecord<F>, SimError> {
        let state = self.plant.state().to_vector();
        let reference = self.reference.at(self.time);
        if reference.len() != state.len() {
            return Err(SimError::DimensionMismatch {
                expected: state.len(),
                actual: reference.len(),
            });
        }
        let error: AllocVec<F> = reference.iter().zip(&state).map(|(&r, &x)| r - x).collect();

        // An inactive controller is not consulted, so its integrators hold.
        let control = if self.control_active {
            self.controller.compute_control(&error)?
        } else {
            F::zero()
        };

        let requested = control + self.disturbance;
        if !requested.is_finite() {
            return Err(SimError::InvalidInput);
        }
        let actuation = match self.config.max_actuation {
            Some(limit) => requested.saturate(limit),
            None => requested,
        };
        let saturated = actuation != requested;

        self.plant.set_input(<P::Input as PlantInput<F>>::from_actuation(actuation))?;
        self.plant.step(self.config.dt)?;

        let record = TickRecord {
            tick: self.ticks,
            time: self.time,
            state,
            error,
            actuation,
            saturated,
        };
        tracing::trace!(
            tick = record.tick,
            time = record.time.to_f64(),
            actuation = actuation.to_f64(),
            saturated,
            "tick"
        );

        self.ticks += 1;
        self.time = self.time + self.config.dt;
        if let Some(history) = self.history.as_mut() {
            history.push(record.clone());
        }
        Ok(record)
    }

    /// Tick `count` times, stopping at the first error.
    pub fn run(&mut self, count: usize) -> Result<(), SimError> {
        for _ in 0..count {
            self.tick()?;
        }
        Ok(())
    }

    /// Flip closed-loop control on or off. Returns the new setting.
    pub fn toggle_control(&mut self) -> bool {
        self.set_control_active(!self.control_active);
        self.control_active
    }

    pub fn set_control_active(&mut self, active: bool) {
        if active != self.control_active {
            tracing::debug!(active, time = self.time.to_f64(), "control toggled");
        }
        self.control_active = active;
    }

    pub fn is_control_active(&self) -> bool {
        self.control_active
    }

    /// Added to the controller output every tick, before the limit. With
    /// control off this is a manual override.
    pub fn set_disturbance(&mut self, disturbance: F) {
        self.disturbance = disturbance;
    }

    pub fn disturbance(&self) -> F {
        self.disturbance
    }

    pub fn set_reference(&mut self, reference: Reference<F>) {
        self.reference = reference;
    }

    pub fn reference(&self) -> &Reference<F> {
        &self.reference
    }

    pub fn plant(&self) -> &P {
        &self.plant
    }

    pub fn plant_mut(&mut self) -> &mut P {
        &mut self.plant
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    pub fn config(&self) -> &DriverConfig<F> {
        &self.config
    }

    pub fn time(&self) -> F {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn history(&self) -> Option<&History<TickRecord<F>>> {
        self.history.as_ref()
    }

    pub fn into_parts(self) -> (P, C) {
        (self.plant, self.controller)
    }
}
