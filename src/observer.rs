//! Step observer trait for monitoring simulation progress.

/// Trait for observing world steps.
///
/// Implement this trait to monitor integrator and solver progress (e.g., for
/// debugging, visualization, or profiling). All methods have default no-op
/// implementations.
pub trait StepObserver {
    /// Called after every body has been integrated for one sub-step.
    fn on_integrate(&mut self) {}

    /// Called after the joint at `index` (construction order) was resolved.
    fn on_constraint_solved(&mut self, _index: usize) {}

    /// Called when a simulation step is fully complete.
    fn on_step_complete(&mut self) {}
}

/// A no-op observer that does nothing. Use as default when no observation needed.
pub struct NoOpStepObserver;

impl StepObserver for NoOpStepObserver {}
