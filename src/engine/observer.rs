//! Engine notifications.

use crate::error::Error;
use crate::population::Population;

/// Receives engine notifications; all methods default to no-ops so
/// implementors override only what they need.
///
/// Notifications fire synchronously on the loop thread. Under asynchronous
/// execution that is the background worker, not the caller's thread.
pub trait EngineObserver: Send + Sync {
    /// The initial population has been evaluated, before generation 1.
    fn on_initial_evaluation_complete(&self, _population: &Population, _evaluations: u64) {}

    /// One operator finished and the intermediate population is current.
    fn on_operator_complete(
        &self,
        _operator: &str,
        _population: &Population,
        _generation: usize,
        _evaluations: u64,
    ) {
    }

    /// A full generation finished.
    fn on_generation_complete(
        &self,
        _population: &Population,
        _generation: usize,
        _evaluations: u64,
    ) {
    }

    /// The run ended, naturally or by cancellation.
    fn on_run_complete(&self, _population: &Population, _generation: usize, _evaluations: u64) {}

    /// A fault stopped a background run. The same error is returned from
    /// [`GeneticEngine::wait`](crate::engine::GeneticEngine::wait).
    fn on_run_exception(&self, _error: &Error) {}
}
