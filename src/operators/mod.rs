//! Genetic operators.
//!
//! Each generation the engine threads the population through a registered
//! chain of operators. An operator reads the current population, fills a
//! fresh one, and reports any fitness evaluations it performed internally so
//! the engine can account for them against its evaluation budget.

mod copy;
mod crossover;
mod elite;
mod memory;
mod mutate;
mod random_replace;

#[allow(deprecated)]
pub use copy::{Copy, CopyMethod};
pub use crossover::{Crossover, CrossoverKind, CrossoverPoints, ReplacementMethod};
pub use elite::Elite;
pub use memory::Memory;
pub use mutate::{BinaryMutate, ObjectMutate, ObjectMutation, SwapMutate};
pub use random_replace::RandomReplace;

use crate::chromosome::FitnessFn;
use crate::error::Result;
use crate::population::Population;

/// A single stage in the generation pipeline.
///
/// `invoke` must treat `current` as read-only and build its output in
/// `next`, which arrives as an empty copy of the current population. The
/// output may differ in size from the input. Disabled operators are skipped
/// by the engine entirely.
pub trait GeneticOperator: Send {
    /// Short name used in notifications and logging.
    fn name(&self) -> &str;

    fn enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    /// Whether this operator reads fitness values, requiring the engine to
    /// re-evaluate the population before it runs.
    fn requires_evaluated_population(&self) -> bool {
        true
    }

    /// Runs the operator, filling `next` from `current`.
    fn invoke(
        &mut self,
        current: &Population,
        next: &mut Population,
        fitness: &FitnessFn,
    ) -> Result<()>;

    /// Fitness evaluations performed inside the last `invoke`, for
    /// accounting. Most operators perform none.
    fn operator_invoked_evaluations(&self) -> usize {
        0
    }
}
