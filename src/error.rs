//! Crate-wide error taxonomy.
//!
//! All fallible operations in the engine return [`Result`]. Configuration
//! problems fail fast at the call that introduced them; retry-bounded
//! failures ([`Error::ChromosomeNotUnique`]) signal that the caller should
//! relax constraints rather than retry.

use thiserror::Error;

/// Errors produced by the genetic-algorithm engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration value (odd population size, zero-length
    /// chromosome, mismatched parent lengths, ...).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The fitness function returned a value outside [0.0, 1.0].
    #[error("fitness function returned {0}, expected a value in [0.0, 1.0]")]
    Evaluation(f64),

    /// A deep clone of a gene produced a different type tag than its source.
    #[error("deep clone of gene produced an inconsistent type tag")]
    GeneCloneInconsistency,

    /// A bounded retry loop failed to produce a unique chromosome.
    #[error("unable to create a unique chromosome: {0}")]
    ChromosomeNotUnique(String),

    /// Ordered crossover was applied to parents that do not share the same
    /// set of gene values.
    #[error(
        "parents are not suitable for ordered crossover: \
         they do not contain the same set of gene values"
    )]
    CrossoverIncompatible,

    /// An operator was invoked on gene types it cannot handle.
    #[error("operator error: {0}")]
    Operator(String),

    /// A ranking query requested more chromosomes than the population holds.
    #[error("population holds {available} chromosomes, {requested} requested")]
    Population { requested: usize, available: usize },

    /// An operation requires a non-empty population.
    #[error("the population contains no chromosomes")]
    EmptyPopulation,

    /// The engine is already executing an asynchronous run.
    #[error("the engine is already running")]
    EngineBusy,

    /// The asynchronous worker thread terminated abnormally.
    #[error("the background run panicked: {0}")]
    RunPanicked(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
