//! General-purpose genetic-algorithm optimization engine.
//!
//! Candidate solutions are [`Chromosome`]s: ordered sequences of typed
//! [`Gene`]s (binary, integer, real, or opaque object values). A
//! [`Population`] of chromosomes is scored by a user-supplied fitness
//! function returning values in `[0.0, 1.0]` (higher is better), then
//! evolved generation by generation through a registered chain of
//! [`operators`]: elitism, crossover, mutation, random replacement, and a
//! solution memory.
//!
//! The [`GeneticEngine`] drives the loop synchronously or on a background
//! worker with cooperative pause/resume and halt, publishing progress to
//! explicit [`EngineObserver`]s.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use evokit::{
//!     BinaryMutate, Chromosome, Crossover, Elite, FitnessFn, GeneticEngine,
//!     Population, PopulationConfig,
//! };
//!
//! // maximize the number of set bits
//! let fitness: FitnessFn = Arc::new(|c: &Chromosome| {
//!     let ones = c.genes().iter().filter(|g| g.binary_value() == 1).count();
//!     ones as f64 / c.len() as f64
//! });
//!
//! let mut rng = evokit::rng::create_rng(42);
//! let population =
//!     Population::random(40, 24, PopulationConfig::default(), &mut rng).unwrap();
//!
//! let mut engine = GeneticEngine::new(population, fitness);
//! engine.add_operator(Box::new(Elite::new(10))).unwrap();
//! engine.add_operator(Box::new(Crossover::new(0.85))).unwrap();
//! engine.add_operator(Box::new(BinaryMutate::new(0.02))).unwrap();
//!
//! engine.run(5_000).unwrap();
//! let best = engine.population().unwrap().get_top(1).unwrap().remove(0);
//! assert!(best.fitness() > 0.5);
//! ```

pub mod chromosome;
pub mod engine;
pub mod error;
pub mod gene;
pub mod operators;
pub mod population;
pub mod rng;

pub use chromosome::{Chromosome, FitnessFn};
pub use engine::{EngineObserver, GeneticEngine, TerminateFn};
pub use error::{Error, Result};
pub use gene::{Gene, GeneType, GeneValue, ObjectValue};
#[allow(deprecated)]
pub use operators::Copy;
pub use operators::{
    BinaryMutate, CopyMethod, Crossover, CrossoverKind, CrossoverPoints, Elite,
    GeneticOperator, Memory, ObjectMutate, ObjectMutation, RandomReplace,
    ReplacementMethod, SwapMutate,
};
pub use population::{
    EvaluationPlan, ParentSelection, Population, PopulationConfig, PreEvaluationHook,
};
