//! The generation-loop controller.
//!
//! [`GeneticEngine`] owns the population and the registered operator chain
//! and drives them generation by generation, synchronously on the caller's
//! thread or asynchronously on a background worker with cooperative
//! pause/resume and halt.

mod observer;

pub use observer::EngineObserver;

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crate::chromosome::FitnessFn;
use crate::error::{Error, Result};
use crate::operators::GeneticOperator;
use crate::population::Population;

/// Termination predicate: `(population, generation, evaluations)`, true
/// stops the loop after the current generation.
pub type TerminateFn = Box<dyn Fn(&Population, usize, u64) -> bool + Send>;

/// State shared between the controller and a background run.
struct SharedState {
    cancel: AtomicBool,
    paused: Mutex<bool>,
    pause_gate: Condvar,
    evaluations: AtomicU64,
    generation: AtomicUsize,
    running: AtomicBool,
}

impl SharedState {
    fn new() -> Self {
        SharedState {
            cancel: AtomicBool::new(false),
            paused: Mutex::new(false),
            pause_gate: Condvar::new(),
            evaluations: AtomicU64::new(0),
            generation: AtomicUsize::new(0),
            running: AtomicBool::new(false),
        }
    }

    fn lock_paused(&self) -> MutexGuard<'_, bool> {
        self.paused.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn add_evaluations(&self, count: usize) -> u64 {
        self.evaluations
            .fetch_add(count as u64, Ordering::SeqCst)
            .wrapping_add(count as u64)
    }

    /// Blocks while paused; returns once resumed or cancelled.
    fn wait_if_paused(&self) {
        let mut paused = self.lock_paused();
        while *paused && !self.cancel.load(Ordering::SeqCst) {
            paused = self
                .pause_gate
                .wait(paused)
                .unwrap_or_else(|e| e.into_inner());
        }
    }
}

/// Everything a run owns: moved onto the worker thread for async execution
/// and handed back by [`GeneticEngine::wait`].
struct EngineInner {
    population: Population,
    operators: Vec<Box<dyn GeneticOperator>>,
    fitness: FitnessFn,
    observers: Vec<Arc<dyn EngineObserver>>,
}

/// Drives the operator chain over the population.
///
/// States: idle, running, paused, completed or cancelled or faulted.
/// `pause`, `resume` and `halt` act on a cooperative gate checked once per
/// generation; an operator mid-invocation always completes. Pausing has no
/// effect on a synchronous [`run`](GeneticEngine::run).
pub struct GeneticEngine {
    inner: Option<EngineInner>,
    shared: Arc<SharedState>,
    handle: Option<JoinHandle<(EngineInner, Result<()>)>>,
}

impl GeneticEngine {
    pub fn new(population: Population, fitness: FitnessFn) -> Self {
        GeneticEngine {
            inner: Some(EngineInner {
                population,
                operators: Vec::new(),
                fitness,
                observers: Vec::new(),
            }),
            shared: Arc::new(SharedState::new()),
            handle: None,
        }
    }

    /// Appends an operator; operators run in registration order.
    pub fn add_operator(&mut self, operator: Box<dyn GeneticOperator>) -> Result<()> {
        match &mut self.inner {
            Some(inner) => {
                inner.operators.push(operator);
                Ok(())
            }
            None => Err(Error::EngineBusy),
        }
    }

    /// Registers an observer for engine notifications.
    pub fn subscribe(&mut self, observer: Arc<dyn EngineObserver>) -> Result<()> {
        match &mut self.inner {
            Some(inner) => {
                inner.observers.push(observer);
                Ok(())
            }
            None => Err(Error::EngineBusy),
        }
    }

    /// The population, unavailable while a background run owns it.
    pub fn population(&self) -> Option<&Population> {
        self.inner.as_ref().map(|inner| &inner.population)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        *self.shared.lock_paused()
    }

    /// Generations completed so far in the current or last run.
    pub fn generation(&self) -> usize {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Cumulative fitness evaluations across the current or last run.
    pub fn evaluations(&self) -> u64 {
        self.shared.evaluations.load(Ordering::SeqCst)
    }

    /// Runs synchronously until the evaluation budget is spent.
    pub fn run(&mut self, max_evaluations: u64) -> Result<()> {
        self.run_sync(Some(max_evaluations), None)
    }

    /// Runs synchronously until the predicate asks to stop.
    pub fn run_until(&mut self, terminate: TerminateFn) -> Result<()> {
        self.run_sync(None, Some(terminate))
    }

    fn run_sync(
        &mut self,
        max_evaluations: Option<u64>,
        terminate: Option<TerminateFn>,
    ) -> Result<()> {
        let mut inner = self.inner.take().ok_or(Error::EngineBusy)?;
        self.reset_counters();

        let result = main_loop(&mut inner, &self.shared, max_evaluations, &terminate);
        if let Err(error) = &result {
            for observer in &inner.observers {
                observer.on_run_exception(error);
            }
        }
        self.inner = Some(inner);
        result
    }

    /// Starts a background run bounded by the evaluation budget.
    pub fn run_async(&mut self, max_evaluations: u64) -> Result<()> {
        self.spawn(Some(max_evaluations), None)
    }

    /// Starts a background run governed by the predicate.
    pub fn run_async_until(&mut self, terminate: TerminateFn) -> Result<()> {
        self.spawn(None, Some(terminate))
    }

    fn spawn(
        &mut self,
        max_evaluations: Option<u64>,
        terminate: Option<TerminateFn>,
    ) -> Result<()> {
        if self.handle.is_some() {
            return Err(Error::EngineBusy);
        }
        let mut inner = self.inner.take().ok_or(Error::EngineBusy)?;
        self.reset_counters();

        let shared = Arc::clone(&self.shared);
        self.handle = Some(std::thread::spawn(move || {
            let result = main_loop(&mut inner, &shared, max_evaluations, &terminate);
            if let Err(error) = &result {
                shared.running.store(false, Ordering::SeqCst);
                for observer in &inner.observers {
                    observer.on_run_exception(error);
                }
            }
            (inner, result)
        }));
        Ok(())
    }

    /// Suspends a background run at the next generation boundary.
    pub fn pause(&self) {
        *self.shared.lock_paused() = true;
    }

    /// Resumes a paused background run.
    pub fn resume(&self) {
        *self.shared.lock_paused() = false;
        self.shared.pause_gate.notify_all();
    }

    /// Requests cooperative cancellation, observed once per generation. A
    /// paused run is released so it can observe the request.
    pub fn halt(&self) {
        self.shared.cancel.store(true, Ordering::SeqCst);
        *self.shared.lock_paused() = false;
        self.shared.pause_gate.notify_all();
    }

    /// Joins a background run, restores the population to the engine, and
    /// surfaces any fault from the run.
    pub fn wait(&mut self) -> Result<()> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => return Ok(()),
        };
        match handle.join() {
            Ok((inner, result)) => {
                self.inner = Some(inner);
                result
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "background run panicked".to_string());
                Err(Error::RunPanicked(message))
            }
        }
    }

    fn reset_counters(&self) {
        self.shared.cancel.store(false, Ordering::SeqCst);
        self.shared.evaluations.store(0, Ordering::SeqCst);
        self.shared.generation.store(0, Ordering::SeqCst);
        *self.shared.lock_paused() = false;
    }
}

fn main_loop(
    inner: &mut EngineInner,
    shared: &SharedState,
    max_evaluations: Option<u64>,
    terminate: &Option<TerminateFn>,
) -> Result<()> {
    if inner.population.is_empty() {
        return Err(Error::EmptyPopulation);
    }

    shared.running.store(true, Ordering::SeqCst);
    let outcome = drive(inner, shared, max_evaluations, terminate);
    shared.running.store(false, Ordering::SeqCst);
    *shared.lock_paused() = false;

    if outcome.is_ok() {
        let generation = shared.generation.load(Ordering::SeqCst);
        let evaluations = shared.evaluations.load(Ordering::SeqCst);
        for observer in &inner.observers {
            observer.on_run_complete(&inner.population, generation, evaluations);
        }
    }
    outcome
}

fn drive(
    inner: &mut EngineInner,
    shared: &SharedState,
    max_evaluations: Option<u64>,
    terminate: &Option<TerminateFn>,
) -> Result<()> {
    let scored = inner.population.evaluate(&inner.fitness)?;
    let mut evaluations = shared.add_evaluations(scored);

    for observer in &inner.observers {
        observer.on_initial_evaluation_complete(&inner.population, evaluations);
    }

    let mut generation = 0usize;
    loop {
        if let Some(max) = max_evaluations {
            if evaluations >= max {
                break;
            }
        }

        evaluations = run_generation(inner, shared, generation)?;
        generation += 1;
        shared.generation.store(generation, Ordering::SeqCst);
        log::debug!(
            "generation {generation} complete, {evaluations} evaluations, best {:?}",
            inner.population.maximum_fitness()
        );

        for observer in &inner.observers {
            observer.on_generation_complete(&inner.population, generation, evaluations);
        }

        if let Some(terminate) = terminate {
            if terminate(&inner.population, generation, evaluations) {
                break;
            }
        }

        shared.wait_if_paused();
        if shared.cancel.load(Ordering::SeqCst) {
            break;
        }
    }
    Ok(())
}

/// One pass of the operator chain. Each enabled operator's output feeds the
/// next operator's input; the intermediate population is re-evaluated only
/// when the following operator needs fitness values, and always after the
/// last.
fn run_generation(
    inner: &mut EngineInner,
    shared: &SharedState,
    generation: usize,
) -> Result<u64> {
    let enabled: Vec<usize> = inner
        .operators
        .iter()
        .enumerate()
        .filter(|(_, op)| op.enabled())
        .map(|(index, _)| index)
        .collect();

    let mut current = {
        let empty = inner.population.empty_copy();
        std::mem::replace(&mut inner.population, empty)
    };
    let mut evaluations = shared.evaluations.load(Ordering::SeqCst);

    for (position, &index) in enabled.iter().enumerate() {
        let mut processed = current.empty_copy();
        let operator = &mut inner.operators[index];
        operator.invoke(&current, &mut processed, &inner.fitness)?;
        evaluations = shared.add_evaluations(operator.operator_invoked_evaluations());
        current = processed;

        let needs_evaluation = match enabled.get(position + 1) {
            Some(&next_index) => inner.operators[next_index].requires_evaluated_population(),
            None => true,
        };
        if needs_evaluation {
            let scored = current.evaluate(&inner.fitness)?;
            evaluations = shared.add_evaluations(scored);
        }

        let name = inner.operators[index].name().to_string();
        for observer in &inner.observers {
            observer.on_operator_complete(&name, &current, generation + 1, evaluations);
        }
    }

    inner.population = current;
    Ok(evaluations)
}
