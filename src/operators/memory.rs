//! Memory: a side buffer of historically-best solutions.

use crate::chromosome::FitnessFn;
use crate::error::{Error, Result};
use crate::operators::GeneticOperator;
use crate::population::{Population, PopulationConfig};

/// Keeps the fittest solution seen every few generations and reintroduces
/// it when it beats the current population's best.
///
/// Designed for noisy fitness landscapes: the memory is re-evaluated on
/// every invocation because cached scores are assumed stale. Place this
/// operator last in the chain, after the population is fully rebuilt.
pub struct Memory {
    memory: Option<Population>,
    memory_size: usize,
    update_period: usize,
    generation: usize,
    enabled: bool,
    evaluations: usize,
}

impl Memory {
    /// `memory_size` slots, refreshed with the current best every
    /// `update_period` generations. Older entries are overwritten once the
    /// memory is full.
    pub fn new(memory_size: usize, update_period: usize) -> Result<Self> {
        if update_period == 0 {
            return Err(Error::Config(
                "memory update period must be greater than zero".into(),
            ));
        }
        Ok(Memory {
            memory: None,
            memory_size,
            update_period,
            generation: 0,
            enabled: true,
            evaluations: 0,
        })
    }

    pub fn memory_size(&self) -> usize {
        self.memory_size
    }

    /// Shrinking the size while running trims the oldest entries on the
    /// next invocation.
    pub fn set_memory_size(&mut self, memory_size: usize) {
        self.memory_size = memory_size;
    }
}

impl GeneticOperator for Memory {
    fn name(&self) -> &str {
        "memory"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn invoke(
        &mut self,
        current: &Population,
        next: &mut Population,
        fitness: &FitnessFn,
    ) -> Result<()> {
        if current.is_empty() {
            return Err(Error::EmptyPopulation);
        }

        self.evaluations = 0;

        next.chromosomes_mut().clear();
        next.add_range(current.chromosomes().iter().cloned());

        if let Some(memory) = self.memory.as_mut() {
            if memory.size() > self.memory_size {
                memory.chromosomes_mut().truncate(self.memory_size);
            }
        }

        // stale scores are useless on a noisy landscape, so the memory
        // always re-evaluates everything
        let parallel = next.config().parallel;
        let memory = self.memory.get_or_insert_with(|| {
            let config = PopulationConfig::default()
                .with_re_evaluate_all(true)
                .with_parallel(parallel);
            Population::empty(config)
        });

        self.generation += 1;
        if self.generation % self.update_period == 0 {
            let best = next.get_top(1)?.remove(0);
            memory.add(best);
            if memory.size() > self.memory_size {
                // overwrite the oldest entry
                memory.chromosomes_mut().remove(0);
            }
        }

        if !memory.is_empty() {
            self.evaluations = memory.evaluate(fitness)?;

            let remembered = memory.get_top(1)?.remove(0);
            let best_in_population = next.get_top(1)?.remove(0);
            if remembered.fitness() > best_in_population.fitness() {
                next.delete_last();
                next.add(remembered);
            }
        }
        Ok(())
    }

    fn operator_invoked_evaluations(&self) -> usize {
        self.evaluations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chromosome::Chromosome;
    use std::sync::Arc;

    fn ones_fitness() -> FitnessFn {
        Arc::new(|c: &Chromosome| {
            let ones = c.genes().iter().filter(|g| g.binary_value() == 1).count();
            ones as f64 / c.len() as f64
        })
    }

    fn population_of(bits: &[&str]) -> Population {
        let mut population = Population::empty(PopulationConfig::default());
        for b in bits {
            population.add(Chromosome::from_binary_string(b).unwrap());
        }
        population.evaluate(&ones_fitness()).unwrap();
        population
    }

    #[test]
    fn zero_update_period_is_rejected() {
        assert!(matches!(Memory::new(10, 0), Err(Error::Config(_))));
    }

    #[test]
    fn reintroduces_a_remembered_best_after_regression() {
        let mut op = Memory::new(4, 1).unwrap();

        // generation with a strong solution: it gets remembered
        let strong = population_of(&["1111", "1000", "0100", "0010"]);
        let mut next = strong.empty_copy();
        op.invoke(&strong, &mut next, &ones_fitness()).unwrap();
        assert!(op.operator_invoked_evaluations() > 0);

        // a later, weaker generation: the memory puts the best back
        let weak = population_of(&["1000", "0100", "0010", "0001"]);
        let mut next = weak.empty_copy();
        op.invoke(&weak, &mut next, &ones_fitness()).unwrap();

        assert_eq!(next.size(), 4);
        let best = next.get_top(1).unwrap().remove(0);
        assert_eq!(best.to_binary_string(), "1111");
    }

    #[test]
    fn memory_respects_its_capacity() {
        let mut op = Memory::new(2, 1).unwrap();

        for bits in [
            &["1000", "0000"],
            &["1100", "0000"],
            &["1110", "0000"],
            &["1111", "0000"],
        ] {
            let current = population_of(bits.as_slice());
            let mut next = current.empty_copy();
            op.invoke(&current, &mut next, &ones_fitness()).unwrap();
        }

        assert_eq!(op.memory.as_ref().unwrap().size(), 2);
    }
}
