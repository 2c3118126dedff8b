//! Elitism: protect the fittest chromosomes from destructive operators.

use crate::chromosome::FitnessFn;
use crate::error::{Error, Result};
use crate::operators::GeneticOperator;
use crate::population::Population;

/// Carries the whole population forward and re-marks the top N% as elite.
///
/// Elite flags from previous generations are cleared first, so the marking
/// always reflects current fitness. Downstream operators (crossover,
/// mutation) leave elite-marked chromosomes untouched, which guarantees
/// each generation is at least as good as the last.
///
/// Place this operator before any operator that modifies solutions.
pub struct Elite {
    percentage: usize,
    enabled: bool,
}

impl Elite {
    /// `percentage` of the population to protect, 0..=100.
    pub fn new(percentage: usize) -> Self {
        Elite {
            percentage,
            enabled: true,
        }
    }

    pub fn percentage(&self) -> usize {
        self.percentage
    }

    pub fn set_percentage(&mut self, percentage: usize) {
        self.percentage = percentage;
    }
}

impl GeneticOperator for Elite {
    fn name(&self) -> &str {
        "elite"
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
        _fitness: &FitnessFn,
    ) -> Result<()> {
        if current.is_empty() {
            return Err(Error::EmptyPopulation);
        }

        next.chromosomes_mut().clear();
        next.add_range(current.chromosomes().iter().cloned());

        for chromosome in next.chromosomes_mut() {
            chromosome.set_elite(false);
        }

        let count =
            ((next.size() as f64 / 100.0) * self.percentage as f64).round() as usize;
        if count == 0 {
            return Ok(());
        }

        next.sort_by_fitness();
        for chromosome in next.chromosomes_mut().iter_mut().take(count) {
            chromosome.set_elite(true);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chromosome::Chromosome;
    use crate::population::PopulationConfig;
    use std::sync::Arc;

    fn scored(bits: &str, fitness: f64) -> Chromosome {
        let mut c = Chromosome::from_binary_string(bits).unwrap();
        let f: FitnessFn = Arc::new(move |_| fitness);
        c.evaluate(&f).unwrap();
        c
    }

    #[test]
    fn marks_top_percent_and_clears_stale_flags() {
        let mut current = Population::empty(PopulationConfig::default());
        for (i, f) in [0.1, 0.9, 0.5, 0.3].iter().enumerate() {
            let mut c = scored("10101010", *f);
            // a stale flag on a weak chromosome must not survive
            c.set_elite(i == 0);
            current.add(c);
        }

        let mut next = current.empty_copy();
        let noop: FitnessFn = Arc::new(|_| 0.0);
        Elite::new(25).invoke(&current, &mut next, &noop).unwrap();

        assert_eq!(next.size(), 4);
        let elites = next.elites();
        assert_eq!(elites.len(), 1);
        assert_eq!(elites[0].fitness(), 0.9);
    }

    #[test]
    fn zero_percent_marks_nothing() {
        let mut current = Population::empty(PopulationConfig::default());
        current.add(scored("1111", 0.8));
        current.add(scored("0000", 0.2));

        let mut next = current.empty_copy();
        let noop: FitnessFn = Arc::new(|_| 0.0);
        Elite::new(0).invoke(&current, &mut next, &noop).unwrap();
        assert!(next.elites().is_empty());
    }

    #[test]
    fn empty_population_is_rejected() {
        let current = Population::empty(PopulationConfig::default());
        let mut next = current.empty_copy();
        let noop: FitnessFn = Arc::new(|_| 0.0);
        assert!(matches!(
            Elite::new(10).invoke(&current, &mut next, &noop),
            Err(Error::EmptyPopulation)
        ));
    }
}
