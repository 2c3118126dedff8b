//! Copy: deprecated pass-through operator.

use rand::rngs::StdRng;
use rand::Rng;

use crate::chromosome::{Chromosome, FitnessFn};
use crate::error::{Error, Result};
use crate::operators::GeneticOperator;
use crate::population::Population;
use crate::rng;

/// How the [`Copy`] operator picks its chromosomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CopyMethod {
    /// Copy the fittest non-elites.
    Fittest,
    /// Copy randomly chosen non-elites, possibly repeating.
    Random,
}

/// Appends a percentage of the current population's non-elites to the next
/// population, fittest-first or at random.
#[deprecated(note = "retained for compatibility; prefer Elite or Crossover replacement")]
pub struct Copy {
    percentage: usize,
    method: CopyMethod,
    enabled: bool,
    rng: StdRng,
}

#[allow(deprecated)]
impl Copy {
    pub fn new(percentage: usize, method: CopyMethod) -> Self {
        Copy {
            percentage,
            method,
            enabled: true,
            rng: rng::entropy_rng(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = rng::create_rng(seed);
        self
    }
}

#[allow(deprecated)]
impl GeneticOperator for Copy {
    fn name(&self) -> &str {
        "copy"
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

        let count = ((current.size() as f64 / 100.0) * self.percentage as f64)
            .round() as usize;
        let count = count.min(current.size());

        let mut pool: Vec<Chromosome> =
            current.non_elites().into_iter().cloned().collect();
        if pool.is_empty() || count == 0 {
            return Ok(());
        }

        match self.method {
            CopyMethod::Fittest => {
                pool.sort_by(Chromosome::by_fitness_desc);
                next.add_range(pool.into_iter().take(count));
            }
            CopyMethod::Random => {
                for _ in 0..count {
                    let pick = self.rng.random_range(0..pool.len());
                    next.add(pool[pick].clone());
                }
            }
        }
        Ok(())
    }
}
