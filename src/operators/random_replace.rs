//! Random replacement: immigrate fresh random solutions each generation.

use rand::rngs::StdRng;

use crate::chromosome::{Chromosome, FitnessFn};
use crate::error::{Error, Result};
use crate::gene::GeneType;
use crate::operators::GeneticOperator;
use crate::population::Population;
use crate::rng;

const UNIQUE_ATTEMPTS: usize = 100;

/// Replaces the weakest P% of the non-elite population with freshly
/// generated random chromosomes, re-evaluating each replacement.
///
/// The percentage is taken of the non-elite count, so 50% of a population
/// of 10 carrying 2 elites replaces 4 chromosomes. Only binary-gene
/// populations are supported.
pub struct RandomReplace {
    percentage: usize,
    allow_duplicates: bool,
    enabled: bool,
    evaluations: usize,
    rng: StdRng,
}

impl RandomReplace {
    /// `percentage` of the non-elite population to replace, 0..=100.
    pub fn new(percentage: usize) -> Self {
        RandomReplace {
            percentage,
            allow_duplicates: false,
            enabled: true,
            evaluations: 0,
            rng: rng::entropy_rng(),
        }
    }

    pub fn with_allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = rng::create_rng(seed);
        self
    }

    pub fn percentage(&self) -> usize {
        self.percentage
    }

    pub fn set_percentage(&mut self, percentage: usize) {
        self.percentage = percentage;
    }

    /// Draws random chromosomes until one not already present in
    /// `population` appears, within the retry budget.
    fn create_unique_chromosome(
        &mut self,
        length: usize,
        population: &Population,
    ) -> Result<Chromosome> {
        if length == 0 {
            return Err(Error::ChromosomeNotUnique(
                "zero-length chromosomes cannot be unique".into(),
            ));
        }

        for _ in 0..UNIQUE_ATTEMPTS {
            let candidate = Chromosome::random(length, &mut self.rng);
            if !population.solution_exists(&candidate) {
                return Ok(candidate);
            }
        }
        Err(Error::ChromosomeNotUnique(
            "unable to create a unique random chromosome; the chromosome may \
             be too short or the population too large"
                .into(),
        ))
    }
}

impl GeneticOperator for RandomReplace {
    fn name(&self) -> &str {
        "random-replace"
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

        let non_binary = current.chromosomes()[0]
            .genes()
            .iter()
            .any(|g| g.gene_type() != GeneType::Binary);
        if non_binary {
            return Err(Error::Operator(
                "only binary genes can be handled by the random replace operator".into(),
            ));
        }

        self.evaluations = 0;

        // elites first, then by fitness, so the weakest sit at the tail
        next.chromosomes_mut().clear();
        next.add_range(current.chromosomes().iter().cloned());
        next.chromosomes_mut().sort_by(|a, b| {
            b.is_elite()
                .cmp(&a.is_elite())
                .then_with(|| Chromosome::by_fitness_desc(a, b))
        });

        let non_elites = next.non_elites().len();
        let to_replace = (((non_elites as f64) / 100.0) * self.percentage as f64)
            .round() as usize;
        let to_replace = to_replace.min(non_elites);
        if to_replace == 0 {
            return Ok(());
        }

        let length = current.chromosome_len();
        let keep = next.size() - to_replace;
        next.chromosomes_mut().truncate(keep);

        for _ in 0..to_replace {
            let mut immigrant = if self.allow_duplicates {
                Chromosome::random(length, &mut self.rng)
            } else {
                self.create_unique_chromosome(length, next)?
            };
            immigrant.evaluate(fitness)?;
            immigrant.set_evaluated_by_operator(true);
            self.evaluations += 1;
            next.add(immigrant);
        }
        Ok(())
    }

    fn operator_invoked_evaluations(&self) -> usize {
        self.evaluations
    }
}
