//! Parent-selection strategies.
//!
//! Selection always yields pairs, which is why population sizes must be
//! even. All strategies operate on a uniformly shuffled index order so the
//! stored chromosome order never biases the walk.
//!
//! # References
//!
//! - Davis (1992), *Handbook of Genetic Algorithms* — roulette selection
//! - Baker (1987), "Reducing Bias and Inefficiency in the Selection
//!   Algorithm" — stochastic universal sampling

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use super::Population;
use crate::chromosome::Chromosome;
use crate::error::{Error, Result};

const PARENT_COUNT: usize = 2;
const TOURNAMENT_MAX_ATTEMPTS: usize = 16;

/// Strategy for choosing crossover parents.
///
/// Higher fitness always means a better chromosome; when the population
/// normalizes fitness, the rank-based values drive the roulette and SUS
/// walks instead of raw magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParentSelection {
    /// Fitness-proportionate (roulette wheel) selection: one independent
    /// uniform draw per parent slot.
    ///
    /// Susceptible to high selection variance; see
    /// [`StochasticUniversal`](ParentSelection::StochasticUniversal) for a
    /// lower-variance alternative at the same cost.
    FitnessProportionate,

    /// Stochastic universal sampling: evenly spaced pointers over the
    /// cumulative fitness, one accumulation walk for all parent slots.
    /// Guarantees lower selection variance than roulette for the same N.
    StochasticUniversal,

    /// Tournament selection: a random-sized sub-sample ("tour") is drawn
    /// via SUS and its fittest member selected, retried until two distinct
    /// parents are found or the attempt budget is exhausted, after which a
    /// duplicate parent is accepted with a warning.
    Tournament,
}

impl Default for ParentSelection {
    fn default() -> Self {
        ParentSelection::FitnessProportionate
    }
}

impl Population {
    /// Selects a pair of parents using the configured strategy.
    ///
    /// The population order is left untouched; the walk happens over a
    /// freshly shuffled index order.
    pub fn select_parents(&self, rng: &mut StdRng) -> Result<[Chromosome; 2]> {
        if self.is_empty() {
            return Err(Error::EmptyPopulation);
        }

        let mut order: Vec<usize> = (0..self.size()).collect();
        order.shuffle(rng);

        let picked = match self.config().parent_selection {
            ParentSelection::FitnessProportionate => {
                self.roulette_select(&order, PARENT_COUNT, rng)
            }
            ParentSelection::StochasticUniversal => {
                self.sus_select(&order, PARENT_COUNT, rng)
            }
            ParentSelection::Tournament => self.tournament_select(&order, rng),
        };

        Ok([
            self.chromosomes()[picked[0]].clone(),
            self.chromosomes()[picked[1]].clone(),
        ])
    }

    /// The fitness magnitude the selection walks accumulate: normalized
    /// rank when normalization is enabled, raw fitness otherwise.
    fn selection_fitness(&self, index: usize) -> f64 {
        let chromosome = &self.chromosomes()[index];
        if self.config().normalize_fitness {
            chromosome.fitness_normalized()
        } else {
            chromosome.fitness()
        }
    }

    fn selection_total(&self) -> f64 {
        (0..self.size()).map(|i| self.selection_fitness(i)).sum()
    }

    /// Roulette-wheel selection: per slot, draw uniform in
    /// [0, totalFitness) and take the first chromosome whose cumulative
    /// fitness reaches the draw.
    fn roulette_select(&self, order: &[usize], count: usize, rng: &mut StdRng) -> Vec<usize> {
        let total = self.selection_total();
        let mut picked = Vec::with_capacity(count);

        for _ in 0..count {
            let draw = rng.random::<f64>() * total;
            let mut running = 0.0;
            let mut choice = *order.last().expect("population is non-empty");
            for &index in order {
                running += self.selection_fitness(index);
                if running >= draw {
                    choice = index;
                    break;
                }
            }
            picked.push(choice);
        }

        picked
    }

    /// Stochastic universal sampling: pointers `start + i * (total / count)`
    /// for one random offset, resolved in a single accumulation walk.
    pub(crate) fn sus_select(
        &self,
        order: &[usize],
        count: usize,
        rng: &mut StdRng,
    ) -> Vec<usize> {
        let total = self.selection_total();
        let distance = total / count as f64;
        let start = rng.random::<f64>() * distance;

        let mut picked = Vec::with_capacity(count);
        let mut walk = 0usize;
        let mut running = self.selection_fitness(order[0]);

        for pointer_index in 0..count {
            let pointer = start + pointer_index as f64 * distance;
            while running < pointer && walk + 1 < order.len() {
                walk += 1;
                running += self.selection_fitness(order[walk]);
            }
            picked.push(order[walk]);
        }

        picked
    }

    /// Tournament selection with a bounded retry budget for distinct
    /// parents. Tour winners are compared on raw fitness.
    fn tournament_select(&self, order: &[usize], rng: &mut StdRng) -> Vec<usize> {
        let mut parents = Vec::with_capacity(PARENT_COUNT);
        let mut attempts = 0usize;

        while parents.len() < PARENT_COUNT {
            let tour_size = rng.random_range(1..=order.len());
            let tour = self.sus_select(order, tour_size, rng);
            let winner = tour
                .into_iter()
                .max_by(|&a, &b| {
                    self.chromosomes()[a]
                        .fitness()
                        .partial_cmp(&self.chromosomes()[b].fitness())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .expect("tour is non-empty");

            attempts += 1;
            if attempts < TOURNAMENT_MAX_ATTEMPTS {
                if !parents.contains(&winner) {
                    parents.push(winner);
                }
            } else {
                // converged or tiny populations may not offer two distinct
                // parents; accept a duplicate rather than spin forever
                log::warn!(
                    "tournament selection failed to find {PARENT_COUNT} distinct parents \
                     after {TOURNAMENT_MAX_ATTEMPTS} attempts; accepting a duplicate"
                );
                parents.push(winner);
            }
        }

        parents
    }
}
