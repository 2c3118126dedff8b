//! The population container.
//!
//! A [`Population`] owns an ordered (but semantically unordered) list of
//! chromosomes plus its evaluation and selection configuration. It provides
//! serial or rayon-parallel evaluation, rank-based fitness normalization,
//! statistics, ranking queries, and the parent-selection strategies used by
//! crossover.

mod config;
mod selection;

pub use config::PopulationConfig;
pub use selection::ParentSelection;

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::chromosome::{Chromosome, FitnessFn};
use crate::error::{Error, Result};

/// The evaluation set handed to a pre-evaluation hook before scoring
/// begins. The hook may trim [`indices`](EvaluationPlan::indices), report
/// evaluations it performed externally, or cancel the pass entirely.
#[derive(Debug)]
pub struct EvaluationPlan {
    /// Indices of the chromosomes about to be scored.
    pub indices: Vec<usize>,
    /// Set to true to skip scoring entirely.
    pub cancel: bool,
    /// Evaluations performed by the hook itself, added to the returned
    /// count for accounting.
    pub external_evaluations: usize,
}

/// Hook invoked before each evaluation pass.
pub type PreEvaluationHook = Arc<dyn Fn(&Population, &mut EvaluationPlan) + Send + Sync>;

/// An owned collection of chromosomes and the configuration governing how
/// they are evaluated and selected.
///
/// Population sizes must be even: parent selection always yields pairs.
/// Within one generation all chromosomes share one fixed gene length.
pub struct Population {
    chromosomes: Vec<Chromosome>,
    config: PopulationConfig,
    pre_evaluation_hook: Option<PreEvaluationHook>,
}

impl Population {
    /// Creates an empty population carrying the given configuration.
    pub fn empty(config: PopulationConfig) -> Self {
        Population {
            chromosomes: Vec::new(),
            config,
            pre_evaluation_hook: None,
        }
    }

    /// Builds `size` random binary chromosomes of `chromosome_len` genes.
    ///
    /// Fails fast on an odd `size` (parent selection yields pairs) or a
    /// zero `chromosome_len`.
    pub fn random(
        size: usize,
        chromosome_len: usize,
        config: PopulationConfig,
        rng: &mut StdRng,
    ) -> Result<Self> {
        if size % 2 != 0 {
            return Err(Error::Config(format!(
                "population size must be even, got {size}"
            )));
        }
        if chromosome_len == 0 {
            return Err(Error::Config(
                "chromosome length must be greater than zero".into(),
            ));
        }

        let mut population = Population::empty(config);
        for _ in 0..size {
            population.add(Chromosome::random(chromosome_len, rng));
        }
        Ok(population)
    }

    /// Produces a new population carrying over all configuration and the
    /// pre-evaluation hook, but no chromosomes. Operators use this for
    /// fresh working buffers.
    pub fn empty_copy(&self) -> Self {
        Population {
            chromosomes: Vec::new(),
            config: self.config.clone(),
            pre_evaluation_hook: self.pre_evaluation_hook.clone(),
        }
    }

    /// Registers a hook that can inspect or trim the evaluation set before
    /// scoring begins.
    pub fn set_pre_evaluation_hook(&mut self, hook: Option<PreEvaluationHook>) {
        self.pre_evaluation_hook = hook;
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PopulationConfig {
        &mut self.config
    }

    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    pub fn chromosomes_mut(&mut self) -> &mut Vec<Chromosome> {
        &mut self.chromosomes
    }

    /// Appends a chromosome.
    pub fn add(&mut self, chromosome: Chromosome) {
        self.chromosomes.push(chromosome);
    }

    /// Appends a range of chromosomes.
    pub fn add_range(&mut self, chromosomes: impl IntoIterator<Item = Chromosome>) {
        self.chromosomes.extend(chromosomes);
    }

    /// Number of chromosomes.
    pub fn size(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    /// Gene length shared by the population's chromosomes; 0 when empty.
    pub fn chromosome_len(&self) -> usize {
        self.chromosomes.first().map_or(0, Chromosome::len)
    }

    /// Sorts chromosomes best-first by raw fitness.
    pub fn sort_by_fitness(&mut self) {
        self.chromosomes.sort_by(Chromosome::by_fitness_desc);
    }

    /// Drops the weakest chromosome.
    pub fn delete_last(&mut self) {
        self.sort_by_fitness();
        self.chromosomes.pop();
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Scores the population with the supplied fitness function and returns
    /// the number of evaluations performed.
    ///
    /// The evaluation set is every chromosome when `re_evaluate_all` is
    /// set, otherwise only those without a positive fitness (and not
    /// already scored by an operator this generation). A registered
    /// pre-evaluation hook may trim the set or cancel the pass. Scoring
    /// runs across the rayon pool when `parallel` is enabled, with a full
    /// barrier before this call returns.
    ///
    /// When normalization is enabled and anything was scored, every
    /// chromosome is re-ranked and assigned a normalized fitness equal to
    /// its 1-based rank counted from the bottom.
    pub fn evaluate(&mut self, fitness_fn: &FitnessFn) -> Result<usize> {
        let mut plan = EvaluationPlan {
            indices: self.evaluation_set(),
            cancel: false,
            external_evaluations: 0,
        };

        if let Some(hook) = self.pre_evaluation_hook.clone() {
            hook(self, &mut plan);
        }

        let mut evaluations = plan.external_evaluations;

        if !plan.cancel {
            let mut selected = vec![false; self.chromosomes.len()];
            for index in plan.indices {
                if let Some(flag) = selected.get_mut(index) {
                    *flag = true;
                }
            }

            evaluations += if self.config.parallel {
                self.chromosomes
                    .par_iter_mut()
                    .zip(selected.par_iter())
                    .filter(|(_, selected)| **selected)
                    .map(|(chromosome, _)| chromosome.evaluate(fitness_fn).map(|_| 1usize))
                    .try_reduce(|| 0, |a, b| Ok(a + b))?
            } else {
                let mut scored = 0usize;
                for (chromosome, _) in self
                    .chromosomes
                    .iter_mut()
                    .zip(selected.iter())
                    .filter(|(_, selected)| **selected)
                {
                    chromosome.evaluate(fitness_fn)?;
                    scored += 1;
                }
                scored
            };
        }

        // operator-evaluation marks live for one pass only
        for chromosome in &mut self.chromosomes {
            chromosome.set_evaluated_by_operator(false);
        }

        if evaluations > 0 && self.config.normalize_fitness {
            self.apply_normalization();
        }

        Ok(evaluations)
    }

    fn evaluation_set(&self) -> Vec<usize> {
        self.chromosomes
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                self.config.re_evaluate_all
                    || (c.fitness() <= 0.0 && !c.evaluated_by_operator())
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Re-ranks the population and assigns each chromosome a normalized
    /// fitness of its 1-based rank from the bottom (worst = 1, best = N).
    fn apply_normalization(&mut self) {
        self.sort_by_fitness();
        let size = self.chromosomes.len();
        for (rank, chromosome) in self.chromosomes.iter_mut().enumerate() {
            chromosome.set_fitness_normalized((size - rank) as f64);
        }
    }

    // ------------------------------------------------------------------
    // Statistics
    // ------------------------------------------------------------------

    /// Sum of raw fitness across the population.
    pub fn total_fitness(&self) -> f64 {
        self.chromosomes.iter().map(Chromosome::fitness).sum()
    }

    /// Sum of normalized fitness across the population.
    pub fn total_fitness_normalized(&self) -> f64 {
        self.chromosomes
            .iter()
            .map(Chromosome::fitness_normalized)
            .sum()
    }

    /// Mean raw fitness, `None` when empty.
    pub fn average_fitness(&self) -> Option<f64> {
        if self.chromosomes.is_empty() {
            return None;
        }
        Some(self.total_fitness() / self.chromosomes.len() as f64)
    }

    /// Highest raw fitness, `None` when empty.
    pub fn maximum_fitness(&self) -> Option<f64> {
        self.chromosomes
            .iter()
            .map(Chromosome::fitness)
            .fold(None, |best, f| Some(best.map_or(f, |b: f64| b.max(f))))
    }

    /// Lowest raw fitness, `None` when empty.
    pub fn minimum_fitness(&self) -> Option<f64> {
        self.chromosomes
            .iter()
            .map(Chromosome::fitness)
            .fold(None, |worst, f| Some(worst.map_or(f, |w: f64| w.min(f))))
    }

    /// Raw-or-normalized fitness of every chromosome, in population order.
    pub fn fitness_vec(&self) -> Vec<f64> {
        self.chromosomes
            .iter()
            .map(|c| {
                if self.config.normalize_fitness {
                    c.fitness_normalized()
                } else {
                    c.fitness()
                }
            })
            .collect()
    }

    /// Number of duplicate solutions, judged by canonical value string.
    pub fn duplicate_count(&self) -> usize {
        let unique: HashSet<String> = self
            .chromosomes
            .iter()
            .map(Chromosome::to_value_string)
            .collect();
        self.chromosomes.len() - unique.len()
    }

    /// Chromosomes currently flagged as elite.
    pub fn elites(&self) -> Vec<&Chromosome> {
        self.chromosomes.iter().filter(|c| c.is_elite()).collect()
    }

    /// Chromosomes not flagged as elite.
    pub fn non_elites(&self) -> Vec<&Chromosome> {
        self.chromosomes.iter().filter(|c| !c.is_elite()).collect()
    }

    // ------------------------------------------------------------------
    // Ranking queries
    // ------------------------------------------------------------------

    /// The `count` fittest chromosomes, best first.
    pub fn get_top(&self, count: usize) -> Result<Vec<Chromosome>> {
        if self.chromosomes.len() < count {
            return Err(Error::Population {
                requested: count,
                available: self.chromosomes.len(),
            });
        }
        let mut sorted = self.chromosomes.clone();
        sorted.sort_by(Chromosome::by_fitness_desc);
        sorted.truncate(count);
        Ok(sorted)
    }

    /// The `count` weakest chromosomes, worst first.
    pub fn get_bottom(&self, count: usize) -> Result<Vec<Chromosome>> {
        if self.chromosomes.len() < count {
            return Err(Error::Population {
                requested: count,
                available: self.chromosomes.len(),
            });
        }
        let mut sorted = self.chromosomes.clone();
        sorted.sort_by(Chromosome::by_fitness_desc);
        sorted.reverse();
        sorted.truncate(count);
        Ok(sorted)
    }

    /// The fittest `percent`% of the population (rounded), best first.
    pub fn get_top_percent(&self, percent: usize) -> Result<Vec<Chromosome>> {
        let count =
            ((self.chromosomes.len() as f64 / 100.0) * percent as f64).round() as usize;
        self.get_top(count)
    }

    /// The `count` fittest chromosomes after deduplication by canonical
    /// value string, best first. Fails when fewer than `count` unique
    /// solutions exist.
    pub fn get_unique_top(&self, count: usize) -> Result<Vec<Chromosome>> {
        if self.chromosomes.len() < count {
            return Err(Error::Population {
                requested: count,
                available: self.chromosomes.len(),
            });
        }

        let mut sorted = self.chromosomes.clone();
        sorted.sort_by(Chromosome::by_fitness_desc);

        let mut seen = HashSet::new();
        let mut unique: Vec<Chromosome> = sorted
            .into_iter()
            .filter(|c| seen.insert(c.to_value_string()))
            .collect();

        if unique.len() < count {
            return Err(Error::Population {
                requested: count,
                available: unique.len(),
            });
        }
        unique.truncate(count);
        Ok(unique)
    }

    /// The fittest unique `percent`% of the population, best first.
    pub fn get_top_unique_percent(&self, percent: usize) -> Result<Vec<Chromosome>> {
        let count =
            ((self.chromosomes.len() as f64 / 100.0) * percent as f64).round() as usize;
        self.get_unique_top(count)
    }

    // ------------------------------------------------------------------
    // Existence checks
    // ------------------------------------------------------------------

    /// True when a chromosome with an identical canonical value string is
    /// present. Ignores identity; used for duplicate avoidance.
    pub fn solution_exists(&self, chromosome: &Chromosome) -> bool {
        let rendered = chromosome.to_value_string();
        self.chromosomes
            .iter()
            .any(|c| c.to_value_string() == rendered)
    }

    /// True when a chromosome with the same identity is present. Takes no
    /// account of gene values.
    pub fn chromosome_exists(&self, chromosome: &Chromosome) -> bool {
        self.chromosomes.iter().any(|c| c.id() == chromosome.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bit_share_fitness() -> FitnessFn {
        Arc::new(|c: &Chromosome| {
            let ones = c.genes().iter().filter(|g| g.binary_value() == 1).count();
            ones as f64 / c.len() as f64
        })
    }

    fn build(size: usize, len: usize, config: PopulationConfig) -> Population {
        let mut rng = create_rng(99);
        Population::random(size, len, config, &mut rng).unwrap()
    }

    #[test]
    fn construction_rejects_odd_size() {
        let mut rng = create_rng(1);
        assert!(matches!(
            Population::random(5, 8, PopulationConfig::default(), &mut rng),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn construction_rejects_zero_length_chromosomes() {
        let mut rng = create_rng(1);
        assert!(Population::random(4, 0, PopulationConfig::default(), &mut rng).is_err());
    }

    #[test]
    fn evaluate_counts_scored_chromosomes() {
        let mut population = build(10, 16, PopulationConfig::default());
        let scored = population.evaluate(&bit_share_fitness()).unwrap();
        assert_eq!(scored, 10);
    }

    #[test]
    fn evaluate_skips_already_scored_unless_re_evaluate_all() {
        let mut population = build(10, 16, PopulationConfig::default());
        population.evaluate(&bit_share_fitness()).unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        let counting = {
            let counter = counter.clone();
            let inner = bit_share_fitness();
            let f: FitnessFn = Arc::new(move |c| {
                counter.fetch_add(1, Ordering::Relaxed);
                inner(c)
            });
            f
        };

        population.evaluate(&counting).unwrap();
        // a random 16-bit chromosome scoring exactly 0.0 is possible but
        // not with this seed; nothing should be re-scored
        assert_eq!(counter.load(Ordering::Relaxed), 0);

        population.config_mut().re_evaluate_all = true;
        population.evaluate(&counting).unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn parallel_evaluation_matches_serial() {
        let config = PopulationConfig::default().with_parallel(true);
        let mut parallel = build(20, 16, config);
        let mut serial = build(20, 16, PopulationConfig::default());

        parallel.evaluate(&bit_share_fitness()).unwrap();
        serial.evaluate(&bit_share_fitness()).unwrap();

        let mut parallel_scores: Vec<f64> =
            parallel.chromosomes().iter().map(Chromosome::fitness).collect();
        let mut serial_scores: Vec<f64> =
            serial.chromosomes().iter().map(Chromosome::fitness).collect();
        parallel_scores.sort_by(|a, b| a.partial_cmp(b).unwrap());
        serial_scores.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(parallel_scores, serial_scores);
    }

    #[test]
    fn normalization_assigns_strict_ranks() {
        let mut population = build(10, 16, PopulationConfig::default());
        population.evaluate(&bit_share_fitness()).unwrap();

        let mut ranks: Vec<f64> = population
            .chromosomes()
            .iter()
            .map(Chromosome::fitness_normalized)
            .collect();
        ranks.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let expected: Vec<f64> = (1..=10).map(|r| r as f64).collect();
        assert_eq!(ranks, expected);

        // rank order must agree with raw fitness order
        let mut pairs: Vec<(f64, f64)> = population
            .chromosomes()
            .iter()
            .map(|c| (c.fitness(), c.fitness_normalized()))
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        for window in pairs.windows(2) {
            if window[0].0 < window[1].0 {
                assert!(window[0].1 < window[1].1);
            }
        }
    }

    #[test]
    fn pre_evaluation_hook_can_cancel() {
        let mut population = build(4, 8, PopulationConfig::default());
        population.set_pre_evaluation_hook(Some(Arc::new(|_, plan| {
            plan.cancel = true;
        })));

        let scored = population.evaluate(&bit_share_fitness()).unwrap();
        assert_eq!(scored, 0);
        assert!(population.chromosomes().iter().all(|c| c.fitness() == 0.0));
    }

    #[test]
    fn pre_evaluation_hook_can_trim_and_report() {
        let mut population = build(4, 8, PopulationConfig::default());
        population.set_pre_evaluation_hook(Some(Arc::new(|_, plan| {
            plan.indices.truncate(1);
            plan.external_evaluations = 3;
        })));

        let scored = population.evaluate(&bit_share_fitness()).unwrap();
        assert_eq!(scored, 4); // 1 scored + 3 reported by the hook
    }

    #[test]
    fn get_top_requires_enough_chromosomes() {
        let mut population = build(4, 8, PopulationConfig::default());
        population.chromosomes_mut().truncate(3);
        assert!(matches!(
            population.get_top(5),
            Err(Error::Population { requested: 5, available: 3 })
        ));
    }

    #[test]
    fn get_top_and_bottom_are_fitness_ordered() {
        let mut population = build(10, 16, PopulationConfig::default());
        population.evaluate(&bit_share_fitness()).unwrap();

        let top = population.get_top(3).unwrap();
        assert!(top[0].fitness() >= top[1].fitness());
        assert!(top[1].fitness() >= top[2].fitness());
        assert_eq!(Some(top[0].fitness()), population.maximum_fitness());

        let bottom = population.get_bottom(3).unwrap();
        assert!(bottom[0].fitness() <= bottom[1].fitness());
        assert_eq!(Some(bottom[0].fitness()), population.minimum_fitness());
    }

    #[test]
    fn unique_top_deduplicates_by_value_string() {
        let mut population = Population::empty(PopulationConfig::default());
        population.add(Chromosome::from_binary_string("1111").unwrap());
        population.add(Chromosome::from_binary_string("1111").unwrap());
        population.add(Chromosome::from_binary_string("0000").unwrap());
        population.add(Chromosome::from_binary_string("1010").unwrap());

        assert_eq!(population.duplicate_count(), 1);

        let unique = population.get_unique_top(3).unwrap();
        let mut strings: Vec<String> =
            unique.iter().map(Chromosome::to_value_string).collect();
        strings.sort();
        assert_eq!(strings, vec!["0000", "1010", "1111"]);

        assert!(population.get_unique_top(4).is_err());
    }

    #[test]
    fn fitness_vec_follows_the_normalization_setting() {
        let mut population = Population::empty(PopulationConfig::default());
        for bits in ["1111", "1100", "1000", "0000"] {
            population.add(Chromosome::from_binary_string(bits).unwrap());
        }
        population.evaluate(&bit_share_fitness()).unwrap();

        // normalization sorts best-first and assigns ranks 4..1
        assert_eq!(population.fitness_vec(), vec![4.0, 3.0, 2.0, 1.0]);

        population.config_mut().normalize_fitness = false;
        assert_eq!(population.fitness_vec(), vec![1.0, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn unique_percent_rounds_and_requires_enough_distinct_solutions() {
        let mut population = Population::empty(PopulationConfig::default());
        for bits in ["1111", "1111", "0000", "1010"] {
            population.add(Chromosome::from_binary_string(bits).unwrap());
        }
        population.evaluate(&bit_share_fitness()).unwrap();

        // 50% of 4 is 2; the duplicate "1111" collapses to one entry
        let top = population.get_top_unique_percent(50).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].to_value_string(), "1111");
        assert_eq!(top[1].to_value_string(), "1010");

        // 100% asks for 4 but only 3 distinct solutions exist
        assert!(matches!(
            population.get_top_unique_percent(100),
            Err(Error::Population { requested: 4, available: 3 })
        ));
    }

    #[test]
    fn solution_exists_is_value_based() {
        let mut population = Population::empty(PopulationConfig::default());
        let original = Chromosome::from_binary_string("1010").unwrap();
        population.add(original.clone());

        let same_value = Chromosome::from_binary_string("1010").unwrap();
        assert!(population.solution_exists(&same_value));
        assert!(population.solution_exists(&original)); // reflexive

        let different = Chromosome::from_binary_string("0101").unwrap();
        assert!(!population.solution_exists(&different));

        // identity-based check only matches the stored instance
        assert!(population.chromosome_exists(&original));
        assert!(!population.chromosome_exists(&same_value));
    }

    #[test]
    fn empty_copy_carries_configuration() {
        let config = PopulationConfig::default()
            .with_parallel(true)
            .with_parent_selection(ParentSelection::Tournament);
        let population = build(4, 8, config);

        let copy = population.empty_copy();
        assert!(copy.is_empty());
        assert!(copy.config().parallel);
        assert_eq!(copy.config().parent_selection, ParentSelection::Tournament);
    }

    #[test]
    fn average_and_totals() {
        let mut population = Population::empty(PopulationConfig::default());
        assert_eq!(population.average_fitness(), None);

        let mut a = Chromosome::from_binary_string("11").unwrap();
        let mut b = Chromosome::from_binary_string("00").unwrap();
        let half: FitnessFn = Arc::new(|_| 0.5);
        let low: FitnessFn = Arc::new(|_| 0.1);
        a.evaluate(&half).unwrap();
        b.evaluate(&low).unwrap();
        population.add(a);
        population.add(b);

        assert!((population.total_fitness() - 0.6).abs() < 1e-12);
        assert!((population.average_fitness().unwrap() - 0.3).abs() < 1e-12);
    }
}
