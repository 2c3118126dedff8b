//! Crossover: recombine pairs of parents into children.

use rand::rngs::StdRng;
use rand::Rng;

use crate::chromosome::{Chromosome, FitnessFn};
use crate::error::{Error, Result};
use crate::operators::GeneticOperator;
use crate::population::Population;
use crate::rng;

/// Recombination strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CrossoverKind {
    /// One cut; each child takes one parent's head and the other's tail.
    SinglePoint,
    /// Two cuts; the middle segment is swapped between parents.
    DoublePoint,
    /// Two cuts; the middle segment is copied verbatim and the remaining
    /// genes are filled in the order they appear in the other parent,
    /// skipping values already present. Requires permutation-style parents
    /// sharing the same set of gene values.
    DoublePointOrdered,
}

/// How children enter the next generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReplacementMethod {
    /// Fill a fresh population up to the prior size, elites carried over.
    Generational,
    /// Evaluate each child immediately and merge it into the full
    /// population, dropping the weakest when capacity is exceeded. Tighter
    /// steady-state convergence at the cost of extra evaluations.
    DeleteLast,
}

/// Cut indices for one recombination. Each index is in `[1, parent_len)`.
#[derive(Debug, Clone)]
pub struct CrossoverPoints {
    pub points: Vec<usize>,
    pub parent_len: usize,
}

const ADMISSION_ATTEMPTS: usize = 100;

/// Regenerates the population up to its original size (minus surviving
/// elites) by repeatedly selecting two parents and recombining them with
/// the configured probability. On a probability miss the children are
/// clones of the parents with fresh identities and cleared fitness.
///
/// With duplicates disallowed, an admission budget of 100 failed attempts
/// guards against deadlock when the population cannot hold enough distinct
/// solutions.
pub struct Crossover {
    probability: f64,
    kind: CrossoverKind,
    replacement: ReplacementMethod,
    allow_duplicates: bool,
    enabled: bool,
    evaluations: usize,
    rng: StdRng,
}

impl Crossover {
    /// Single-point generational crossover allowing duplicates.
    pub fn new(probability: f64) -> Self {
        Crossover {
            probability,
            kind: CrossoverKind::SinglePoint,
            replacement: ReplacementMethod::Generational,
            allow_duplicates: true,
            enabled: true,
            evaluations: 0,
            rng: rng::entropy_rng(),
        }
    }

    pub fn with_kind(mut self, kind: CrossoverKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_replacement(mut self, replacement: ReplacementMethod) -> Self {
        self.replacement = replacement;
        self
    }

    pub fn with_allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = rng::create_rng(seed);
        self
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn set_probability(&mut self, probability: f64) {
        self.probability = probability;
    }

    /// Recombines two parents, honoring the crossover probability.
    pub fn perform_crossover(
        &mut self,
        p1: &Chromosome,
        p2: &Chromosome,
        points: &CrossoverPoints,
    ) -> Result<(Chromosome, Chromosome)> {
        let len = p1.len();
        if len != p2.len() {
            return Err(Error::Config(
                "parent chromosomes are not the same length".into(),
            ));
        }

        if self.rng.random::<f64>() > self.probability {
            // pass through untouched apart from fresh identities
            let mut c1 = Chromosome::new();
            c1.add_range_cloned(p1.genes())?;
            let mut c2 = Chromosome::new();
            c2.add_range_cloned(p2.genes())?;
            return Ok((c1, c2));
        }

        let (c1, c2) = match self.kind {
            CrossoverKind::SinglePoint => single_point(p1, p2, points)?,
            CrossoverKind::DoublePoint => double_point(p1, p2, points)?,
            CrossoverKind::DoublePointOrdered => double_point_ordered(p1, p2, points)?,
        };

        debug_assert_eq!(c1.len(), len);
        debug_assert_eq!(c2.len(), len);
        Ok((c1, c2))
    }

    /// Draws cut points for the configured kind. Chromosomes must carry at
    /// least two genes for a cut to exist.
    pub fn create_points(&mut self, parent_len: usize) -> Result<CrossoverPoints> {
        if parent_len < 2 {
            return Err(Error::Config(
                "crossover requires chromosomes of at least two genes".into(),
            ));
        }

        let points = match self.kind {
            CrossoverKind::SinglePoint => {
                vec![self.rng.random_range(1..parent_len)]
            }
            CrossoverKind::DoublePoint | CrossoverKind::DoublePointOrdered => {
                // two distinct cut indices need at least two candidates
                if parent_len < 3 {
                    return Err(Error::Config(
                        "double-point crossover requires chromosomes of at least \
                         three genes"
                            .into(),
                    ));
                }
                let first = self.rng.random_range(1..parent_len);
                let mut second = self.rng.random_range(1..parent_len);
                while second == first {
                    second = self.rng.random_range(1..parent_len);
                }
                vec![first.min(second), first.max(second)]
            }
        };
        Ok(CrossoverPoints { points, parent_len })
    }

    /// Admits a child into `next` per the replacement method. Returns true
    /// when the child counts towards the generation quota.
    fn add_child(
        &mut self,
        child: Chromosome,
        current: &Population,
        next: &mut Population,
        target_size: usize,
        fitness: &FitnessFn,
    ) -> Result<bool> {
        match self.replacement {
            ReplacementMethod::DeleteLast => {
                let mut child = child;
                child.evaluate(fitness)?;
                child.set_evaluated_by_operator(true);
                self.evaluations += 1;

                let floor = current.minimum_fitness().unwrap_or(0.0);
                if child.fitness() <= floor {
                    return Ok(false);
                }
                if !self.allow_duplicates && next.solution_exists(&child) {
                    return Ok(false);
                }

                next.add(child);
                if next.size() > target_size {
                    next.sort_by_fitness();
                    next.chromosomes_mut().truncate(target_size);
                }
                Ok(true)
            }
            ReplacementMethod::Generational => {
                if !self.allow_duplicates && next.solution_exists(&child) {
                    return Ok(false);
                }
                next.add(child);
                Ok(true)
            }
        }
    }
}

impl GeneticOperator for Crossover {
    fn name(&self) -> &str {
        "crossover"
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

        let target_size = current.size();
        let elite_count = match self.replacement {
            ReplacementMethod::DeleteLast => {
                // merge against the full current generation
                next.add_range(current.chromosomes().iter().cloned());
                0
            }
            ReplacementMethod::Generational => {
                let elites: Vec<Chromosome> =
                    current.elites().into_iter().cloned().collect();
                let count = elites.len();
                next.add_range(elites);
                count
            }
        };

        let mut to_generate = target_size - elite_count;
        let mut attempts = ADMISSION_ATTEMPTS;

        while to_generate > 0 {
            if attempts == 0 {
                return Err(Error::ChromosomeNotUnique(
                    "unable to admit a crossover child; consider allowing \
                     duplicates, longer chromosomes, or more elites"
                        .into(),
                ));
            }

            let [p1, p2] = current.select_parents(&mut self.rng)?;
            let points = self.create_points(p1.len())?;
            let (c1, c2) = self.perform_crossover(&p1, &p2, &points)?;

            for child in [c1, c2] {
                if to_generate == 0 {
                    break;
                }
                if self.add_child(child, current, next, target_size, fitness)? {
                    to_generate -= 1;
                } else {
                    attempts = attempts.saturating_sub(1);
                }
            }
        }
        Ok(())
    }

    fn operator_invoked_evaluations(&self) -> usize {
        self.evaluations
    }
}

fn single_point(
    p1: &Chromosome,
    p2: &Chromosome,
    points: &CrossoverPoints,
) -> Result<(Chromosome, Chromosome)> {
    let cut = *points
        .points
        .first()
        .ok_or_else(|| Error::Operator("missing crossover point".into()))?;

    let mut c1 = Chromosome::new();
    c1.add_range_cloned(&p1.genes()[..cut])?;
    c1.add_range_cloned(&p2.genes()[cut..])?;

    let mut c2 = Chromosome::new();
    c2.add_range_cloned(&p2.genes()[..cut])?;
    c2.add_range_cloned(&p1.genes()[cut..])?;

    Ok((c1, c2))
}

fn double_point(
    p1: &Chromosome,
    p2: &Chromosome,
    points: &CrossoverPoints,
) -> Result<(Chromosome, Chromosome)> {
    let [first, second] = two_points(points)?;

    let mut c1 = Chromosome::new();
    c1.add_range_cloned(&p1.genes()[..first])?;
    c1.add_range_cloned(&p2.genes()[first..second])?;
    c1.add_range_cloned(&p1.genes()[second..])?;

    let mut c2 = Chromosome::new();
    c2.add_range_cloned(&p2.genes()[..first])?;
    c2.add_range_cloned(&p1.genes()[first..second])?;
    c2.add_range_cloned(&p2.genes()[second..])?;

    Ok((c1, c2))
}

/// The middle segment comes verbatim from one parent; the rest is filled
/// with that parent's remaining values in the order the other parent
/// carries them. Matching is by canonical gene value, not identity, so both
/// parents must hold the same set of values.
fn double_point_ordered(
    p1: &Chromosome,
    p2: &Chromosome,
    points: &CrossoverPoints,
) -> Result<(Chromosome, Chromosome)> {
    let [first, second] = two_points(points)?;

    let c1 = ordered_child(p1, p2, first, second)?;
    let c2 = ordered_child(p2, p1, first, second)?;

    if c1.len() != p1.len() || c2.len() != p2.len() {
        return Err(Error::CrossoverIncompatible);
    }
    Ok((c1, c2))
}

fn ordered_child(
    keep: &Chromosome,
    order: &Chromosome,
    first: usize,
    second: usize,
) -> Result<Chromosome> {
    use std::collections::HashSet;

    let mut child = Chromosome::new();
    child.add_range_cloned(&keep.genes()[first..second])?;

    let keep_values: HashSet<String> =
        keep.genes().iter().map(|g| g.canonical_value()).collect();
    let mut present: HashSet<String> =
        child.genes().iter().map(|g| g.canonical_value()).collect();

    for gene in order.genes() {
        let value = gene.canonical_value();
        if keep_values.contains(&value) && present.insert(value) {
            child.add(gene.deep_clone()?);
        }
    }
    Ok(child)
}

fn two_points(points: &CrossoverPoints) -> Result<[usize; 2]> {
    match points.points.as_slice() {
        [first, second, ..] => Ok([*first, *second]),
        _ => Err(Error::Operator("missing crossover points".into())),
    }
}
