//! Mutation operators.
//!
//! All three variants walk the non-elite chromosomes of the population and
//! apply a probabilistic change, invalidating fitness on any hit. Elites
//! pass through untouched.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;

use crate::chromosome::{Chromosome, FitnessFn};
use crate::error::{Error, Result};
use crate::gene::{Gene, GeneType, GeneValue, ObjectValue};
use crate::operators::GeneticOperator;
use crate::population::Population;
use crate::rng;

fn clamp_probability(p: f64) -> f64 {
    p.clamp(0.0, 1.0)
}

fn carry_over(current: &Population, next: &mut Population) -> Result<()> {
    if current.is_empty() {
        return Err(Error::EmptyPopulation);
    }
    next.chromosomes_mut().clear();
    next.add_range(current.chromosomes().iter().cloned());
    Ok(())
}

/// Per-gene bit-flip mutation.
///
/// For each gene of each non-elite chromosome a uniform draw is compared
/// against the mutation probability. On a hit, binary genes flip; real
/// genes negate when `negate_reals` is set (the historical rule, kept
/// behind a flag because its asymmetry with integer genes is suspect);
/// integer genes are left unchanged. Object genes are not supported.
pub struct BinaryMutate {
    probability: f64,
    allow_duplicates: bool,
    negate_reals: bool,
    enabled: bool,
    rng: StdRng,
}

impl BinaryMutate {
    /// `probability` is clamped into `[0, 1]`.
    pub fn new(probability: f64) -> Self {
        BinaryMutate {
            probability: clamp_probability(probability),
            allow_duplicates: true,
            negate_reals: true,
            enabled: true,
            rng: rng::entropy_rng(),
        }
    }

    /// With duplicates disallowed, a mutation producing a solution already
    /// present in the population is discarded.
    pub fn with_allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    pub fn with_negate_reals(mut self, negate: bool) -> Self {
        self.negate_reals = negate;
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
        self.probability = clamp_probability(probability);
    }

    fn mutate_chromosome(&mut self, chromosome: &mut Chromosome) -> Result<()> {
        for index in 0..chromosome.len() {
            if self.rng.random::<f64>() <= self.probability {
                chromosome.clear_fitness();
                let gene = &mut chromosome.genes_mut()[index];
                mutate_gene(gene, self.negate_reals)?;
            }
        }
        Ok(())
    }
}

fn mutate_gene(gene: &mut Gene, negate_reals: bool) -> Result<()> {
    match gene.value().clone() {
        GeneValue::Binary(b) => gene.set_value(!b),
        GeneValue::Real(r) => {
            if negate_reals {
                gene.set_value(-r);
            }
        }
        GeneValue::Integer(_) => {}
        GeneValue::Object(_) => {
            return Err(Error::Operator(
                "object genes cannot be mutated by the binary mutate operator".into(),
            ));
        }
    }
    Ok(())
}

impl GeneticOperator for BinaryMutate {
    fn name(&self) -> &str {
        "binary-mutate"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn requires_evaluated_population(&self) -> bool {
        false
    }

    fn invoke(
        &mut self,
        current: &Population,
        next: &mut Population,
        _fitness: &FitnessFn,
    ) -> Result<()> {
        carry_over(current, next)?;

        for index in 0..next.size() {
            if next.chromosomes()[index].is_elite() {
                continue;
            }

            if self.allow_duplicates {
                self.mutate_chromosome(&mut next.chromosomes_mut()[index])?;
            } else {
                // mutate a clone so a duplicate outcome can be discarded
                // without undoing anything
                let mut candidate = next.chromosomes()[index].deep_clone(false)?;
                self.mutate_chromosome(&mut candidate)?;
                if !next.solution_exists(&candidate) {
                    let target = &mut next.chromosomes_mut()[index];
                    *target.genes_mut() = candidate.genes().to_vec();
                    target.clear_fitness();
                }
            }
        }
        Ok(())
    }
}

/// Swaps two randomly chosen gene positions per probability hit.
///
/// Gene values are never altered, which makes this the mutation of choice
/// for permutation-encoded chromosomes.
pub struct SwapMutate {
    probability: f64,
    enabled: bool,
    rng: StdRng,
}

impl SwapMutate {
    /// `probability` is clamped into `[0, 1]`.
    pub fn new(probability: f64) -> Self {
        SwapMutate {
            probability: clamp_probability(probability),
            enabled: true,
            rng: rng::entropy_rng(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = rng::create_rng(seed);
        self
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    fn swap_points(&mut self, len: usize) -> (usize, usize) {
        let first = self.rng.random_range(0..len);
        let mut second = self.rng.random_range(0..len);
        while second == first {
            second = self.rng.random_range(0..len);
        }
        (first, second)
    }
}

impl GeneticOperator for SwapMutate {
    fn name(&self) -> &str {
        "swap-mutate"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn requires_evaluated_population(&self) -> bool {
        false
    }

    fn invoke(
        &mut self,
        current: &Population,
        next: &mut Population,
        _fitness: &FitnessFn,
    ) -> Result<()> {
        carry_over(current, next)?;

        for chromosome in next.chromosomes_mut() {
            if chromosome.is_elite() || chromosome.len() < 2 {
                continue;
            }
            if self.rng.random::<f64>() <= self.probability {
                let (first, second) = self.swap_points(chromosome.len());
                chromosome.genes_mut().swap(first, second);
                chromosome.clear_fitness();
            }
        }
        Ok(())
    }
}

/// User-supplied transform applied to object-valued genes.
pub type ObjectMutation = Box<dyn Fn(&Arc<dyn ObjectValue>) -> Arc<dyn ObjectValue> + Send>;

/// Applies a caller-provided mutation to `Object` genes, per-gene
/// probability. Chromosomes carrying any non-object gene are rejected.
pub struct ObjectMutate {
    probability: f64,
    mutation: ObjectMutation,
    enabled: bool,
    rng: StdRng,
}

impl ObjectMutate {
    /// `probability` is clamped into `[0, 1]`.
    pub fn new(probability: f64, mutation: ObjectMutation) -> Self {
        ObjectMutate {
            probability: clamp_probability(probability),
            mutation,
            enabled: true,
            rng: rng::entropy_rng(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = rng::create_rng(seed);
        self
    }
}

impl GeneticOperator for ObjectMutate {
    fn name(&self) -> &str {
        "object-mutate"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn requires_evaluated_population(&self) -> bool {
        false
    }

    fn invoke(
        &mut self,
        current: &Population,
        next: &mut Population,
        _fitness: &FitnessFn,
    ) -> Result<()> {
        carry_over(current, next)?;

        for chromosome in next.chromosomes_mut() {
            if chromosome.is_elite() {
                continue;
            }
            for index in 0..chromosome.len() {
                let gene = &chromosome.genes()[index];
                if gene.gene_type() != GeneType::Object {
                    return Err(Error::Operator(
                        "only object genes can be mutated by the object mutate operator"
                            .into(),
                    ));
                }
                if self.rng.random::<f64>() <= self.probability {
                    chromosome.clear_fitness();
                    let gene = &mut chromosome.genes_mut()[index];
                    if let GeneValue::Object(value) = gene.value().clone() {
                        gene.set_value(GeneValue::Object((self.mutation)(&value)));
                    }
                }
            }
        }
        Ok(())
    }
}
