//! Chromosomes: ordered, fixed-length gene sequences with fitness metadata.

use std::any::Any;
use std::cmp::Ordering;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{Error, Result};
use crate::gene::{next_id, Gene, GeneType, GeneValue};

/// The externally supplied scoring function.
///
/// Must return a fitness in [0.0, 1.0]; higher is better. Called from the
/// evaluation worker pool when parallel evaluation is enabled, hence
/// `Send + Sync`.
pub type FitnessFn = Arc<dyn Fn(&Chromosome) -> f64 + Send + Sync>;

/// One candidate solution: an ordered sequence of genes plus fitness
/// metadata and identity.
///
/// Chromosomes sort by descending fitness. Equality for duplicate
/// detection is defined over [`to_value_string`](Chromosome::to_value_string),
/// not identity.
#[derive(Debug, Clone)]
pub struct Chromosome {
    id: u64,
    genes: Vec<Gene>,
    fitness: f64,
    fitness_normalized: f64,
    is_elite: bool,
    evaluated_by_operator: bool,
    tag: Option<Arc<dyn Any + Send + Sync>>,
}

impl Chromosome {
    /// Creates an empty chromosome.
    pub fn new() -> Self {
        Chromosome {
            id: next_id(),
            genes: Vec::new(),
            fitness: 0.0,
            fitness_normalized: 0.0,
            is_elite: false,
            evaluated_by_operator: false,
            tag: None,
        }
    }

    /// Creates a random binary chromosome of the given length.
    pub fn random(length: usize, rng: &mut StdRng) -> Self {
        let mut chromosome = Chromosome::new();
        for _ in 0..length {
            chromosome.add(Gene::new(rng.random_bool(0.5)));
        }
        chromosome
    }

    /// Creates a binary chromosome from a string of `0`/`1` digits.
    pub fn from_binary_string(bits: &str) -> Result<Self> {
        let mut chromosome = Chromosome::new();
        for digit in bits.chars() {
            match digit {
                '0' => chromosome.add(Gene::new(false)),
                '1' => chromosome.add(Gene::new(true)),
                other => {
                    return Err(Error::Config(format!(
                        "invalid binary digit {other:?} in chromosome string"
                    )))
                }
            }
        }
        Ok(chromosome)
    }

    /// Creates a real-valued chromosome.
    pub fn from_reals(reals: impl IntoIterator<Item = f64>) -> Self {
        let mut chromosome = Chromosome::new();
        for value in reals {
            chromosome.add(Gene::new(value));
        }
        chromosome
    }

    /// Creates an integer-valued chromosome.
    pub fn from_integers(ints: impl IntoIterator<Item = i64>) -> Self {
        let mut chromosome = Chromosome::new();
        for value in ints {
            chromosome.add(Gene::new(value));
        }
        chromosome
    }

    /// Creates a chromosome from existing genes.
    pub fn from_genes(genes: Vec<Gene>) -> Self {
        let mut chromosome = Chromosome::new();
        chromosome.genes = genes;
        chromosome
    }

    /// Appends a gene.
    pub fn add(&mut self, gene: Gene) {
        self.genes.push(gene);
    }

    /// Appends a range of genes.
    pub fn add_range(&mut self, genes: impl IntoIterator<Item = Gene>) {
        self.genes.extend(genes);
    }

    /// Appends deep clones of the given genes.
    pub fn add_range_cloned<'a>(
        &mut self,
        genes: impl IntoIterator<Item = &'a Gene>,
    ) -> Result<()> {
        for gene in genes {
            self.genes.push(gene.deep_clone()?);
        }
        Ok(())
    }

    /// Removes all genes.
    pub fn clear(&mut self) {
        self.genes.clear();
    }

    /// The first gene, if any.
    pub fn first_gene(&self) -> Option<&Gene> {
        self.genes.first()
    }

    /// The last gene, if any.
    pub fn last_gene(&self) -> Option<&Gene> {
        self.genes.last()
    }

    /// Number of genes.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// True when the chromosome holds no genes.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// The chromosome's identity. Unique per instance; survives cloning.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Assigns a fresh identity.
    pub fn regenerate_id(&mut self) {
        self.id = next_id();
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn genes_mut(&mut self) -> &mut Vec<Gene> {
        &mut self.genes
    }

    /// The most recent raw fitness, 0.0 when unevaluated.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// The rank-based normalized fitness, 0.0 when unassigned.
    pub fn fitness_normalized(&self) -> f64 {
        self.fitness_normalized
    }

    pub(crate) fn set_fitness_normalized(&mut self, fitness: f64) {
        self.fitness_normalized = fitness;
    }

    /// Whether the selection process marked this chromosome as elite.
    pub fn is_elite(&self) -> bool {
        self.is_elite
    }

    pub fn set_elite(&mut self, elite: bool) {
        self.is_elite = elite;
    }

    /// Whether an operator already evaluated this chromosome during the
    /// current generation, making a further evaluation redundant.
    pub fn evaluated_by_operator(&self) -> bool {
        self.evaluated_by_operator
    }

    pub(crate) fn set_evaluated_by_operator(&mut self, evaluated: bool) {
        self.evaluated_by_operator = evaluated;
    }

    /// Opaque consumer-owned metadata, typically read by the fitness
    /// function.
    pub fn tag(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.tag.as_ref()
    }

    pub fn set_tag(&mut self, tag: Option<Arc<dyn Any + Send + Sync>>) {
        self.tag = tag;
    }

    /// Resets raw and normalized fitness; used after a mutation invalidates
    /// a previous evaluation.
    pub fn clear_fitness(&mut self) {
        self.fitness = 0.0;
        self.fitness_normalized = 0.0;
    }

    /// Renders the chromosome as the concatenation of each gene's binary
    /// view.
    pub fn to_binary_string(&self) -> String {
        let mut bits = String::with_capacity(self.genes.len());
        for gene in &self.genes {
            bits.push(if gene.binary_value() == 1 { '1' } else { '0' });
        }
        bits
    }

    /// Renders the chromosome's canonical value string: binary genes as
    /// contiguous bits, other genes as space-separated values. This string
    /// defines equality for duplicate detection.
    pub fn to_value_string(&self) -> String {
        let mut rendered = String::new();
        for gene in &self.genes {
            match gene.gene_type() {
                GeneType::Binary => rendered.push_str(&gene.canonical_value()),
                _ => {
                    rendered.push_str(&gene.canonical_value());
                    rendered.push(' ');
                }
            }
        }
        rendered.trim_end().to_string()
    }

    /// Deep-clones the chromosome, optionally resetting the clone's
    /// fitness. The clone keeps this chromosome's identity; its genes get
    /// fresh identities.
    pub fn deep_clone(&self, clear_fitness: bool) -> Result<Chromosome> {
        let mut clone = Chromosome::new();
        clone.add_range_cloned(&self.genes)?;
        clone.id = self.id;
        clone.is_elite = self.is_elite;
        clone.evaluated_by_operator = self.evaluated_by_operator;
        clone.tag = self.tag.clone();
        if !clear_fitness {
            clone.fitness = self.fitness;
            clone.fitness_normalized = self.fitness_normalized;
        }
        Ok(clone)
    }

    /// Scores the chromosome with the supplied fitness function and stores
    /// the result. Fails with [`Error::Evaluation`] when the returned value
    /// falls outside [0.0, 1.0].
    pub fn evaluate(&mut self, fitness_fn: &FitnessFn) -> Result<f64> {
        let fitness = fitness_fn(self);
        if !(0.0..=1.0).contains(&fitness) {
            return Err(Error::Evaluation(fitness));
        }
        self.fitness = fitness;
        Ok(fitness)
    }

    /// Comparison used for population sorting: higher fitness first.
    pub fn by_fitness_desc(a: &Chromosome, b: &Chromosome) -> Ordering {
        b.fitness
            .partial_cmp(&a.fitness)
            .unwrap_or(Ordering::Equal)
    }
}

impl Default for Chromosome {
    fn default() -> Self {
        Chromosome::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;

    fn fitness_of(value: f64) -> FitnessFn {
        Arc::new(move |_c: &Chromosome| value)
    }

    #[test]
    fn binary_string_round_trip() {
        let chromosome = Chromosome::from_binary_string("10110010").unwrap();
        assert_eq!(chromosome.len(), 8);
        assert_eq!(chromosome.to_binary_string(), "10110010");
        assert_eq!(chromosome.to_value_string(), "10110010");
    }

    #[test]
    fn rejects_invalid_binary_string() {
        assert!(Chromosome::from_binary_string("10x1").is_err());
    }

    #[test]
    fn value_string_spaces_non_binary_genes() {
        let chromosome = Chromosome::from_reals([1.5, -2.0]);
        assert_eq!(chromosome.to_value_string(), "1.5 -2");

        let ints = Chromosome::from_integers([3, -7, 0]);
        assert_eq!(ints.to_value_string(), "3 -7 0");
    }

    #[test]
    fn evaluate_stores_in_range_fitness() {
        let mut chromosome = Chromosome::random(4, &mut create_rng(1));
        let scored = chromosome.evaluate(&fitness_of(0.75)).unwrap();
        assert_eq!(scored, 0.75);
        assert_eq!(chromosome.fitness(), 0.75);
    }

    #[test]
    fn evaluate_rejects_out_of_range_fitness() {
        let mut chromosome = Chromosome::random(4, &mut create_rng(1));
        assert!(matches!(
            chromosome.evaluate(&fitness_of(1.5)),
            Err(Error::Evaluation(_))
        ));
        assert!(matches!(
            chromosome.evaluate(&fitness_of(-0.1)),
            Err(Error::Evaluation(_))
        ));
        // a failed evaluation must not overwrite the stored fitness
        assert_eq!(chromosome.fitness(), 0.0);
    }

    #[test]
    fn deep_clone_with_fitness_reset() {
        let mut chromosome = Chromosome::from_binary_string("1100").unwrap();
        chromosome.evaluate(&fitness_of(0.9)).unwrap();

        let kept = chromosome.deep_clone(false).unwrap();
        assert_eq!(kept.fitness(), 0.9);
        assert_eq!(kept.id(), chromosome.id());
        assert_eq!(kept.to_value_string(), chromosome.to_value_string());

        let reset = chromosome.deep_clone(true).unwrap();
        assert_eq!(reset.fitness(), 0.0);
        // the source keeps its score
        assert_eq!(chromosome.fitness(), 0.9);
    }

    #[test]
    fn sorts_by_descending_fitness() {
        let mut a = Chromosome::random(4, &mut create_rng(2));
        let mut b = Chromosome::random(4, &mut create_rng(3));
        a.evaluate(&fitness_of(0.2)).unwrap();
        b.evaluate(&fitness_of(0.8)).unwrap();

        let mut list = vec![a, b];
        list.sort_by(Chromosome::by_fitness_desc);
        assert_eq!(list[0].fitness(), 0.8);
        assert_eq!(list[1].fitness(), 0.2);
    }

    #[test]
    fn regenerate_id_changes_identity() {
        let mut chromosome = Chromosome::random(4, &mut create_rng(4));
        let original = chromosome.id();
        chromosome.regenerate_id();
        assert_ne!(chromosome.id(), original);
    }
}
