//! Population configuration.

use super::selection::ParentSelection;

/// Configuration carried by a [`Population`](super::Population).
///
/// A single value object: operators that need a fresh working buffer copy
/// it wholesale via [`Population::empty_copy`](super::Population::empty_copy).
///
/// # Builder Pattern
///
/// ```
/// use evokit::population::{ParentSelection, PopulationConfig};
///
/// let config = PopulationConfig::default()
///     .with_parallel(true)
///     .with_parent_selection(ParentSelection::StochasticUniversal);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopulationConfig {
    /// Re-score every chromosome on each evaluation pass. When false, only
    /// chromosomes without a positive fitness are scored. Defaults to
    /// false; enable for noisy fitness landscapes where cached scores go
    /// stale.
    pub re_evaluate_all: bool,

    /// Fan chromosome scoring out across the rayon worker pool.
    pub parallel: bool,

    /// Assign rank-based normalized fitness after each evaluation pass
    /// (worst = 1, best = population size). Reduces selection-pressure
    /// distortion from raw fitness magnitude.
    pub normalize_fitness: bool,

    /// Strategy used by `select_parents`.
    pub parent_selection: ParentSelection,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            re_evaluate_all: false,
            parallel: false,
            normalize_fitness: true,
            parent_selection: ParentSelection::default(),
        }
    }
}

impl PopulationConfig {
    /// Sets whether every chromosome is re-scored on each evaluation pass.
    pub fn with_re_evaluate_all(mut self, re_evaluate_all: bool) -> Self {
        self.re_evaluate_all = re_evaluate_all;
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enables or disables rank-based fitness normalization.
    pub fn with_normalize_fitness(mut self, normalize: bool) -> Self {
        self.normalize_fitness = normalize;
        self
    }

    /// Sets the parent-selection strategy.
    pub fn with_parent_selection(mut self, selection: ParentSelection) -> Self {
        self.parent_selection = selection;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PopulationConfig::default();
        assert!(!config.re_evaluate_all);
        assert!(!config.parallel);
        assert!(config.normalize_fitness);
        assert_eq!(
            config.parent_selection,
            ParentSelection::FitnessProportionate
        );
    }

    #[test]
    fn builder_pattern() {
        let config = PopulationConfig::default()
            .with_re_evaluate_all(true)
            .with_parallel(true)
            .with_normalize_fitness(false)
            .with_parent_selection(ParentSelection::Tournament);

        assert!(config.re_evaluate_all);
        assert!(config.parallel);
        assert!(!config.normalize_fitness);
        assert_eq!(config.parent_selection, ParentSelection::Tournament);
    }
}
