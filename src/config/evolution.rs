use super::traits::ConfigSection;
use crate::engines::generation::codec::MAX_NESTING_DEPTH;
use crate::error::{GpError, Result};
use serde::{Deserialize, Serialize};

/// Knobs of one evolutionary run.
///
/// `tournament_size` has no default: a size of 1 degenerates into random
/// selection, so every config file and every constructor must state it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    #[serde(default = "defaults::population_size")]
    pub population_size: usize,
    #[serde(default = "defaults::num_generations")]
    pub num_generations: usize,
    pub tournament_size: usize,
    #[serde(default = "defaults::crossover_rate")]
    pub crossover_rate: f64,
    #[serde(default = "defaults::mutation_rate")]
    pub mutation_rate: f64,
    #[serde(default = "defaults::elitism_rate")]
    pub elitism_rate: f64,
    #[serde(default = "defaults::height_limit")]
    pub height_limit: usize,
    #[serde(default = "defaults::init_min_depth")]
    pub init_min_depth: usize,
    #[serde(default = "defaults::init_max_depth")]
    pub init_max_depth: usize,
    #[serde(default = "defaults::mutation_min_depth")]
    pub mutation_min_depth: usize,
    #[serde(default = "defaults::mutation_max_depth")]
    pub mutation_max_depth: usize,
    #[serde(default = "defaults::hall_of_fame_size")]
    pub hall_of_fame_size: usize,
    #[serde(default)]
    pub parallel_evaluation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

mod defaults {
    pub fn population_size() -> usize {
        50
    }
    pub fn num_generations() -> usize {
        10
    }
    pub fn crossover_rate() -> f64 {
        0.8
    }
    pub fn mutation_rate() -> f64 {
        0.2
    }
    pub fn elitism_rate() -> f64 {
        0.01
    }
    pub fn height_limit() -> usize {
        6
    }
    pub fn init_min_depth() -> usize {
        1
    }
    pub fn init_max_depth() -> usize {
        3
    }
    pub fn mutation_min_depth() -> usize {
        1
    }
    pub fn mutation_max_depth() -> usize {
        2
    }
    pub fn hall_of_fame_size() -> usize {
        1
    }
}

impl EvolutionConfig {
    pub fn new(tournament_size: usize) -> Self {
        Self {
            population_size: defaults::population_size(),
            num_generations: defaults::num_generations(),
            tournament_size,
            crossover_rate: defaults::crossover_rate(),
            mutation_rate: defaults::mutation_rate(),
            elitism_rate: defaults::elitism_rate(),
            height_limit: defaults::height_limit(),
            init_min_depth: defaults::init_min_depth(),
            init_max_depth: defaults::init_max_depth(),
            mutation_min_depth: defaults::mutation_min_depth(),
            mutation_max_depth: defaults::mutation_max_depth(),
            hall_of_fame_size: defaults::hall_of_fame_size(),
            parallel_evaluation: false,
            seed: None,
        }
    }

    /// `max(1, round(population_size * elitism_rate))`, never above the population.
    pub fn elite_size(&self) -> usize {
        let raw = (self.population_size as f64 * self.elitism_rate).round() as usize;
        raw.max(1).min(self.population_size)
    }
}

fn check_rate(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(GpError::Configuration(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )));
    }
    Ok(())
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(GpError::Configuration(
                "Population size must be at least 2".to_string(),
            ));
        }
        if self.tournament_size == 0 {
            return Err(GpError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        check_rate("crossover_rate", self.crossover_rate)?;
        check_rate("mutation_rate", self.mutation_rate)?;
        check_rate("elitism_rate", self.elitism_rate)?;

        if self.init_min_depth > self.init_max_depth {
            return Err(GpError::Configuration(format!(
                "init_min_depth {} exceeds init_max_depth {}",
                self.init_min_depth, self.init_max_depth
            )));
        }
        if self.mutation_min_depth > self.mutation_max_depth {
            return Err(GpError::Configuration(format!(
                "mutation_min_depth {} exceeds mutation_max_depth {}",
                self.mutation_min_depth, self.mutation_max_depth
            )));
        }
        if self.init_max_depth > self.height_limit {
            return Err(GpError::Configuration(format!(
                "Initial trees ({}) may not exceed the height limit ({})",
                self.init_max_depth, self.height_limit
            )));
        }
        // Infix text nests up to two levels per tree level (`-(...)`).
        if self.height_limit * 2 > MAX_NESTING_DEPTH {
            return Err(GpError::Configuration(format!(
                "Height limit {} exceeds the parseable maximum of {}",
                self.height_limit,
                MAX_NESTING_DEPTH / 2
            )));
        }
        if self.hall_of_fame_size == 0 {
            return Err(GpError::Configuration(
                "Hall of fame must hold at least one individual".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = EvolutionConfig::new(3);
        assert!(config.validate().is_ok());
        assert_eq!(config.elite_size(), 1);
    }

    #[test]
    fn test_height_limit_must_stay_parseable() {
        let mut config = EvolutionConfig::new(3);
        config.height_limit = MAX_NESTING_DEPTH / 2;
        assert!(config.validate().is_ok());
        config.height_limit += 1;
        assert!(matches!(config.validate(), Err(GpError::Configuration(_))));
    }

    #[test]
    fn test_elite_size_rounds() {
        let mut config = EvolutionConfig::new(3);
        config.population_size = 500;
        assert_eq!(config.elite_size(), 5);
        config.population_size = 260;
        config.elitism_rate = 0.01;
        assert_eq!(config.elite_size(), 3);
    }

    #[test]
    fn test_tournament_size_is_required() {
        let without: std::result::Result<EvolutionConfig, _> =
            toml::from_str("population_size = 20\n");
        assert!(without.is_err());

        let with: EvolutionConfig = toml::from_str("tournament_size = 4\n").unwrap();
        assert_eq!(with.tournament_size, 4);
        assert_eq!(with.population_size, 50);
        assert_eq!(with.height_limit, 6);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = EvolutionConfig::new(0);
        assert!(config.validate().is_err());
        config.tournament_size = 2;
        config.mutation_rate = 1.5;
        assert!(config.validate().is_err());
        config.mutation_rate = 0.2;
        config.init_max_depth = 9;
        assert!(config.validate().is_err());
    }
}
