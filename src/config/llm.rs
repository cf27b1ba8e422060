use super::traits::ConfigSection;
use crate::error::{GpError, Result};
use serde::{Deserialize, Serialize};

/// Sampling temperatures for the semantic operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub generation_temperature: f64,
    pub crossover_temperature: f64,
    pub mutation_temperature: f64,
    /// Expressions requested from the model for a seeded start; the
    /// population size when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_pool_size: Option<usize>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            generation_temperature: 1.0,
            crossover_temperature: 1.0,
            mutation_temperature: 1.0,
            seed_pool_size: None,
        }
    }
}

impl ConfigSection for LlmConfig {
    fn section_name() -> &'static str {
        "llm"
    }

    fn validate(&self) -> Result<()> {
        for (name, t) in [
            ("generation_temperature", self.generation_temperature),
            ("crossover_temperature", self.crossover_temperature),
            ("mutation_temperature", self.mutation_temperature),
        ] {
            if !t.is_finite() || t < 0.0 {
                return Err(GpError::Configuration(format!(
                    "{} must be a non-negative number, got {}",
                    name, t
                )));
            }
        }
        if self.seed_pool_size == Some(0) {
            return Err(GpError::Configuration(
                "seed_pool_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
