use super::{
    evolution::EvolutionConfig, llm::LlmConfig, paths::PathsConfig, traits::ConfigSection,
};
use crate::error::{GpError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix of environment overrides, e.g. `LLMGP__EVOLUTION__TOURNAMENT_SIZE=3`.
pub const ENV_PREFIX: &str = "LLMGP";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

impl AppConfig {
    pub fn new(evolution: EvolutionConfig) -> Self {
        Self {
            evolution,
            llm: LlmConfig::default(),
            paths: PathsConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.evolution.validate()?;
        self.llm.validate()?;
        self.paths.validate()?;
        Ok(())
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl ConfigManager {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GpError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = toml::from_str(&contents)
            .map_err(|e| GpError::Configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(Self::new(config))
    }

    /// File (if any) overlaid with `LLMGP__SECTION__FIELD` environment variables.
    pub fn layered<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path.as_ref()).format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| GpError::Configuration(format!("Failed to load config: {}", e)))?;

        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| GpError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| GpError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        match self.config.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Applies `f` and keeps the result only if it still validates.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut candidate = self.get();
        f(&mut candidate);
        candidate.validate()?;

        let mut guard = match self.config.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = candidate;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::new(EvolutionConfig::new(3));
        config.evolution.seed = Some(42);
        config.paths.function_id = 4;
        let manager = ConfigManager::new(config.clone());
        manager.save_to_file(&path).unwrap();

        let reloaded = ConfigManager::from_file(&path).unwrap();
        assert_eq!(reloaded.get(), config);
    }

    #[test]
    fn test_missing_tournament_size_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[evolution]\npopulation_size = 20\n").unwrap();

        assert!(matches!(
            ConfigManager::from_file(&path),
            Err(GpError::Configuration(_))
        ));
    }

    #[test]
    fn test_layered_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[evolution]\ntournament_size = 2\n\n[paths]\nfunction_id = 7\n",
        )
        .unwrap();

        std::env::set_var("LLMGP__EVOLUTION__NUM_GENERATIONS", "25");
        let manager = ConfigManager::layered(Some(&path)).unwrap();
        std::env::remove_var("LLMGP__EVOLUTION__NUM_GENERATIONS");

        let config = manager.get();
        assert_eq!(config.evolution.tournament_size, 2);
        assert_eq!(config.evolution.num_generations, 25);
        assert_eq!(config.paths.function_id, 7);
        assert_eq!(config.llm, LlmConfig::default());
    }

    #[test]
    fn test_update_rejects_invalid() {
        let manager = ConfigManager::new(AppConfig::new(EvolutionConfig::new(3)));
        assert!(manager.update(|c| c.evolution.tournament_size = 0).is_err());
        assert_eq!(manager.get().evolution.tournament_size, 3);
        manager.update(|c| c.evolution.tournament_size = 5).unwrap();
        assert_eq!(manager.get().evolution.tournament_size, 5);
    }
}
