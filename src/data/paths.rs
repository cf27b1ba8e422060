use crate::config::PathsConfig;
use crate::data::persistence::ensure_parent_dir;
use crate::error::Result;
use std::path::PathBuf;

/// Every file one experiment touches.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPaths {
    pub function_id: u32,
    pub experiment_id: u32,
    pub train_fitness_cache: PathBuf,
    pub test_fitness_cache: PathBuf,
    pub results: PathBuf,
    pub first_generation: PathBuf,
    pub time_log: PathBuf,
    pub init_expressions: PathBuf,
    pub train_data: PathBuf,
    pub test_data: PathBuf,
}

impl RunPaths {
    pub fn resolve(config: &PathsConfig, experiment_id: u32) -> Self {
        let f = config.function_id;
        let e = experiment_id;
        let base = &config.base_path;

        Self {
            function_id: f,
            experiment_id: e,
            train_fitness_cache: base
                .join("caches")
                .join(format!("func{}", f))
                .join(format!("train_fitness_func{}_exp{}.json", f, e)),
            test_fitness_cache: base
                .join("caches")
                .join(format!("func{}", f))
                .join(format!("test_fitness_func{}_exp{}.json", f, e)),
            results: base
                .join("results")
                .join(format!("func{}", f))
                .join(format!("holdout_func{}_exp{}.jsonl", f, e)),
            first_generation: base
                .join("records")
                .join(format!("func{}", f))
                .join(format!("first_generation_func{}_exp{}.json", f, e)),
            time_log: Self::time_log_for(config),
            init_expressions: base
                .join("init_expressions")
                .join(&config.llm_path)
                .join(format!("init_expressions_func{}.jsonl", f)),
            train_data: config.data_dir.join(format!("fitness_cases{}.csv", f)),
            test_data: config.data_dir.join(format!("hold_out{}.csv", f)),
        }
    }

    /// Shared by every experiment of one function.
    pub fn time_log_for(config: &PathsConfig) -> PathBuf {
        let f = config.function_id;
        config
            .base_path
            .join("timelogs")
            .join(format!("func{}", f))
            .join(format!("experiment_time_log_func{}.json", f))
    }

    /// Creates the directories of every output file.
    pub fn ensure_parent_dirs(&self) -> Result<()> {
        for path in [
            &self.train_fitness_cache,
            &self.test_fitness_cache,
            &self.results,
            &self.first_generation,
            &self.time_log,
        ] {
            ensure_parent_dir(path)?;
        }
        Ok(())
    }
}
