use super::traits::ConfigSection;
use crate::error::{GpError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a batch of experiments reads its data and writes its records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of caches, results, records and time logs.
    pub base_path: PathBuf,
    /// Holds `fitness_cases{f}.csv` and `hold_out{f}.csv`.
    pub data_dir: PathBuf,
    /// Label of the model that produced the seed expressions.
    pub llm_path: String,
    pub function_id: u32,
    pub num_experiments: u32,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("../gp_records"),
            data_dir: PathBuf::from("../datasets"),
            llm_path: "gp".to_string(),
            function_id: 1,
            num_experiments: 1,
        }
    }
}

impl ConfigSection for PathsConfig {
    fn section_name() -> &'static str {
        "paths"
    }

    fn validate(&self) -> Result<()> {
        if self.num_experiments == 0 {
            return Err(GpError::Configuration(
                "num_experiments must be at least 1".to_string(),
            ));
        }
        if self.llm_path.trim().is_empty() {
            return Err(GpError::Configuration("llm_path is empty".to_string()));
        }
        Ok(())
    }
}
