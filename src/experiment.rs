//! Batches of independent runs for one target function.

use crate::config::AppConfig;
use crate::data::persistence::{write_json, write_jsonl};
use crate::data::{DatasetProvider, FitnessCache, RunPaths};
use crate::engines::evaluation::{Evaluator, FitnessAdapter};
use crate::engines::generation::{
    canonical_to_infix, compute_test_fitness, persist_run, EvolutionEngine, InitMethod,
    ProgressCallback, SeedPool, Variation,
};
use crate::engines::llm::{LlmClient, SemanticOperators};
use crate::error::{GpError, Result};
use crate::functions::PrimitiveSet;
use crate::types::Individual;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// Where generation 0 comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitSource {
    #[default]
    Random,
    /// The experiment's `init_expressions` file.
    SeedFile,
    /// Expressions generated by the model at the start of each experiment.
    Llm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationMode {
    #[default]
    Structural,
    Semantic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExperimentPlan {
    pub init: InitSource,
    pub variation: VariationMode,
}

#[derive(Debug, Clone)]
pub struct ExperimentSummary {
    pub experiment_id: u32,
    pub best: Option<Individual>,
    pub seconds: f64,
}

pub struct ExperimentRunner<'a> {
    config: AppConfig,
    pset: Arc<PrimitiveSet>,
    provider: &'a dyn DatasetProvider,
    evaluator: Arc<dyn Evaluator>,
    client: Option<Arc<dyn LlmClient>>,
    plan: ExperimentPlan,
}

impl<'a> ExperimentRunner<'a> {
    pub fn new(config: AppConfig, provider: &'a dyn DatasetProvider, evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            config,
            pset: Arc::new(PrimitiveSet::standard()),
            provider,
            evaluator,
            client: None,
            plan: ExperimentPlan::default(),
        }
    }

    pub fn with_pset(mut self, pset: Arc<PrimitiveSet>) -> Self {
        self.pset = pset;
        self
    }

    pub fn with_llm(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_plan(mut self, plan: ExperimentPlan) -> Self {
        self.plan = plan;
        self
    }

    fn client(&self) -> Result<Arc<dyn LlmClient>> {
        self.client
            .clone()
            .ok_or_else(|| GpError::Configuration("This plan needs an LLM client".to_string()))
    }

    /// Runs experiments `1..=num_experiments` and writes the shared time log.
    pub fn run_experiments<C: ProgressCallback>(&self, callback: &mut C) -> Result<Vec<ExperimentSummary>> {
        self.config.validate()?;

        let total = self.config.paths.num_experiments;
        let mut summaries = Vec::with_capacity(total as usize);
        let mut times = serde_json::Map::new();

        for experiment_id in 1..=total {
            log::info!("Running experiment {}/{}...", experiment_id, total);
            let summary = self.run_experiment(experiment_id, callback)?;
            log::info!(
                "Experiment {} completed in {:.2} seconds",
                experiment_id,
                summary.seconds
            );
            times.insert(format!("experiment_{}", experiment_id), json!(summary.seconds));
            summaries.push(summary);
        }

        times.insert("completed_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));
        write_json(RunPaths::time_log_for(&self.config.paths), &times)?;
        Ok(summaries)
    }

    /// One full run: evolve, persist, then score the log on hold-out data.
    pub fn run_experiment<C: ProgressCallback>(
        &self,
        experiment_id: u32,
        callback: &mut C,
    ) -> Result<ExperimentSummary> {
        if experiment_id == 0 {
            return Err(GpError::Configuration(
                "Experiment ids start at 1".to_string(),
            ));
        }

        let started = Instant::now();
        let paths = RunPaths::resolve(&self.config.paths, experiment_id);
        paths.ensure_parent_dirs()?;

        let (train, test) = self.provider.load(&paths)?;
        let adapter = FitnessAdapter::new(self.evaluator.clone(), Arc::new(train), Arc::new(test))
            .with_parallel(self.config.evolution.parallel_evaluation);
        let mut cache = FitnessCache::load(&paths.train_fitness_cache)?;

        let mut evolution = self.config.evolution.clone();
        evolution.seed = evolution
            .seed
            .map(|seed| seed.wrapping_add(u64::from(experiment_id) - 1));
        let height_limit = evolution.height_limit;

        let init = match self.plan.init {
            InitSource::Random => InitMethod::Random,
            InitSource::SeedFile => InitMethod::Seeded(SeedPool::from_jsonl(
                &paths.init_expressions,
                &self.pset,
                height_limit,
            )?),
            InitSource::Llm => {
                let mut operators = SemanticOperators::from_config(self.client()?, &self.config.llm);
                let mut rng = match evolution.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let count = self
                    .config
                    .llm
                    .seed_pool_size
                    .unwrap_or(evolution.population_size);
                let pool = SeedPool::from_llm(&mut operators, count, &self.pset, height_limit, &mut rng);

                let stored: Vec<serde_json::Value> = pool
                    .trees()
                    .iter()
                    .map(|tree| json!({ "expression": canonical_to_infix(tree, &self.pset) }))
                    .collect();
                write_jsonl(&paths.init_expressions, &stored)?;
                InitMethod::Seeded(pool)
            }
        };

        let variation = match self.plan.variation {
            VariationMode::Structural => Variation::Structural,
            VariationMode::Semantic => {
                Variation::Semantic(SemanticOperators::from_config(self.client()?, &self.config.llm))
            }
        };

        let mut engine = EvolutionEngine::new(evolution, self.pset.clone())?
            .with_init(init)
            .with_variation(variation);
        let outcome = engine.run(&adapter, &mut cache, callback)?;

        persist_run(&outcome, &cache, &paths)?;
        compute_test_fitness(&paths, &self.pset, &adapter)?;

        Ok(ExperimentSummary {
            experiment_id,
            best: outcome.best,
            seconds: started.elapsed().as_secs_f64(),
        })
    }
}
