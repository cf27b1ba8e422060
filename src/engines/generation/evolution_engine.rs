use crate::config::{ConfigSection, EvolutionConfig};
use crate::data::FitnessCache;
use crate::engines::evaluation::FitnessAdapter;
use crate::engines::generation::{
    hall_of_fame::HallOfFame,
    operators::{crossover, mutate, random_tree, select_best, tournament_selection, TreeShape},
    seed_pool::SeedPool,
};
use crate::engines::llm::SemanticOperators;
use crate::error::{GpError, Result};
use crate::functions::PrimitiveSet;
use crate::types::{GenerationRecord, Individual};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::sync::Arc;

/// How generation 0 is built.
pub enum InitMethod {
    /// Ramped half-and-half trees between the configured init depths.
    Random,
    /// Draws with replacement from a pool of ready trees.
    Seeded(SeedPool),
}

/// Which crossover and mutation the VARY step uses.
pub enum Variation {
    /// Subtree swap and subtree replacement.
    Structural,
    /// Rewrites proposed by a language model.
    Semantic(SemanticOperators),
}

pub trait ProgressCallback {
    fn on_generation_start(&mut self, generation: usize);
    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, hall_of_fame_size: usize);
    fn on_individuals_evaluated(&mut self, generation: usize, evaluations: usize, population: usize);
}

/// Everything a finished run leaves behind.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Lowest-error individual seen after any replacement.
    pub best: Option<Individual>,
    pub hall_of_fame: Vec<Individual>,
    /// Per-generation records, each generation sorted by train fitness.
    pub records: Vec<GenerationRecord>,
    /// Canonical text of every member of generation 0.
    pub first_generation: Vec<String>,
    /// Number of evaluator calls made during the run.
    pub evaluations: usize,
}

pub struct EvolutionEngine {
    config: EvolutionConfig,
    pset: Arc<PrimitiveSet>,
    init: InitMethod,
    variation: Variation,
    hall_of_fame: HallOfFame,
    rng: StdRng,
}

impl EvolutionEngine {
    pub fn new(config: EvolutionConfig, pset: Arc<PrimitiveSet>) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let hall_of_fame = HallOfFame::new(config.hall_of_fame_size);

        Ok(Self {
            config,
            pset,
            init: InitMethod::Random,
            variation: Variation::Structural,
            hall_of_fame,
            rng,
        })
    }

    pub fn with_init(mut self, init: InitMethod) -> Self {
        self.init = init;
        self
    }

    pub fn with_variation(mut self, variation: Variation) -> Self {
        self.variation = variation;
        self
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn get_hall_of_fame(&self) -> &HallOfFame {
        &self.hall_of_fame
    }

    /// Runs `num_generations` cycles of
    /// EVALUATE, LOG, SELECT, VARY, REPAIR, REPLACE.
    ///
    /// Train fitness is resolved through `cache`; whatever the run adds to it
    /// stays there for the caller to persist.
    pub fn run<C: ProgressCallback>(
        &mut self,
        adapter: &FitnessAdapter,
        cache: &mut FitnessCache,
        callback: &mut C,
    ) -> Result<RunOutcome> {
        let mut population = self.initialize_population()?;
        let mut records = Vec::with_capacity(self.config.population_size * self.config.num_generations);
        let mut first_generation = Vec::new();
        let mut evaluations = 0;

        for generation in 0..self.config.num_generations {
            callback.on_generation_start(generation);

            let evaluated = adapter.evaluate_missing(&mut population, cache);
            evaluations += evaluated;
            callback.on_individuals_evaluated(generation, evaluated, population.len());

            if generation == 0 {
                first_generation = population.iter().map(|ind| ind.expression.clone()).collect();
            }
            records.extend(Self::generation_records(generation, &population));

            let selected: Vec<Individual> = (0..population.len())
                .map(|_| tournament_selection(&population, self.config.tournament_size, &mut self.rng))
                .collect();

            let mut offspring = self.vary(&selected);
            self.repair(&mut offspring, &selected);

            evaluations += adapter.evaluate_missing(&mut offspring, cache);
            population = self.replace(&population, &offspring);

            self.hall_of_fame.update(&population);
            let best_fitness = self
                .hall_of_fame
                .best()
                .map(Individual::rank_key)
                .unwrap_or(f64::INFINITY);
            callback.on_generation_complete(generation, best_fitness, self.hall_of_fame.len());
        }

        if let Some(best) = self.hall_of_fame.best() {
            log::info!("Best individual: {} (fitness {})", best.expression, best.rank_key());
        }

        Ok(RunOutcome {
            best: self.hall_of_fame.best().cloned(),
            hall_of_fame: self.hall_of_fame.get_all().to_vec(),
            records,
            first_generation,
            evaluations,
        })
    }

    fn initialize_population(&mut self) -> Result<Vec<Individual>> {
        let size = self.config.population_size;
        match &self.init {
            InitMethod::Random => (0..size)
                .map(|_| {
                    random_tree(
                        &self.pset,
                        self.config.init_min_depth,
                        self.config.init_max_depth,
                        TreeShape::HalfAndHalf,
                        &mut self.rng,
                    )
                    .map(Individual::new)
                })
                .collect(),
            InitMethod::Seeded(pool) => {
                if pool.is_empty() {
                    return Err(GpError::Configuration(
                        "Seeded initialisation needs a non-empty seed pool".to_string(),
                    ));
                }
                Ok((0..size)
                    .filter_map(|_| pool.sample(&mut self.rng))
                    .cloned()
                    .map(Individual::new)
                    .collect())
            }
        }
    }

    fn generation_records(generation: usize, population: &[Individual]) -> Vec<GenerationRecord> {
        let mut records: Vec<GenerationRecord> = population
            .iter()
            .map(|ind| GenerationRecord {
                generation,
                expression: ind.expression.clone(),
                train_fitness: ind.rank_key(),
                test_fitness: None,
            })
            .collect();
        records.sort_by(|a, b| a.train_fitness.total_cmp(&b.train_fitness));
        records
    }

    /// Crossover on adjacent pairs, then per-individual mutation. Varied
    /// individuals lose their fitness.
    fn vary(&mut self, selected: &[Individual]) -> Vec<Individual> {
        let mut offspring = selected.to_vec();
        let limit = self.config.height_limit;

        for i in (0..offspring.len() / 2).map(|pair| pair * 2) {
            if self.rng.gen::<f64>() >= self.config.crossover_rate {
                continue;
            }
            let (child1, child2) = match &self.variation {
                Variation::Structural => {
                    crossover(&offspring[i].tree, &offspring[i + 1].tree, limit, &mut self.rng)
                }
                Variation::Semantic(llm) => {
                    llm.crossover_trees(&offspring[i].tree, &offspring[i + 1].tree, &self.pset, limit)
                }
            };
            offspring[i].replace_tree(child1);
            offspring[i + 1].replace_tree(child2);
        }

        for individual in offspring.iter_mut() {
            if self.rng.gen::<f64>() >= self.config.mutation_rate {
                continue;
            }
            let mutant = match &self.variation {
                Variation::Structural => mutate(
                    &individual.tree,
                    &self.pset,
                    self.config.mutation_min_depth,
                    self.config.mutation_max_depth,
                    limit,
                    &mut self.rng,
                ),
                Variation::Semantic(llm) => llm.mutate_tree(&individual.tree, &self.pset, limit),
            };
            individual.replace_tree(mutant);
        }

        offspring
    }

    /// Any offspring over the height limit reverts to the selected parent
    /// at the same index.
    fn repair(&self, offspring: &mut [Individual], selected: &[Individual]) {
        for (child, parent) in offspring.iter_mut().zip(selected) {
            if child.height() > self.config.height_limit {
                log::debug!(
                    "Repairing {} (height {} > {})",
                    child.expression,
                    child.height(),
                    self.config.height_limit
                );
                *child = parent.clone();
            }
        }
    }

    /// Elites of the current population followed by the best offspring.
    fn replace(&self, population: &[Individual], offspring: &[Individual]) -> Vec<Individual> {
        let elite_size = self.config.elite_size();
        let mut next = select_best(population, elite_size);
        next.extend(select_best(
            offspring,
            self.config.population_size.saturating_sub(elite_size),
        ));
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::engines::generation::ast::ExprTree;
    use crate::engines::generation::progress::SilentProgress;

    fn size_adapter() -> FitnessAdapter {
        let evaluator = |tree: &ExprTree, _: &Dataset, _: &Dataset| -> anyhow::Result<(f64, f64)> {
            Ok((tree.size() as f64, 0.0))
        };
        FitnessAdapter::new(
            Arc::new(evaluator),
            Arc::new(Dataset::default()),
            Arc::new(Dataset::default()),
        )
    }

    fn small_config(seed: u64) -> EvolutionConfig {
        let mut config = EvolutionConfig::new(3);
        config.population_size = 20;
        config.num_generations = 4;
        config.seed = Some(seed);
        config
    }

    #[test]
    fn test_population_size_is_constant() {
        let pset = Arc::new(PrimitiveSet::standard());
        let mut engine = EvolutionEngine::new(small_config(1), pset).unwrap();
        let mut cache = FitnessCache::new();
        let outcome = engine
            .run(&size_adapter(), &mut cache, &mut SilentProgress)
            .unwrap();

        assert_eq!(outcome.first_generation.len(), 20);
        assert_eq!(outcome.records.len(), 20 * 4);
        for generation in 0..4 {
            let fitness: Vec<f64> = outcome
                .records
                .iter()
                .filter(|r| r.generation == generation)
                .map(|r| r.train_fitness)
                .collect();
            assert_eq!(fitness.len(), 20);
            assert!(fitness.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_best_never_gets_worse() {
        let pset = Arc::new(PrimitiveSet::standard());
        let mut engine = EvolutionEngine::new(small_config(2), pset).unwrap();
        let mut cache = FitnessCache::new();
        let outcome = engine
            .run(&size_adapter(), &mut cache, &mut SilentProgress)
            .unwrap();

        let best_per_generation: Vec<f64> = (0..4)
            .map(|g| {
                outcome
                    .records
                    .iter()
                    .filter(|r| r.generation == g)
                    .map(|r| r.train_fitness)
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        assert!(best_per_generation.windows(2).all(|w| w[1] <= w[0]));

        let best = outcome.best.unwrap();
        assert!(best.rank_key() <= best_per_generation[3]);
    }

    #[test]
    fn test_seeded_init_uses_pool() {
        let pset = Arc::new(PrimitiveSet::standard());
        let pool = SeedPool::from_trees(vec![
            ExprTree::parse("add(x1, x2)", &pset).unwrap(),
            ExprTree::parse("sin(x1)", &pset).unwrap(),
        ]);
        let mut engine = EvolutionEngine::new(small_config(3), pset)
            .unwrap()
            .with_init(InitMethod::Seeded(pool));
        let mut cache = FitnessCache::new();
        let outcome = engine
            .run(&size_adapter(), &mut cache, &mut SilentProgress)
            .unwrap();

        assert!(outcome
            .first_generation
            .iter()
            .all(|e| e == "add(x1, x2)" || e == "sin(x1)"));
    }

    #[test]
    fn test_empty_seed_pool_is_an_error() {
        let pset = Arc::new(PrimitiveSet::standard());
        let mut engine = EvolutionEngine::new(small_config(4), pset)
            .unwrap()
            .with_init(InitMethod::Seeded(SeedPool::default()));
        let mut cache = FitnessCache::new();
        assert!(engine
            .run(&size_adapter(), &mut cache, &mut SilentProgress)
            .is_err());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let pset = Arc::new(PrimitiveSet::standard());
        assert!(EvolutionEngine::new(EvolutionConfig::new(0), pset).is_err());
    }
}
