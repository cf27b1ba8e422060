use super::evaluator::Evaluator;
use crate::data::{Dataset, FitnessCache};
use crate::engines::generation::ast::ExprTree;
use crate::types::Individual;
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

/// Which half of the evaluator's `(train, test)` pair a cache holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitnessTarget {
    Train,
    Test,
}

/// Memoizing front of an [`Evaluator`]: a canonical expression is scored at
/// most once per cache.
pub struct FitnessAdapter {
    evaluator: Arc<dyn Evaluator>,
    train: Arc<Dataset>,
    test: Arc<Dataset>,
    parallel: bool,
}

impl FitnessAdapter {
    pub fn new(evaluator: Arc<dyn Evaluator>, train: Arc<Dataset>, test: Arc<Dataset>) -> Self {
        Self {
            evaluator,
            train,
            test,
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Calls the evaluator. Errors and NaN become `+inf`.
    fn score(&self, tree: &ExprTree, target: FitnessTarget) -> f64 {
        let fitness = match self.evaluator.evaluate(tree, &self.train, &self.test) {
            Ok((train, test)) => match target {
                FitnessTarget::Train => train,
                FitnessTarget::Test => test,
            },
            Err(e) => {
                log::warn!("Evaluation of {} failed: {}", tree, e);
                f64::INFINITY
            }
        };

        if fitness.is_nan() {
            f64::INFINITY
        } else {
            fitness
        }
    }

    /// Cached fitness of `tree`, evaluating and storing it on a miss.
    pub fn get_or_evaluate(
        &self,
        tree: &ExprTree,
        cache: &mut FitnessCache,
        target: FitnessTarget,
    ) -> f64 {
        let key = tree.render();
        if let Some(fitness) = cache.get(&key) {
            return fitness;
        }

        log::debug!("Cache miss: {}", key);
        let fitness = self.score(tree, target);
        cache.insert(key, fitness);
        fitness
    }

    /// Gives every unscored individual its train fitness. Distinct cache
    /// misses are evaluated once each, in parallel when enabled. Returns the
    /// number of evaluator calls made.
    pub fn evaluate_missing(&self, population: &mut [Individual], cache: &mut FitnessCache) -> usize {
        let scored: Vec<(String, f64)> = {
            let mut seen = HashSet::new();
            let misses: Vec<&Individual> = population
                .iter()
                .filter(|ind| ind.fitness.is_none() && !cache.contains(&ind.expression))
                .filter(|ind| seen.insert(ind.expression.as_str()))
                .collect();

            if self.parallel {
                misses
                    .par_iter()
                    .map(|ind| (ind.expression.clone(), self.score(&ind.tree, FitnessTarget::Train)))
                    .collect()
            } else {
                misses
                    .iter()
                    .map(|ind| (ind.expression.clone(), self.score(&ind.tree, FitnessTarget::Train)))
                    .collect()
            }
        };

        let evaluations = scored.len();
        for (expression, fitness) in scored {
            cache.insert(expression, fitness);
        }

        for ind in population.iter_mut().filter(|ind| ind.fitness.is_none()) {
            ind.fitness = cache.get(&ind.expression);
        }

        evaluations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::PrimitiveSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_adapter(calls: Arc<AtomicUsize>, parallel: bool) -> FitnessAdapter {
        let evaluator = move |tree: &ExprTree, _: &Dataset, _: &Dataset| -> anyhow::Result<(f64, f64)> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok((tree.size() as f64, -(tree.size() as f64)))
        };
        FitnessAdapter::new(
            Arc::new(evaluator),
            Arc::new(Dataset::default()),
            Arc::new(Dataset::default()),
        )
        .with_parallel(parallel)
    }

    #[test]
    fn test_same_expression_evaluated_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let adapter = counting_adapter(calls.clone(), false);
        let pset = PrimitiveSet::standard();
        let tree = ExprTree::parse("add(x1, x2)", &pset).unwrap();
        let mut cache = FitnessCache::new();

        assert_eq!(adapter.get_or_evaluate(&tree, &mut cache, FitnessTarget::Train), 3.0);
        assert_eq!(adapter.get_or_evaluate(&tree, &mut cache, FitnessTarget::Train), 3.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_test_target() {
        let calls = Arc::new(AtomicUsize::new(0));
        let adapter = counting_adapter(calls, false);
        let pset = PrimitiveSet::standard();
        let tree = ExprTree::parse("x1", &pset).unwrap();
        let mut cache = FitnessCache::new();
        assert_eq!(adapter.get_or_evaluate(&tree, &mut cache, FitnessTarget::Test), -1.0);
    }

    #[test]
    fn test_loaded_cache_is_honoured() {
        let calls = Arc::new(AtomicUsize::new(0));
        let adapter = counting_adapter(calls.clone(), false);
        let pset = PrimitiveSet::standard();
        let tree = ExprTree::parse("x1", &pset).unwrap();
        let mut cache = FitnessCache::new();
        cache.insert("x1".to_string(), 42.0);

        assert_eq!(adapter.get_or_evaluate(&tree, &mut cache, FitnessTarget::Train), 42.0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_evaluate_missing_dedupes() {
        for parallel in [false, true] {
            let calls = Arc::new(AtomicUsize::new(0));
            let adapter = counting_adapter(calls.clone(), parallel);
            let pset = PrimitiveSet::standard();
            let mut population: Vec<Individual> = ["x1", "add(x1, x2)", "x1", "sin(x2)"]
                .iter()
                .map(|t| Individual::new(ExprTree::parse(t, &pset).unwrap()))
                .collect();
            population[3].fitness = Some(0.0);
            let mut cache = FitnessCache::new();

            let evaluations = adapter.evaluate_missing(&mut population, &mut cache);
            assert_eq!(evaluations, 2);
            assert_eq!(calls.load(Ordering::SeqCst), 2);
            assert_eq!(population[0].fitness, Some(1.0));
            assert_eq!(population[1].fitness, Some(3.0));
            assert_eq!(population[2].fitness, Some(1.0));
            assert_eq!(population[3].fitness, Some(0.0));
        }
    }

    #[test]
    fn test_evaluator_error_scores_infinity() {
        let failing = |_: &ExprTree, _: &Dataset, _: &Dataset| -> anyhow::Result<(f64, f64)> {
            Err(anyhow::anyhow!("boom"))
        };
        let adapter = FitnessAdapter::new(
            Arc::new(failing),
            Arc::new(Dataset::default()),
            Arc::new(Dataset::default()),
        );
        let pset = PrimitiveSet::standard();
        let tree = ExprTree::parse("x1", &pset).unwrap();
        let mut cache = FitnessCache::new();
        assert!(adapter
            .get_or_evaluate(&tree, &mut cache, FitnessTarget::Train)
            .is_infinite());
    }
}
