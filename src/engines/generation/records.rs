//! On-disk artifacts of a run and the hold-out scoring pass over them.

use crate::data::persistence::{read_jsonl, write_json, write_jsonl};
use crate::data::{FitnessCache, RunPaths};
use crate::engines::evaluation::{FitnessAdapter, FitnessTarget};
use crate::engines::generation::ast::ExprTree;
use crate::engines::generation::evolution_engine::RunOutcome;
use crate::error::Result;
use crate::functions::PrimitiveSet;
use crate::types::GenerationRecord;

/// Writes the train cache, the results log and the generation-0 snapshot.
pub fn persist_run(outcome: &RunOutcome, train_cache: &FitnessCache, paths: &RunPaths) -> Result<()> {
    train_cache.save(&paths.train_fitness_cache)?;
    write_jsonl(&paths.results, &outcome.records)?;
    write_json(&paths.first_generation, &outcome.first_generation)?;
    log::info!(
        "Persisted {} records and {} cached fitness values",
        outcome.records.len(),
        train_cache.len()
    );
    Ok(())
}

/// Adds `test_fitness` to every record of the results log.
///
/// Expressions are resolved through the test cache; a logged expression
/// that no longer parses scores `+inf`. The log and the test cache are
/// rewritten in full.
pub fn compute_test_fitness(
    paths: &RunPaths,
    pset: &PrimitiveSet,
    adapter: &FitnessAdapter,
) -> Result<Vec<GenerationRecord>> {
    let mut records: Vec<GenerationRecord> = read_jsonl(&paths.results)?;
    let mut cache = FitnessCache::load(&paths.test_fitness_cache)?;

    for record in records.iter_mut() {
        let fitness = match cache.get(&record.expression) {
            Some(fitness) => fitness,
            None => match ExprTree::parse(&record.expression, pset) {
                Ok(tree) => adapter.get_or_evaluate(&tree, &mut cache, FitnessTarget::Test),
                Err(e) => {
                    log::warn!("Error processing expression {}: {}", record.expression, e);
                    cache.insert(record.expression.clone(), f64::INFINITY);
                    f64::INFINITY
                }
            },
        };
        record.test_fitness = Some(fitness);
    }

    write_jsonl(&paths.results, &records)?;
    cache.save(&paths.test_fitness_cache)?;
    log::info!("Test fitness computed for {} records", records.len());
    Ok(records)
}
