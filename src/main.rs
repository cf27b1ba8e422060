use llmgp::config::ConfigManager;
use llmgp::data::CsvConnector;
use llmgp::engines::evaluation::MseEvaluator;
use llmgp::engines::generation::ConsoleProgressCallback;
use llmgp::experiment::ExperimentRunner;
use llmgp::functions::PrimitiveSet;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config_path = std::env::args().nth(1);
    let config = ConfigManager::layered(config_path.as_deref())?.get();

    let pset = Arc::new(PrimitiveSet::standard());
    let runner = ExperimentRunner::new(config, &CsvConnector, Arc::new(MseEvaluator::new(pset.clone())))
        .with_pset(pset);

    for summary in runner.run_experiments(&mut ConsoleProgressCallback)? {
        match summary.best {
            Some(best) => log::info!(
                "Experiment {}: best {} (fitness {})",
                summary.experiment_id,
                best.expression,
                best.rank_key()
            ),
            None => log::info!("Experiment {}: no individual scored", summary.experiment_id),
        }
    }
    Ok(())
}
