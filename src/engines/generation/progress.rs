use super::evolution_engine::ProgressCallback;

/// Reports progress through `log` at info level.
pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        log::info!("Generation {} starting...", generation);
    }

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, hall_of_fame_size: usize) {
        log::info!(
            "Generation {} complete. Best fitness: {:.6}, Hall of Fame size: {}",
            generation,
            best_fitness,
            hall_of_fame_size
        );
    }

    fn on_individuals_evaluated(&mut self, generation: usize, evaluations: usize, population: usize) {
        log::debug!(
            "  Generation {}: {} new evaluations for {} individuals",
            generation,
            evaluations,
            population
        );
    }
}

/// Discards every notification.
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_generation_start(&mut self, _generation: usize) {}

    fn on_generation_complete(&mut self, _generation: usize, _best_fitness: f64, _hall_of_fame_size: usize) {}

    fn on_individuals_evaluated(&mut self, _generation: usize, _evaluations: usize, _population: usize) {}
}
