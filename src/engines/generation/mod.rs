pub mod ast;
pub mod codec;
pub mod evolution_engine;
pub mod hall_of_fame;
pub mod infix;
pub mod operators;
pub mod progress;
pub mod records;
pub mod seed_pool;

pub use ast::ExprTree;
pub use evolution_engine::{EvolutionEngine, InitMethod, ProgressCallback, RunOutcome, Variation};
pub use hall_of_fame::HallOfFame;
pub use infix::{canonical_to_infix, infix_to_canonical};
pub use progress::{ConsoleProgressCallback, SilentProgress};
pub use records::{compute_test_fitness, persist_run};
pub use seed_pool::SeedPool;
