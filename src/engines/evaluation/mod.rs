pub mod evaluator;
pub mod fitness;

pub use evaluator::{Evaluator, MseEvaluator};
pub use fitness::{FitnessAdapter, FitnessTarget};
