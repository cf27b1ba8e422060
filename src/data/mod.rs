pub mod cache;
pub mod connectors;
pub mod dataset;
pub mod paths;
pub mod persistence;

pub use cache::FitnessCache;
pub use connectors::{CsvConnector, DatasetProvider};
pub use dataset::Dataset;
pub use paths::RunPaths;
