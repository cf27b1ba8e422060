pub mod evolution;
pub mod llm;
pub mod manager;
pub mod paths;
pub mod traits;

pub use evolution::EvolutionConfig;
pub use llm::LlmConfig;
pub use manager::{AppConfig, ConfigManager};
pub use paths::PathsConfig;
pub use traits::ConfigSection;
