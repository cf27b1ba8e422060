pub mod evaluation;
pub mod generation;
pub mod llm;
pub mod validation;
