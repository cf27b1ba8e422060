//! Symbolic regression by genetic programming, with optional
//! language-model-driven generation, crossover and mutation.

pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod experiment;
pub mod functions;
pub mod types;

pub use error::{GpError, Result};
