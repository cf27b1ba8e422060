pub mod client;
pub mod operators;
pub mod prompts;
pub mod response;

pub use client::{LlmClient, LlmResponse, LoggedClient};
pub use operators::{infix_to_tree, SemanticOperators, INVALID_EXPRESSION};
pub use prompts::TerminalSet;
