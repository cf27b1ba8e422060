use thiserror::Error;

/// Failure to read canonical prefix text back into a tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Unknown terminal: {0}")]
    UnknownTerminal(String),

    #[error("Operator {name} expects {expected} args, got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Malformed expression at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },
}

/// Failure to turn infix math text into canonical prefix text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Unsupported syntax at offset {offset}: {message}")]
    Unsupported { offset: usize, message: String },

    #[error("Unknown function: {0}")]
    UnknownFunction(String),
}

/// An LLM answer (or an expression inside it) that cannot be used.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    #[error("Response carries no usable payload: {0}")]
    MalformedResponse(String),

    #[error("Expected {expected} expressions, got {actual}")]
    WrongCount { expected: usize, actual: usize },

    #[error("Expression does not parse: {0}")]
    Unparsable(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Expression is not real-valued at the sample point: {0}")]
    NonReal(String),
}

#[derive(Error, Debug)]
pub enum GpError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Validation failure: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("Tree height {height} exceeds limit {limit}")]
    StructuralLimitViolation { height: usize, limit: usize },

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Data loading error: {0}")]
    DataLoading(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GpError>;
