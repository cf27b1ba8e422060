pub mod validity;

pub use validity::{check_expression, is_valid, SAMPLE_POINT};
