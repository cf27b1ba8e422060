mod csv;
mod validator;

pub use csv::{CsvConnector, DatasetProvider};
pub use validator::DataValidator;
