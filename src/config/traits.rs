use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};

/// One `[section]` of the TOML config file.
pub trait ConfigSection: Serialize + DeserializeOwned + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<()>;
}
