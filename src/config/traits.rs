use crate::error::MinerError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), MinerError>;
}

pub(crate) fn invalid(section: &str, message: &str) -> MinerError {
    MinerError::Configuration(format!("[{}] {}", section, message))
}
