use super::traits::{invalid, ConfigSection};
use crate::error::MinerError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub data_dir: String,
    pub target_column: String,
    pub timestamp_columns: Vec<String>,
    pub separator: String,
    pub verification_files: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            target_column: "X".to_string(),
            timestamp_columns: vec!["T".to_string(), "timestamp".to_string()],
            separator: ",".to_string(),
            verification_files: true,
        }
    }
}

impl DataConfig {
    pub fn separator_byte(&self) -> u8 {
        self.separator.as_bytes().first().copied().unwrap_or(b',')
    }
}

impl ConfigSection for DataConfig {
    fn section_name() -> &'static str {
        "data"
    }

    fn validate(&self) -> Result<(), MinerError> {
        let section = Self::section_name();
        if self.target_column.is_empty() {
            return Err(invalid(section, "target_column must not be empty"));
        }
        if self.separator.len() != 1 || !self.separator.is_ascii() {
            return Err(invalid(section, "separator must be a single ASCII character"));
        }
        Ok(())
    }
}
