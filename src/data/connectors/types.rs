use crate::types::AttributeValue;
use serde::{Deserialize, Serialize};

/// Columns pulled out of a dataset file, before a horizon is applied
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub target: Vec<f64>,
    pub attributes: Vec<Vec<AttributeValue>>, // [attribute][row]
    pub attribute_names: Vec<String>,
    pub timestamps: Option<Vec<String>>,
}

/// Metadata about a loaded dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub file_path: String,
    pub num_rows: usize,
    pub num_attributes: usize,
    pub timestamp_column: Option<String>,
    pub missing_target: usize,   // X cells that did not parse as numbers
    pub missing_attributes: usize, // attribute cells other than 0/1
}

impl LoadedSeries {
    pub fn metadata(&self, file_path: &str, timestamp_column: Option<String>) -> DatasetMetadata {
        DatasetMetadata {
            file_path: file_path.to_string(),
            num_rows: self.target.len(),
            num_attributes: self.attributes.len(),
            timestamp_column,
            missing_target: self.target.iter().filter(|v| !v.is_finite()).count(),
            missing_attributes: self
                .attributes
                .iter()
                .flatten()
                .filter(|&&v| v == AttributeValue::Missing)
                .count(),
        }
    }
}
