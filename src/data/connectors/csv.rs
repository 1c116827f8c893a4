use crate::config::DataConfig;
use crate::error::{MinerError, Result};
use crate::types::AttributeValue;
use polars::prelude::*;
use std::path::Path;
use super::{
    dictionary::AttributeDictionary,
    types::{DatasetMetadata, LoadedSeries},
};

pub struct CsvConnector;

impl CsvConnector {
    pub fn ensure_readable(path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(MinerError::DataLoading(format!(
                "Input file not found: {}",
                path.display()
            )));
        }
        Ok(())
    }

    /// Load CSV file into DataFrame
    pub fn load<P: AsRef<Path>>(path: P, separator: u8) -> Result<DataFrame> {
        let path = path.as_ref();
        Self::ensure_readable(path)?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_parse_options(CsvParseOptions::default().with_separator(separator))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
            .map_err(|e| MinerError::DataLoading(format!("Failed to read CSV: {}", e)))?;

        Ok(df)
    }

    /// Load a dataset and split it into target, timestamps and attribute columns.
    ///
    /// Rows with a wrong number of fields are parsed best-effort by polars; there is
    /// no schema validation beyond requiring the target column.
    pub fn load_series<P: AsRef<Path>>(
        path: P,
        config: &DataConfig,
        dictionary: Option<&AttributeDictionary>,
    ) -> Result<(LoadedSeries, DatasetMetadata)> {
        let df = Self::load(&path, config.separator_byte())?;
        let timestamp_column = Self::detect_timestamp_column(&df, config);
        let series = Self::split_columns(&df, config, dictionary)?;

        let metadata = series.metadata(&path.as_ref().to_string_lossy(), timestamp_column);
        if metadata.missing_target > 0 {
            log::warn!(
                "{}: {} target values are not numeric and will be treated as NaN",
                metadata.file_path,
                metadata.missing_target
            );
        }
        log::info!(
            "Loaded {}: {} rows, {} attributes",
            metadata.file_path,
            metadata.num_rows,
            metadata.num_attributes
        );

        Ok((series, metadata))
    }

    pub fn split_columns(
        df: &DataFrame,
        config: &DataConfig,
        dictionary: Option<&AttributeDictionary>,
    ) -> Result<LoadedSeries> {
        let columns: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        if !columns.iter().any(|c| c == &config.target_column) {
            return Err(MinerError::DataLoading(format!(
                "Missing target column '{}' (found: {:?})",
                config.target_column, columns
            )));
        }

        let target = Self::numeric_column(df, &config.target_column)?;
        let timestamp_column = Self::detect_timestamp_column(df, config);
        let timestamps = match &timestamp_column {
            Some(name) => Some(Self::text_column(df, name)?),
            None => None,
        };

        let mut attributes = Vec::new();
        let mut attribute_names = Vec::new();
        for name in columns.iter().filter(|c| {
            *c != &config.target_column && Some(*c) != timestamp_column.as_ref()
        }) {
            let values = Self::numeric_cells(df, name)?;
            attributes.push(values.into_iter().map(AttributeValue::from_cell).collect());

            let id = attribute_names.len();
            let display = match dictionary {
                Some(dict) => dict.display_name(id, name),
                None => name.clone(),
            };
            attribute_names.push(display);
        }

        Ok(LoadedSeries {
            target,
            attributes,
            attribute_names,
            timestamps,
        })
    }

    fn numeric_cells(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        // Non-strict cast: text and other unparsable cells become null
        let column = df.column(name)?.cast(&DataType::Float64)?;
        Ok(column.f64()?.into_iter().collect())
    }

    fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
        Ok(Self::numeric_cells(df, name)?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect())
    }

    fn text_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
        let column = df.column(name)?.cast(&DataType::String)?;
        Ok(column
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or("").to_string())
            .collect())
    }

    fn detect_timestamp_column(df: &DataFrame, config: &DataConfig) -> Option<String> {
        let columns = df.get_column_names();
        config
            .timestamp_columns
            .iter()
            .find(|alias| columns.iter().any(|col| col.as_str() == alias.as_str()))
            .cloned()
    }
}
