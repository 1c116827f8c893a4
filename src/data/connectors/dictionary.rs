use crate::error::Result;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use super::csv::CsvConnector;

/// Maps numeric attribute ids to display names
#[derive(Debug, Clone, Default)]
pub struct AttributeDictionary {
    names: HashMap<usize, String>,
}

impl AttributeDictionary {
    pub fn new(names: HashMap<usize, String>) -> Self {
        Self { names }
    }

    /// Two headerless columns: `id,name`. Rows whose id is not an integer are skipped.
    pub fn load<P: AsRef<Path>>(path: P, separator: u8) -> Result<Self> {
        let path = path.as_ref();
        let df = CsvReadOptions::default()
            .with_has_header(false)
            .with_parse_options(CsvParseOptions::default().with_separator(separator))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        if df.width() < 2 {
            log::warn!("Dictionary {} has fewer than two columns, ignoring it", path.display());
            return Ok(Self::default());
        }

        let column_names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        let ids = df.column(&column_names[0])?.cast(&DataType::Int64)?;
        let names = df.column(&column_names[1])?.cast(&DataType::String)?;

        let mut map = HashMap::new();
        for (id, name) in ids.i64()?.into_iter().zip(names.str()?.into_iter()) {
            if let (Some(id), Some(name)) = (id, name) {
                if id >= 0 {
                    map.insert(id as usize, name.trim().to_string());
                }
            }
        }
        log::info!("Loaded {} attribute names from {}", map.len(), path.display());

        Ok(Self { names: map })
    }

    /// Load through the dataset connector's existence check first
    pub fn load_checked<P: AsRef<Path>>(path: P, separator: u8) -> Result<Self> {
        CsvConnector::ensure_readable(path.as_ref())?;
        Self::load(path, separator)
    }

    pub fn get(&self, id: usize) -> Option<&str> {
        self.names.get(&id).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name for a data column. Numeric headers are looked up as ids and fall back to
    /// `attr{id}`; other headers are kept as written.
    pub fn display_name(&self, position: usize, header: &str) -> String {
        let header = header.trim();
        match header.parse::<usize>() {
            Ok(id) => self
                .get(id)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("attr{}", id)),
            Err(_) if header.is_empty() => self
                .get(position)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("attr{}", position)),
            Err(_) => header.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_display_name_fallbacks() {
        let mut names = HashMap::new();
        names.insert(12, "volume_spike".to_string());
        let dict = AttributeDictionary::new(names);

        assert_eq!(dict.display_name(0, "12"), "volume_spike");
        assert_eq!(dict.display_name(1, "13"), "attr13");
        assert_eq!(dict.display_name(2, "gap_up"), "gap_up");
        assert_eq!(dict.display_name(3, ""), "attr3");
    }

    #[test]
    fn test_load_dictionary_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dict.csv");
        fs::write(&path, "0,open_high\n1,close_low\nx,broken\n").unwrap();

        let dict = AttributeDictionary::load_checked(&path, b',').unwrap();
        assert_eq!(dict.get(0), Some("open_high"));
        assert_eq!(dict.get(1), Some("close_low"));
        assert_eq!(dict.len(), 2);
    }
}
