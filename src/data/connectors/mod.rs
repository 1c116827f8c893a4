mod csv;
mod dictionary;
mod types;

pub use csv::CsvConnector;
pub use dictionary::AttributeDictionary;
pub use types::{DatasetMetadata, LoadedSeries};
