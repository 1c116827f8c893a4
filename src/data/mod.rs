pub mod connectors;
pub mod export;
pub mod store;

pub use connectors::{AttributeDictionary, CsvConnector, DatasetMetadata, LoadedSeries};
pub use export::RunExporter;
pub use store::{Horizon, TimeSeriesStore};

use crate::config::AppConfig;
use crate::error::Result;
use std::path::Path;

/// Load a dataset file into a store whose window matches `config`
pub fn load_store<P: AsRef<Path>>(
    path: P,
    config: &AppConfig,
    dictionary: Option<&AttributeDictionary>,
) -> Result<(TimeSeriesStore, DatasetMetadata)> {
    let (series, metadata) = CsvConnector::load_series(path, &config.data, dictionary)?;
    let horizon = Horizon {
        max_delay: config.evolution.max_time_delay,
        future_span: config.mining.future_span,
    };
    let store = TimeSeriesStore::new(
        series.target,
        series.attributes,
        series.attribute_names,
        series.timestamps,
        horizon,
    )?;
    Ok((store, metadata))
}
