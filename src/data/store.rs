use crate::error::{MinerError, Result};
use crate::types::AttributeValue;

/// Row range the miner may look at, fixed by the longest delay and future offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    pub max_delay: usize,
    pub future_span: usize,
}

/// In-memory time series: one continuous target `X` and discrete attribute columns.
///
/// `future(t, k)` is `X[t + k]`. The evaluation window holds every row that has
/// `max_delay` rows of history and finite values for all `future_span` offsets;
/// it is the row set every count, support ratio and rematch is taken over.
#[derive(Debug, Clone)]
pub struct TimeSeriesStore {
    target: Vec<f64>,
    attributes: Vec<Vec<AttributeValue>>, // [attribute][row]
    attribute_names: Vec<String>,
    timestamps: Option<Vec<String>>,
    horizon: Horizon,
    futures: Vec<f64>, // [row][offset - 1]
    window: Vec<usize>,
}

impl TimeSeriesStore {
    pub fn new(
        target: Vec<f64>,
        attributes: Vec<Vec<AttributeValue>>,
        attribute_names: Vec<String>,
        timestamps: Option<Vec<String>>,
        horizon: Horizon,
    ) -> Result<Self> {
        let rows = target.len();
        if let Some(bad) = attributes.iter().position(|column| column.len() != rows) {
            return Err(MinerError::DataLoading(format!(
                "Attribute column {} has {} rows, target has {}",
                bad,
                attributes[bad].len(),
                rows
            )));
        }
        if attribute_names.len() != attributes.len() {
            return Err(MinerError::DataLoading(format!(
                "{} attribute names for {} attribute columns",
                attribute_names.len(),
                attributes.len()
            )));
        }
        if let Some(ts) = &timestamps {
            if ts.len() != rows {
                return Err(MinerError::DataLoading(format!(
                    "Timestamp column has {} rows, target has {}",
                    ts.len(),
                    rows
                )));
            }
        }
        if horizon.future_span == 0 {
            return Err(MinerError::DataLoading("future_span must be positive".to_string()));
        }

        let mut store = Self {
            target,
            attributes,
            attribute_names,
            timestamps,
            horizon,
            futures: Vec::new(),
            window: Vec::new(),
        };
        store.build_window();
        Ok(store)
    }

    fn build_window(&mut self) {
        let rows = self.rows();
        let span = self.horizon.future_span;
        self.futures = Vec::with_capacity(rows * span);
        for t in 0..rows {
            for k in 1..=span {
                let value = self.target.get(t + k).copied().unwrap_or(f64::NAN);
                self.futures.push(value);
            }
        }

        self.window = (self.horizon.max_delay..rows)
            .filter(|&t| self.future_row(t).iter().all(|v| v.is_finite()))
            .collect();
    }

    pub fn rows(&self) -> usize {
        self.target.len()
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn future_span(&self) -> usize {
        self.horizon.future_span
    }

    /// Attribute value at `row`; out-of-range rows and unknown ids are missing
    pub fn attribute(&self, row: usize, id: usize) -> AttributeValue {
        self.attributes
            .get(id)
            .and_then(|column| column.get(row))
            .copied()
            .unwrap_or(AttributeValue::Missing)
    }

    /// Attribute value `delay` rows before `row`
    pub fn attribute_at(&self, row: usize, id: usize, delay: usize) -> AttributeValue {
        match row.checked_sub(delay) {
            Some(source) => self.attribute(source, id),
            None => AttributeValue::Missing,
        }
    }

    /// `X[row + offset]`, NaN past the end of the series
    pub fn future(&self, row: usize, offset: usize) -> f64 {
        if offset == 0 || offset > self.horizon.future_span || row >= self.rows() {
            return self.target.get(row + offset).copied().unwrap_or(f64::NAN);
        }
        self.futures[row * self.horizon.future_span + offset - 1]
    }

    /// All future values of `row`, offsets 1..=future_span
    pub fn future_row(&self, row: usize) -> &[f64] {
        let span = self.horizon.future_span;
        &self.futures[row * span..(row + 1) * span]
    }

    pub fn window(&self) -> &[usize] {
        &self.window
    }

    /// Nrd: number of evaluable rows
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn attribute_name(&self, id: usize) -> String {
        self.attribute_names
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("attr{}", id))
    }

    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    pub fn target(&self) -> &[f64] {
        &self.target
    }

    /// Timestamp of `row`, the row index when the data carried none
    pub fn timestamp(&self, row: usize) -> String {
        self.timestamps
            .as_ref()
            .and_then(|ts| ts.get(row).cloned())
            .unwrap_or_else(|| row.to_string())
    }
}
