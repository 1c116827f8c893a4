use crate::config::MiningConfig;
use crate::data::TimeSeriesStore;
use crate::engines::evaluation::{Moments, SummaryStats};
use crate::types::{AttributeValue, Quadrant, RuleAttribute, RuleStatistics};

/// Result of replaying the whole window against one exact signature
#[derive(Debug, Clone, PartialEq)]
pub struct Rematch {
    pub matched_rows: Vec<usize>,
    pub effective_rows: usize, // rows with no missing value on any rule attribute
    pub quadrant_counts: [usize; Quadrant::COUNT],
    pub moments: Vec<Moments>,
}

impl Rematch {
    pub fn run(store: &TimeSeriesStore, attributes: &[RuleAttribute]) -> Self {
        let span = store.future_span();
        let mut matched_rows = Vec::new();
        let mut effective_rows = 0;
        let mut quadrant_counts = [0; Quadrant::COUNT];
        let mut moments = vec![Moments::default(); span];

        for &row in store.window() {
            let mut all_present = true;
            let mut any_missing = false;
            for attr in attributes {
                match store.attribute_at(row, attr.id, attr.delay) {
                    AttributeValue::Present => {}
                    AttributeValue::Absent => all_present = false,
                    AttributeValue::Missing => {
                        all_present = false;
                        any_missing = true;
                    }
                }
            }
            if !any_missing {
                effective_rows += 1;
            }
            if !all_present {
                continue;
            }

            let futures = store.future_row(row);
            for (k, &value) in futures.iter().enumerate() {
                moments[k].push(value);
            }
            if futures.len() >= 2 {
                if let Some(q) = Quadrant::classify(futures[0], futures[1]) {
                    quadrant_counts[q.index()] += 1;
                }
            }
            matched_rows.push(row);
        }

        Self {
            matched_rows,
            effective_rows,
            quadrant_counts,
            moments,
        }
    }

    pub fn match_count(&self) -> usize {
        self.matched_rows.len()
    }
}

/// Support ratio, 0 when there are no rows at all
pub fn support_value(matched: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    }
}

/// Share of classified rows in the most common quadrant, with that quadrant.
/// Ties go to the lowest quadrant index.
pub fn concentration(counts: &[usize; Quadrant::COUNT]) -> (f64, Option<Quadrant>) {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return (0.0, None);
    }
    let mut best = 0;
    for (i, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = i;
        }
    }
    (counts[best] as f64 / total as f64, Quadrant::from_index(best))
}

/// Why a candidate did not become a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    TooFewAttributes,
    LowConcentration,
    Deviation,
    LowSupport,
    HighVariance,
}

/// Staged accept/reject pipeline; the first failing gate wins
pub struct QualityFilter<'a> {
    config: &'a MiningConfig,
    store: &'a TimeSeriesStore,
}

impl<'a> QualityFilter<'a> {
    pub fn new(config: &'a MiningConfig, store: &'a TimeSeriesStore) -> Self {
        Self { config, store }
    }

    pub fn rematch(&self, attributes: &[RuleAttribute]) -> Rematch {
        Rematch::run(self.store, attributes)
    }

    pub fn evaluate(
        &self,
        attributes: &[RuleAttribute],
        rematch: &Rematch,
    ) -> Result<RuleStatistics, Rejection> {
        if attributes.len() < self.config.min_attributes {
            return Err(Rejection::TooFewAttributes);
        }

        let (concentration, dominant) = concentration(&rematch.quadrant_counts);
        let dominant = match dominant {
            Some(q) if concentration >= self.config.quadrant_threshold_rate => q,
            _ => return Err(Rejection::LowConcentration),
        };
        if self.max_excursion(&rematch.matched_rows, dominant) > self.config.deviation_threshold {
            return Err(Rejection::Deviation);
        }

        let support_count = rematch.match_count();
        let support = support_value(support_count, self.store.window_len());
        if support < self.config.min_support || support_count < self.config.min_support_count {
            return Err(Rejection::LowSupport);
        }

        let summaries: Vec<SummaryStats> = rematch.moments.iter().map(SummaryStats::from_moments).collect();
        if summaries.iter().any(|s| s.sigma > self.config.max_sigma) {
            return Err(Rejection::HighVariance);
        }

        Ok(RuleStatistics {
            support_count,
            support,
            confidence: support_value(support_count, rematch.effective_rows),
            future_mean: summaries.iter().map(|s| s.mean).collect(),
            future_sigma: summaries.iter().map(|s| s.sigma).collect(),
            quadrant_counts: rematch.quadrant_counts,
            concentration,
            dominant_quadrant: Some(dominant),
        })
    }

    /// Quality flags of an accepted rule: (high_support, low_variance)
    pub fn flags(&self, stats: &RuleStatistics) -> (bool, bool) {
        let high_support = stats.support >= 2.0 * self.config.min_support;
        let low_variance = stats
            .future_sigma
            .iter()
            .all(|&s| s <= self.config.max_sigma / 2.0);
        (high_support, low_variance)
    }

    fn max_excursion(&self, rows: &[usize], dominant: Quadrant) -> f64 {
        rows.iter()
            .map(|&row| dominant.excursion(self.store.future(row, 1), self.store.future(row, 2)))
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Horizon;
    use AttributeValue::*;

    fn attr(id: usize, delay: usize) -> RuleAttribute {
        RuleAttribute { id, delay }
    }

    /// 12 rows; attribute 0 present on rows 2..=7, attribute 1 present everywhere
    /// but missing on row 5.
    fn store(target: Vec<f64>) -> TimeSeriesStore {
        let a: Vec<AttributeValue> = (0..12).map(|t| if (2..=7).contains(&t) { Present } else { Absent }).collect();
        let mut b = vec![Present; 12];
        b[5] = Missing;
        TimeSeriesStore::new(
            target,
            vec![a, b],
            vec!["a".into(), "b".into()],
            None,
            Horizon { max_delay: 0, future_span: 2 },
        )
        .unwrap()
    }

    fn rising() -> Vec<f64> {
        vec![-1.0, -1.0, -1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, -1.0, -1.0]
    }

    fn config() -> MiningConfig {
        MiningConfig {
            min_attributes: 1,
            min_support: 0.1,
            min_support_count: 3,
            max_sigma: 1.0,
            quadrant_threshold_rate: 0.9,
            deviation_threshold: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_support_value_zero_total() {
        for matched in [0, 1, 17] {
            assert_eq!(support_value(matched, 0), 0.0);
        }
        assert_eq!(support_value(3, 12), 0.25);
    }

    #[test]
    fn test_concentration_bounds() {
        assert_eq!(concentration(&[0, 0, 0, 0]), (0.0, None));
        assert_eq!(concentration(&[5, 0, 0, 0]), (1.0, Some(Quadrant::UpUp)));
        let (c, q) = concentration(&[1, 3, 3, 1]);
        assert_eq!(c, 0.375);
        assert_eq!(q, Some(Quadrant::DownUp));
        for counts in [[1, 1, 1, 1], [9, 0, 1, 0], [0, 2, 0, 7]] {
            let (c, _) = concentration(&counts);
            assert!((0.0..=1.0).contains(&c));
        }
    }

    #[test]
    fn test_rematch_rows_and_effective_rows() {
        let store = store(rising());
        let rematch = Rematch::run(&store, &[attr(0, 0), attr(1, 0)]);
        // Window is rows 0..=9; a∧b on 2,3,4,6,7; row 5 has b missing
        assert_eq!(rematch.matched_rows, vec![2, 3, 4, 6, 7]);
        assert_eq!(rematch.effective_rows, 9);
    }

    #[test]
    fn test_accepts_concentrated_rule() {
        let store = store(rising());
        let config = config();
        let filter = QualityFilter::new(&config, &store);
        let attributes = [attr(0, 0)];
        let rematch = filter.rematch(&attributes);
        // Rows 2..=7, futures X[3..=9] all 2.0
        let stats = filter.evaluate(&attributes, &rematch).unwrap();
        assert_eq!(stats.support_count, 6);
        assert_eq!(stats.concentration, 1.0);
        assert_eq!(stats.dominant_quadrant, Some(Quadrant::UpUp));
        assert_eq!(stats.future_mean, vec![2.0, 2.0]);
        assert_eq!(stats.future_sigma, vec![0.0, 0.0]);
    }

    #[test]
    fn test_gate_order() {
        let store = store(rising());
        let strict_count = MiningConfig {
            min_attributes: 2,
            ..config()
        };
        let filter = QualityFilter::new(&strict_count, &store);
        let attributes = [attr(0, 0)];
        let rematch = filter.rematch(&attributes);
        assert_eq!(filter.evaluate(&attributes, &rematch), Err(Rejection::TooFewAttributes));

        let needs_support = MiningConfig {
            min_support_count: 7,
            ..config()
        };
        let filter = QualityFilter::new(&needs_support, &store);
        assert_eq!(filter.evaluate(&attributes, &rematch), Err(Rejection::LowSupport));

        let tight_sigma = MiningConfig {
            max_sigma: 0.5,
            ..config()
        };
        // One row of delay lets the last match straddle the regime change
        let shifted = [attr(0, 1)];
        let filter = QualityFilter::new(&tight_sigma, &store);
        let rematch = filter.rematch(&shifted);
        assert!(filter.evaluate(&shifted, &rematch).is_err());
    }

    #[test]
    fn test_deviation_tolerance() {
        // Row 7's second future dips below zero
        let mut target = rising();
        target[9] = -0.2;
        let store = store(target);
        let attributes = [attr(0, 0)];

        let loose = MiningConfig {
            quadrant_threshold_rate: 0.8,
            max_sigma: 10.0,
            ..config()
        };
        let filter = QualityFilter::new(&loose, &store);
        let rematch = filter.rematch(&attributes);
        assert!(filter.evaluate(&attributes, &rematch).is_ok());

        let strict = MiningConfig {
            deviation_threshold: 0.1,
            ..loose
        };
        let filter = QualityFilter::new(&strict, &store);
        assert_eq!(filter.evaluate(&attributes, &rematch), Err(Rejection::Deviation));
    }

    #[test]
    fn test_low_concentration() {
        let target = vec![1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let store = store(target);
        let loose = MiningConfig {
            max_sigma: 10.0,
            ..config()
        };
        let filter = QualityFilter::new(&loose, &store);
        let attributes = [attr(0, 0)];
        let rematch = filter.rematch(&attributes);
        assert_eq!(filter.evaluate(&attributes, &rematch), Err(Rejection::LowConcentration));
    }
}
