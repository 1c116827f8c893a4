use super::traits::{invalid, ConfigSection};
use crate::error::MinerError;
use serde::{Deserialize, Serialize};

/// Which part of a rule decides whether two rules are the same
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DedupPolicy {
    AttributesOnly,
    AttributesAndDelays,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    pub min_attributes: usize,
    pub min_support: f64,        // Minsup, fraction of window rows
    pub min_support_count: usize,
    pub max_sigma: f64,          // Maxsigx
    pub quadrant_threshold_rate: f64,
    pub deviation_threshold: f64, // absolute, independent of sample size
    pub max_rules: usize,
    pub future_span: usize,
    pub dedup_policy: DedupPolicy,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_attributes: 1,
            min_support: 0.04,
            min_support_count: 10,
            max_sigma: 1.0,
            quadrant_threshold_rate: 0.7,
            deviation_threshold: 0.5,
            max_rules: 2000,
            future_span: 2,
            dedup_policy: DedupPolicy::AttributesAndDelays,
        }
    }
}

impl ConfigSection for MiningConfig {
    fn section_name() -> &'static str {
        "mining"
    }

    fn validate(&self) -> Result<(), MinerError> {
        let section = Self::section_name();
        if self.min_attributes == 0 {
            return Err(invalid(section, "min_attributes must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.min_support) {
            return Err(invalid(section, "min_support must be between 0 and 1"));
        }
        if !(0.0..=1.0).contains(&self.quadrant_threshold_rate) {
            return Err(invalid(section, "quadrant_threshold_rate must be between 0 and 1"));
        }
        if !(self.max_sigma > 0.0) {
            return Err(invalid(section, "max_sigma must be positive"));
        }
        if !(self.deviation_threshold >= 0.0) {
            return Err(invalid(section, "deviation_threshold must not be negative"));
        }
        if self.max_rules == 0 {
            return Err(invalid(section, "max_rules must be positive"));
        }
        if self.future_span < 2 {
            return Err(invalid(section, "future_span must cover at least t+1 and t+2"));
        }
        Ok(())
    }
}
