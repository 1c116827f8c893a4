use super::traits::{invalid, ConfigSection};
use crate::error::MinerError;
use serde::{Deserialize, Serialize};

/// A bonus granted once `value >= threshold`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub threshold: f64,
    pub bonus: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    pub attribute_weight: f64,
    pub support_weight: f64,
    pub sigma_weight: f64,
    pub sigma_epsilon: f64,
    pub direction_bonus: f64,
    pub new_rule_bonus: f64,
    pub duplicate_bonus: f64,
    pub tie_epsilon: f64,
    pub concentration_tiers: Vec<Tier>,
    pub significance_tiers: Vec<Tier>, // keyed on max |future mean|
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            attribute_weight: 1.0,
            support_weight: 10.0,
            sigma_weight: 1.0,
            sigma_epsilon: 0.1,
            direction_bonus: 5.0,
            new_rule_bonus: 20.0,
            duplicate_bonus: 2.0,
            tie_epsilon: 1e-6,
            concentration_tiers: vec![
                Tier { threshold: 0.7, bonus: 5.0 },
                Tier { threshold: 0.8, bonus: 10.0 },
                Tier { threshold: 0.9, bonus: 20.0 },
            ],
            significance_tiers: vec![
                Tier { threshold: 0.1, bonus: 2.0 },
                Tier { threshold: 0.2, bonus: 5.0 },
                Tier { threshold: 0.5, bonus: 10.0 },
            ],
        }
    }
}

impl FitnessConfig {
    /// Bonus of the highest tier `value` reaches, 0 when none
    pub fn tier_bonus(tiers: &[Tier], value: f64) -> f64 {
        tiers
            .iter()
            .rev()
            .find(|tier| value >= tier.threshold)
            .map(|tier| tier.bonus)
            .unwrap_or(0.0)
    }
}

fn ascending(tiers: &[Tier]) -> bool {
    tiers.windows(2).all(|w| w[0].threshold < w[1].threshold)
}

impl ConfigSection for FitnessConfig {
    fn section_name() -> &'static str {
        "fitness"
    }

    fn validate(&self) -> Result<(), MinerError> {
        let section = Self::section_name();
        if !(self.sigma_epsilon > 0.0) {
            return Err(invalid(section, "sigma_epsilon must be positive"));
        }
        if !(self.tie_epsilon > 0.0) {
            return Err(invalid(section, "tie_epsilon must be positive"));
        }
        if self.duplicate_bonus > self.new_rule_bonus {
            return Err(invalid(section, "duplicate_bonus must not exceed new_rule_bonus"));
        }
        if !ascending(&self.concentration_tiers) || !ascending(&self.significance_tiers) {
            return Err(invalid(section, "tier thresholds must be strictly ascending"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_bonus_picks_highest_reached() {
        let config = FitnessConfig::default();
        assert_eq!(FitnessConfig::tier_bonus(&config.concentration_tiers, 0.5), 0.0);
        assert_eq!(FitnessConfig::tier_bonus(&config.concentration_tiers, 0.75), 5.0);
        assert_eq!(FitnessConfig::tier_bonus(&config.concentration_tiers, 1.0), 20.0);
    }

    #[test]
    fn test_rejects_unordered_tiers() {
        let config = FitnessConfig {
            significance_tiers: vec![
                Tier { threshold: 0.5, bonus: 1.0 },
                Tier { threshold: 0.2, bonus: 2.0 },
            ],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
