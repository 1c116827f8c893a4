// src/engines/metrics/fitness.rs
use crate::config::FitnessConfig;
use crate::types::RuleStatistics;

/// Outcome of offering an accepted rule to the trial pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    New,
    Duplicate,
    /// Pool at capacity; the rule was neither stored nor counted as a duplicate
    Full,
}

pub struct FitnessEvaluator<'a> {
    config: &'a FitnessConfig,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(config: &'a FitnessConfig) -> Self {
        Self { config }
    }

    /// Starting fitness, strictly decreasing with the index so ranking has no ties
    /// between otherwise equal individuals
    pub fn seed(&self, population: usize) -> Vec<f64> {
        (0..population)
            .map(|i| -(i as f64) * self.config.tie_epsilon)
            .collect()
    }

    /// Contribution of one accepted rule to the individual that produced it
    pub fn score(&self, attribute_count: usize, stats: &RuleStatistics, registration: Registration) -> f64 {
        let mut score = self.quality_score(attribute_count, stats);
        match registration {
            Registration::New => score += self.config.new_rule_bonus,
            Registration::Duplicate => score += self.config.duplicate_bonus,
            Registration::Full => {}
        }
        score
    }

    fn quality_score(&self, attribute_count: usize, stats: &RuleStatistics) -> f64 {
        let c = self.config;
        let mut score = c.attribute_weight * attribute_count as f64 + c.support_weight * stats.support;

        if !stats.future_sigma.is_empty() {
            let mean_sigma = stats.future_sigma.iter().sum::<f64>() / stats.future_sigma.len() as f64;
            score += c.sigma_weight / (mean_sigma + c.sigma_epsilon);
        }

        score += FitnessConfig::tier_bonus(&c.concentration_tiers, stats.concentration);

        let strongest = stats.future_mean.iter().map(|m| m.abs()).fold(0.0, f64::max);
        score += FitnessConfig::tier_bonus(&c.significance_tiers, strongest);

        if Self::direction_consistent(&stats.future_mean) {
            score += c.direction_bonus;
        }

        score
    }

    /// Every offset mean is non-zero and shares one sign
    pub fn direction_consistent(means: &[f64]) -> bool {
        !means.is_empty()
            && (means.iter().all(|&m| m > 0.0) || means.iter().all(|&m| m < 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Quadrant;

    fn stats() -> RuleStatistics {
        RuleStatistics {
            support_count: 20,
            support: 0.2,
            confidence: 0.8,
            future_mean: vec![0.3, 0.25],
            future_sigma: vec![0.1, 0.1],
            quadrant_counts: [19, 1, 0, 0],
            concentration: 0.95,
            dominant_quadrant: Some(Quadrant::UpUp),
        }
    }

    #[test]
    fn test_seed_strictly_decreasing() {
        let config = FitnessConfig::default();
        let seed = FitnessEvaluator::new(&config).seed(5);
        assert!(seed.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(seed[0], 0.0);
    }

    #[test]
    fn test_score_components() {
        let config = FitnessConfig::default();
        let evaluator = FitnessEvaluator::new(&config);
        let base = evaluator.score(2, &stats(), Registration::Full);

        // 2 attributes + 10*0.2 support + 1/(0.1+0.1) sigma + 20 concentration
        // + 5 significance (0.3 >= 0.2) + 5 direction
        let expected = 2.0 + 2.0 + 5.0 + 20.0 + 5.0 + 5.0;
        assert!((base - expected).abs() < 1e-9);

        let new = evaluator.score(2, &stats(), Registration::New);
        let dup = evaluator.score(2, &stats(), Registration::Duplicate);
        assert!((new - base - config.new_rule_bonus).abs() < 1e-9);
        assert!((dup - base - config.duplicate_bonus).abs() < 1e-9);
        assert!(new > dup);
    }

    #[test]
    fn test_direction_consistency() {
        assert!(FitnessEvaluator::direction_consistent(&[0.1, 0.2]));
        assert!(FitnessEvaluator::direction_consistent(&[-0.1, -0.2]));
        assert!(!FitnessEvaluator::direction_consistent(&[0.1, -0.2]));
        assert!(!FitnessEvaluator::direction_consistent(&[0.0, 0.2]));
        assert!(!FitnessEvaluator::direction_consistent(&[]));
    }
}
