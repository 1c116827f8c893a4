use super::context::{EvaluationContext, Moments};
use crate::types::Quadrant;

/// Mean and unbiased standard deviation of one sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub sigma: f64,
}

impl SummaryStats {
    pub fn from_moments(m: &Moments) -> Self {
        if m.count == 0 {
            return Self::default();
        }
        let n = m.count as f64;
        let mean = m.sum / n;
        // Rounding can push the population variance slightly below zero
        let mut variance = (m.sum_sq / n - mean * mean).max(0.0);
        if m.count > 1 {
            variance *= n / (n - 1.0);
        }
        Self {
            count: m.count,
            mean,
            sigma: variance.sqrt(),
        }
    }
}

fn sub_mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Reduced statistics of one (individual, node, depth) cell
#[derive(Debug, Clone, PartialEq)]
pub struct DepthStatistics {
    pub match_count: usize,
    pub visit_count: usize,
    pub negative_count: usize, // rows not lost to missing values
    pub confidence: f64,
    pub mean: Vec<f64>,
    pub sigma: Vec<f64>,
    pub positive_mean: Vec<f64>,
    pub negative_mean: Vec<f64>,
    pub quadrants: [usize; Quadrant::COUNT],
}

/// Statistics for every cell of a generation, same layout as the arena
#[derive(Debug, Clone)]
pub struct StatisticsTable {
    nodes: usize,
    depths: usize,
    cells: Vec<DepthStatistics>,
}

impl StatisticsTable {
    pub fn get(&self, individual: usize, node: usize, depth: usize) -> &DepthStatistics {
        &self.cells[(individual * self.nodes + node) * self.depths + depth]
    }
}

pub struct StatisticsAggregator;

impl StatisticsAggregator {
    pub fn aggregate(context: &EvaluationContext) -> StatisticsTable {
        let dims = context.dims();
        let mut cells = Vec::with_capacity(dims.individuals * dims.nodes * dims.depths);

        for individual in 0..dims.individuals {
            for node in 0..dims.nodes {
                let baseline = context.match_count(individual, node, 0);
                for depth in 0..dims.depths {
                    cells.push(Self::reduce(context, individual, node, depth, baseline));
                }
            }
        }

        StatisticsTable {
            nodes: dims.nodes,
            depths: dims.depths,
            cells,
        }
    }

    fn reduce(
        context: &EvaluationContext,
        individual: usize,
        node: usize,
        depth: usize,
        baseline: usize,
    ) -> DepthStatistics {
        let offsets = context.dims().offsets;
        let match_count = context.match_count(individual, node, depth);
        let visit_count = context.visit_count(individual, node, depth);
        let negative_count = (baseline + match_count).saturating_sub(visit_count);
        let confidence = if negative_count == 0 {
            0.0
        } else {
            match_count as f64 / negative_count as f64
        };

        let mut mean = Vec::with_capacity(offsets);
        let mut sigma = Vec::with_capacity(offsets);
        let mut positive_mean = Vec::with_capacity(offsets);
        let mut negative_mean = Vec::with_capacity(offsets);
        for offset in 0..offsets {
            let summary = SummaryStats::from_moments(&context.moments(individual, node, depth, offset));
            mean.push(summary.mean);
            sigma.push(summary.sigma);

            let ((pos_sum, pos_count), (neg_sum, neg_count)) =
                context.signed_sums(individual, node, depth, offset);
            positive_mean.push(sub_mean(pos_sum, pos_count));
            negative_mean.push(sub_mean(neg_sum, neg_count));
        }

        DepthStatistics {
            match_count,
            visit_count,
            negative_count,
            confidence,
            mean,
            sigma,
            positive_mean,
            negative_mean,
            quadrants: context.quadrants(individual, node, depth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::evaluation::context::ArenaDims;

    fn moments(values: &[f64]) -> Moments {
        let mut m = Moments::default();
        for &v in values {
            m.push(v);
        }
        m
    }

    #[test]
    fn test_unbiased_sigma() {
        let s = SummaryStats::from_moments(&moments(&[1.0, 2.0, 3.0, 4.0]));
        assert!((s.mean - 2.5).abs() < 1e-12);
        // sample variance 1.6667
        assert!((s.sigma - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_single_row_sigma_is_zero() {
        let s = SummaryStats::from_moments(&moments(&[42.0]));
        assert_eq!(s.sigma, 0.0);
        assert!(!s.sigma.is_nan());
    }

    #[test]
    fn test_empty_sample() {
        let s = SummaryStats::from_moments(&Moments::default());
        assert_eq!(s, SummaryStats::default());
    }

    #[test]
    fn test_constant_sample_never_negative_variance() {
        let s = SummaryStats::from_moments(&moments(&[0.1; 7]));
        assert!(!s.sigma.is_nan());
        assert!(s.sigma < 1e-6);
    }

    #[test]
    fn test_negative_count_excludes_missing_noise() {
        let mut ctx = EvaluationContext::new(ArenaDims {
            individuals: 1,
            nodes: 1,
            depths: 2,
            offsets: 2,
        })
        .unwrap();
        // 10 baseline rows; 6 reach depth 1, of which 4 match and 2 hit a missing value
        for _ in 0..10 {
            ctx.record_match(0, 0, 0, &[1.0, 1.0]);
            ctx.record_visit(0, 0, 0);
        }
        for i in 0..6 {
            if i < 4 {
                ctx.record_match(0, 0, 1, &[2.0, -1.0]);
            }
            ctx.record_visit(0, 0, 1);
        }

        let table = StatisticsAggregator::aggregate(&ctx);
        let cell = table.get(0, 0, 1);
        assert_eq!(cell.negative_count, 8);
        assert!((cell.confidence - 0.5).abs() < 1e-12);
        assert_eq!(cell.mean, vec![2.0, -1.0]);
        assert_eq!(cell.positive_mean, vec![2.0, 0.0]);
        assert_eq!(cell.negative_mean, vec![0.0, -1.0]);
        assert_eq!(cell.quadrants, [0, 0, 0, 4]);
    }
}
