use crate::error::{MinerError, Result};
use crate::types::Quadrant;

/// Extents of one generation's evaluation arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaDims {
    pub individuals: usize,
    pub nodes: usize,   // processing nodes per individual
    pub depths: usize,  // max_depth + 1, depth 0 is the unconditional baseline
    pub offsets: usize, // future offsets t+1..=t+offsets
}

/// Raw first and second moments of one future offset
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Moments {
    pub count: usize,
    pub sum: f64,
    pub sum_sq: f64,
}

impl Moments {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }
}

/// Per-generation accumulators, one contiguous buffer per quantity.
///
/// Cell `(individual, node, depth)` lives at
/// `((individual * nodes) + node) * depths + depth`; per-offset buffers multiply
/// that by `offsets`, quadrant buffers by 4. Everything is zeroed by [`Self::reset`]
/// before a generation is walked, so nothing leaks between generations.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    dims: ArenaDims,
    match_count: Vec<usize>,
    visit_count: Vec<usize>,
    sum: Vec<f64>,
    sum_sq: Vec<f64>,
    positive_sum: Vec<f64>,
    positive_count: Vec<usize>,
    negative_sum: Vec<f64>,
    negative_count: Vec<usize>,
    quadrants: Vec<usize>,
}

impl EvaluationContext {
    pub fn new(dims: ArenaDims) -> Result<Self> {
        let cells = dims
            .individuals
            .checked_mul(dims.nodes)
            .and_then(|n| n.checked_mul(dims.depths))
            .ok_or_else(|| MinerError::Evaluation(format!("Arena dimensions overflow: {:?}", dims)))?;
        let offset_cells = cells
            .checked_mul(dims.offsets)
            .ok_or_else(|| MinerError::Evaluation(format!("Arena dimensions overflow: {:?}", dims)))?;
        let quadrant_cells = cells
            .checked_mul(Quadrant::COUNT)
            .ok_or_else(|| MinerError::Evaluation(format!("Arena dimensions overflow: {:?}", dims)))?;

        Ok(Self {
            dims,
            match_count: vec![0; cells],
            visit_count: vec![0; cells],
            sum: vec![0.0; offset_cells],
            sum_sq: vec![0.0; offset_cells],
            positive_sum: vec![0.0; offset_cells],
            positive_count: vec![0; offset_cells],
            negative_sum: vec![0.0; offset_cells],
            negative_count: vec![0; offset_cells],
            quadrants: vec![0; quadrant_cells],
        })
    }

    pub fn dims(&self) -> ArenaDims {
        self.dims
    }

    pub fn reset(&mut self) {
        self.match_count.fill(0);
        self.visit_count.fill(0);
        self.sum.fill(0.0);
        self.sum_sq.fill(0.0);
        self.positive_sum.fill(0.0);
        self.positive_count.fill(0);
        self.negative_sum.fill(0.0);
        self.negative_count.fill(0);
        self.quadrants.fill(0);
    }

    #[inline]
    fn cell(&self, individual: usize, node: usize, depth: usize) -> usize {
        debug_assert!(individual < self.dims.individuals);
        debug_assert!(node < self.dims.nodes);
        debug_assert!(depth < self.dims.depths);
        (individual * self.dims.nodes + node) * self.dims.depths + depth
    }

    /// Count a matched row at `depth` and fold its futures into the accumulators
    pub fn record_match(&mut self, individual: usize, node: usize, depth: usize, futures: &[f64]) {
        let cell = self.cell(individual, node, depth);
        self.match_count[cell] += 1;

        let base = cell * self.dims.offsets;
        for (k, &value) in futures.iter().take(self.dims.offsets).enumerate() {
            let i = base + k;
            self.sum[i] += value;
            self.sum_sq[i] += value * value;
            if value > 0.0 {
                self.positive_sum[i] += value;
                self.positive_count[i] += 1;
            } else if value < 0.0 {
                self.negative_sum[i] += value;
                self.negative_count[i] += 1;
            }
        }

        if futures.len() >= 2 {
            if let Some(q) = Quadrant::classify(futures[0], futures[1]) {
                self.quadrants[cell * Quadrant::COUNT + q.index()] += 1;
            }
        }
    }

    pub fn record_visit(&mut self, individual: usize, node: usize, depth: usize) {
        let cell = self.cell(individual, node, depth);
        self.visit_count[cell] += 1;
    }

    pub fn match_count(&self, individual: usize, node: usize, depth: usize) -> usize {
        self.match_count[self.cell(individual, node, depth)]
    }

    pub fn visit_count(&self, individual: usize, node: usize, depth: usize) -> usize {
        self.visit_count[self.cell(individual, node, depth)]
    }

    pub fn moments(&self, individual: usize, node: usize, depth: usize, offset: usize) -> Moments {
        let cell = self.cell(individual, node, depth);
        let i = cell * self.dims.offsets + offset;
        Moments {
            count: self.match_count[cell],
            sum: self.sum[i],
            sum_sq: self.sum_sq[i],
        }
    }

    /// (sum, count) of strictly positive and strictly negative futures
    pub fn signed_sums(
        &self,
        individual: usize,
        node: usize,
        depth: usize,
        offset: usize,
    ) -> ((f64, usize), (f64, usize)) {
        let i = self.cell(individual, node, depth) * self.dims.offsets + offset;
        (
            (self.positive_sum[i], self.positive_count[i]),
            (self.negative_sum[i], self.negative_count[i]),
        )
    }

    pub fn quadrants(&self, individual: usize, node: usize, depth: usize) -> [usize; Quadrant::COUNT] {
        let base = self.cell(individual, node, depth) * Quadrant::COUNT;
        let mut out = [0; Quadrant::COUNT];
        out.copy_from_slice(&self.quadrants[base..base + Quadrant::COUNT]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> ArenaDims {
        ArenaDims {
            individuals: 2,
            nodes: 3,
            depths: 4,
            offsets: 2,
        }
    }

    #[test]
    fn test_cells_are_independent() {
        let mut ctx = EvaluationContext::new(dims()).unwrap();
        ctx.record_match(1, 2, 3, &[1.5, -0.5]);
        ctx.record_visit(1, 2, 3);

        assert_eq!(ctx.match_count(1, 2, 3), 1);
        assert_eq!(ctx.visit_count(1, 2, 3), 1);
        assert_eq!(ctx.match_count(1, 2, 2), 0);
        assert_eq!(ctx.match_count(0, 2, 3), 0);

        let m = ctx.moments(1, 2, 3, 1);
        assert_eq!(m.sum, -0.5);
        assert_eq!(m.sum_sq, 0.25);
        assert_eq!(ctx.quadrants(1, 2, 3), [0, 0, 0, 1]);
        assert_eq!(ctx.signed_sums(1, 2, 3, 0), ((1.5, 1), (0.0, 0)));
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let mut ctx = EvaluationContext::new(dims()).unwrap();
        ctx.record_match(0, 0, 0, &[1.0, 1.0]);
        ctx.record_visit(0, 0, 0);
        ctx.reset();

        assert_eq!(ctx.match_count(0, 0, 0), 0);
        assert_eq!(ctx.visit_count(0, 0, 0), 0);
        assert_eq!(ctx.moments(0, 0, 0, 0), Moments::default());
        assert_eq!(ctx.quadrants(0, 0, 0), [0; 4]);
    }

    #[test]
    fn test_zero_future_skips_quadrant() {
        let mut ctx = EvaluationContext::new(dims()).unwrap();
        ctx.record_match(0, 1, 1, &[0.0, 2.0]);
        assert_eq!(ctx.quadrants(0, 1, 1), [0; 4]);
        assert_eq!(ctx.match_count(0, 1, 1), 1);
    }

    #[test]
    fn test_overflowing_dims_are_rejected() {
        let result = EvaluationContext::new(ArenaDims {
            individuals: usize::MAX,
            nodes: 2,
            depths: 2,
            offsets: 2,
        });
        assert!(matches!(result, Err(MinerError::Evaluation(_))));
    }
}
