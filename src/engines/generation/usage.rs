use crate::types::RuleAttribute;
use rand::Rng;

/// Number of usage slots kept per option
pub const USAGE_WINDOW: usize = 5;

/// Weighted pick over `weights`; uniform when every weight is zero.
/// Returns `None` only for an empty slice.
pub fn roulette_select<R: Rng>(weights: &[u64], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: u64 = weights.iter().sum();
    if total == 0 {
        return Some(rng.gen_range(0..weights.len()));
    }

    let mut spin = rng.gen_range(0..total);
    for (i, &w) in weights.iter().enumerate() {
        if spin < w {
            return Some(i);
        }
        spin -= w;
    }

    // Fallback
    Some(weights.len() - 1)
}

/// Ring of `USAGE_WINDOW` count slots over a fixed set of options.
///
/// The current slot starts at `floor` for every option, so an option no rule has
/// used yet keeps a non-zero weight.
#[derive(Debug, Clone)]
pub struct UsageRing {
    slots: Vec<Vec<u64>>,
    current: usize,
}

impl UsageRing {
    pub fn new(options: usize, floor: u64) -> Self {
        let mut slots = vec![vec![0; options]; USAGE_WINDOW];
        slots[0].fill(floor);
        Self { slots, current: 0 }
    }

    pub fn record(&mut self, option: usize) {
        if let Some(count) = self.slots[self.current].get_mut(option) {
            *count += 1;
        }
    }

    /// Evict the oldest slot and seed it as the new current slot
    pub fn advance(&mut self, floor: u64) {
        self.current = (self.current + 1) % USAGE_WINDOW;
        self.slots[self.current].fill(floor);
    }

    /// Counts summed over the whole window
    pub fn weights(&self) -> Vec<u64> {
        let options = self.slots[0].len();
        (0..options)
            .map(|i| self.slots.iter().map(|slot| slot[i]).sum())
            .collect()
    }
}

/// Recent attribute and delay usage among accepted rules; drives adaptive mutation
#[derive(Debug, Clone)]
pub struct UsageHistory {
    attributes: UsageRing,
    delays: UsageRing,
}

impl UsageHistory {
    pub fn new(attributes: usize, delay_options: usize, floor: u64) -> Self {
        Self {
            attributes: UsageRing::new(attributes, floor),
            delays: UsageRing::new(delay_options, floor),
        }
    }

    pub fn record_rule(&mut self, attributes: &[RuleAttribute]) {
        for attr in attributes {
            self.attributes.record(attr.id);
            self.delays.record(attr.delay);
        }
    }

    pub fn refresh(&mut self, floor: u64) {
        self.attributes.advance(floor);
        self.delays.advance(floor);
    }

    pub fn attribute_weights(&self) -> Vec<u64> {
        self.attributes.weights()
    }

    pub fn delay_weights(&self) -> Vec<u64> {
        self.delays.weights()
    }
}
