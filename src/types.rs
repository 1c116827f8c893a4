use serde::{Deserialize, Serialize};

/// Value of a discrete attribute at one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AttributeValue {
    Absent = 0,
    Present = 1,
    Missing = 2,
}

impl AttributeValue {
    /// CSV cell → attribute value: `0` absent, `1` present, anything else missing
    pub fn from_cell(cell: Option<f64>) -> Self {
        match cell {
            Some(v) if v == 0.0 => Self::Absent,
            Some(v) if v == 1.0 => Self::Present,
            _ => Self::Missing,
        }
    }
}

/// Sign region of the first two future offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    UpUp = 0,     // (+, +)
    DownUp = 1,   // (-, +)
    DownDown = 2, // (-, -)
    UpDown = 3,   // (+, -)
}

impl Quadrant {
    pub const COUNT: usize = 4;

    /// Classify by sign of `(future[t+1], future[t+2])`. Zero or NaN on either side
    /// classifies nothing.
    pub fn classify(first: f64, second: f64) -> Option<Self> {
        match (sign(first), sign(second)) {
            (Some(true), Some(true)) => Some(Self::UpUp),
            (Some(false), Some(true)) => Some(Self::DownUp),
            (Some(false), Some(false)) => Some(Self::DownDown),
            (Some(true), Some(false)) => Some(Self::UpDown),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::UpUp),
            1 => Some(Self::DownUp),
            2 => Some(Self::DownDown),
            3 => Some(Self::UpDown),
            _ => None,
        }
    }

    /// Expected direction (`true` = up) of offsets t+1 and t+2
    pub fn directions(self) -> (bool, bool) {
        match self {
            Self::UpUp => (true, true),
            Self::DownUp => (false, true),
            Self::DownDown => (false, false),
            Self::UpDown => (true, false),
        }
    }

    /// Largest distance by which `(first, second)` sits on the wrong side of this quadrant
    pub fn excursion(self, first: f64, second: f64) -> f64 {
        let (up_first, up_second) = self.directions();
        wrong_side(first, up_first).max(wrong_side(second, up_second))
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::UpUp => "++",
            Self::DownUp => "-+",
            Self::DownDown => "--",
            Self::UpDown => "+-",
        }
    }
}

fn sign(value: f64) -> Option<bool> {
    if value > 0.0 {
        Some(true)
    } else if value < 0.0 {
        Some(false)
    } else {
        None
    }
}

fn wrong_side(value: f64, up: bool) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    if up {
        (-value).max(0.0)
    } else {
        value.max(0.0)
    }
}

/// One antecedent of a rule: attribute `id` held `delay` rows before the anchor row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleAttribute {
    pub id: usize,
    pub delay: usize,
}

/// Statistical profile of a rule, computed from its authoritative matched rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleStatistics {
    pub support_count: usize,
    pub support: f64,
    pub confidence: f64,
    pub future_mean: Vec<f64>,
    pub future_sigma: Vec<f64>,
    pub quadrant_counts: [usize; Quadrant::COUNT],
    pub concentration: f64,
    pub dominant_quadrant: Option<Quadrant>,
}

/// Where a rule was first found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOrigin {
    pub trial: usize,
    pub generation: usize,
    pub individual: usize,
    pub node: usize,
    pub depth: usize,
}

/// A persisted temporal association rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub attributes: Vec<RuleAttribute>, // strictly increasing ids
    pub stats: RuleStatistics,
    pub matched_rows: Vec<usize>,
    pub high_support: bool,
    pub low_variance: bool,
    pub origin: RuleOrigin,
}

impl Rule {
    pub fn attribute_ids(&self) -> Vec<usize> {
        self.attributes.iter().map(|a| a.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadrant_classification_is_sign_based() {
        assert_eq!(Quadrant::classify(0.3, 2.0), Some(Quadrant::UpUp));
        assert_eq!(Quadrant::classify(-0.3, 2.0), Some(Quadrant::DownUp));
        assert_eq!(Quadrant::classify(-0.3, -2.0), Some(Quadrant::DownDown));
        assert_eq!(Quadrant::classify(0.3, -2.0), Some(Quadrant::UpDown));
    }

    #[test]
    fn test_zero_or_nan_future_classifies_nothing() {
        assert_eq!(Quadrant::classify(0.0, 1.0), None);
        assert_eq!(Quadrant::classify(1.0, 0.0), None);
        assert_eq!(Quadrant::classify(f64::NAN, 1.0), None);
    }

    #[test]
    fn test_exactly_one_bucket_per_nonzero_pair() {
        let values = [-3.0, -0.01, 0.01, 7.5];
        for &a in &values {
            for &b in &values {
                let mut buckets = [0usize; Quadrant::COUNT];
                if let Some(q) = Quadrant::classify(a, b) {
                    buckets[q.index()] += 1;
                }
                assert_eq!(buckets.iter().sum::<usize>(), 1);
            }
        }
    }

    #[test]
    fn test_excursion() {
        assert_eq!(Quadrant::UpUp.excursion(1.0, 2.0), 0.0);
        assert!((Quadrant::UpUp.excursion(1.0, -0.25) - 0.25).abs() < 1e-12);
        assert!((Quadrant::DownUp.excursion(0.5, 1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_attribute_cells() {
        assert_eq!(AttributeValue::from_cell(Some(1.0)), AttributeValue::Present);
        assert_eq!(AttributeValue::from_cell(Some(0.0)), AttributeValue::Absent);
        assert_eq!(AttributeValue::from_cell(Some(2.0)), AttributeValue::Missing);
        assert_eq!(AttributeValue::from_cell(None), AttributeValue::Missing);
    }
}
