pub mod candidate;
pub mod quality;

pub use candidate::{normalize, RuleCandidate, RuleCandidateExtractor};
pub use quality::{concentration, support_value, QualityFilter, Rejection, Rematch};
