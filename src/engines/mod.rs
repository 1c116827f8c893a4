pub mod evaluation;
pub mod experiment;
pub mod generation;
pub mod metrics;
pub mod validation;

pub use experiment::{BatchReport, ExperimentController, ExperimentSummary, TrialSummary};
