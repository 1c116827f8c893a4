pub mod context;
pub mod graph;
pub mod statistics;

pub use context::{ArenaDims, EvaluationContext, Moments};
pub use graph::{DecisionList, GraphEvaluator, Step};
pub use statistics::{DepthStatistics, StatisticsAggregator, StatisticsTable, SummaryStats};
