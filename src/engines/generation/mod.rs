pub mod gene;
pub mod operators;
pub mod progress;
pub mod rule_pool;
pub mod trial;
pub mod usage;

pub use gene::{Gene, GeneLayout, GeneStore, Node};
pub use operators::{EvolutionOperators, PopulationBands};
pub use progress::{CollectingProgressCallback, ConsoleProgressCallback};
pub use rule_pool::{GlobalRulePool, RuleKey, RulePool};
pub use trial::{GenerationReport, ProgressCallback, TrialController, TrialOutcome};
pub use usage::{roulette_select, UsageHistory, USAGE_WINDOW};
