pub mod traits;
pub mod evolution;
pub mod mining;
pub mod fitness;
pub mod data;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use evolution::EvolutionConfig;
pub use mining::{MiningConfig, DedupPolicy};
pub use fitness::{FitnessConfig, Tier};
pub use data::DataConfig;
pub use traits::ConfigSection;
