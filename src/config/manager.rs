use super::{
    data::DataConfig,
    evolution::EvolutionConfig,
    fitness::FitnessConfig,
    mining::MiningConfig,
    traits::ConfigSection,
};
use crate::error::MinerError;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment overrides, e.g. `GNP_EVOLUTION__SEED=7`
pub const ENV_PREFIX: &str = "GNP";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub mining: MiningConfig,
    pub fitness: FitnessConfig,
    pub data: DataConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), MinerError> {
        self.evolution.validate()?;
        self.mining.validate()?;
        self.fitness.validate()?;
        self.data.validate()?;

        if self.mining.min_attributes > self.evolution.max_depth {
            return Err(MinerError::Configuration(format!(
                "min_attributes ({}) cannot exceed max_depth ({})",
                self.mining.min_attributes, self.evolution.max_depth
            )));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    config: AppConfig,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Defaults, then the TOML file, then `GNP_*` environment overrides
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), MinerError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MinerError::Configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let settings = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Toml))
            .add_source(Self::environment())
            .build()?;
        self.install(settings)
    }

    /// Same layering as [`Self::load_from_file`] with the TOML given inline
    pub fn load_from_str(&mut self, toml_source: &str) -> Result<(), MinerError> {
        let settings = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::from_str(toml_source, FileFormat::Toml))
            .build()?;
        self.install(settings)
    }

    /// Defaults layered only with environment overrides
    pub fn load_from_env(&mut self) -> Result<(), MinerError> {
        let settings = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(Self::environment())
            .build()?;
        self.install(settings)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), MinerError> {
        let toml_str = toml::to_string_pretty(&self.config)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> &AppConfig {
        &self.config
    }

    pub fn into_inner(self) -> AppConfig {
        self.config
    }

    pub fn update<F>(&mut self, f: F) -> Result<(), MinerError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut candidate = self.config.clone();
        f(&mut candidate);
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn install(&mut self, settings: Config) -> Result<(), MinerError> {
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        self.config = config;
        Ok(())
    }
}
