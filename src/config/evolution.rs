use super::traits::{invalid, ConfigSection};
use crate::error::MinerError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub processing_nodes: usize, // Npn
    pub judgment_nodes: usize,   // Njg
    pub max_depth: usize,        // Nmx, also the attribute cap of a rule
    pub generations: usize,
    pub trials: usize,
    pub seed: u64,
    pub max_time_delay: usize,
    pub crossover_points: usize, // Nkousa

    // Mutation happens with probability 1/rate
    pub mutation_processing: u32,
    pub mutation_judgment: u32,
    pub mutation_attribute: u32,
    pub mutation_delay: u32,

    pub usage_refresh_interval: usize,
    pub usage_floor: u64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 120,
            processing_nodes: 10,
            judgment_nodes: 100,
            max_depth: 8,
            generations: 201,
            trials: 3,
            seed: 1,
            max_time_delay: 3,
            crossover_points: 6,
            mutation_processing: 1,
            mutation_judgment: 6,
            mutation_attribute: 6,
            mutation_delay: 6,
            usage_refresh_interval: 5,
            usage_floor: 1,
        }
    }
}

impl EvolutionConfig {
    pub fn elite_size(&self) -> usize {
        self.population_size / 3
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), MinerError> {
        let section = Self::section_name();
        if self.population_size < 6 {
            return Err(invalid(section, "population_size must be at least 6"));
        }
        if self.processing_nodes == 0 || self.judgment_nodes == 0 {
            return Err(invalid(section, "processing_nodes and judgment_nodes must be positive"));
        }
        if self.max_depth == 0 {
            return Err(invalid(section, "max_depth must be positive"));
        }
        if self.generations == 0 || self.trials == 0 {
            return Err(invalid(section, "generations and trials must be positive"));
        }
        let rates = [
            self.mutation_processing,
            self.mutation_judgment,
            self.mutation_attribute,
            self.mutation_delay,
        ];
        if rates.iter().any(|&r| r == 0) {
            return Err(invalid(section, "mutation rates are 1/N and N must be at least 1"));
        }
        if self.usage_refresh_interval == 0 {
            return Err(invalid(section, "usage_refresh_interval must be positive"));
        }
        if self.usage_floor == 0 {
            return Err(invalid(section, "usage_floor must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EvolutionConfig::default().validate().is_ok());
        assert_eq!(EvolutionConfig::default().elite_size(), 40);
    }

    #[test]
    fn test_rejects_zero_mutation_rate() {
        let config = EvolutionConfig {
            mutation_judgment: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_tiny_population() {
        let config = EvolutionConfig {
            population_size: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
