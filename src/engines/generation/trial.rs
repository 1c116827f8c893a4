use crate::config::AppConfig;
use crate::data::TimeSeriesStore;
use crate::engines::evaluation::{ArenaDims, EvaluationContext, GraphEvaluator, StatisticsAggregator};
use crate::engines::generation::{
    gene::{GeneLayout, GeneStore},
    operators::EvolutionOperators,
    rule_pool::RulePool,
    usage::UsageHistory,
};
use crate::engines::metrics::{FitnessEvaluator, Registration};
use crate::engines::validation::{QualityFilter, RuleCandidate, RuleCandidateExtractor};
use crate::error::{MinerError, Result};
use crate::types::{Rule, RuleAttribute, RuleOrigin, RuleStatistics};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

pub trait ProgressCallback {
    fn on_trial_start(&mut self, trial: usize);
    fn on_generation_complete(&mut self, trial: usize, report: &GenerationReport);
    fn on_rule_cap_reached(&mut self, trial: usize, rule_count: usize);
}

/// Per-generation summary handed to the progress callback
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub generation: usize,
    pub rule_count: usize,
    pub new_rules: usize,
    pub evaluations: usize, // candidates that reached the quality filter
    pub average_fitness: f64,
    pub best_fitness: f64,
}

pub struct TrialOutcome {
    pub trial: usize,
    pub pool: RulePool,
    pub reports: Vec<GenerationReport>,
    pub capped: bool,
}

/// A candidate that passed every quality gate
#[derive(Debug, Clone)]
struct Accepted {
    stats: RuleStatistics,
    matched_rows: Vec<usize>,
    high_support: bool,
    low_variance: bool,
}

/// Runs one independent evolutionary trial over a store
pub struct TrialController<'a> {
    config: &'a AppConfig,
    store: &'a TimeSeriesStore,
}

impl<'a> TrialController<'a> {
    pub fn new(config: &'a AppConfig, store: &'a TimeSeriesStore) -> Self {
        Self { config, store }
    }

    pub fn run<C: ProgressCallback + ?Sized>(&self, trial: usize, callback: &mut C) -> Result<TrialOutcome> {
        let evo = &self.config.evolution;
        let mining = &self.config.mining;

        if self.store.attribute_count() == 0 {
            return Err(MinerError::Evaluation("Dataset has no attribute columns".to_string()));
        }
        if self.store.window_len() == 0 {
            return Err(MinerError::Evaluation(format!(
                "No evaluable rows: {} rows, max_time_delay {}, future_span {}",
                self.store.rows(),
                evo.max_time_delay,
                mining.future_span
            )));
        }

        let mut rng = StdRng::seed_from_u64(evo.seed.wrapping_add(trial as u64));
        let layout = GeneLayout::new(evo, self.store.attribute_count());
        let mut genes = GeneStore::random(layout, evo.population_size, &mut rng);

        let evaluator = GraphEvaluator::new(self.store, evo.max_depth);
        let extractor = RuleCandidateExtractor::new(mining, evo.max_depth);
        let filter = QualityFilter::new(mining, self.store);
        let scorer = FitnessEvaluator::new(&self.config.fitness);
        let operators = EvolutionOperators::new(evo);

        let mut context = EvaluationContext::new(ArenaDims {
            individuals: evo.population_size,
            nodes: evo.processing_nodes,
            depths: evo.max_depth + 1,
            offsets: mining.future_span,
        })?;
        let mut pool = RulePool::new(mining.max_rules, mining.dedup_policy);
        let mut usage = UsageHistory::new(layout.attributes, layout.delay_options(), evo.usage_floor);
        let mut reports = Vec::with_capacity(evo.generations);
        let mut capped = false;

        log::info!(
            "Trial {}: {} individuals, {} generations, {} window rows",
            trial,
            evo.population_size,
            evo.generations,
            self.store.window_len()
        );
        callback.on_trial_start(trial);

        for generation in 0..evo.generations {
            if pool.is_full() {
                capped = true;
                break;
            }

            context.reset();
            let lists = evaluator.compile(&genes);
            evaluator.evaluate(&lists, &mut context);
            let table = StatisticsAggregator::aggregate(&context);
            let candidates = extractor.extract(&lists, &table);

            let mut fitness = scorer.seed(evo.population_size);
            let mut memo: HashMap<Vec<RuleAttribute>, Option<Accepted>> = HashMap::new();
            let rules_before = pool.len();
            let mut evaluations = 0;

            for candidate in &candidates {
                evaluations += 1;
                let accepted = memo
                    .entry(candidate.attributes.clone())
                    .or_insert_with(|| Self::assess(&filter, &candidate.attributes));
                let Some(accepted) = accepted else {
                    continue;
                };

                let registration = if pool.contains(&candidate.attributes) {
                    Registration::Duplicate
                } else {
                    let rule = Self::build_rule(trial, generation, candidate, accepted);
                    pool.register(rule)
                };
                if registration == Registration::New {
                    log::debug!(
                        "Trial {} gen {}: new rule {:?} (support {})",
                        trial,
                        generation,
                        candidate.attributes,
                        accepted.stats.support_count
                    );
                }

                fitness[candidate.individual] +=
                    scorer.score(candidate.attributes.len(), &accepted.stats, registration);
                usage.record_rule(&candidate.attributes);

                if pool.is_full() {
                    capped = true;
                    break;
                }
            }

            let report = GenerationReport {
                generation,
                rule_count: pool.len(),
                new_rules: pool.len() - rules_before,
                evaluations,
                average_fitness: fitness.iter().sum::<f64>() / fitness.len() as f64,
                best_fitness: fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            };
            callback.on_generation_complete(trial, &report);
            reports.push(report);

            if (generation + 1) % evo.usage_refresh_interval == 0 {
                usage.refresh(evo.usage_floor);
            }

            if capped {
                break;
            }
            if generation + 1 < evo.generations {
                operators.evolve(&mut genes, &fitness, &usage, &mut rng);
            }
        }

        if capped {
            log::info!("Trial {}: rule cap of {} reached", trial, mining.max_rules);
            callback.on_rule_cap_reached(trial, pool.len());
        }
        log::info!("Trial {} finished with {} rules", trial, pool.len());

        Ok(TrialOutcome {
            trial,
            pool,
            reports,
            capped,
        })
    }

    fn assess(filter: &QualityFilter<'_>, attributes: &[RuleAttribute]) -> Option<Accepted> {
        let rematch = filter.rematch(attributes);
        let stats = filter.evaluate(attributes, &rematch).ok()?;
        let (high_support, low_variance) = filter.flags(&stats);
        Some(Accepted {
            stats,
            matched_rows: rematch.matched_rows,
            high_support,
            low_variance,
        })
    }

    fn build_rule(trial: usize, generation: usize, candidate: &RuleCandidate, accepted: &Accepted) -> Rule {
        Rule {
            attributes: candidate.attributes.clone(),
            stats: accepted.stats.clone(),
            matched_rows: accepted.matched_rows.clone(),
            high_support: accepted.high_support,
            low_variance: accepted.low_variance,
            origin: RuleOrigin {
                trial,
                generation,
                individual: candidate.individual,
                node: candidate.node,
                depth: candidate.depth,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Horizon;
    use crate::engines::generation::progress::CollectingProgressCallback;
    use crate::types::AttributeValue;

    /// Attribute 0 fires on rows 5..=15 and X jumps one row later
    fn store() -> TimeSeriesStore {
        let rows = 24;
        let signal: Vec<AttributeValue> = (0..rows)
            .map(|r| if (5..=15).contains(&r) { AttributeValue::Present } else { AttributeValue::Absent })
            .collect();
        let noise: Vec<AttributeValue> = (0..rows)
            .map(|r| if r % 2 == 0 { AttributeValue::Present } else { AttributeValue::Absent })
            .collect();
        let target: Vec<f64> = (0..rows)
            .map(|r| if (6..=17).contains(&r) { 5.0 } else { -0.1 })
            .collect();
        TimeSeriesStore::new(
            target,
            vec![signal, noise],
            vec!["signal".into(), "noise".into()],
            None,
            Horizon {
                max_delay: 0,
                future_span: 2,
            },
        )
        .unwrap()
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.evolution.population_size = 12;
        config.evolution.processing_nodes = 4;
        config.evolution.judgment_nodes = 10;
        config.evolution.max_depth = 3;
        config.evolution.generations = 6;
        config.evolution.max_time_delay = 0;
        config.mining.min_support = 0.1;
        config.mining.min_support_count = 5;
        config.mining.max_sigma = 3.0;
        config
    }

    #[test]
    fn test_trial_is_deterministic() {
        let store = store();
        let config = config();
        let controller = TrialController::new(&config, &store);

        let mut first = CollectingProgressCallback::default();
        let mut second = CollectingProgressCallback::default();
        let a = controller.run(0, &mut first).unwrap();
        let b = controller.run(0, &mut second).unwrap();

        assert_eq!(a.reports, b.reports);
        let rules_a: Vec<_> = a.pool.get_all().iter().map(|r| r.attributes.clone()).collect();
        let rules_b: Vec<_> = b.pool.get_all().iter().map(|r| r.attributes.clone()).collect();
        assert_eq!(rules_a, rules_b);
        assert_eq!(first.reports.len(), config.evolution.generations);
    }

    #[test]
    fn test_rule_count_never_decreases() {
        let store = store();
        let config = config();
        let outcome = TrialController::new(&config, &store)
            .run(1, &mut CollectingProgressCallback::default())
            .unwrap();
        assert!(outcome.reports.windows(2).all(|w| w[0].rule_count <= w[1].rule_count));
        for rule in outcome.pool.get_all() {
            assert!(rule.attributes.windows(2).all(|w| w[0].id < w[1].id));
            assert!(rule.stats.support_count >= config.mining.min_support_count);
        }
    }

    #[test]
    fn test_rule_cap_stops_trial() {
        let store = store();
        let mut config = config();
        config.mining.max_rules = 1;
        let mut callback = CollectingProgressCallback::default();
        let outcome = TrialController::new(&config, &store).run(0, &mut callback).unwrap();

        // The planted rule fills the pool during generation 0
        assert!(outcome.capped);
        assert_eq!(outcome.pool.len(), 1);
        assert_eq!(callback.capped, vec![(0, 1)]);
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(callback.reports.len(), 1);
    }

    #[test]
    fn test_empty_window_is_an_error() {
        let store = TimeSeriesStore::new(
            vec![0.1, 0.2],
            vec![vec![AttributeValue::Present; 2]],
            vec!["a".into()],
            None,
            Horizon {
                max_delay: 0,
                future_span: 2,
            },
        )
        .unwrap();
        let config = config();
        let result = TrialController::new(&config, &store).run(0, &mut CollectingProgressCallback::default());
        assert!(matches!(result, Err(MinerError::Evaluation(_))));
    }
}
