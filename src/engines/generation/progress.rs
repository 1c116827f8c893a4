use super::trial::{GenerationReport, ProgressCallback};

/// Logs a line per generation through the `log` facade
pub struct ConsoleProgressCallback {
    every: usize,
}

impl ConsoleProgressCallback {
    /// Report every `every`-th generation (and always the first)
    pub fn new(every: usize) -> Self {
        Self { every: every.max(1) }
    }
}

impl Default for ConsoleProgressCallback {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ProgressCallback for ConsoleProgressCallback {
    fn on_trial_start(&mut self, trial: usize) {
        log::info!("Trial {} starting...", trial);
    }

    fn on_generation_complete(&mut self, trial: usize, report: &GenerationReport) {
        if report.generation % self.every == 0 {
            log::info!(
                "Trial {} generation {}: {} rules (+{}), {} evaluations, avg fitness {:.4}, best {:.4}",
                trial,
                report.generation,
                report.rule_count,
                report.new_rules,
                report.evaluations,
                report.average_fitness,
                report.best_fitness
            );
        }
    }

    fn on_rule_cap_reached(&mut self, trial: usize, rule_count: usize) {
        log::warn!("Trial {} stopped early at {} rules", trial, rule_count);
    }
}

/// Keeps every callback in memory
#[derive(Debug, Default)]
pub struct CollectingProgressCallback {
    pub trials: Vec<usize>,
    pub reports: Vec<(usize, GenerationReport)>,
    pub capped: Vec<(usize, usize)>,
}

impl ProgressCallback for CollectingProgressCallback {
    fn on_trial_start(&mut self, trial: usize) {
        self.trials.push(trial);
    }

    fn on_generation_complete(&mut self, trial: usize, report: &GenerationReport) {
        self.reports.push((trial, report.clone()));
    }

    fn on_rule_cap_reached(&mut self, trial: usize, rule_count: usize) {
        self.capped.push((trial, rule_count));
    }
}
