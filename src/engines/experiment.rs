use crate::config::AppConfig;
use crate::data::{load_store, AttributeDictionary, RunExporter, TimeSeriesStore};
use crate::engines::generation::{GlobalRulePool, ProgressCallback, TrialController};
use crate::error::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSummary {
    pub trial: usize,
    pub rule_count: usize,
    pub new_in_global: usize,
    pub generations_run: usize,
    pub capped: bool,
}

pub struct ExperimentSummary {
    pub trials: Vec<TrialSummary>,
    pub global: GlobalRulePool,
}

/// Outcome of running several datasets; failures are logged and kept here
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<(PathBuf, usize)>, // dataset, pooled rules
    pub failed: Vec<(String, String)>,    // dataset, error
}

impl BatchReport {
    pub fn all_failed(&self) -> bool {
        self.succeeded.is_empty()
    }
}

/// Runs the configured number of trials and merges them into one pool
pub struct ExperimentController<'a> {
    config: &'a AppConfig,
}

impl<'a> ExperimentController<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    pub fn run<C: ProgressCallback + ?Sized>(
        &self,
        store: &TimeSeriesStore,
        exporter: Option<&RunExporter>,
        callback: &mut C,
    ) -> Result<ExperimentSummary> {
        if let Some(exporter) = exporter {
            exporter.prepare()?;
            exporter.write_config(self.config)?;
        }

        let controller = TrialController::new(self.config, store);
        let mut global = GlobalRulePool::new(self.config.mining.dedup_policy);
        let mut trials = Vec::with_capacity(self.config.evolution.trials);

        for trial in 0..self.config.evolution.trials {
            let outcome = controller.run(trial, callback)?;
            let rules = outcome.pool.get_all();
            let new_in_global = global.merge(rules);

            if let Some(exporter) = exporter {
                exporter.write_trial_rules(trial, rules, store)?;
                exporter.write_progress(trial, &outcome.reports)?;
                exporter.write_verification(trial, rules, store)?;
            }

            log::info!(
                "Trial {}: {} rules, {} new to the global pool ({} total)",
                trial,
                rules.len(),
                new_in_global,
                global.len()
            );
            trials.push(TrialSummary {
                trial,
                rule_count: rules.len(),
                new_in_global,
                generations_run: outcome.reports.len(),
                capped: outcome.capped,
            });
        }

        if let Some(exporter) = exporter {
            exporter.write_pool(global.get_all(), store)?;
        }

        Ok(ExperimentSummary { trials, global })
    }

    /// A dataset argument is either an existing path or a name under `data_dir`
    pub fn resolve_dataset(&self, dataset: &str) -> PathBuf {
        let direct = PathBuf::from(dataset);
        if direct.is_file() {
            return direct;
        }
        Path::new(&self.config.data.data_dir).join(format!("{}.csv", dataset))
    }

    /// Load one dataset and run a full experiment into `output_dir`
    pub fn run_dataset<C: ProgressCallback + ?Sized>(
        &self,
        dataset: &str,
        dictionary: Option<&AttributeDictionary>,
        output_dir: &Path,
        callback: &mut C,
    ) -> Result<ExperimentSummary> {
        let path = self.resolve_dataset(dataset);
        let (store, metadata) = load_store(&path, self.config, dictionary)?;
        log::info!(
            "{}: {} rows, {} attributes, {} window rows",
            metadata.file_path,
            metadata.num_rows,
            metadata.num_attributes,
            store.window_len()
        );

        let exporter = RunExporter::new(output_dir, self.config.data.verification_files);
        self.run(&store, Some(&exporter), callback)
    }

    /// Run every dataset into `<output_root>/<dataset stem>`, skipping failures
    pub fn run_batch<C: ProgressCallback + ?Sized>(
        &self,
        datasets: &[String],
        dictionary: Option<&AttributeDictionary>,
        output_root: &Path,
        callback: &mut C,
    ) -> BatchReport {
        let mut report = BatchReport::default();

        for dataset in datasets {
            let path = self.resolve_dataset(dataset);
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| dataset.clone());
            let output_dir = output_root.join(&stem);

            match self.run_dataset(dataset, dictionary, &output_dir, callback) {
                Ok(summary) => report.succeeded.push((path, summary.global.len())),
                Err(e) => {
                    log::warn!("Skipping {}: {}", dataset, e);
                    report.failed.push((dataset.clone(), e.to_string()));
                }
            }
        }

        report
    }
}
