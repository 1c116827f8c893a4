use crate::config::AppConfig;
use crate::data::TimeSeriesStore;
use crate::engines::generation::GenerationReport;
use crate::error::{MinerError, Result};
use crate::types::{Rule, RuleAttribute};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// `name(t-d)`
pub fn render_attribute(store: &TimeSeriesStore, attribute: &RuleAttribute) -> String {
    format!("{}(t-{})", store.attribute_name(attribute.id), attribute.delay)
}

fn render_attribute_id(attribute: &RuleAttribute) -> String {
    format!("{}(t-{})", attribute.id, attribute.delay)
}

/// Writes the per-run directory: rules, progress, verification, pool and config
pub struct RunExporter {
    root: PathBuf,
    verification: bool,
}

impl RunExporter {
    pub fn new<P: AsRef<Path>>(root: P, verification: bool) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            verification,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the output directory tree
    pub fn prepare(&self) -> Result<()> {
        for dir in ["rules", "progress", "verification", "pool"] {
            let path = self.root.join(dir);
            fs::create_dir_all(&path).map_err(|e| {
                MinerError::Export(format!("Cannot create {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }

    pub fn write_config(&self, config: &AppConfig) -> Result<PathBuf> {
        let path = self.root.join("config.toml");
        fs::write(&path, toml::to_string_pretty(config)?)?;
        Ok(path)
    }

    /// One rule per line, attributes tab-separated
    pub fn write_trial_rules(&self, trial: usize, rules: &[Rule], store: &TimeSeriesStore) -> Result<PathBuf> {
        let path = self.root.join("rules").join(format!("trial_{:03}.tsv", trial));
        let mut writer = BufWriter::new(File::create(&path)?);
        for rule in rules {
            let line: Vec<String> = rule.attributes.iter().map(|a| render_attribute(store, a)).collect();
            writeln!(writer, "{}", line.join("\t"))?;
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn write_progress(&self, trial: usize, reports: &[GenerationReport]) -> Result<PathBuf> {
        let path = self.root.join("progress").join(format!("trial_{:03}.tsv", trial));
        let mut df = DataFrame::new(vec![
            Column::new("generation".into(), reports.iter().map(|r| r.generation as u64).collect::<Vec<_>>()),
            Column::new("rule_count".into(), reports.iter().map(|r| r.rule_count as u64).collect::<Vec<_>>()),
            Column::new("new_rules".into(), reports.iter().map(|r| r.new_rules as u64).collect::<Vec<_>>()),
            Column::new("evaluations".into(), reports.iter().map(|r| r.evaluations as u64).collect::<Vec<_>>()),
            Column::new("average_fitness".into(), reports.iter().map(|r| r.average_fitness).collect::<Vec<_>>()),
            Column::new("best_fitness".into(), reports.iter().map(|r| r.best_fitness).collect::<Vec<_>>()),
        ])?;
        write_tsv(&path, &mut df)?;
        Ok(path)
    }

    /// Per rule, the matched rows with the source-row timestamp of each antecedent
    /// and the future values. Skipped when verification output is disabled.
    pub fn write_verification(&self, trial: usize, rules: &[Rule], store: &TimeSeriesStore) -> Result<usize> {
        if !self.verification {
            return Ok(0);
        }
        let dir = self.root.join("verification").join(format!("trial_{:03}", trial));
        fs::create_dir_all(&dir)?;

        for (index, rule) in rules.iter().enumerate() {
            let rows = &rule.matched_rows;
            let mut columns = vec![
                Column::new("row".into(), rows.iter().map(|&r| r as u64).collect::<Vec<_>>()),
                Column::new("timestamp".into(), rows.iter().map(|&r| store.timestamp(r)).collect::<Vec<_>>()),
            ];
            for attribute in &rule.attributes {
                let sources: Vec<String> = rows
                    .iter()
                    .map(|&r| store.timestamp(r.saturating_sub(attribute.delay)))
                    .collect();
                columns.push(Column::new(render_attribute(store, attribute).into(), sources));
            }
            for offset in 1..=store.future_span() {
                let values: Vec<f64> = rows.iter().map(|&r| store.future(r, offset)).collect();
                columns.push(Column::new(format!("X(t+{})", offset).into(), values));
            }

            let mut df = DataFrame::new(columns)?;
            write_tsv(&dir.join(format!("rule_{:04}.tsv", index)), &mut df)?;
        }
        Ok(rules.len())
    }

    /// Aggregate pool, once with attribute names and once with ids
    pub fn write_pool(&self, rules: &[Rule], store: &TimeSeriesStore) -> Result<(PathBuf, PathBuf)> {
        let named_path = self.root.join("pool").join("rules_named.tsv");
        let ids_path = self.root.join("pool").join("rules_ids.tsv");

        let named: Vec<String> = rules
            .iter()
            .map(|r| r.attributes.iter().map(|a| render_attribute(store, a)).collect::<Vec<_>>().join(" "))
            .collect();
        let ids: Vec<String> = rules
            .iter()
            .map(|r| r.attributes.iter().map(render_attribute_id).collect::<Vec<_>>().join(" "))
            .collect();

        write_tsv(&named_path, &mut pool_frame(named, rules, store.future_span())?)?;
        write_tsv(&ids_path, &mut pool_frame(ids, rules, store.future_span())?)?;
        log::info!("Wrote {} pooled rules to {}", rules.len(), named_path.display());
        Ok((named_path, ids_path))
    }
}

fn pool_frame(attributes: Vec<String>, rules: &[Rule], span: usize) -> Result<DataFrame> {
    let mut columns = vec![
        Column::new("attributes".into(), attributes),
        Column::new("attribute_count".into(), rules.iter().map(|r| r.attributes.len() as u64).collect::<Vec<_>>()),
    ];
    for k in 0..span {
        let means: Vec<f64> = rules.iter().map(|r| r.stats.future_mean.get(k).copied().unwrap_or(f64::NAN)).collect();
        columns.push(Column::new(format!("mean_t+{}", k + 1).into(), means));
    }
    for k in 0..span {
        let sigmas: Vec<f64> = rules.iter().map(|r| r.stats.future_sigma.get(k).copied().unwrap_or(f64::NAN)).collect();
        columns.push(Column::new(format!("sigma_t+{}", k + 1).into(), sigmas));
    }
    columns.extend([
        Column::new("support_count".into(), rules.iter().map(|r| r.stats.support_count as u64).collect::<Vec<_>>()),
        Column::new("support".into(), rules.iter().map(|r| r.stats.support).collect::<Vec<_>>()),
        Column::new("confidence".into(), rules.iter().map(|r| r.stats.confidence).collect::<Vec<_>>()),
        Column::new("concentration".into(), rules.iter().map(|r| r.stats.concentration).collect::<Vec<_>>()),
        Column::new(
            "dominant_quadrant".into(),
            rules
                .iter()
                .map(|r| r.stats.dominant_quadrant.map(|q| q.label()).unwrap_or("").to_string())
                .collect::<Vec<_>>(),
        ),
        Column::new("high_support".into(), rules.iter().map(|r| r.high_support).collect::<Vec<_>>()),
        Column::new("low_variance".into(), rules.iter().map(|r| r.low_variance).collect::<Vec<_>>()),
        Column::new("trial".into(), rules.iter().map(|r| r.origin.trial as u64).collect::<Vec<_>>()),
        Column::new("generation".into(), rules.iter().map(|r| r.origin.generation as u64).collect::<Vec<_>>()),
    ]);
    Ok(DataFrame::new(columns)?)
}

fn write_tsv(path: &Path, df: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b'\t')
        .finish(df)
        .map_err(|e| MinerError::Export(format!("Failed to write {}: {}", path.display(), e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Horizon;
    use crate::types::{AttributeValue, Quadrant, RuleOrigin, RuleStatistics};
    use tempfile::tempdir;

    fn store() -> TimeSeriesStore {
        TimeSeriesStore::new(
            vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            vec![vec![AttributeValue::Present; 6], vec![AttributeValue::Absent; 6]],
            vec!["rain".into(), "wind".into()],
            Some((1..=6).map(|d| format!("2024-01-0{}", d)).collect()),
            Horizon {
                max_delay: 1,
                future_span: 2,
            },
        )
        .unwrap()
    }

    fn rule() -> Rule {
        Rule {
            attributes: vec![RuleAttribute { id: 0, delay: 1 }, RuleAttribute { id: 1, delay: 0 }],
            stats: RuleStatistics {
                support_count: 2,
                support: 0.5,
                confidence: 1.0,
                future_mean: vec![0.45, 0.55],
                future_sigma: vec![0.07, 0.07],
                quadrant_counts: [2, 0, 0, 0],
                concentration: 1.0,
                dominant_quadrant: Some(Quadrant::UpUp),
            },
            matched_rows: vec![2, 3],
            high_support: true,
            low_variance: true,
            origin: RuleOrigin {
                trial: 0,
                generation: 4,
                individual: 1,
                node: 0,
                depth: 2,
            },
        }
    }

    #[test]
    fn test_rules_file_uses_names_and_delays() {
        let dir = tempdir().unwrap();
        let exporter = RunExporter::new(dir.path(), true);
        exporter.prepare().unwrap();

        let path = exporter.write_trial_rules(0, &[rule()], &store()).unwrap();
        assert!(path.ends_with("rules/trial_000.tsv"));
        assert_eq!(fs::read_to_string(path).unwrap(), "rain(t-1)\twind(t-0)\n");
    }

    #[test]
    fn test_verification_uses_source_row_timestamps() {
        let dir = tempdir().unwrap();
        let exporter = RunExporter::new(dir.path(), true);
        exporter.prepare().unwrap();

        assert_eq!(exporter.write_verification(2, &[rule()], &store()).unwrap(), 1);
        let text = fs::read_to_string(dir.path().join("verification/trial_002/rule_0000.tsv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("row\ttimestamp\train(t-1)\twind(t-0)\tX(t+1)"));
        // Row 2 is 2024-01-03; rain was read one row earlier
        assert!(lines[1].starts_with("2\t2024-01-03\t2024-01-02\t2024-01-03\t"));
    }

    #[test]
    fn test_verification_can_be_disabled() {
        let dir = tempdir().unwrap();
        let exporter = RunExporter::new(dir.path(), false);
        exporter.prepare().unwrap();
        assert_eq!(exporter.write_verification(0, &[rule()], &store()).unwrap(), 0);
        assert!(!dir.path().join("verification/trial_000").exists());
    }

    #[test]
    fn test_pool_and_config_files() {
        let dir = tempdir().unwrap();
        let exporter = RunExporter::new(dir.path(), true);
        exporter.prepare().unwrap();

        let (named, ids) = exporter.write_pool(&[rule(), rule()], &store()).unwrap();
        let named = fs::read_to_string(named).unwrap();
        let ids = fs::read_to_string(ids).unwrap();
        assert_eq!(named.lines().count(), 3);
        assert!(named.lines().next().unwrap().contains("mean_t+2"));
        assert!(named.contains("rain(t-1) wind(t-0)"));
        assert!(ids.contains("0(t-1) 1(t-0)"));
        assert!(named.contains("++"));

        let config_path = exporter.write_config(&AppConfig::default()).unwrap();
        let text = fs::read_to_string(config_path).unwrap();
        assert!(text.contains("[evolution]"));
    }
}
