use anyhow::{bail, Context, Result};
use gnp_miner::config::ConfigManager;
use gnp_miner::data::AttributeDictionary;
use gnp_miner::engines::generation::ConsoleProgressCallback;
use gnp_miner::engines::ExperimentController;
use std::path::PathBuf;
use std::process::ExitCode;

struct CliArgs {
    config: Option<PathBuf>,
    dictionary: Option<PathBuf>,
    output: PathBuf,
    datasets: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return ExitCode::SUCCESS;
    }

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {}", e);
            print_help();
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut config = None;
    let mut dictionary = None;
    let mut output = PathBuf::from("output");
    let mut datasets = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let val = iter.next().context("--config needs a file")?;
                config = Some(PathBuf::from(val));
            }
            "-d" | "--dictionary" => {
                let val = iter.next().context("--dictionary needs a file")?;
                dictionary = Some(PathBuf::from(val));
            }
            "-o" | "--output" => {
                let val = iter.next().context("--output needs a directory")?;
                output = PathBuf::from(val);
            }
            flag if flag.starts_with('-') => bail!("unknown option '{}'", flag),
            dataset => datasets.push(dataset.to_string()),
        }
    }

    if datasets.is_empty() {
        bail!("no dataset given");
    }

    Ok(CliArgs {
        config,
        dictionary,
        output,
        datasets,
    })
}

fn run(cli: CliArgs) -> Result<()> {
    let mut manager = ConfigManager::new();
    match &cli.config {
        Some(path) => manager
            .load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => manager.load_from_env()?,
    }
    let config = manager.into_inner();

    let dictionary = match &cli.dictionary {
        Some(path) => Some(
            AttributeDictionary::load_checked(path, config.data.separator_byte())
                .with_context(|| format!("loading dictionary {}", path.display()))?,
        ),
        None => None,
    };

    log::info!(
        "{} trials x {} generations, population {}, seed {}",
        config.evolution.trials,
        config.evolution.generations,
        config.evolution.population_size,
        config.evolution.seed
    );

    let controller = ExperimentController::new(&config);
    let mut progress = ConsoleProgressCallback::default();

    if let [dataset] = cli.datasets.as_slice() {
        let summary = controller.run_dataset(dataset, dictionary.as_ref(), &cli.output, &mut progress)?;
        println!(
            "{}: {} rules over {} trials, written to {}",
            dataset,
            summary.global.len(),
            summary.trials.len(),
            cli.output.display()
        );
        return Ok(());
    }

    let report = controller.run_batch(&cli.datasets, dictionary.as_ref(), &cli.output, &mut progress);
    for (path, rules) in &report.succeeded {
        println!("{}: {} rules", path.display(), rules);
    }
    for (dataset, error) in &report.failed {
        println!("{}: skipped ({})", dataset, error);
    }
    if report.all_failed() {
        bail!("every dataset failed");
    }
    Ok(())
}

fn print_help() {
    println!("gnp-miner - temporal association rule mining with Genetic Network Programming");
    println!();
    println!("Usage: gnp-miner [OPTIONS] <DATASET>...");
    println!();
    println!("A dataset is a CSV path or a name resolved to <data_dir>/<name>.csv");
    println!();
    println!("Options:");
    println!("  -c, --config <FILE>      TOML configuration (GNP_* env vars override)");
    println!("  -d, --dictionary <FILE>  Attribute dictionary CSV: id,name without header");
    println!("  -o, --output <DIR>       Output directory [default: output]");
    println!("  -h, --help               Print this help");
}
