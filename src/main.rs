use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use tsbench_bench::{
    BatchSelector, Benchmark, CountingAllocator, DEFAULT_COLS, DEFAULT_ROWS, PipelineConfig,
    ProbeConfig, TimedPipeline, run_probe,
};
use tsbench_io::{
    DEFAULT_DOWNLOAD_URL, DatasetName, HttpSource, Report, SummaryFormat, UcrArchive,
    default_cache_dir, write_summary,
};

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

#[derive(Parser)]
#[command(name = "tsbench")]
#[command(about = "Time-series classification benchmarks on the UCR archive")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all logging except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Options shared by the timed drivers.
#[derive(Args, Debug, Clone)]
struct DriverArgs {
    /// Number of shards the catalog is split into (requires INDEX)
    #[arg(requires = "index")]
    shards: Option<usize>,

    /// Zero-based shard to run (requires SHARDS)
    #[arg(requires = "shards")]
    index: Option<usize>,

    /// UCR archive: {dir}/{Name}/{Name}_TRAIN.tsv and _TEST.tsv (or .ts).
    /// Missing datasets are downloaded and unpacked here.
    #[arg(long, default_value = "UCRArchive_2018")]
    archive_dir: PathBuf,

    /// Base URL serving {Name}.zip for missing datasets
    #[arg(long, default_value = DEFAULT_DOWNLOAD_URL)]
    download_url: String,

    /// Never download; fail on datasets missing from the archive
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Split cache directory (defaults to ~/.tsbench_ucr)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Always read splits from the archive
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Wall-clock budget for the predict stage, in seconds
    #[arg(long, default_value_t = 180)]
    timeout_secs: u64,

    /// Skip the untimed warm-up run
    #[arg(long, default_value_t = false)]
    no_warmup: bool,

    /// Restrict the catalog to these datasets (comma separated)
    #[arg(long, value_delimiter = ',')]
    datasets: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Csv,
    Json,
}

impl From<Format> for SummaryFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Csv => SummaryFormat::Csv,
            Format::Json => SummaryFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Time 1-NN DTW classification over the catalog
    Knn {
        #[command(flatten)]
        driver: DriverArgs,
    },

    /// Time the MiniRocket transform over the catalog
    Minirocket {
        #[command(flatten)]
        driver: DriverArgs,
    },

    /// Count MiniRocket fit and transform allocations over a sweep of shapes
    AllocProbe {
        /// Row counts to sweep (comma separated)
        #[arg(long, value_delimiter = ',')]
        rows: Option<Vec<usize>>,

        /// Series lengths to sweep (comma separated)
        #[arg(long, value_delimiter = ',')]
        cols: Option<Vec<usize>>,
    },

    /// Summarise driver logs into one row per dataset, sorted by name
    Report {
        /// Log files to read, parsed as one concatenated stream; stdin if
        /// none or "-"
        files: Vec<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
    },
}

fn select_datasets(driver: &DriverArgs) -> Result<Vec<DatasetName>> {
    let catalog = if driver.datasets.is_empty() {
        DatasetName::catalog()
    } else {
        driver
            .datasets
            .iter()
            .map(|n| DatasetName::new(n.trim()).with_context(|| format!("--datasets entry {n:?}")))
            .collect::<Result<Vec<_>>>()?
    };

    let selector = match (driver.shards, driver.index) {
        (Some(shards), Some(index)) => {
            BatchSelector::new(shards, index).context("invalid shard arguments")?
        }
        _ => BatchSelector::default(),
    };
    let batch = selector.select(&catalog);
    info!(
        shards = selector.shards(),
        index = selector.index(),
        n_catalog = catalog.len(),
        n_batch = batch.len(),
        "datasets selected"
    );
    Ok(batch)
}

fn run_driver(benchmark: Benchmark, driver: &DriverArgs, seed: u64) -> Result<()> {
    let batch = select_datasets(driver)?;

    let mut archive = UcrArchive::new(&driver.archive_dir);
    if !driver.no_cache
        && let Some(dir) = driver.cache_dir.clone().or_else(default_cache_dir)
    {
        info!(cache_dir = %dir.display(), "split cache enabled");
        archive = archive.with_cache_dir(dir);
    }
    if !driver.offline {
        let source = HttpSource::new(driver.download_url.as_str())
            .context("failed to set up dataset downloads")?;
        archive = archive.with_source(source);
    }

    let config = PipelineConfig::new(Duration::from_secs(driver.timeout_secs))
        .context("invalid --timeout-secs")?
        .with_warmup(!driver.no_warmup)
        .with_seed(seed);
    let pipeline = TimedPipeline::new(&archive, benchmark, config);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    pipeline
        .run_batch(&batch, &mut out)
        .with_context(|| format!("{} benchmark failed", benchmark.as_str()))?;
    Ok(())
}

fn run_report(files: &[PathBuf], format: Format) -> Result<()> {
    let inputs = if files.is_empty() {
        vec![Box::new(io::stdin()) as Box<dyn Read>]
    } else {
        files
            .iter()
            .map(|path| -> Result<Box<dyn Read>> {
                if path == Path::new("-") {
                    return Ok(Box::new(io::stdin()));
                }
                let file = File::open(path)
                    .with_context(|| format!("cannot open log {}", path.display()))?;
                Ok(Box::new(file))
            })
            .collect::<Result<Vec<_>>>()?
    };

    let mut report = Report::new();
    report.ingest_concatenated(inputs).context("failed to parse logs")?;
    info!(n_records = report.len(), "logs parsed");

    let stdout = io::stdout();
    write_summary(&report, format.into(), stdout.lock()).context("failed to write summary")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Knn { driver } => run_driver(Benchmark::KnnDtw, &driver, cli.seed)?,
        Command::Minirocket { driver } => run_driver(Benchmark::MiniRocket, &driver, cli.seed)?,
        Command::AllocProbe { rows, cols } => {
            let config = ProbeConfig::default()
                .with_shapes(
                    rows.unwrap_or_else(|| DEFAULT_ROWS.to_vec()),
                    cols.unwrap_or_else(|| DEFAULT_COLS.to_vec()),
                )
                .context("invalid probe shapes")?
                .with_seed(cli.seed);
            let stdout = io::stdout();
            let mut out = stdout.lock();
            run_probe(&config, &mut out).context("allocation probe failed")?;
            out.flush().context("failed to flush stdout")?;
        }
        Command::Report { files, format } => run_report(&files, format)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    fn driver_of(args: &[&str]) -> DriverArgs {
        match Cli::try_parse_from(args).unwrap().command {
            Command::Knn { driver } | Command::Minirocket { driver } => driver,
            _ => panic!("expected a driver subcommand"),
        }
    }

    #[test]
    fn no_shard_arguments_select_whole_catalog() {
        let driver = driver_of(&["tsbench", "knn"]);
        assert_eq!((driver.shards, driver.index), (None, None));
        assert_eq!(select_datasets(&driver).unwrap(), DatasetName::catalog());
    }

    #[test]
    fn shard_pair_selects_round_robin_slice() {
        let driver = driver_of(&["tsbench", "minirocket", "4", "1"]);
        assert_eq!((driver.shards, driver.index), (Some(4), Some(1)));

        let batch = select_datasets(&driver).unwrap();
        let catalog = DatasetName::catalog();
        assert_eq!(batch.len(), 28);
        assert_eq!(batch[0], catalog[1]);
        assert_eq!(batch[1], catalog[5]);
    }

    #[test]
    fn lone_shard_count_is_rejected() {
        let err = Cli::try_parse_from(["tsbench", "knn", "4"]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn out_of_range_index_fails_selection() {
        let driver = driver_of(&["tsbench", "knn", "4", "4"]);
        assert!(select_datasets(&driver).is_err());
    }

    #[test]
    fn download_flags_parse() {
        let driver = driver_of(&["tsbench", "knn"]);
        assert_eq!(driver.download_url, DEFAULT_DOWNLOAD_URL);
        assert!(!driver.offline);

        let driver = driver_of(&["tsbench", "knn", "--offline", "--download-url", "http://mirror/ucr"]);
        assert!(driver.offline);
        assert_eq!(driver.download_url, "http://mirror/ucr");
    }
}
