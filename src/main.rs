use anyhow::{Context, Result};
use chat_archive_loader::{
    load_datasets_with, ArchiveResult, LoadError, LoadObserver, LoaderConfig,
};
use clap::Parser;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn, LevelFilter};
use simple_logger::SimpleLogger;
use std::cell::Cell;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use time::macros::format_description;

#[derive(Parser, Clone)]
#[command(name = "Chat Archive Loader")]
#[command(about = "Loads zipped conversation datasets and summarizes them by assistant/user role pair.")]
#[command(version = "1.1.0")]
struct Cli {
    #[arg(short, long, help = "Directory containing *.zip datasets (defaults to ./datasets next to the crate)")]
    datasets_dir: Option<PathBuf>,
    #[arg(short, long, help = "Optional YAML configuration file")]
    config: Option<PathBuf>,
    #[arg(short, long, default_value = "INFO", help = "Logging level (DEBUG, INFO, WARN, ERROR)")]
    log_level: String,
    #[arg(long, help = "Suffix of archive entries to read (default .json)")]
    extension: Option<String>,
    #[arg(long, help = "Skip archive entries that cannot be read or decoded")]
    skip_malformed_entries: bool,
    #[arg(long, help = "Drop failing archives instead of aborting the whole scan; the exit status is still 1 if any archive was dropped")]
    isolate_archive_failures: bool,
    #[arg(short, long, help = "Hide progress bars")]
    quiet: bool,
}

struct ProgressReporter {
    _multi: MultiProgress,
    archives: ProgressBar,
    records: ProgressBar,
    failed: Cell<usize>,
}

impl ProgressReporter {
    fn new(quiet: bool) -> Result<Self> {
        let multi = MultiProgress::new();
        if quiet {
            return Ok(Self {
                _multi: multi,
                archives: ProgressBar::hidden(),
                records: ProgressBar::hidden(),
                failed: Cell::new(0),
            });
        }

        let archives = multi.add(ProgressBar::new(0));
        archives.set_style(ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} archives {msg}")
            .context("Failed to create archive progress bar template")?
            .progress_chars("=> "));
        archives.set_message("Scanning...");

        let records = multi.add(ProgressBar::new(0));
        records.set_style(ProgressStyle::default_bar()
            .template("  [{bar:40.green/white}] {pos}/{len} records ({per_sec}) {msg}")
            .context("Failed to create record progress bar template")?
            .progress_chars("=> "));

        Ok(Self { _multi: multi, archives, records, failed: Cell::new(0) })
    }

    fn finish(&self) {
        self.records.finish_and_clear();
        self.archives.finish_with_message(format!(
            "Loading finished. {} archives OK, {} errors.",
            self.archives.position() as usize - self.failed.get(),
            self.failed.get()
        ));
    }
}

impl LoadObserver for ProgressReporter {
    fn archives_found(&self, count: usize) {
        self.archives.set_length(count as u64);
    }

    fn archive_started(&self, name: &str, entries: usize) {
        self.records.reset();
        self.records.set_length(entries as u64);
        self.records.set_message(name.to_string());
    }

    fn record_processed(&self) {
        self.records.inc(1);
    }

    fn archive_finished(&self, name: &str, result: &ArchiveResult) {
        self.archives.set_message(format!("OK: {} ({} pairs, {} tasks)", name, result.pair_count(), result.task_count()));
        self.archives.inc(1);
    }

    fn archive_failed(&self, name: &str, _error: &LoadError) {
        self.failed.set(self.failed.get() + 1);
        self.archives.set_message(format!("ERR: {}", name));
        self.archives.inc(1);
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = elapsed.subsec_millis();
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, millis)
    }
}

/// Dropped archives still fail the run, even when the scan itself succeeded.
fn exit_code(failed_archives: usize) -> i32 {
    if failed_archives > 0 { 1 } else { 0 }
}

fn resolve_config(cli: &Cli) -> Result<LoaderConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            LoaderConfig::from_yaml_file(path)?
        }
        None => LoaderConfig::default(),
    };
    if let Some(dir) = &cli.datasets_dir {
        config.datasets_dir = Some(dir.clone());
    }
    if let Some(extension) = &cli.extension {
        config.options.extension = extension.clone();
    }
    config.options.skip_malformed_entries |= cli.skip_malformed_entries;
    config.options.isolate_archive_failures |= cli.isolate_archive_failures;
    Ok(config)
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    let log_level = match cli.log_level.to_uppercase().as_str() {
        "DEBUG" => LevelFilter::Debug,
        "INFO" => LevelFilter::Info,
        "WARN" | "WARNING" => LevelFilter::Warn,
        "ERROR" => LevelFilter::Error,
        _ => { eprintln!("Invalid log level '{}', defaulting to INFO.", cli.log_level); LevelFilter::Info }
    };
    SimpleLogger::new()
        .with_level(log_level)
        .with_timestamp_format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .init()?;

    info!("Starting Chat Archive Loader");

    let config = resolve_config(&cli)?;
    let datasets_dir = config.datasets_dir();
    info!("Datasets directory: {}", datasets_dir.display());
    info!("Entry extension: {}", config.options.extension);
    if config.options.skip_malformed_entries {
        info!("Malformed entries will be skipped.");
    }
    if config.options.isolate_archive_failures {
        info!("Failing archives will be dropped instead of aborting the scan.");
    }

    let reporter = ProgressReporter::new(cli.quiet)?;
    let loaded = load_datasets_with(Some(&datasets_dir), &config.options, &reporter);
    reporter.finish();
    let datasets = loaded
        .with_context(|| format!("Failed to load datasets from {}", datasets_dir.display()))?;

    info!("-------------------- SUMMARY --------------------");
    info!("Total execution time: {}", format_elapsed(start_time.elapsed()));
    info!("Datasets loaded: {}", datasets.len());
    for (name, dataset) in &datasets {
        info!(
            "  - {}: {} assistant roles, {} user roles, {} role pairs, {} tasks",
            name,
            dataset.assistant_roles.len(),
            dataset.user_roles.len(),
            dataset.pair_count(),
            dataset.task_count()
        );
        if dataset.is_empty() {
            warn!("    Dataset '{}' contains no valid records.", name);
        }
    }
    info!("-------------------------------------------------");

    let code = exit_code(reporter.failed.get());
    if code != 0 {
        error!("{} archives could not be loaded.", reporter.failed.get());
        std::process::exit(code);
    }

    Ok(())
}
