//! Archive -> records -> matrix pipeline and the directory scan on top of it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use log::{debug, info, warn};

use crate::archive::ArchiveReader;
use crate::config::{default_datasets_dir, LoadOptions};
use crate::dataset::{ArchiveResult, Assembler};
use crate::error::LoadError;
use crate::record::parse_value;

/// Dataset name (archive file stem) to its contents.
pub type DatasetCollection = BTreeMap<String, ArchiveResult>;

/// Receives progress notifications while a load runs. Every method has a
/// no-op default; results never depend on the observer.
pub trait LoadObserver {
    fn archives_found(&self, _count: usize) {}
    fn archive_started(&self, _name: &str, _entries: usize) {}
    fn record_processed(&self) {}
    fn archive_finished(&self, _name: &str, _result: &ArchiveResult) {}
    fn archive_failed(&self, _name: &str, _error: &LoadError) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl LoadObserver for NoProgress {}

/// Per-archive tallies, for diagnostics only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveStats {
    /// Matching entries in the archive.
    pub entries: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Malformed entries dropped under `skip_malformed_entries`.
    pub skipped: usize,
}

pub fn load_archive<P: AsRef<Path>>(
    path: P,
    options: &LoadOptions,
) -> Result<ArchiveResult, LoadError> {
    load_archive_with_stats(path, options, &NoProgress).map(|(result, _)| result)
}

/// Reads every matching entry of one archive, keeps the records that pass
/// validation and assembles them.
pub fn load_archive_with_stats<P: AsRef<Path>>(
    path: P,
    options: &LoadOptions,
    observer: &dyn LoadObserver,
) -> Result<(ArchiveResult, ArchiveStats), LoadError> {
    let path = path.as_ref();
    let name = dataset_name(path);
    let mut reader = ArchiveReader::open(path, &options.extension)?;
    let mut stats = ArchiveStats {
        entries: reader.len(),
        ..ArchiveStats::default()
    };
    observer.archive_started(&name, stats.entries);

    let mut assembler = Assembler::new();
    for item in reader.records() {
        let value = match item {
            Ok(value) => value,
            Err(e) if options.skip_malformed_entries && e.is_entry_level() => {
                warn!("Skipping malformed entry: {}", e);
                stats.skipped += 1;
                observer.record_processed();
                continue;
            }
            Err(e) => return Err(e),
        };

        match parse_value(&value) {
            Some(record) => {
                assembler.push(record);
                stats.accepted += 1;
            }
            None => stats.rejected += 1,
        }
        observer.record_processed();
    }

    let result = assembler.finish();
    debug!(
        "Finished {}: Entries={}, Accepted={}, Rejected={}, Skipped={}, RolePairs={}, Tasks={}",
        path.display(),
        stats.entries,
        stats.accepted,
        stats.rejected,
        stats.skipped,
        result.pair_count(),
        result.task_count()
    );
    observer.archive_finished(&name, &result);
    Ok((result, stats))
}

/// Name a dataset is stored under: the file name without its extension.
pub fn dataset_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Zip archives directly inside `directory`, sorted by path. A missing
/// directory simply has no archives.
pub fn find_archives<P: AsRef<Path>>(directory: P) -> Result<Vec<PathBuf>, LoadError> {
    let escaped = Pattern::escape(&directory.as_ref().to_string_lossy());
    let pattern = Path::new(&escaped).join("*.zip");
    let pattern_str = pattern.to_string_lossy().into_owned();
    info!("Searching for archives matching pattern: {}", pattern_str);

    let mut paths: Vec<PathBuf> = glob(&pattern_str)
        .map_err(|source| LoadError::Pattern {
            pattern: pattern_str.clone(),
            source,
        })?
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    if paths.is_empty() {
        warn!("No archives found matching the pattern: {}", pattern_str);
    }
    Ok(paths)
}

/// Loads every archive of `directory` (or [`default_datasets_dir`]) into a
/// collection keyed by dataset name.
pub fn load_datasets(
    directory: Option<&Path>,
    options: &LoadOptions,
) -> Result<DatasetCollection, LoadError> {
    load_datasets_with(directory, options, &NoProgress)
}

pub fn load_datasets_with(
    directory: Option<&Path>,
    options: &LoadOptions,
    observer: &dyn LoadObserver,
) -> Result<DatasetCollection, LoadError> {
    let directory = directory
        .map(Path::to_path_buf)
        .unwrap_or_else(default_datasets_dir);
    let archives = find_archives(&directory)?;
    info!(
        "Found {} archives in {}",
        archives.len(),
        directory.display()
    );
    observer.archives_found(archives.len());

    let mut datasets = DatasetCollection::new();
    for path in archives {
        let name = dataset_name(&path);
        match load_archive_with_stats(&path, options, observer) {
            Ok((result, _)) => {
                datasets.insert(name, result);
            }
            Err(e) if options.isolate_archive_failures => {
                warn!("Dropping dataset '{}': {}", name, e);
                observer.archive_failed(&name, &e);
            }
            Err(e) => {
                observer.archive_failed(&name, &e);
                return Err(e);
            }
        }
    }
    Ok(datasets)
}
