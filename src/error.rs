use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Archive-level failures. Records that merely fail validation never show up here.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open archive {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed zip archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("cannot open entry #{index} in {}: {source}", path.display())]
    EntryAccess {
        path: PathBuf,
        index: usize,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("failed to read entry '{entry}' in {}: {source}", path.display())]
    EntryRead {
        path: PathBuf,
        entry: String,
        #[source]
        source: io::Error,
    },
    #[error("entry '{entry}' in {} is not valid UTF-8: {source}", path.display())]
    InvalidUtf8 {
        path: PathBuf,
        entry: String,
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("entry '{entry}' in {} is not valid JSON: {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        entry: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid dataset search pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

impl LoadError {
    /// Path of the archive the failure belongs to, if any.
    pub fn archive_path(&self) -> Option<&PathBuf> {
        match self {
            LoadError::Open { path, .. }
            | LoadError::Archive { path, .. }
            | LoadError::EntryAccess { path, .. }
            | LoadError::EntryRead { path, .. }
            | LoadError::InvalidUtf8 { path, .. }
            | LoadError::InvalidJson { path, .. } => Some(path),
            LoadError::Pattern { .. } => None,
        }
    }

    /// True for failures confined to a single entry, which
    /// `skip_malformed_entries` is allowed to swallow.
    pub fn is_entry_level(&self) -> bool {
        matches!(
            self,
            LoadError::EntryAccess { .. }
                | LoadError::EntryRead { .. }
                | LoadError::InvalidUtf8 { .. }
                | LoadError::InvalidJson { .. }
        )
    }
}

/// Failures reading the optional YAML configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse configuration YAML from {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
