use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::archive::DEFAULT_ENTRY_EXTENSION;
use crate::error::ConfigError;

/// Knobs for a single load. The defaults reproduce the strict behavior:
/// any unreadable entry or archive aborts the load.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoadOptions {
    /// Suffix an archive entry must carry to be read.
    pub extension: String,
    /// Log and skip entries that cannot be read or decoded.
    pub skip_malformed_entries: bool,
    /// Log and drop an archive that fails instead of aborting the whole scan.
    pub isolate_archive_failures: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_ENTRY_EXTENSION.to_string(),
            skip_malformed_entries: false,
            isolate_archive_failures: false,
        }
    }
}

/// Optional YAML configuration file, e.g.
///
/// ```yaml
/// datasets_dir: /data/ai_society
/// skip_malformed_entries: true
/// ```
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderConfig {
    #[serde(default)]
    pub datasets_dir: Option<PathBuf>,
    #[serde(flatten)]
    pub options: LoadOptions,
}

impl LoaderConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_reader(file).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The configured directory, or [`default_datasets_dir`] when none is set.
    pub fn datasets_dir(&self) -> PathBuf {
        self.datasets_dir
            .clone()
            .unwrap_or_else(default_datasets_dir)
    }
}

/// `datasets/` next to the crate's own manifest.
pub fn default_datasets_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("datasets")
}
