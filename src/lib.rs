//! Loader for archived role-playing conversation datasets.
//!
//! Each dataset is a zip archive of JSON records. Records are validated,
//! normalized and grouped by `(assistant_role, user_role)` pair, then by task.

pub mod archive;
pub mod config;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod record;

pub use archive::{ArchiveReader, Records, DEFAULT_ENTRY_EXTENSION};
pub use config::{default_datasets_dir, LoadOptions, LoaderConfig};
pub use dataset::{
    assemble, assemble_with_progress, ArchiveResult, Assembler, RolePair, TaskEntry, TaskIndex,
};
pub use error::{ConfigError, LoadError};
pub use loader::{
    dataset_name, find_archives, load_archive, load_archive_with_stats, load_datasets,
    load_datasets_with, ArchiveStats, DatasetCollection, LoadObserver, NoProgress,
};
pub use record::{
    extract_role, message_index, parse, parse_value, Messages, NormalizedRecord, RawRecord,
    ASSISTANT_ROLE_MARKER, USER_ROLE_MARKER,
};
