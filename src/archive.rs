//! Lazy reading of JSON entries packed in a zip archive.

use std::fs::File;
use std::io::{self, Read};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

use log::debug;
use serde_json::Value;
use zip::ZipArchive;

use crate::error::LoadError;

pub const DEFAULT_ENTRY_EXTENSION: &str = ".json";

/// Upper bound on the read buffer reserved from an entry's declared size.
const MAX_ENTRY_PREALLOC: usize = 16 * 1024 * 1024;

/// An opened archive together with the list of entries whose names end in
/// the requested extension, in central-directory order.
///
/// The file handle lives as long as the reader; dropping the reader (or
/// returning early with an error) releases it.
pub struct ArchiveReader {
    path: PathBuf,
    archive: ZipArchive<File>,
    entries: Vec<usize>,
}

impl ArchiveReader {
    pub fn open<P: AsRef<Path>>(path: P, extension: &str) -> Result<Self, LoadError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| LoadError::Open {
            path: path.clone(),
            source,
        })?;
        let mut archive = ZipArchive::new(file).map_err(|source| LoadError::Archive {
            path: path.clone(),
            source,
        })?;

        let mut entries = Vec::new();
        for index in 0..archive.len() {
            let entry = archive
                .by_index(index)
                .map_err(|source| LoadError::Archive {
                    path: path.clone(),
                    source,
                })?;
            if !entry.is_dir() && entry.name().ends_with(extension) {
                entries.push(index);
            }
        }
        debug!(
            "Opened {}: {} of {} entries match '{}'",
            path.display(),
            entries.len(),
            archive.len(),
            extension
        );

        Ok(Self {
            path,
            archive,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of matching entries, known without reading any of them.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A fresh single-pass sequence over the matching entries. Each item is
    /// decoded on demand; calling this again starts from the first entry.
    pub fn records(&mut self) -> Records<'_> {
        Records {
            reader: self,
            next: 0,
        }
    }

    fn read_entry(&mut self, index: usize) -> Result<Value, LoadError> {
        let mut file = self
            .archive
            .by_index(index)
            .map_err(|source| LoadError::EntryAccess {
                path: self.path.clone(),
                index,
                source,
            })?;
        let entry = file.name().to_string();

        let declared = file.size();
        let prealloc = usize::try_from(declared)
            .unwrap_or(usize::MAX)
            .min(MAX_ENTRY_PREALLOC);
        let mut bytes = Vec::with_capacity(prealloc);
        file.read_to_end(&mut bytes)
            .map_err(|source| LoadError::EntryRead {
                path: self.path.clone(),
                entry: entry.clone(),
                source,
            })?;
        if bytes.len() as u64 != declared {
            return Err(LoadError::EntryRead {
                path: self.path.clone(),
                entry,
                source: io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("header declares {} bytes, entry holds {}", declared, bytes.len()),
                ),
            });
        }
        let text = std::str::from_utf8(&bytes).map_err(|source| LoadError::InvalidUtf8 {
            path: self.path.clone(),
            entry: entry.clone(),
            source,
        })?;
        serde_json::from_str(text).map_err(|source| LoadError::InvalidJson {
            path: self.path.clone(),
            entry,
            source,
        })
    }
}

/// Decoded JSON values of an [`ArchiveReader`], one per matching entry.
pub struct Records<'a> {
    reader: &'a mut ArchiveReader,
    next: usize,
}

impl Iterator for Records<'_> {
    type Item = Result<Value, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = *self.reader.entries.get(self.next)?;
        self.next += 1;
        Some(self.reader.read_entry(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.reader.entries.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Records<'_> {}

impl FusedIterator for Records<'_> {}
