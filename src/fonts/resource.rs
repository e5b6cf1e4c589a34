//! Access to CMap resources.
//!
//! Predefined CMaps are plain text files named after the encoding
//! (`UniJIS-UTF16-H`, `UniGB-UTF16-H`, ...), as shipped in Adobe's
//! cmap-resources distribution. A [`CMapSource`] opens one by name.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

use crate::config::MetricsConfig;
use crate::error::{Error, Result};

/// A provider of CMap resource streams.
pub trait CMapSource: Send + Sync {
    /// Open the resource for an encoding id.
    ///
    /// Fails with [`Error::ResourceUnavailable`] if the resource does not
    /// exist or cannot be opened.
    fn open(&self, encoding_id: &str) -> Result<Box<dyn BufRead + Send>>;
}

fn unavailable(encoding_id: &str, source: io::Error) -> Error {
    Error::ResourceUnavailable {
        resource: encoding_id.to_string(),
        source,
    }
}

/// Whether an encoding id is a bare resource name.
fn is_plain_name(encoding_id: &str) -> bool {
    !encoding_id.is_empty()
        && !encoding_id.contains(['/', '\\'])
        && encoding_id != "."
        && encoding_id != ".."
}

/// CMap files looked up by name in a list of directories.
#[derive(Debug, Clone, Default)]
pub struct DirectorySource {
    dirs: Vec<PathBuf>,
}

impl DirectorySource {
    /// Search the given directories, first match wins.
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Search the directories of a configuration.
    pub fn from_config(config: &MetricsConfig) -> Self {
        Self::new(config.cmap_dirs.iter().cloned())
    }

    /// Directories searched, in order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    fn locate(&self, encoding_id: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(encoding_id))
            .find(|path| path.is_file())
    }
}

impl CMapSource for DirectorySource {
    fn open(&self, encoding_id: &str) -> Result<Box<dyn BufRead + Send>> {
        if !is_plain_name(encoding_id) {
            return Err(unavailable(
                encoding_id,
                io::Error::new(io::ErrorKind::InvalidInput, "encoding id is not a plain resource name"),
            ));
        }

        let path = self.locate(encoding_id).ok_or_else(|| {
            unavailable(
                encoding_id,
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("not found in {} search director(ies)", self.dirs.len()),
                ),
            )
        })?;

        log::debug!("Opening CMap resource {}", path.display());
        let file = File::open(&path).map_err(|e| unavailable(encoding_id, e))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// CMap resources held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    resources: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a resource.
    pub fn insert(&mut self, encoding_id: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.resources.insert(encoding_id.into(), data.into());
    }

    /// Builder form of [`MemorySource::insert`].
    pub fn with(mut self, encoding_id: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(encoding_id, data);
        self
    }

    /// Read every file of a directory into memory, keyed by file name.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut source = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                source.insert(name, std::fs::read(entry.path())?);
            }
        }
        Ok(source)
    }
}

impl CMapSource for MemorySource {
    fn open(&self, encoding_id: &str) -> Result<Box<dyn BufRead + Send>> {
        let data = self.resources.get(encoding_id).ok_or_else(|| {
            unavailable(encoding_id, io::Error::new(io::ErrorKind::NotFound, "no such in-memory resource"))
        })?;
        Ok(Box::new(Cursor::new(data.clone())))
    }
}
