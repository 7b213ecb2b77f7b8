//! Filesystem blob store for contract artifacts.
//!
//! Two areas mirror the upload/processing split: `raw/` holds original
//! uploaded files, `text/` holds combined OCR text artifacts. Locators are
//! `"<area>/<filename>"` strings stored on the database rows, so the store
//! can move without rewriting the schema.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid blob locator: {0}")]
    InvalidLocator(String),

    #[error("Blob not found: {0}")]
    NotFound(String),
}

/// Storage area a blob lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobArea {
    Raw,
    Text,
}

impl BlobArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobArea::Raw => "raw",
            BlobArea::Text => "text",
        }
    }
}

pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Open (and create if needed) a blob store rooted at `root`.
    pub fn open(root: &Path) -> Result<Self, StorageError> {
        for area in [BlobArea::Raw, BlobArea::Text] {
            std::fs::create_dir_all(root.join(area.as_str()))?;
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Write a blob and return its locator (`"<area>/<filename>"`).
    pub fn put(
        &self,
        area: BlobArea,
        filename: &str,
        content: &[u8],
    ) -> Result<String, StorageError> {
        validate_filename(filename)?;
        let path = self.root.join(area.as_str()).join(filename);
        std::fs::write(&path, content)?;
        Ok(format!("{}/{}", area.as_str(), filename))
    }

    pub fn get(&self, locator: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(locator)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(locator.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a blob. Deleting a missing blob is not an error; the caller's
    /// database row is the source of truth for existence.
    pub fn delete(&self, locator: &str) -> Result<(), StorageError> {
        let path = self.resolve(locator)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, locator: &str) -> Result<PathBuf, StorageError> {
        let (area, filename) = locator
            .split_once('/')
            .ok_or_else(|| StorageError::InvalidLocator(locator.to_string()))?;
        if area != BlobArea::Raw.as_str() && area != BlobArea::Text.as_str() {
            return Err(StorageError::InvalidLocator(locator.to_string()));
        }
        validate_filename(filename)?;
        Ok(self.root.join(area).join(filename))
    }
}

/// Reject path separators and traversal in blob filenames.
fn validate_filename(filename: &str) -> Result<(), StorageError> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Err(StorageError::InvalidLocator(filename.to_string()));
    }
    Ok(())
}
