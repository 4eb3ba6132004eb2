//! Shared fixtures for this crate's inline unit tests.
#![cfg(test)]

use codegraph_core::fs_adapter::{FileSystem, Stat};
use codegraph_core::{CoreError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// An in-memory filesystem fixture keyed by full path; directory listings
/// are derived from path prefixes so no explicit directory entries are
/// needed.
pub struct InMemoryFs {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl InMemoryFs {
    pub fn new(files: impl IntoIterator<Item = (PathBuf, Vec<u8>)>) -> Self {
        Self {
            files: Mutex::new(files.into_iter().collect()),
        }
    }
}

impl FileSystem for InMemoryFs {
    fn list_directory(&self, path: &Path) -> Result<Vec<String>> {
        let files = self.files.lock().unwrap();
        let mut names: Vec<String> = files
            .keys()
            .filter_map(|p| p.strip_prefix(path).ok())
            .filter(|rel| rel.components().count() >= 1)
            .filter_map(|rel| rel.components().next().map(|c| c.as_os_str().to_string_lossy().to_string()))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn stat(&self, path: &Path) -> Result<Stat> {
        let files = self.files.lock().unwrap();
        let now = chrono::Utc::now();
        if let Some(bytes) = files.get(path) {
            Ok(Stat {
                size: bytes.len() as u64,
                created: now,
                modified: now,
                is_directory: false,
            })
        } else {
            Ok(Stat {
                size: 0,
                created: now,
                modified: now,
                is_directory: true,
            })
        }
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned().ok_or_else(|| {
            CoreError::io(
                path.display().to_string(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            )
        })
    }
}
