//! A disk-backed `FileSystem` (spec §6 adapter interface). The interface
//! itself is a core seam (spec §1 keeps concrete filesystem access out of
//! the core); this is the default collaborator so the facade crate and
//! these analyzers have something real to run against.

use codegraph_core::fs_adapter::{FileSystem, Stat};
use codegraph_core::{CoreError, Result};
use std::path::Path;

pub struct DiskFileSystem;

impl FileSystem for DiskFileSystem {
    /// Directory entries sorted by name. `std::fs::read_dir` does not
    /// guarantee an order; sorting is what makes the fold in
    /// `codegraph_core::hash::fold_dir_hash` deterministic across runs
    /// (spec invariant 4).
    fn list_directory(&self, path: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let entries = std::fs::read_dir(path)
            .map_err(|e| CoreError::io(path.display().to_string(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| CoreError::io(path.display().to_string(), e))?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }

    fn stat(&self, path: &Path) -> Result<Stat> {
        let meta = std::fs::metadata(path).map_err(|e| CoreError::io(path.display().to_string(), e))?;
        let to_chrono = |t: std::io::Result<std::time::SystemTime>| {
            t.ok()
                .map(chrono::DateTime::<chrono::Utc>::from)
                .unwrap_or_else(chrono::Utc::now)
        };
        Ok(Stat {
            size: meta.len(),
            created: to_chrono(meta.created()),
            modified: to_chrono(meta.modified()),
            is_directory: meta.is_dir(),
        })
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| CoreError::io(path.display().to_string(), e))
    }
}
