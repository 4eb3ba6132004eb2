//! The file-system adapter seam (spec §6). Concrete implementations — real
//! disk I/O, an in-memory fixture for tests — are collaborators; the core
//! only depends on this trait.

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

#[derive(Debug, Clone, Copy)]
pub struct Stat {
    pub size: u64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub is_directory: bool,
}

/// `listDirectory` / `stat` / `readFile` (spec §6). No other filesystem
/// access is performed by the core — everything else goes through these
/// three methods, which is also what lets tests swap in an in-memory tree.
pub trait FileSystem: Send + Sync {
    /// Ordered list of entry names directly under `path`. The order
    /// returned here is the order the tree builder preserves verbatim.
    fn list_directory(&self, path: &Path) -> Result<Vec<String>>;
    fn stat(&self, path: &Path) -> Result<Stat>;
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
}
