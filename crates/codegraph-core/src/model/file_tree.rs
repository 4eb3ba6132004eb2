use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hex-encoded content digest. Any collision-resistant digest satisfies the
/// spec; the hash tracker (`crate::hash`) uses SHA-256.
pub type Hash = String;

/// A single file under the tree. Content is fetched on demand through the
/// shared context's cache, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileNode {
    pub path: PathBuf,
    pub parent: Option<PathBuf>,
    pub extension: Option<String>,
    pub size: u64,
    pub hash: Hash,
    pub language: Option<String>,
    pub metadata: IndexMap<String, serde_json::Value>,
}

impl FileNode {
    pub fn new(path: PathBuf, size: u64, hash: Hash) -> Self {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_string());
        Self {
            parent: path.parent().map(|p| p.to_path_buf()),
            extension,
            size,
            hash,
            language: None,
            metadata: IndexMap::new(),
            path,
        }
    }
}

/// A directory. Its hash is the fold of its ordered children's hashes
/// (spec §4.1); children order is the order the file-system adapter
/// returned them in, and is preserved verbatim — it is never re-sorted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirNode {
    pub path: PathBuf,
    pub parent: Option<PathBuf>,
    pub children: Vec<FileTreeEntry>,
    pub hash: Hash,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// A file tree node: either a file or a directory. Directories own their
/// children by value (arena-free; the tree itself is the only owner), so
/// there are no back-pointers, only the `parent` path key (spec §9).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileTreeEntry {
    File(FileNode),
    Dir(DirNode),
}

impl FileTreeEntry {
    pub fn path(&self) -> &std::path::Path {
        match self {
            FileTreeEntry::File(f) => &f.path,
            FileTreeEntry::Dir(d) => &d.path,
        }
    }

    pub fn hash(&self) -> &str {
        match self {
            FileTreeEntry::File(f) => &f.hash,
            FileTreeEntry::Dir(d) => &d.hash,
        }
    }

    pub fn as_dir(&self) -> Option<&DirNode> {
        match self {
            FileTreeEntry::Dir(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            FileTreeEntry::File(f) => Some(f),
            _ => None,
        }
    }

    /// Walks the tree depth-first, yielding every file in the deterministic
    /// order established by the tree builder. Used by the orchestrator to
    /// give analyzers files in walk order regardless of worker assignment
    /// (spec §5c).
    pub fn walk_files(&self) -> Vec<&FileNode> {
        let mut out = Vec::new();
        self.walk_files_into(&mut out);
        out
    }

    fn walk_files_into<'a>(&'a self, out: &mut Vec<&'a FileNode>) {
        match self {
            FileTreeEntry::File(f) => out.push(f),
            FileTreeEntry::Dir(d) => {
                for child in &d.children {
                    child.walk_files_into(out);
                }
            }
        }
    }
}

/// Per-extension aggregate collected by the tree builder (spec §4.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtensionStats {
    pub file_count: u64,
    pub total_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_files_visits_depth_first_in_child_order() {
        let now = Utc::now();
        let leaf_a = FileTreeEntry::File(FileNode::new(PathBuf::from("/r/a.rs"), 1, "h1".into()));
        let leaf_b = FileTreeEntry::File(FileNode::new(PathBuf::from("/r/b.rs"), 1, "h2".into()));
        let root = FileTreeEntry::Dir(DirNode {
            path: PathBuf::from("/r"),
            parent: None,
            children: vec![leaf_a, leaf_b],
            hash: "dirhash".into(),
            created: now,
            modified: now,
        });

        let files = root.walk_files();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, PathBuf::from("/r/a.rs"));
        assert_eq!(files[1].path, PathBuf::from("/r/b.rs"));
    }
}
