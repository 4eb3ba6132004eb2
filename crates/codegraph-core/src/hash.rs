//! Content hashing for files and folded hashing for directories (spec
//! §4.1). Any collision-resistant digest satisfies the spec; SHA-256 is
//! used here, matching the teacher's use of the `sha2` crate for
//! content-addressed hashing elsewhere in the pack.

use crate::model::file_tree::{FileTreeEntry, Hash};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;

/// Hashes file content bytes.
pub fn hash_content(bytes: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Folds a directory's ordered `(name, hash)` children into one hash. The
/// order is whatever the caller passes — the tree builder is responsible
/// for calling this with children in the file-system adapter's insertion
/// order, which is what makes the fold deterministic across runs on
/// unchanged inputs (spec invariant 4).
pub fn fold_dir_hash<'a>(children: impl IntoIterator<Item = (&'a str, &'a str)>) -> Hash {
    let mut hasher = Sha256::new();
    for (name, hash) in children {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(hash.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Result of diffing two file trees (spec §4.1 `compareTrees`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeDiff {
    pub added: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
}

/// Walks both trees by path, comparing file hashes. Directories never
/// appear in the output — their changes are summarized by their files, as
/// the spec requires.
pub fn compare_trees(old: &FileTreeEntry, new: &FileTreeEntry) -> TreeDiff {
    let old_files: HashMap<PathBuf, &str> = old
        .walk_files()
        .into_iter()
        .map(|f| (f.path.clone(), f.hash.as_str()))
        .collect();
    let new_files: HashMap<PathBuf, &str> = new
        .walk_files()
        .into_iter()
        .map(|f| (f.path.clone(), f.hash.as_str()))
        .collect();

    let mut diff = TreeDiff::default();

    for (path, new_hash) in &new_files {
        match old_files.get(path) {
            None => diff.added.push(path.clone()),
            Some(old_hash) if old_hash != new_hash => diff.modified.push(path.clone()),
            Some(_) => {}
        }
    }
    for path in old_files.keys() {
        if !new_files.contains_key(path) {
            diff.deleted.push(path.clone());
        }
    }

    diff.added.sort();
    diff.modified.sort();
    diff.deleted.sort();
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::file_tree::{DirNode, FileNode};
    use chrono::Utc;

    fn file(path: &str, hash: &str) -> FileTreeEntry {
        FileTreeEntry::File(FileNode::new(PathBuf::from(path), 1, hash.to_string()))
    }

    fn dir(path: &str, children: Vec<FileTreeEntry>) -> FileTreeEntry {
        let now = Utc::now();
        FileTreeEntry::Dir(DirNode {
            path: PathBuf::from(path),
            parent: None,
            children,
            hash: "unused".to_string(),
            created: now,
            modified: now,
        })
    }

    #[test]
    fn hash_content_is_deterministic() {
        assert_eq!(hash_content(b"hello"), hash_content(b"hello"));
        assert_ne!(hash_content(b"hello"), hash_content(b"world"));
    }

    #[test]
    fn fold_dir_hash_is_order_sensitive() {
        let a = fold_dir_hash([("a", "1"), ("b", "2")]);
        let b = fold_dir_hash([("b", "2"), ("a", "1")]);
        assert_ne!(a, b, "fold must respect child order, not be order-independent");
    }

    #[test]
    fn compare_trees_detects_added_modified_deleted() {
        let old = dir(
            "/r",
            vec![file("/r/a.rs", "h1"), file("/r/b.rs", "h2")],
        );
        let new = dir(
            "/r",
            vec![file("/r/a.rs", "h1-changed"), file("/r/c.rs", "h3")],
        );

        let diff = compare_trees(&old, &new);
        assert_eq!(diff.added, vec![PathBuf::from("/r/c.rs")]);
        assert_eq!(diff.modified, vec![PathBuf::from("/r/a.rs")]);
        assert_eq!(diff.deleted, vec![PathBuf::from("/r/b.rs")]);
    }

    #[test]
    fn compare_trees_unchanged_file_is_skipped_on_both_sides() {
        let old = dir("/r", vec![file("/r/a.rs", "h1")]);
        let new = dir("/r", vec![file("/r/a.rs", "h1")]);
        let diff = compare_trees(&old, &new);
        assert!(diff.added.is_empty());
        assert!(diff.modified.is_empty());
        assert!(diff.deleted.is_empty());
    }
}
