//! File-tree builder (spec §4.4), grounded on the teacher's recursive
//! directory walk in `codegraph-ir`'s indexing feature, re-expressed
//! against the core's `FileSystem` seam instead of direct `std::fs` calls
//! so the same builder works against the disk adapter or a test fixture.

use crate::language;
use codegraph_core::fs_adapter::FileSystem;
use codegraph_core::hash::{fold_dir_hash, hash_content};
use codegraph_core::model::file_tree::{DirNode, ExtensionStats, FileNode, FileTreeEntry};
use codegraph_core::model::LanguageStats;
use codegraph_core::options::RunOptions;
use codegraph_core::{CoreError, Result, SharedContext};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

pub struct FileTreeBuilder {
    root: PathBuf,
}

impl FileTreeBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl codegraph_pipeline::TreeBuilder for FileTreeBuilder {
    fn build(&self, ctx: &SharedContext) -> Result<()> {
        let fs = ctx.fs().clone();
        let options = ctx.options().clone();
        let mut languages: IndexMap<String, LanguageStats> = IndexMap::new();
        let mut ext_stats: IndexMap<String, ExtensionStats> = IndexMap::new();

        let tree = build_node(fs.as_ref(), &self.root, &self.root, 0, &options, &mut languages, &mut ext_stats)?;

        ctx.set_file_tree(tree);
        ctx.set_languages(languages);
        Ok(())
    }
}

fn relative_str(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

fn build_node(
    fs: &dyn FileSystem,
    root: &Path,
    path: &Path,
    depth: usize,
    options: &RunOptions,
    languages: &mut IndexMap<String, LanguageStats>,
    ext_stats: &mut IndexMap<String, ExtensionStats>,
) -> Result<FileTreeEntry> {
    let stat = fs.stat(path)?;

    if !stat.is_directory {
        let bytes = fs.read_file(path)?;
        let hash = hash_content(&bytes);
        let mut node = FileNode::new(path.to_path_buf(), stat.size, hash);
        if let Some(ext) = &node.extension {
            node.language = language::detect(ext).map(|l| l.to_string());
            let entry = ext_stats.entry(ext.clone()).or_default();
            entry.file_count += 1;
            entry.total_size += stat.size;
            if let Some(lang) = &node.language {
                let lang_stats = languages.entry(lang.clone()).or_default();
                lang_stats.file_count += 1;
                lang_stats.total_size += stat.size;
            }
        }
        return Ok(FileTreeEntry::File(node));
    }

    let mut children = Vec::new();
    if depth < options.max_depth {
        for name in fs.list_directory(path)? {
            let child_path = path.join(&name);
            let rel = relative_str(root, &child_path);
            if options.is_excluded(&rel) {
                continue;
            }
            let child_stat = fs.stat(&child_path)?;
            if !child_stat.is_directory && !options.include_tests && language::looks_like_test(&name) {
                continue;
            }
            let child = build_node(fs, root, &child_path, depth + 1, options, languages, ext_stats)?;
            children.push(child);
        }
    }

    let name_hash_pairs: Vec<(String, String)> = children
        .iter()
        .map(|c| {
            let name = c
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (name, c.hash().to_string())
        })
        .collect();
    let hash = fold_dir_hash(name_hash_pairs.iter().map(|(n, h)| (n.as_str(), h.as_str())));

    Ok(FileTreeEntry::Dir(DirNode {
        path: path.to_path_buf(),
        parent: path.parent().map(|p| p.to_path_buf()),
        children,
        hash,
        created: stat.created,
        modified: stat.modified,
    }))
}

/// Error helper for callers that need a `ConfigError` when the configured
/// root does not exist or is not a directory. Used by the facade crate
/// before constructing a [`FileTreeBuilder`].
pub fn require_root_exists(fs: &dyn FileSystem, root: &Path) -> Result<()> {
    let stat = fs.stat(root)?;
    if !stat.is_directory {
        return Err(CoreError::config(format!("{} is not a directory", root.display())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryFs;
    use codegraph_pipeline::TreeBuilder;
    use std::sync::Arc;

    #[test]
    fn builds_tree_with_hashes_and_language_stats() {
        let fs = InMemoryFs::new(vec![
            (PathBuf::from("/r/a.rs"), b"fn main() {}".to_vec()),
            (PathBuf::from("/r/sub/b.py"), b"def f(): pass".to_vec()),
        ]);
        let ctx = SharedContext::new(Arc::new(fs), RunOptions::default());
        let builder = FileTreeBuilder::new("/r");
        builder.build(&ctx).unwrap();

        let tree = ctx.file_tree().unwrap();
        let files = tree.walk_files();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].language.as_deref(), Some("rust"));
        assert_eq!(files[1].language.as_deref(), Some("python"));

        let languages = ctx.languages();
        assert_eq!(languages["rust"].file_count, 1);
        assert_eq!(languages["python"].file_count, 1);
    }

    #[test]
    fn exclude_option_skips_matching_paths() {
        let fs = InMemoryFs::new(vec![
            (PathBuf::from("/r/a.rs"), b"x".to_vec()),
            (PathBuf::from("/r/target/b.rs"), b"y".to_vec()),
        ]);
        let mut options = RunOptions::default();
        options.exclude.push("target".to_string());
        let ctx = SharedContext::new(Arc::new(fs), options);
        FileTreeBuilder::new("/r").build(&ctx).unwrap();

        let files = ctx.file_tree().unwrap().walk_files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, PathBuf::from("/r/a.rs"));
    }

    #[test]
    fn dir_hash_is_deterministic_across_builds() {
        let fs = Arc::new(InMemoryFs::new(vec![
            (PathBuf::from("/r/a.rs"), b"one".to_vec()),
            (PathBuf::from("/r/b.rs"), b"two".to_vec()),
        ]));
        let ctx1 = SharedContext::new(fs.clone(), RunOptions::default());
        FileTreeBuilder::new("/r").build(&ctx1).unwrap();
        let ctx2 = SharedContext::new(fs, RunOptions::default());
        FileTreeBuilder::new("/r").build(&ctx2).unwrap();

        assert_eq!(
            ctx1.file_tree().unwrap().hash(),
            ctx2.file_tree().unwrap().hash()
        );
    }
}
