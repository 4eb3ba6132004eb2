//! Assembles a [`Model`] from a finished [`SharedContext`] run (spec §6
//! "Persisted model"). No seam in `codegraph-core` does this conversion —
//! the context is a run-scoped mutable store, the model is its frozen,
//! serializable snapshot, and gluing the two together is the facade's job.

use codegraph_core::model::{Issue, Model};
use codegraph_core::SharedContext;
use std::path::Path;

pub fn build_model(ctx: &SharedContext, root_path: &Path, created_at: chrono::DateTime<chrono::Utc>) -> Model {
    let file_system = ctx
        .file_tree()
        .unwrap_or_else(|| empty_tree(root_path, created_at));

    let issues = ctx
        .events()
        .into_iter()
        .filter(|e| e.kind == "file-failed")
        .map(|e| Issue {
            kind: e.kind,
            path: e.payload.get("path").and_then(|v| v.as_str()).map(String::from),
            message: e
                .payload
                .get("cause")
                .and_then(|v| v.as_str())
                .unwrap_or("unspecified failure")
                .to_string(),
        })
        .collect();

    Model {
        root_path: root_path.to_path_buf(),
        file_system,
        languages: ctx.languages(),
        code_nodes: ctx.code_nodes_snapshot(),
        relationships: ctx.relationships_snapshot(),
        patterns: ctx.patterns_snapshot(),
        data_flow: ctx.data_flow_snapshot(),
        dependencies: ctx.dependencies_snapshot(),
        concepts: ctx.concepts_snapshot(),
        semantic_units: ctx.semantic_units_snapshot(),
        clusters: ctx.clusters_snapshot(),
        created_at,
        updated_at: chrono::Utc::now(),
        options: ctx.options().clone(),
        issues,
    }
}

/// Invariant 9 (empty root): the tree builder still produces a root dir
/// node even with zero children, but a fresh context with nothing run
/// against it has no tree at all — fall back to a well-formed empty one.
fn empty_tree(root_path: &Path, now: chrono::DateTime<chrono::Utc>) -> codegraph_core::model::FileTreeEntry {
    use codegraph_core::model::file_tree::DirNode;
    codegraph_core::model::FileTreeEntry::Dir(DirNode {
        path: root_path.to_path_buf(),
        parent: None,
        children: Vec::new(),
        hash: codegraph_core::hash::fold_dir_hash(std::iter::empty()),
        created: now,
        modified: now,
    })
}
