//! `query(model, query) → Result` (spec §6). The spec leaves the query
//! language unspecified; shaped after the pack's own language-agnostic
//! graph-query API (`codegraph-ir/src/api/graph_query.rs`'s `QueryFilter`/
//! `QueryResult`), trimmed to the fields this model actually has.

use codegraph_core::model::{CodeNode, Model, NodeKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryFilter {
    pub kind: Option<String>,
    pub name: Option<String>,
    pub name_prefix: Option<String>,
    pub qualified_name_prefix: Option<String>,
    pub file_path: Option<String>,
    pub min_confidence: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub count: usize,
    pub nodes: Vec<CodeNode>,
}

/// Filters `model.code_nodes` by every set field of `filter`, all
/// conjoined. Node order in the result follows the model's own `IndexMap`
/// iteration order (insertion order, same as everywhere else in this
/// crate set).
pub fn query(model: &Model, filter: &QueryFilter) -> QueryResult {
    let nodes: Vec<CodeNode> = model
        .code_nodes
        .values()
        .filter(|n| matches(n, filter))
        .cloned()
        .collect();

    QueryResult {
        count: nodes.len(),
        nodes,
    }
}

fn matches(node: &CodeNode, filter: &QueryFilter) -> bool {
    if let Some(kind) = &filter.kind {
        if node.kind.as_str() != kind.as_str() && !matches_other(&node.kind, kind) {
            return false;
        }
    }
    if let Some(name) = &filter.name {
        if &node.name != name {
            return false;
        }
    }
    if let Some(prefix) = &filter.name_prefix {
        if !node.name.starts_with(prefix.as_str()) {
            return false;
        }
    }
    if let Some(prefix) = &filter.qualified_name_prefix {
        if !node.qualified_name.starts_with(prefix.as_str()) {
            return false;
        }
    }
    if let Some(path) = &filter.file_path {
        if node.file_path.to_string_lossy() != path.as_str() {
            return false;
        }
    }
    if let Some(min) = filter.min_confidence {
        if node.confidence < min {
            return false;
        }
    }
    true
}

fn matches_other(kind: &NodeKind, filter_kind: &str) -> bool {
    matches!(kind, NodeKind::Other(s) if s == filter_kind)
}
