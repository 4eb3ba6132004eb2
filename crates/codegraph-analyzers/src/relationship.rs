//! Relationship analyzer (spec §2 "Relationship analyzer", §4.3
//! `processRelationships`). Without privileged knowledge of any language's
//! grammar the only structural signal available is the code-node tree
//! itself (parent/child) plus identifier occurrence inside sibling files'
//! content — so containment is exact and call/use/reference edges are a
//! name-occurrence heuristic, same texture as the data-flow analyzer's
//! name-based role inference.

use codegraph_core::model::code_node::NodeId;
use codegraph_core::model::{CodeNode, Relationship, RelationshipType};
use codegraph_core::{Result, SharedContext};
use codegraph_pipeline::Analyzer;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;

pub struct RelationshipAnalyzer;

impl RelationshipAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RelationshipAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for RelationshipAnalyzer {
    fn id(&self) -> &str {
        "relationship-analyzer"
    }

    fn name(&self) -> &str {
        "Relationship Analyzer"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn process_relationships(&self, ctx: &SharedContext) -> Result<()> {
        let nodes = ctx.code_nodes_snapshot();

        emit_containment(ctx, &nodes);
        emit_name_occurrence_edges(ctx, &nodes);
        Ok(())
    }
}

fn emit_containment(ctx: &SharedContext, nodes: &IndexMap<NodeId, CodeNode>) {
    let mut emitted = 0u32;
    for node in nodes.values() {
        for child_id in &node.children {
            if !nodes.contains_key(child_id) {
                continue;
            }
            ctx.add_relationship(Relationship {
                id: format!("rel:contains:{}:{}", node.id, child_id),
                kind: RelationshipType::Contains,
                source: node.id.clone(),
                target: child_id.clone(),
                weight: 1.0,
                confidence: codegraph_core::confidence::MAX_CONFIDENCE,
                metadata: IndexMap::new(),
            });
            emitted += 1;
        }
    }
    ctx.record_metric("relationships.contains", emitted as f64);
}

/// Finds, for every non-trivial identifier (name of a class/function/
/// method/variable), every other node whose file content references it by
/// a word-boundary match, and emits a `calls`/`uses`/`references` edge
/// depending on the referenced node's kind. The surrounding line is kept
/// as `context` metadata — the data-flow analyzer mines it for lexical
/// cues (spec §4.6.2).
fn emit_name_occurrence_edges(ctx: &SharedContext, nodes: &IndexMap<NodeId, CodeNode>) {
    let mut by_name: IndexMap<&str, Vec<&CodeNode>> = IndexMap::new();
    for node in nodes.values() {
        if node.name.len() < 3 {
            continue;
        }
        by_name.entry(node.name.as_str()).or_default().push(node);
    }

    let mut seen_edges: HashSet<(NodeId, NodeId)> = HashSet::new();
    let mut emitted = 0u32;

    for referrer in nodes.values() {
        let Ok(content) = ctx.get_file_content(&referrer.file_path) else {
            continue;
        };
        let text = String::from_utf8_lossy(&content);

        for (name, candidates) in &by_name {
            let Ok(pattern) = Regex::new(&format!(r"\b{}\b", regex::escape(name))) else {
                continue;
            };
            let Some(m) = pattern.find(&text) else {
                continue;
            };

            for candidate in candidates {
                if candidate.id == referrer.id {
                    continue;
                }
                let key = (referrer.id.clone(), candidate.id.clone());
                if !seen_edges.insert(key) {
                    continue;
                }

                let kind = if candidate.kind.is_callable() {
                    RelationshipType::Calls
                } else if matches!(candidate.kind, codegraph_core::model::NodeKind::Variable | codegraph_core::model::NodeKind::Property) {
                    RelationshipType::Uses
                } else {
                    RelationshipType::References
                };

                let line_start = text[..m.start()].rfind('\n').map(|i| i + 1).unwrap_or(0);
                let line_end = text[m.start()..].find('\n').map(|i| m.start() + i).unwrap_or(text.len());
                let context = text[line_start..line_end].trim().to_string();

                let mut metadata = IndexMap::new();
                metadata.insert("context".to_string(), serde_json::json!(context));

                ctx.add_relationship(Relationship {
                    id: format!("rel:{}:{}:{}", kind.as_str(), referrer.id, candidate.id),
                    kind,
                    source: referrer.id.clone(),
                    target: candidate.id.clone(),
                    weight: 1.0,
                    confidence: 0.6,
                    metadata,
                });
                emitted += 1;
            }
        }
    }
    ctx.record_metric("relationships.name_occurrence", emitted as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryFs;
    use codegraph_core::model::code_node::Location;
    use codegraph_core::model::NodeKind;
    use codegraph_core::RunOptions;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn node(id: &str, name: &str, kind: NodeKind, file: &str, children: Vec<&str>) -> CodeNode {
        CodeNode {
            id: id.into(),
            kind,
            name: name.into(),
            qualified_name: name.into(),
            file_path: PathBuf::from(file),
            language: Some("rust".into()),
            content_hash: "h".into(),
            location: Location::point(1, 0),
            content: None,
            children: children.into_iter().map(String::from).collect(),
            parent: None,
            confidence: 0.7,
            metadata: IndexMap::new(),
        }
    }

    #[test]
    fn containment_is_emitted_for_each_child() {
        let fs = InMemoryFs::new(vec![(PathBuf::from("/r/a.rs"), b"fn main() {}".to_vec())]);
        let ctx = SharedContext::new(Arc::new(fs), RunOptions::default());
        ctx.merge_code_nodes(vec![
            node("parent", "Main", NodeKind::Module, "/r/a.rs", vec!["child"]),
            node("child", "run", NodeKind::Function, "/r/a.rs", vec![]),
        ]);

        RelationshipAnalyzer::new().process_relationships(&ctx).unwrap();

        let rels = ctx.relationships_snapshot();
        assert!(rels.iter().any(|r| r.kind == RelationshipType::Contains && r.source == "parent" && r.target == "child"));
    }

    #[test]
    fn name_occurrence_emits_calls_for_callable_reference() {
        let fs = InMemoryFs::new(vec![
            (PathBuf::from("/r/a.rs"), b"fn main() { helper(); }".to_vec()),
            (PathBuf::from("/r/b.rs"), b"fn helper() {}".to_vec()),
        ]);
        let ctx = SharedContext::new(Arc::new(fs), RunOptions::default());
        ctx.merge_code_nodes(vec![
            node("main", "main", NodeKind::Function, "/r/a.rs", vec![]),
            node("helper", "helper", NodeKind::Function, "/r/b.rs", vec![]),
        ]);

        RelationshipAnalyzer::new().process_relationships(&ctx).unwrap();

        let rels = ctx.relationships_snapshot();
        assert!(rels
            .iter()
            .any(|r| r.kind == RelationshipType::Calls && r.source == "main" && r.target == "helper"));
    }
}
