//! Integration (spec §4.6.6). Emits `depends_on` relationships for the
//! code-node pairs behind each data flow and annotates the involved code
//! nodes with their discovered role.

use codegraph_core::model::code_node::meta_keys;
use codegraph_core::model::RelationshipType;
use codegraph_core::SharedContext;
use indexmap::IndexMap;
use std::collections::HashSet;

pub fn integrate(ctx: &SharedContext) {
    let graph = ctx.data_flow_snapshot();

    for dn in graph.nodes.values() {
        let Some(node_id) = &dn.node_id else { continue };
        ctx.update_code_node_metadata(
            node_id,
            meta_keys::DATA_FLOW_ROLE,
            serde_json::json!(role_str(dn.role)),
        );
        ctx.update_code_node_metadata(node_id, meta_keys::DATA_NODE_ID, serde_json::json!(dn.id));
    }

    let mut seen: HashSet<(String, String, &'static str)> = HashSet::new();
    let mut emitted = 0u32;

    for flow in &graph.flows {
        let Some(source_node) = graph.nodes.get(&flow.source).and_then(|n| n.node_id.clone()) else {
            continue;
        };
        let Some(target_node) = graph.nodes.get(&flow.target).and_then(|n| n.node_id.clone()) else {
            continue;
        };
        let kind_tag = super::flow_kind_tag(&flow.kind);
        let key = (source_node.clone(), target_node.clone(), kind_tag);
        if !seen.insert(key) {
            continue;
        }

        let mut metadata = IndexMap::new();
        metadata.insert(meta_keys::FLOW_TYPE.to_string(), serde_json::json!(kind_tag));
        metadata.insert("isAsync".to_string(), serde_json::json!(flow.is_async));
        metadata.insert("conditional".to_string(), serde_json::json!(flow.conditional));
        metadata.insert("transformations".to_string(), serde_json::json!(flow.transformations));

        ctx.add_relationship(codegraph_core::model::Relationship {
            id: format!("rel:depends_on:{kind_tag}:{source_node}:{target_node}"),
            kind: RelationshipType::DependsOn,
            source: source_node,
            target: target_node,
            weight: flow.confidence,
            confidence: flow.confidence,
            metadata,
        });
        emitted += 1;
    }

    ctx.record_metric("data_flow.depends_on_relationships", emitted as f64);
}

fn role_str(role: codegraph_core::model::DataNodeRole) -> &'static str {
    use codegraph_core::model::DataNodeRole::*;
    match role {
        Source => "source",
        Sink => "sink",
        Transformer => "transformer",
        Store => "store",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryFs;
    use codegraph_core::model::code_node::Location;
    use codegraph_core::model::{CodeNode, DataFlow, DataFlowType, DataNode, DataNodeRole, NodeKind};
    use codegraph_core::RunOptions;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn code_node(id: &str) -> CodeNode {
        CodeNode {
            id: id.into(),
            kind: NodeKind::Function,
            name: id.into(),
            qualified_name: id.into(),
            file_path: PathBuf::from("/r/a.rs"),
            language: Some("rust".into()),
            content_hash: "h".into(),
            location: Location::point(1, 0),
            content: None,
            children: Vec::new(),
            parent: None,
            confidence: 0.7,
            metadata: Default::default(),
        }
    }

    #[test]
    fn integration_emits_depends_on_and_writes_role_metadata() {
        let fs = InMemoryFs::new(vec![]);
        let ctx = SharedContext::new(Arc::new(fs), RunOptions::default());
        ctx.merge_code_nodes(vec![code_node("a"), code_node("b")]);
        ctx.add_data_node(DataNode {
            id: "dn:a".into(),
            name: "a".into(),
            node_id: Some("a".into()),
            role: DataNodeRole::Source,
            confidence: 0.8,
            data_type: None,
            metadata: Default::default(),
        });
        ctx.add_data_node(DataNode {
            id: "dn:b".into(),
            name: "b".into(),
            node_id: Some("b".into()),
            role: DataNodeRole::Sink,
            confidence: 0.8,
            data_type: None,
            metadata: Default::default(),
        });
        ctx.add_data_flow(DataFlow {
            id: "f1".into(),
            kind: DataFlowType::Return,
            source: "dn:a".into(),
            target: "dn:b".into(),
            transformations: Vec::new(),
            is_async: false,
            conditional: false,
            confidence: 0.8,
            metadata: Default::default(),
        });

        integrate(&ctx);

        let rels = ctx.relationships_snapshot();
        assert!(rels.iter().any(|r| r.kind == RelationshipType::DependsOn && r.source == "a" && r.target == "b"));

        let node_a = ctx.get_code_node("a").unwrap();
        assert_eq!(node_a.meta_str(meta_keys::DATA_FLOW_ROLE), Some("source"));
    }
}
