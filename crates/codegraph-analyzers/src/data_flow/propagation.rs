//! Data-type propagation (spec §4.6.4). Runs after paths are built.

use codegraph_core::model::code_node::meta_keys;
use codegraph_core::SharedContext;

const MAX_ROUNDS: usize = 3;

pub fn propagate_data_types(ctx: &SharedContext) {
    let nodes = ctx.code_nodes_snapshot();

    ctx.with_data_flow_mut(|graph| {
        for dn in graph.nodes.values_mut() {
            if dn.data_type.is_some() {
                continue;
            }
            if let Some(node_id) = &dn.node_id {
                if let Some(code_node) = nodes.get(node_id) {
                    if let Some(data_type) = code_node.meta_str(meta_keys::DATA_TYPE) {
                        dn.data_type = Some(data_type.to_string());
                    }
                }
            }
        }

        for _round in 0..MAX_ROUNDS {
            let mut changed = false;
            for flow in &graph.flows {
                let Some(source_type) = graph.nodes.get(&flow.source).and_then(|n| n.data_type.clone()) else {
                    continue;
                };
                let already_set = graph.nodes.get(&flow.target).map(|n| n.data_type.is_some()).unwrap_or(true);
                if already_set {
                    continue;
                }
                let propagated = apply_transformations(&source_type, &flow.transformations);
                if let Some(target) = graph.nodes.get_mut(&flow.target) {
                    target.data_type = Some(propagated);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    });
}

fn apply_transformations(data_type: &str, transformations: &[String]) -> String {
    let mut t = data_type.to_string();
    for tag in transformations {
        t = match tag.as_str() {
            "map" => {
                if t.ends_with("[]") {
                    t
                } else {
                    format!("{t}[]")
                }
            }
            "filter" => t,
            "reduce" => t.strip_suffix("[]").map(str::to_string).unwrap_or(t),
            "transform" | "format" => "string".to_string(),
            _ => t,
        };
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryFs;
    use codegraph_core::model::{DataFlow, DataFlowType, DataNode, DataNodeRole};
    use codegraph_core::RunOptions;
    use std::sync::Arc;

    #[test]
    fn map_transformation_appends_array_brackets() {
        assert_eq!(apply_transformations("User", &["map".to_string()]), "User[]");
        assert_eq!(apply_transformations("User[]", &["map".to_string()]), "User[]");
    }

    #[test]
    fn reduce_strips_array_brackets() {
        assert_eq!(apply_transformations("User[]", &["reduce".to_string()]), "User");
    }

    #[test]
    fn propagation_flows_through_one_hop() {
        let fs = InMemoryFs::new(vec![]);
        let ctx = SharedContext::new(Arc::new(fs), RunOptions::default());
        ctx.add_data_node(DataNode {
            id: "a".into(),
            name: "a".into(),
            node_id: None,
            role: DataNodeRole::Source,
            confidence: 0.7,
            data_type: Some("User".into()),
            metadata: Default::default(),
        });
        ctx.add_data_node(DataNode {
            id: "b".into(),
            name: "b".into(),
            node_id: None,
            role: DataNodeRole::Sink,
            confidence: 0.7,
            data_type: None,
            metadata: Default::default(),
        });
        ctx.add_data_flow(DataFlow {
            id: "f1".into(),
            kind: DataFlowType::MethodCall,
            source: "a".into(),
            target: "b".into(),
            transformations: vec!["map".to_string()],
            is_async: false,
            conditional: false,
            confidence: 0.8,
            metadata: Default::default(),
        });

        propagate_data_types(&ctx);

        let graph = ctx.data_flow_snapshot();
        assert_eq!(graph.nodes.get("b").unwrap().data_type.as_deref(), Some("User[]"));
    }
}
