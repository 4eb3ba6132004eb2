//! Data-flow analyzer (spec §2, §4.6) — the largest analyzer. Infers
//! producers, consumers, transformers, and the paths data travels between
//! them, without privileged knowledge of any language's grammar.
//!
//! Phase assignment departs from the letter of §4.6.1 in one place: see
//! [`roles`] for why node-role discovery runs at the start of relationship
//! mapping rather than inside `analyzeFile`.

mod flows;
mod integration;
mod mining;
mod paths;
mod propagation;
mod roles;

use codegraph_core::model::DataFlowType;
use codegraph_core::{Result, SharedContext};
use codegraph_pipeline::Analyzer;

pub struct DataFlowAnalyzer;

impl DataFlowAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DataFlowAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for DataFlowAnalyzer {
    fn id(&self) -> &str {
        "data-flow-analyzer"
    }

    fn name(&self) -> &str {
        "Data Flow Analyzer"
    }

    fn priority(&self) -> i32 {
        30
    }

    fn dependencies(&self) -> Vec<String> {
        vec!["relationship-analyzer".to_string(), "pattern-analyzer".to_string()]
    }

    fn process_relationships(&self, ctx: &SharedContext) -> Result<()> {
        roles::discover_roles(ctx);
        flows::discover_flows(ctx);
        Ok(())
    }

    fn discover_patterns(&self, ctx: &SharedContext) -> Result<()> {
        paths::enumerate_paths(ctx);
        propagation::propagate_data_types(ctx);
        mining::mine_transformation_patterns(ctx);
        Ok(())
    }

    fn integrate_analysis(&self, ctx: &SharedContext) -> Result<()> {
        integration::integrate(ctx);
        Ok(())
    }
}

pub(crate) fn flow_kind_tag(kind: &DataFlowType) -> &'static str {
    match kind {
        DataFlowType::Parameter => "parameter",
        DataFlowType::Return => "return",
        DataFlowType::Assignment => "assignment",
        DataFlowType::PropertyAccess => "property_access",
        DataFlowType::EventEmission => "event_emission",
        DataFlowType::EventHandling => "event_handling",
        DataFlowType::StateMutation => "state_mutation",
        DataFlowType::MethodCall => "method_call",
        DataFlowType::Import => "import",
        DataFlowType::Export => "export",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryFs;
    use codegraph_core::model::code_node::{meta_keys, Location};
    use codegraph_core::model::{CodeNode, NodeKind, RelationshipType};
    use codegraph_core::RunOptions;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn node(id: &str, name: &str, has_return: bool, has_params: bool, children: Vec<&str>) -> CodeNode {
        let mut metadata = indexmap::IndexMap::new();
        metadata.insert(meta_keys::IS_RETURN.to_string(), serde_json::json!(has_return));
        metadata.insert(meta_keys::IS_PARAMETER.to_string(), serde_json::json!(has_params));
        CodeNode {
            id: id.into(),
            kind: NodeKind::Function,
            name: name.into(),
            qualified_name: name.into(),
            file_path: PathBuf::from("/r/a.rs"),
            language: Some("rust".into()),
            content_hash: "h".into(),
            location: Location::point(1, 0),
            content: None,
            children: children.into_iter().map(String::from).collect(),
            parent: None,
            confidence: 0.7,
            metadata,
        }
    }

    /// End-to-end: a source function calling a sink function through a
    /// `calls` relationship produces a data-flow path and a `depends_on`
    /// relationship back into the code graph (scenario S2 shape).
    #[test]
    fn producer_consumer_pair_yields_path_and_depends_on() {
        let fs = InMemoryFs::new(vec![(PathBuf::from("/r/a.rs"), b"fn makeUser() { return User::new(); }\nfn saveUser(user) { db.save(user); }".to_vec())]);
        let ctx = SharedContext::new(Arc::new(fs), RunOptions::default());
        ctx.merge_code_nodes(vec![
            node("make", "makeUser", true, false, vec![]),
            node("save", "saveUser", false, true, vec![]),
        ]);
        ctx.add_relationship(codegraph_core::model::Relationship {
            id: "r1".into(),
            kind: RelationshipType::Calls,
            source: "make".into(),
            target: "save".into(),
            weight: 1.0,
            confidence: 0.8,
            metadata: Default::default(),
        });

        let analyzer = DataFlowAnalyzer::new();
        analyzer.process_relationships(&ctx).unwrap();
        analyzer.discover_patterns(&ctx).unwrap();
        analyzer.integrate_analysis(&ctx).unwrap();

        let graph = ctx.data_flow_snapshot();
        assert_eq!(graph.nodes.get("dn:make").unwrap().role, codegraph_core::model::DataNodeRole::Source);
        assert_eq!(graph.nodes.get("dn:save").unwrap().role, codegraph_core::model::DataNodeRole::Sink);
        assert!(!graph.paths.is_empty());

        let rels = ctx.relationships_snapshot();
        assert!(rels.iter().any(|r| r.kind == RelationshipType::DependsOn));
    }
}
