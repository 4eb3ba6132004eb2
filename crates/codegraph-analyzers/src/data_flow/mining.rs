//! Transformation-pattern mining (spec §4.6.5).

use codegraph_core::model::Pattern;
use codegraph_core::SharedContext;
use std::collections::HashMap;

const MIN_GROUP_SIZE: usize = 3;
const PATTERN_CONFIDENCE: f32 = 0.80;

pub fn mine_transformation_patterns(ctx: &SharedContext) {
    let graph = ctx.data_flow_snapshot();

    let mut groups: HashMap<Vec<String>, usize> = HashMap::new();
    for flow in &graph.flows {
        if flow.transformations.is_empty() {
            continue;
        }
        let mut tags = flow.transformations.clone();
        tags.sort();
        *groups.entry(tags).or_insert(0) += 1;
    }

    let mut registered = 0u32;
    for (tags, count) in groups {
        if count < MIN_GROUP_SIZE {
            continue;
        }
        let mut pattern = Pattern::new(
            format!("pattern:data_transformation:{}", tags.join("+")),
            "data_transformation",
            tags.join("+"),
            None,
            PATTERN_CONFIDENCE,
        );
        pattern.metadata.insert("tags".to_string(), serde_json::json!(tags));
        pattern.metadata.insert("sampleSize".to_string(), serde_json::json!(count));
        ctx.register_pattern(pattern);
        registered += 1;
    }

    ctx.record_metric("data_flow.transformation_patterns", registered as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryFs;
    use codegraph_core::model::{DataFlow, DataFlowType};
    use codegraph_core::RunOptions;
    use std::sync::Arc;

    fn flow(id: &str, tags: &[&str]) -> DataFlow {
        DataFlow {
            id: id.into(),
            kind: DataFlowType::MethodCall,
            source: "a".into(),
            target: "b".into(),
            transformations: tags.iter().map(|s| s.to_string()).collect(),
            is_async: false,
            conditional: false,
            confidence: 0.8,
            metadata: Default::default(),
        }
    }

    #[test]
    fn frequent_transformation_combo_is_registered_as_pattern() {
        let fs = InMemoryFs::new(vec![]);
        let ctx = SharedContext::new(Arc::new(fs), RunOptions::default());
        for i in 0..3 {
            ctx.add_data_flow(flow(&format!("f{i}"), &["map", "filter"]));
        }

        mine_transformation_patterns(&ctx);

        assert!(ctx
            .patterns_snapshot()
            .iter()
            .any(|p| p.type_tag == "data_transformation"));
    }

    #[test]
    fn rare_transformation_combo_is_not_registered() {
        let fs = InMemoryFs::new(vec![]);
        let ctx = SharedContext::new(Arc::new(fs), RunOptions::default());
        ctx.add_data_flow(flow("f1", &["map"]));
        ctx.add_data_flow(flow("f2", &["map"]));

        mine_transformation_patterns(&ctx);

        assert!(ctx.patterns_snapshot().is_empty());
    }
}
