//! Flow discovery (spec §4.6.2). Runs during relationship mapping, right
//! after [`super::roles::discover_roles`] has populated the data-node set
//! for the run.

use codegraph_core::confidence;
use codegraph_core::model::{DataFlow, DataFlowType, DataNode, DataNodeRole, Relationship, RelationshipType};
use codegraph_core::SharedContext;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

const SHARED_STATE_BASE: f32 = 0.60;
const CALL_INFERENCE_BASE: f32 = 0.60;
const EVENT_FLOW_BASE: f32 = 0.60;

static WRITE_NAME_PREFIXES: &[&str] = &["set", "update", "write", "save", "add"];

pub fn discover_flows(ctx: &SharedContext) {
    let relationships = ctx.relationships_snapshot();
    let options = ctx.options();
    let min_confidence = options.data_flow_min_confidence;
    let allow_conditional = options.include_conditional_flows;
    let allow_async = options.include_async_flows;
    let mut seen: HashSet<(String, String, &'static str)> = HashSet::new();
    let mut emitted = 0u32;

    for rel in &relationships {
        if !rel.kind.is_flow_eligible() {
            continue;
        }
        let source_dn = format!("dn:{}", rel.source);
        let target_dn = format!("dn:{}", rel.target);
        if ctx.with_data_flow_mut(|g| !g.nodes.contains_key(&source_dn) || !g.nodes.contains_key(&target_dn)) {
            continue;
        }

        let kind = flow_type_for_relationship(rel);
        let transformations = detect_transformations(rel.context().unwrap_or(""));
        let (mut is_async, conditional) = detect_flags(rel, allow_conditional);
        if !allow_async {
            is_async = false;
        }

        if admit_and_emit(
            ctx,
            &mut seen,
            super::flow_kind_tag(&kind),
            &source_dn,
            &target_dn,
            kind,
            transformations,
            is_async,
            conditional,
            rel.confidence,
            min_confidence,
        ) {
            emitted += 1;
        }
    }

    emitted += discover_shared_state_flows(ctx, &relationships, &mut seen, min_confidence);
    emitted += discover_call_inference_flows(ctx, &relationships, &mut seen, min_confidence);
    if allow_async {
        emitted += discover_event_flows(ctx, &mut seen, min_confidence);
    }

    ctx.record_metric("data_flow.flows_discovered", emitted as f64);
}

fn parse_flow_type(s: &str) -> Option<DataFlowType> {
    Some(match s {
        "parameter" => DataFlowType::Parameter,
        "return" => DataFlowType::Return,
        "assignment" => DataFlowType::Assignment,
        "property_access" => DataFlowType::PropertyAccess,
        "event_emission" => DataFlowType::EventEmission,
        "event_handling" => DataFlowType::EventHandling,
        "state_mutation" => DataFlowType::StateMutation,
        "method_call" => DataFlowType::MethodCall,
        "import" => DataFlowType::Import,
        "export" => DataFlowType::Export,
        _ => return None,
    })
}

fn flow_type_for_relationship(rel: &Relationship) -> DataFlowType {
    if let Some(explicit) = rel.meta_str("flowType").and_then(parse_flow_type) {
        return explicit;
    }
    match rel.kind {
        RelationshipType::Imports => DataFlowType::Import,
        RelationshipType::Exports => DataFlowType::Export,
        RelationshipType::Calls => {
            if rel.meta_bool("isParameterPass") == Some(true) {
                DataFlowType::Parameter
            } else if rel.meta_bool("isReturnValue") == Some(true) {
                DataFlowType::Return
            } else {
                DataFlowType::MethodCall
            }
        }
        _ => flow_type_from_context(rel.context().unwrap_or("")),
    }
}

fn flow_type_from_context(context: &str) -> DataFlowType {
    if context.contains('=') && !context.contains("==") {
        DataFlowType::Assignment
    } else if context.contains("emit") || context.contains("dispatch") {
        DataFlowType::EventEmission
    } else if context.contains("listen") || context.contains("handler") {
        DataFlowType::EventHandling
    } else if context.contains('.') {
        DataFlowType::PropertyAccess
    } else {
        DataFlowType::MethodCall
    }
}

static TRANSFORMATION_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("map", Regex::new(r"map\(").unwrap()),
        ("filter", Regex::new(r"filter\(").unwrap()),
        ("reduce", Regex::new(r"reduce\(").unwrap()),
        ("sort", Regex::new(r"sort\(").unwrap()),
        ("transform", Regex::new(r"transform|convert").unwrap()),
        ("parse", Regex::new(r"parse|stringify").unwrap()),
    ]
});

fn detect_transformations(context: &str) -> Vec<String> {
    TRANSFORMATION_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(context))
        .map(|(tag, _)| tag.to_string())
        .collect()
}

static ASYNC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)async|promise|then\(|callback|await|eventlistener").unwrap());
static CONDITIONAL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bif\b|\belse\b|\bswitch\b|\bcase\b|\btry\b|\bcatch\b|\?|\|\||&&").unwrap());

fn detect_flags(rel: &Relationship, allow_conditional: bool) -> (bool, bool) {
    let context = rel.context().unwrap_or("");
    let is_async = rel.meta_bool("isAsync").unwrap_or_else(|| ASYNC_PATTERN.is_match(context));
    let conditional = allow_conditional
        && rel
            .meta_bool("conditional")
            .unwrap_or_else(|| CONDITIONAL_PATTERN.is_match(context));
    (is_async, conditional)
}

#[allow(clippy::too_many_arguments)]
fn admit_and_emit(
    ctx: &SharedContext,
    seen: &mut HashSet<(String, String, &'static str)>,
    kind_tag: &'static str,
    source_dn: &str,
    target_dn: &str,
    kind: DataFlowType,
    transformations: Vec<String>,
    is_async: bool,
    conditional: bool,
    base_confidence: f32,
    min_confidence: f32,
) -> bool {
    let key = (source_dn.to_string(), target_dn.to_string(), kind_tag);
    if !seen.insert(key) {
        return false;
    }
    if base_confidence < min_confidence {
        return false;
    }
    ctx.add_data_flow(DataFlow {
        id: format!("flow:{kind_tag}:{source_dn}:{target_dn}"),
        kind,
        source: source_dn.to_string(),
        target: target_dn.to_string(),
        transformations,
        is_async,
        conditional,
        confidence: base_confidence,
        metadata: Default::default(),
    });
    true
}

fn is_write_accessor(ctx: &SharedContext, accessor_id: &str, context: Option<&str>) -> bool {
    if let Some(node) = ctx.get_code_node(accessor_id) {
        if WRITE_NAME_PREFIXES.iter().any(|p| node.name.to_lowercase().starts_with(p)) {
            return true;
        }
    }
    let lower = context.unwrap_or("").to_lowercase();
    lower.contains('=') || lower.contains("set") || lower.contains("update") || lower.contains("write") || lower.contains("save")
}

fn discover_shared_state_flows(
    ctx: &SharedContext,
    relationships: &[Relationship],
    seen: &mut HashSet<(String, String, &'static str)>,
    min_confidence: f32,
) -> u32 {
    let mut accessors: HashMap<String, Vec<&Relationship>> = HashMap::new();
    for rel in relationships {
        if matches!(rel.kind, RelationshipType::Uses | RelationshipType::References) {
            accessors.entry(rel.target.clone()).or_default().push(rel);
        }
    }

    let mut emitted = 0u32;
    for (target, accesses) in accessors {
        let mut distinct: HashSet<&str> = HashSet::new();
        for rel in &accesses {
            distinct.insert(rel.source.as_str());
        }
        if distinct.len() < 2 {
            continue;
        }

        let store_dn = format!("dn:{target}");
        let exists = ctx.with_data_flow_mut(|g| g.nodes.contains_key(&store_dn));
        if !exists {
            let name = ctx.get_code_node(&target).map(|n| n.name).unwrap_or_else(|| target.clone());
            ctx.add_data_node(DataNode {
                id: store_dn.clone(),
                name,
                node_id: Some(target.clone()),
                role: DataNodeRole::Store,
                confidence: SHARED_STATE_BASE,
                data_type: None,
                metadata: Default::default(),
            });
        }

        for rel in &accesses {
            let accessor_dn = format!("dn:{}", rel.source);
            if !ctx.with_data_flow_mut(|g| g.nodes.contains_key(&accessor_dn)) {
                continue;
            }
            let write = rel.meta_bool("isWrite").unwrap_or_else(|| is_write_accessor(ctx, &rel.source, rel.context()));
            let confidence = confidence::combine(SHARED_STATE_BASE, &[0.10]);
            let (source, target_dn) = if write {
                (accessor_dn.clone(), store_dn.clone())
            } else {
                (store_dn.clone(), accessor_dn.clone())
            };
            if admit_and_emit(
                ctx,
                seen,
                "state_mutation",
                &source,
                &target_dn,
                DataFlowType::StateMutation,
                Vec::new(),
                false,
                false,
                confidence,
                min_confidence,
            ) {
                emitted += 1;
            }
        }
    }
    emitted
}

fn discover_call_inference_flows(
    ctx: &SharedContext,
    relationships: &[Relationship],
    seen: &mut HashSet<(String, String, &'static str)>,
    min_confidence: f32,
) -> u32 {
    let mut emitted = 0u32;
    for rel in relationships {
        if rel.kind != RelationshipType::Calls {
            continue;
        }
        let Some(callee) = ctx.get_code_node(&rel.target) else {
            continue;
        };
        let caller_dn = format!("dn:{}", rel.source);
        if !ctx.with_data_flow_mut(|g| g.nodes.contains_key(&caller_dn)) {
            continue;
        }

        for child_id in &callee.children {
            let Some(child) = ctx.get_code_node(child_id) else {
                continue;
            };
            let child_dn = format!("dn:{}", child.id);
            if !ctx.with_data_flow_mut(|g| g.nodes.contains_key(&child_dn)) {
                continue;
            }
            let confidence = confidence::combine(CALL_INFERENCE_BASE, &[0.10]);
            if child.has_params() && !child.has_return() {
                if admit_and_emit(
                    ctx, seen, "parameter", &caller_dn, &child_dn,
                    DataFlowType::Parameter, Vec::new(), false, false, confidence, min_confidence,
                ) {
                    emitted += 1;
                }
            }
        }

        if callee.has_return() {
            let callee_dn = format!("dn:{}", callee.id);
            let confidence = confidence::combine(CALL_INFERENCE_BASE, &[0.10]);
            if admit_and_emit(
                ctx, seen, "return", &callee_dn, &caller_dn,
                DataFlowType::Return, Vec::new(), false, false, confidence, min_confidence,
            ) {
                emitted += 1;
            }
        }
    }
    emitted
}

static EMIT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:emit|dispatch|publish)\s*\(\s*['"](\w+)['"]"#).unwrap());
static HANDLER_QUOTED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:on|addEventListener|subscribe)\s*\(\s*['"](\w+)['"]"#).unwrap());
static HANDLER_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^on([A-Z]\w*)$").unwrap());

fn camel_decapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn discover_event_flows(
    ctx: &SharedContext,
    seen: &mut HashSet<(String, String, &'static str)>,
    min_confidence: f32,
) -> u32 {
    let nodes = ctx.code_nodes_snapshot();
    let mut emitters: HashMap<String, Vec<String>> = HashMap::new();
    let mut handlers: HashMap<String, Vec<String>> = HashMap::new();

    for node in nodes.values() {
        let dn = format!("dn:{}", node.id);
        if !ctx.with_data_flow_mut(|g| g.nodes.contains_key(&dn)) {
            continue;
        }

        if let Some(caps) = HANDLER_NAME_PATTERN.captures(&node.name) {
            let event = camel_decapitalize(caps.get(1).unwrap().as_str());
            handlers.entry(event).or_default().push(dn.clone());
        }

        let Ok(content) = ctx.get_file_content(&node.file_path) else {
            continue;
        };
        let text = String::from_utf8_lossy(&content);
        for caps in EMIT_PATTERN.captures_iter(&text) {
            emitters.entry(caps[1].to_string()).or_default().push(dn.clone());
        }
        for caps in HANDLER_QUOTED_PATTERN.captures_iter(&text) {
            handlers.entry(caps[1].to_string()).or_default().push(dn.clone());
        }
    }

    let mut emitted = 0u32;
    for (event, emitter_dns) in &emitters {
        let Some(handler_dns) = handlers.get(event) else {
            continue;
        };
        let confidence = confidence::combine(EVENT_FLOW_BASE, &[0.10]);
        for emitter in emitter_dns {
            for handler in handler_dns {
                if emitter == handler {
                    continue;
                }
                if admit_and_emit(
                    ctx, seen, "event_emission", emitter, handler,
                    DataFlowType::EventEmission, Vec::new(), true, false, confidence, min_confidence,
                ) {
                    emitted += 1;
                }
            }
        }
    }
    emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryFs;
    use codegraph_core::model::code_node::Location;
    use codegraph_core::model::{CodeNode, NodeKind};
    use codegraph_core::RunOptions;
    use std::path::PathBuf;
    use std::sync::Arc;
    use indexmap::IndexMap;

    fn node(id: &str, name: &str, file: &str) -> CodeNode {
        CodeNode {
            id: id.into(),
            kind: NodeKind::Function,
            name: name.into(),
            qualified_name: name.into(),
            file_path: PathBuf::from(file),
            language: Some("rust".into()),
            content_hash: "h".into(),
            location: Location::point(1, 0),
            content: None,
            children: Vec::new(),
            parent: None,
            confidence: 0.7,
            metadata: IndexMap::new(),
        }
    }

    fn dn(ctx: &SharedContext, id: &str, role: DataNodeRole) {
        ctx.add_data_node(DataNode {
            id: format!("dn:{id}"),
            name: id.into(),
            node_id: Some(id.into()),
            role,
            confidence: 0.7,
            data_type: None,
            metadata: IndexMap::new(),
        });
    }

    #[test]
    fn calls_relationship_with_return_flag_emits_return_flow() {
        let fs = InMemoryFs::new(vec![(PathBuf::from("/r/a.rs"), b"x".to_vec())]);
        let ctx = SharedContext::new(Arc::new(fs), RunOptions::default());
        ctx.merge_code_nodes(vec![node("a", "caller", "/r/a.rs"), node("b", "callee", "/r/a.rs")]);
        dn(&ctx, "a", DataNodeRole::Sink);
        dn(&ctx, "b", DataNodeRole::Source);

        let mut metadata = IndexMap::new();
        metadata.insert("isReturnValue".to_string(), serde_json::json!(true));
        ctx.add_relationship(Relationship {
            id: "r1".into(),
            kind: RelationshipType::Calls,
            source: "a".into(),
            target: "b".into(),
            weight: 1.0,
            confidence: 0.8,
            metadata,
        });

        discover_flows(&ctx);

        let graph = ctx.data_flow_snapshot();
        assert!(graph.flows.iter().any(|f| f.kind == DataFlowType::Return && f.source == "dn:a" && f.target == "dn:b"));
    }

    #[test]
    fn event_emission_and_handler_names_are_linked() {
        let fs = InMemoryFs::new(vec![
            (PathBuf::from("/r/a.rs"), b"fn placeOrder() { emit(\"orderPlaced\"); }".to_vec()),
            (PathBuf::from("/r/b.rs"), b"fn onOrderPlaced() {}".to_vec()),
        ]);
        let ctx = SharedContext::new(Arc::new(fs), RunOptions::default());
        ctx.merge_code_nodes(vec![node("emitter", "placeOrder", "/r/a.rs"), node("handler", "onOrderPlaced", "/r/b.rs")]);
        dn(&ctx, "emitter", DataNodeRole::Source);
        dn(&ctx, "handler", DataNodeRole::Sink);

        discover_flows(&ctx);

        let graph = ctx.data_flow_snapshot();
        assert!(graph
            .flows
            .iter()
            .any(|f| f.kind == DataFlowType::EventEmission && f.source == "dn:emitter" && f.target == "dn:handler"));
    }

    #[test]
    fn include_async_flows_false_suppresses_event_inference() {
        let fs = InMemoryFs::new(vec![
            (PathBuf::from("/r/a.rs"), b"fn placeOrder() { emit(\"orderPlaced\"); }".to_vec()),
            (PathBuf::from("/r/b.rs"), b"fn onOrderPlaced() {}".to_vec()),
        ]);
        let options = RunOptions {
            include_async_flows: false,
            ..RunOptions::default()
        };
        let ctx = SharedContext::new(Arc::new(fs), options);
        ctx.merge_code_nodes(vec![node("emitter", "placeOrder", "/r/a.rs"), node("handler", "onOrderPlaced", "/r/b.rs")]);
        dn(&ctx, "emitter", DataNodeRole::Source);
        dn(&ctx, "handler", DataNodeRole::Sink);

        discover_flows(&ctx);

        let graph = ctx.data_flow_snapshot();
        assert!(!graph.flows.iter().any(|f| f.kind == DataFlowType::EventEmission));
    }

    #[test]
    fn include_conditional_flows_false_forces_flag_off() {
        let fs = InMemoryFs::new(vec![(PathBuf::from("/r/a.rs"), b"x".to_vec())]);
        let options = RunOptions {
            include_conditional_flows: false,
            ..RunOptions::default()
        };
        let ctx = SharedContext::new(Arc::new(fs), options);
        ctx.merge_code_nodes(vec![node("a", "caller", "/r/a.rs"), node("b", "callee", "/r/a.rs")]);
        dn(&ctx, "a", DataNodeRole::Sink);
        dn(&ctx, "b", DataNodeRole::Source);

        let mut metadata = IndexMap::new();
        metadata.insert("context".to_string(), serde_json::json!("if (ready) { callee() }"));
        ctx.add_relationship(Relationship {
            id: "r1".into(),
            kind: RelationshipType::Calls,
            source: "a".into(),
            target: "b".into(),
            weight: 1.0,
            confidence: 0.8,
            metadata,
        });

        discover_flows(&ctx);

        let graph = ctx.data_flow_snapshot();
        let flow = graph
            .flows
            .iter()
            .find(|f| f.source == "dn:a" && f.target == "dn:b")
            .expect("method call flow from caller to callee");
        assert!(!flow.conditional);
    }
}
