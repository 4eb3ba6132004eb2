//! Data-node discovery (spec §4.6.1). The spec places this "during file
//! analysis", recursively walking each file's code-node tree. The batched,
//! merge-at-end-of-phase architecture (`codegraph_pipeline::orchestrator`)
//! means an analyzer's `analyzeFile` hook only ever sees nodes already
//! merged from *prior* batches — never nodes a sibling analyzer is
//! producing for the same file in the same pass (spec §5's own
//! "no analyzer may observe another analyzer's in-flight writes within a
//! phase" rule, generalized to same-phase siblings). Since this node's own
//! kind, name, and metadata are all role discovery needs, it runs once per
//! run at the start of relationship mapping instead, against the fully
//! merged snapshot `processRelationships` already receives — one phase
//! later than the letter of the spec, same effect, no missed nodes.

use codegraph_core::confidence::{self, MAX_CONFIDENCE};
use codegraph_core::model::code_node::meta_keys;
use codegraph_core::model::{CodeNode, DataNode, DataNodeRole, NodeKind};
use codegraph_core::SharedContext;

const SOURCE_WORDS: &[&str] = &["input", "source", "fetch", "get", "read", "load", "api"];
const SINK_WORDS: &[&str] = &[
    "output", "sink", "save", "write", "send", "set", "update", "emit", "publish",
];
const TRANSFORMER_WORDS: &[&str] = &[
    "transform", "convert", "format", "parse", "map", "filter", "reduce", "process",
];
const STORE_WORDS: &[&str] = &[
    "store", "state", "cache", "repository", "db", "database", "model", "container",
];

const BASE_CONFIDENCE: f32 = 0.70;
const SIGNAL_BUMP: f32 = 0.15;
const NAME_BUMP: f32 = 0.10;

struct Signal {
    role: DataNodeRole,
    bump: f32,
    pattern_confidence: Option<f32>,
}

pub fn discover_roles(ctx: &SharedContext) {
    let nodes = ctx.code_nodes_snapshot();
    let adaptive_threshold = ctx.options().adaptive_threshold;
    let mut created = 0u32;

    for node in nodes.values() {
        let Some(signal) = classify(ctx, node) else {
            continue;
        };

        let mut base = BASE_CONFIDENCE;
        if let Some(pattern_confidence) = signal.pattern_confidence {
            base = base.max(pattern_confidence);
        }
        let confidence = confidence::combine(base, &[signal.bump]).min(MAX_CONFIDENCE);
        if confidence < adaptive_threshold {
            continue;
        }

        ctx.add_data_node(DataNode {
            id: format!("dn:{}", node.id),
            name: node.name.clone(),
            node_id: Some(node.id.clone()),
            role: signal.role,
            confidence,
            data_type: node.meta_str(meta_keys::DATA_TYPE).map(str::to_string),
            metadata: Default::default(),
        });
        created += 1;
    }

    ctx.record_metric("data_flow.nodes_discovered", created as f64);
}

fn classify(ctx: &SharedContext, node: &CodeNode) -> Option<Signal> {
    if let Some(role) = explicit_role(node) {
        return Some(Signal {
            role,
            bump: SIGNAL_BUMP,
            pattern_confidence: None,
        });
    }

    if let Some((role, confidence)) = pattern_role(ctx, node) {
        return Some(Signal {
            role,
            bump: SIGNAL_BUMP,
            pattern_confidence: Some(confidence),
        });
    }

    if let Some(role) = name_role(&node.name) {
        return Some(Signal {
            role,
            bump: NAME_BUMP,
            pattern_confidence: None,
        });
    }

    structural_role(node).map(|role| Signal {
        role,
        bump: 0.0,
        pattern_confidence: None,
    })
}

fn explicit_role(node: &CodeNode) -> Option<DataNodeRole> {
    match node.meta_str(meta_keys::DATA_FLOW_ROLE) {
        Some("source") => return Some(DataNodeRole::Source),
        Some("sink") => return Some(DataNodeRole::Sink),
        Some("transformer") => return Some(DataNodeRole::Transformer),
        Some("store") => return Some(DataNodeRole::Store),
        _ => {}
    }
    if node.meta_bool(meta_keys::IS_DATA_SOURCE) == Some(true) {
        return Some(DataNodeRole::Source);
    }
    if node.meta_bool(meta_keys::IS_DATA_SINK) == Some(true) {
        return Some(DataNodeRole::Sink);
    }
    if node.meta_bool(meta_keys::IS_DATA_TRANSFORMER) == Some(true) {
        return Some(DataNodeRole::Transformer);
    }
    if node.meta_bool(meta_keys::IS_DATA_STORE) == Some(true) {
        return Some(DataNodeRole::Store);
    }
    None
}

fn pattern_role(ctx: &SharedContext, node: &CodeNode) -> Option<(DataNodeRole, f32)> {
    let text = node_text(ctx, node)?;
    for (tag, role) in [
        ("data_source", DataNodeRole::Source),
        ("data_sink", DataNodeRole::Sink),
        ("data_transformer", DataNodeRole::Transformer),
        ("data_store", DataNodeRole::Store),
    ] {
        let hits = ctx.find_matching_patterns(&text, tag);
        if let Some(best) = hits.iter().map(|p| p.confidence).fold(None, |acc, c| {
            Some(acc.map_or(c, |a: f32| a.max(c)))
        }) {
            return Some((role, best));
        }
    }
    None
}

fn node_text(ctx: &SharedContext, node: &CodeNode) -> Option<String> {
    if let Some(content) = &node.content {
        return Some(content.clone());
    }
    ctx.get_file_content(&node.file_path)
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

fn name_role(name: &str) -> Option<DataNodeRole> {
    let lower = name.to_lowercase();
    let contains_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if contains_any(SOURCE_WORDS) {
        Some(DataNodeRole::Source)
    } else if contains_any(SINK_WORDS) {
        Some(DataNodeRole::Sink)
    } else if contains_any(TRANSFORMER_WORDS) {
        Some(DataNodeRole::Transformer)
    } else if contains_any(STORE_WORDS) {
        Some(DataNodeRole::Store)
    } else {
        None
    }
}

fn structural_role(node: &CodeNode) -> Option<DataNodeRole> {
    if node.kind.is_callable() {
        let params = node.has_params();
        let returns = node.has_return();
        return match (params, returns) {
            (false, true) => Some(DataNodeRole::Source),
            (true, false) => Some(DataNodeRole::Sink),
            (true, true) => Some(DataNodeRole::Transformer),
            (false, false) => None,
        };
    }
    if matches!(node.kind, NodeKind::Class | NodeKind::Interface) {
        let has_getter = node.meta_bool(meta_keys::IS_GETTER) == Some(true);
        let has_setter = node.meta_bool(meta_keys::IS_SETTER) == Some(true);
        if has_getter && has_setter {
            return Some(DataNodeRole::Store);
        }
    }
    None
}
