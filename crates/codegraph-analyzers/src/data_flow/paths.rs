//! Path enumeration (spec §4.6.3). Runs during pattern discovery, after
//! flow discovery has populated the graph's flows.

use codegraph_core::model::data_flow::{DataFlowId, DataNodeId};
use codegraph_core::model::{DataFlowGraph, DataFlowPath, DataNodeRole};
use codegraph_core::SharedContext;
use indexmap::IndexMap;
use std::collections::HashSet;

pub fn enumerate_paths(ctx: &SharedContext) {
    let max_depth = ctx.options().max_depth;
    let mut emitted = 0u32;

    ctx.with_data_flow_mut(|graph| {
        let by_source = index_by_source(graph);
        let entry_points = find_entry_points(graph, &by_source);

        let mut new_paths = Vec::new();
        let mut counter = 0usize;
        for entry in &entry_points {
            walk(
                graph,
                &by_source,
                entry,
                vec![entry.clone()],
                Vec::new(),
                &mut HashSet::from([entry.clone()]),
                max_depth,
                &mut new_paths,
                &mut counter,
            );
        }
        emitted = new_paths.len() as u32;
        graph.paths = new_paths;
    });

    ctx.record_metric("data_flow.paths_enumerated", emitted as f64);
}

fn index_by_source<'g>(graph: &'g DataFlowGraph) -> IndexMap<&'g str, Vec<&'g codegraph_core::model::DataFlow>> {
    let mut map: IndexMap<&str, Vec<&codegraph_core::model::DataFlow>> = IndexMap::new();
    for flow in &graph.flows {
        map.entry(flow.source.as_str()).or_default().push(flow);
    }
    map
}

fn find_entry_points(
    graph: &DataFlowGraph,
    by_source: &IndexMap<&str, Vec<&codegraph_core::model::DataFlow>>,
) -> Vec<DataNodeId> {
    let targets: HashSet<&str> = graph.flows.iter().map(|f| f.target.as_str()).collect();
    graph
        .nodes
        .values()
        .filter(|n| n.role == DataNodeRole::Source && !targets.contains(n.id.as_str()))
        .filter(|n| by_source.contains_key(n.id.as_str()))
        .map(|n| n.id.clone())
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn walk(
    graph: &DataFlowGraph,
    by_source: &IndexMap<&str, Vec<&codegraph_core::model::DataFlow>>,
    current: &str,
    nodes: Vec<DataNodeId>,
    flows: Vec<DataFlowId>,
    visited: &mut HashSet<DataNodeId>,
    max_depth: usize,
    out: &mut Vec<DataFlowPath>,
    counter: &mut usize,
) {
    let current_node = graph.nodes.get(current);
    let is_sink = current_node.map(|n| n.role == DataNodeRole::Sink).unwrap_or(false);
    let outgoing = by_source.get(current);

    if is_sink || outgoing.is_none() || nodes.len() >= max_depth {
        if nodes.len() >= 2 {
            emit_path(graph, &nodes, &flows, out, counter);
        }
        return;
    }

    for flow in outgoing.unwrap() {
        if visited.contains(&flow.target) {
            continue;
        }
        if nodes.len() >= max_depth {
            if nodes.len() >= 2 {
                emit_path(graph, &nodes, &flows, out, counter);
            }
            continue;
        }

        let mut next_nodes = nodes.clone();
        next_nodes.push(flow.target.clone());
        let mut next_flows = flows.clone();
        next_flows.push(flow.id.clone());
        visited.insert(flow.target.clone());

        walk(graph, by_source, &flow.target, next_nodes, next_flows, visited, max_depth, out, counter);

        visited.remove(&flow.target);
    }

    // Dead end with no admissible outgoing edge but not itself a sink: still
    // worth recording if the branch has gone somewhere.
    if outgoing.map(|v| v.is_empty()).unwrap_or(false) && nodes.len() >= 2 {
        emit_path(graph, &nodes, &flows, out, counter);
    }
}

fn emit_path(
    graph: &DataFlowGraph,
    nodes: &[DataNodeId],
    flows: &[DataFlowId],
    out: &mut Vec<DataFlowPath>,
    counter: &mut usize,
) {
    let flow_by_id: IndexMap<&str, &codegraph_core::model::DataFlow> =
        graph.flows.iter().map(|f| (f.id.as_str(), f)).collect();

    let mean_confidence: f32 = if flows.is_empty() {
        0.7
    } else {
        flows.iter().filter_map(|id| flow_by_id.get(id.as_str())).map(|f| f.confidence).sum::<f32>() / flows.len() as f32
    };
    let length = nodes.len();
    let penalty = 0.03 * (length.saturating_sub(2)) as f32;
    let confidence = (mean_confidence - penalty).clamp(0.50, 0.95);

    let source_name = graph.nodes.get(&nodes[0]).map(|n| n.name.as_str()).unwrap_or("?");
    let target_name = graph
        .nodes
        .get(nodes.last().unwrap())
        .map(|n| n.name.as_str())
        .unwrap_or("?");

    *counter += 1;
    out.push(DataFlowPath {
        id: format!("path:{counter}"),
        name: format!("{source_name} to {target_name}"),
        description: format!("Data flows from {source_name} to {target_name} across {} hop(s).", length - 1),
        nodes: nodes.to_vec(),
        flows: flows.to_vec(),
        entry_points: vec![nodes[0].clone()],
        exit_points: vec![nodes.last().unwrap().clone()],
        confidence,
        metadata: Default::default(),
    });
}
