use super::code_node::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type DataNodeId = String;
pub type DataFlowId = String;
pub type DataFlowPathId = String;

/// The inferred role of a data node (spec §3, §4.6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataNodeRole {
    Source,
    Sink,
    Transformer,
    Store,
}

/// A node in the data-flow graph, optionally bound to a code node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataNode {
    pub id: DataNodeId,
    pub name: String,
    pub node_id: Option<NodeId>,
    pub role: DataNodeRole,
    pub confidence: f32,
    pub data_type: Option<String>,
    pub metadata: IndexMap<String, serde_json::Value>,
}

/// Kind of edge between data nodes (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFlowType {
    Parameter,
    Return,
    Assignment,
    PropertyAccess,
    EventEmission,
    EventHandling,
    StateMutation,
    MethodCall,
    Import,
    Export,
}

/// A directed edge between two data nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFlow {
    pub id: DataFlowId,
    pub kind: DataFlowType,
    pub source: DataNodeId,
    pub target: DataNodeId,
    pub transformations: Vec<String>,
    pub is_async: bool,
    pub conditional: bool,
    pub confidence: f32,
    pub metadata: IndexMap<String, serde_json::Value>,
}

/// A simple path of data nodes connected by flows, from an entry point to a
/// sink or dead-end (spec §3, §4.6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFlowPath {
    pub id: DataFlowPathId,
    pub name: String,
    pub description: String,
    pub nodes: Vec<DataNodeId>,
    pub flows: Vec<DataFlowId>,
    pub entry_points: Vec<DataNodeId>,
    pub exit_points: Vec<DataNodeId>,
    pub confidence: f32,
    pub metadata: IndexMap<String, serde_json::Value>,
}

/// The full data-flow model (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataFlowGraph {
    pub nodes: IndexMap<DataNodeId, DataNode>,
    pub flows: Vec<DataFlow>,
    pub paths: Vec<DataFlowPath>,
}

impl DataFlowGraph {
    /// Invariant 1 (partial): every flow's endpoints resolve to a data
    /// node, and every data node's `node_id`, if set, resolves to a code
    /// node in `code_node_ids`.
    pub fn check_referential_integrity(
        &self,
        code_node_ids: &std::collections::HashSet<NodeId>,
    ) -> Result<(), String> {
        for dn in self.nodes.values() {
            if let Some(nid) = &dn.node_id {
                if !code_node_ids.contains(nid) {
                    return Err(format!(
                        "data node {} references missing code node {}",
                        dn.id, nid
                    ));
                }
            }
        }
        for flow in &self.flows {
            if !self.nodes.contains_key(&flow.source) {
                return Err(format!("flow {} has missing source {}", flow.id, flow.source));
            }
            if !self.nodes.contains_key(&flow.target) {
                return Err(format!("flow {} has missing target {}", flow.id, flow.target));
            }
        }
        Ok(())
    }

    /// Invariant 2: every path is simple, its entry/exit points match its
    /// endpoints, and each consecutive node pair is connected by at least
    /// one flow actually present in `flows`.
    pub fn check_path_validity(&self) -> Result<(), String> {
        let flow_by_id: IndexMap<&str, &DataFlow> =
            self.flows.iter().map(|f| (f.id.as_str(), f)).collect();

        for path in &self.paths {
            let mut seen = std::collections::HashSet::new();
            for n in &path.nodes {
                if !seen.insert(n.clone()) {
                    return Err(format!("path {} repeats node {}", path.id, n));
                }
            }

            if path.nodes.first() != path.entry_points.first() || path.entry_points.len() != 1 {
                return Err(format!("path {} entry points mismatch", path.id));
            }
            if path.nodes.last() != path.exit_points.first() || path.exit_points.len() != 1 {
                return Err(format!("path {} exit points mismatch", path.id));
            }

            for pair in path.nodes.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                let connected = path.flows.iter().any(|fid| {
                    flow_by_id
                        .get(fid.as_str())
                        .map(|f| &f.source == a && &f.target == b)
                        .unwrap_or(false)
                });
                if !connected {
                    return Err(format!("path {} missing flow {}->{}", path.id, a, b));
                }
            }
        }
        Ok(())
    }
}
