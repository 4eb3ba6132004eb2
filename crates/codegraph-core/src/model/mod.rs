pub mod code_node;
pub mod data_flow;
pub mod dependency;
pub mod file_tree;
pub mod pattern;
pub mod relationship;

pub use code_node::{CodeNode, NodeId, NodeKind};
pub use data_flow::{DataFlow, DataFlowGraph, DataFlowPath, DataFlowType, DataNode, DataNodeRole};
pub use dependency::{Dependency, DependencyCategory, DependencyGraph, ExportStatement, ImportStatement};
pub use file_tree::{DirNode, ExtensionStats, FileNode, FileTreeEntry, Hash};
pub use pattern::{Pattern, PatternId};
pub use relationship::{Relationship, RelationshipId, RelationshipType};

use crate::options::RunOptions;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-language aggregate computed by the language detector (spec §2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageStats {
    pub file_count: u64,
    pub total_size: u64,
}

/// A concept produced by the semantic-analysis collaborator hook (spec §2,
/// §6 `semanticAnalysis`). The core defines the shape but never populates
/// it — that is the collaborator's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub name: String,
    pub description: String,
    pub related_nodes: Vec<NodeId>,
    pub confidence: f32,
}

/// A semantic unit (a cohesive group of code nodes the semantic analyzer
/// judges to implement one idea).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticUnit {
    pub id: String,
    pub name: String,
    pub node_ids: Vec<NodeId>,
    pub confidence: f32,
}

/// A cluster produced by the clustering collaborator hook (spec §2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub label: String,
    pub node_ids: Vec<NodeId>,
    pub confidence: f32,
}

/// A recoverable failure recorded during the run (spec §7 "the returned
/// model carries a non-empty issues summary").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub kind: String,
    pub path: Option<String>,
    pub message: String,
}

/// The persisted model document (spec §6). Top-level keys match the spec
/// exactly so a round-tripped document is recognizable to any collaborator
/// that reads the spec. All paths inside are relative to `root_path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub root_path: std::path::PathBuf,
    pub file_system: FileTreeEntry,
    pub languages: IndexMap<String, LanguageStats>,
    pub code_nodes: IndexMap<NodeId, CodeNode>,
    pub relationships: Vec<Relationship>,
    pub patterns: Vec<Pattern>,
    pub data_flow: DataFlowGraph,
    pub dependencies: DependencyGraph,
    pub concepts: Vec<Concept>,
    pub semantic_units: Vec<SemanticUnit>,
    pub clusters: Vec<Cluster>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub options: RunOptions,
    pub issues: Vec<Issue>,
}

impl Model {
    /// Invariant 1 (full): every relationship's endpoints, every flow's
    /// endpoints, and every data node's `node_id` resolve.
    pub fn check_referential_integrity(&self) -> Result<(), String> {
        for rel in &self.relationships {
            if !self.code_nodes.contains_key(&rel.source) {
                return Err(format!(
                    "relationship {} has missing source {}",
                    rel.id, rel.source
                ));
            }
            if !self.code_nodes.contains_key(&rel.target) {
                return Err(format!(
                    "relationship {} has missing target {}",
                    rel.id, rel.target
                ));
            }
        }
        let code_node_ids = self.code_nodes.keys().cloned().collect();
        self.data_flow.check_referential_integrity(&code_node_ids)
    }

    /// Invariant 2, delegated to the data-flow graph.
    pub fn check_path_validity(&self) -> Result<(), String> {
        self.data_flow.check_path_validity()
    }

    /// Invariant 3: every confidence value (relationships, patterns, data
    /// nodes, flows, paths, dependencies, code nodes) is in `[0, 0.95]`.
    pub fn check_confidence_bounds(&self) -> Result<(), String> {
        let in_bounds = |c: f32| (0.0..=crate::confidence::MAX_CONFIDENCE).contains(&c);

        for n in self.code_nodes.values() {
            if !in_bounds(n.confidence) {
                return Err(format!("code node {} confidence out of bounds", n.id));
            }
        }
        for r in &self.relationships {
            if !in_bounds(r.confidence) {
                return Err(format!("relationship {} confidence out of bounds", r.id));
            }
        }
        for p in &self.patterns {
            if !in_bounds(p.confidence) {
                return Err(format!("pattern {} confidence out of bounds", p.id));
            }
        }
        for dn in self.data_flow.nodes.values() {
            if !in_bounds(dn.confidence) {
                return Err(format!("data node {} confidence out of bounds", dn.id));
            }
        }
        for f in &self.data_flow.flows {
            if !in_bounds(f.confidence) {
                return Err(format!("flow {} confidence out of bounds", f.id));
            }
        }
        for path in &self.data_flow.paths {
            if !in_bounds(path.confidence) {
                return Err(format!("path {} confidence out of bounds", path.id));
            }
        }
        for dep in self.dependencies.dependencies.values() {
            if !in_bounds(dep.confidence) {
                return Err(format!("dependency {} confidence out of bounds", dep.specifier));
            }
        }
        Ok(())
    }

    pub fn check_all_invariants(&self) -> Result<(), String> {
        self.check_referential_integrity()?;
        self.check_path_validity()?;
        self.check_confidence_bounds()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::file_tree::DirNode;

    fn empty_model() -> Model {
        let now = Utc::now();
        Model {
            root_path: "/r".into(),
            file_system: FileTreeEntry::Dir(DirNode {
                path: "/r".into(),
                parent: None,
                children: Vec::new(),
                hash: "h".into(),
                created: now,
                modified: now,
            }),
            languages: IndexMap::new(),
            code_nodes: IndexMap::new(),
            relationships: Vec::new(),
            patterns: Vec::new(),
            data_flow: DataFlowGraph::default(),
            dependencies: DependencyGraph::default(),
            concepts: Vec::new(),
            semantic_units: Vec::new(),
            clusters: Vec::new(),
            created_at: now,
            updated_at: now,
            options: RunOptions::default(),
            issues: Vec::new(),
        }
    }

    #[test]
    fn empty_model_satisfies_all_invariants() {
        let m = empty_model();
        assert!(m.check_all_invariants().is_ok());
    }

    #[test]
    fn dangling_relationship_fails_referential_integrity() {
        let mut m = empty_model();
        m.relationships.push(Relationship {
            id: "r1".into(),
            kind: RelationshipType::Calls,
            source: "missing-a".into(),
            target: "missing-b".into(),
            weight: 1.0,
            confidence: 0.5,
            metadata: IndexMap::new(),
        });
        assert!(m.check_referential_integrity().is_err());
    }
}
