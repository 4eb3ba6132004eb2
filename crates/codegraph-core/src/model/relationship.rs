use super::code_node::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type RelationshipId = String;

/// Directed edge type between code nodes (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Calls,
    Imports,
    Exports,
    Extends,
    Implements,
    Uses,
    DependsOn,
    References,
    Contains,
    Other(String),
}

impl RelationshipType {
    pub fn as_str(&self) -> &str {
        match self {
            RelationshipType::Calls => "calls",
            RelationshipType::Imports => "imports",
            RelationshipType::Exports => "exports",
            RelationshipType::Extends => "extends",
            RelationshipType::Implements => "implements",
            RelationshipType::Uses => "uses",
            RelationshipType::DependsOn => "depends_on",
            RelationshipType::References => "references",
            RelationshipType::Contains => "contains",
            RelationshipType::Other(s) => s.as_str(),
        }
    }

    /// Relationship types the data-flow analyzer may lift into flows
    /// (spec §4.6.2 "From existing relationships").
    pub fn is_flow_eligible(&self) -> bool {
        matches!(
            self,
            RelationshipType::Calls
                | RelationshipType::Imports
                | RelationshipType::Exports
                | RelationshipType::Uses
                | RelationshipType::DependsOn
                | RelationshipType::References
        )
    }
}

/// An edge between two code nodes. `metadata["context"]`, when present,
/// carries the surrounding textual fragment the relationship analyzer
/// captured — the data-flow analyzer mines it for lexical cues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub kind: RelationshipType,
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f32,
    pub confidence: f32,
    pub metadata: IndexMap<String, serde_json::Value>,
}

impl Relationship {
    pub fn context(&self) -> Option<&str> {
        self.metadata.get("context").and_then(|v| v.as_str())
    }

    pub fn meta_bool(&self, key: &str) -> Option<bool> {
        self.metadata.get(key).and_then(|v| v.as_bool())
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}
