use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub type NodeId = String;

/// Kind of a code node (spec §3). `Other` carries kinds a parser
/// collaborator reports that the core doesn't special-case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Module,
    Class,
    Interface,
    Function,
    Method,
    Variable,
    Constant,
    Parameter,
    Property,
    Other(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Module => "module",
            NodeKind::Class => "class",
            NodeKind::Interface => "interface",
            NodeKind::Function => "function",
            NodeKind::Method => "method",
            NodeKind::Variable => "variable",
            NodeKind::Constant => "constant",
            NodeKind::Parameter => "parameter",
            NodeKind::Property => "property",
            NodeKind::Other(s) => s.as_str(),
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, NodeKind::Function | NodeKind::Method)
    }
}

/// Source location within the owning file's current content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Location {
    pub fn point(line: u32, col: u32) -> Self {
        Self {
            start_line: line,
            start_col: col,
            end_line: line,
            end_col: col,
        }
    }
}

/// A node in the code-structure tree: module, class, function, variable...
/// Produced by parser collaborators (per file) and by analyzers that
/// annotate existing nodes' metadata; never mutated outside its creator
/// once integrated, by convention (spec §3 "Ownership and lifecycle").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub qualified_name: String,
    pub file_path: PathBuf,
    pub language: Option<String>,
    pub content_hash: String,
    pub location: Location,
    pub content: Option<String>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub confidence: f32,
    pub metadata: IndexMap<String, serde_json::Value>,
}

/// Conventional metadata keys the spec names (§3): `isParameter`,
/// `isReturn`, `isGetter`, `dataType`, `dataFlowRole`, plus the handful the
/// data-flow analyzer reads/writes (§4.6).
pub mod meta_keys {
    pub const IS_PARAMETER: &str = "isParameter";
    pub const IS_RETURN: &str = "isReturn";
    pub const IS_GETTER: &str = "isGetter";
    pub const IS_SETTER: &str = "isSetter";
    pub const DATA_TYPE: &str = "dataType";
    pub const DATA_FLOW_ROLE: &str = "dataFlowRole";
    pub const IS_DATA_SOURCE: &str = "isDataSource";
    pub const IS_DATA_SINK: &str = "isDataSink";
    pub const IS_DATA_TRANSFORMER: &str = "isDataTransformer";
    pub const IS_DATA_STORE: &str = "isDataStore";
    pub const DATA_NODE_ID: &str = "dataNodeId";
    pub const FLOW_TYPE: &str = "flowType";
    pub const IS_PARAMETER_PASS: &str = "isParameterPass";
    pub const IS_RETURN_VALUE: &str = "isReturnValue";
}

impl CodeNode {
    pub fn meta_bool(&self, key: &str) -> Option<bool> {
        self.metadata.get(key).and_then(|v| v.as_bool())
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn has_return(&self) -> bool {
        self.meta_bool(meta_keys::IS_RETURN).unwrap_or(false)
    }

    pub fn has_params(&self) -> bool {
        self.meta_bool(meta_keys::IS_PARAMETER).unwrap_or(false)
    }
}
