use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// The run's immutable configuration (spec §6 "recognized options"). The
/// core does not own a loader — a CLI or other collaborator constructs this
/// (or reads it from TOML via [`RunOptions::from_toml_str`]) and hands it to
/// [`crate::context::SharedContext::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Path substrings to skip during file-tree traversal.
    pub exclude: Vec<String>,
    /// Cap on file-tree depth and on data-node recursion / path length.
    pub max_depth: usize,
    /// Enable event/async inference in the data-flow analyzer.
    pub include_async_flows: bool,
    /// Tag flows as conditional when lexical cues are present.
    pub include_conditional_flows: bool,
    /// Flow admission threshold (spec §4.6.2).
    pub data_flow_min_confidence: f32,
    /// Generic analyzer confidence gate.
    pub adaptive_threshold: f32,
    /// Enable the semantic analyzer / concept extraction collaborator hook.
    pub semantic_analysis: bool,
    /// Include files whose name looks like a test (vs. skip them).
    pub include_tests: bool,
    /// Collaborator hook, unused by the core.
    pub generate_embeddings: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            max_depth: 5,
            include_async_flows: true,
            include_conditional_flows: true,
            data_flow_min_confidence: 0.6,
            adaptive_threshold: 0.7,
            semantic_analysis: false,
            include_tests: true,
            generate_embeddings: false,
        }
    }
}

impl RunOptions {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(CoreError::config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(CoreError::config)
    }

    pub fn is_excluded(&self, relative_path: &str) -> bool {
        self.exclude.iter().any(|pat| relative_path.contains(pat.as_str()))
    }
}
