//! The analyzer capability set (spec §4.3, §9 "Polymorphism across
//! analyzers"): a small trait with phase-opt-in via hook presence, rather
//! than a class hierarchy. Default hook bodies are no-ops so an analyzer
//! only overrides the phases it participates in.

use codegraph_core::model::CodeNode;
use codegraph_core::{Result, SharedContext};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One file handed to `analyze_file`, already read through the shared
/// context's content cache.
pub struct FileTask {
    pub path: PathBuf,
    pub content: Arc<Vec<u8>>,
    pub language: Option<String>,
}

impl FileTask {
    pub fn content_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// An analyzer participates in any subset of the orchestrator's phases by
/// overriding the corresponding hook; unimplemented hooks are no-ops (spec
/// §4.3 "Analyzer contract").
pub trait Analyzer: Send + Sync {
    /// Opaque, run-unique identifier used for dependency edges and the
    /// lexicographic tie-break in topological ordering.
    fn id(&self) -> &str;

    fn name(&self) -> &str {
        self.id()
    }

    /// Higher runs earlier within equal dependency rank.
    fn priority(&self) -> i32 {
        0
    }

    /// Ids of analyzers that must run before this one.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    fn initialize(&self, _ctx: &SharedContext) -> Result<()> {
        Ok(())
    }

    /// Called once per file during `FILE_ANALYSIS`. Returns the code nodes
    /// this analyzer produced for `file`; the orchestrator merges them into
    /// the shared context at the batch's synchronization point.
    fn analyze_file(&self, _ctx: &SharedContext, _file: &FileTask) -> Result<Vec<CodeNode>> {
        Ok(Vec::new())
    }

    fn process_relationships(&self, _ctx: &SharedContext) -> Result<()> {
        Ok(())
    }

    fn discover_patterns(&self, _ctx: &SharedContext) -> Result<()> {
        Ok(())
    }

    fn integrate_analysis(&self, _ctx: &SharedContext) -> Result<()> {
        Ok(())
    }

    fn cleanup(&self, _ctx: &SharedContext) -> Result<()> {
        Ok(())
    }
}

/// Optional collaborator invoked during `SEMANTIC_ANALYSIS` (spec §2's
/// "Semantic analyzer" and "Clustering" rows are explicitly collaborator
/// hooks, not core analyzers — see spec §1). The core ships the seam only;
/// no default collaborator is registered.
pub trait SemanticCollaborator: Send + Sync {
    fn id(&self) -> &str;
    fn run(&self, ctx: &SharedContext) -> Result<()>;
}

pub(crate) fn read_file_task(ctx: &SharedContext, path: &Path) -> Result<FileTask> {
    let content = ctx.get_file_content(path)?;
    Ok(FileTask {
        path: path.to_path_buf(),
        content,
        language: None,
    })
}
