//! The phase-ordered driver (spec §4.3, §5). Grounded on the teacher's
//! `PipelineOrchestrator::run_dag` (`codegraph-orchestration/src/
//! orchestrator.rs`) for overall shape — construct from a registry, log the
//! execution plan, run phases, translate failure into a typed error — but
//! re-expressed as a **synchronous** driver per spec §9 "Cooperative phases
//! rather than callbacks": no `async fn`, no `tokio`, no `.await`. The only
//! concurrency in this crate is the `rayon` data-parallel batch in
//! `FILE_ANALYSIS`, which is plain thread-pool fan-out with a conventional
//! join, not cooperative scheduling.

use codegraph_core::hash::{compare_trees, TreeDiff};
use codegraph_core::model::file_tree::FileTreeEntry;
use codegraph_core::model::CodeNode;
use codegraph_core::{CoreError, Phase, Result, SharedContext};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

use crate::analyzer::{read_file_task, SemanticCollaborator};
use crate::batch::plan_batches;
use crate::registry::AnalyzerRegistry;

/// Builds the file tree into the shared context (spec §4.4). A seam, not a
/// concrete implementation — `codegraph-analyzers` provides the walker that
/// drives a `FileSystem` (spec §1 keeps concrete filesystem traversal out of
/// the core).
pub trait TreeBuilder: Send + Sync {
    fn build(&self, ctx: &SharedContext) -> Result<()>;
}

pub struct PipelineOrchestrator {
    registry: AnalyzerRegistry,
    tree_builder: Arc<dyn TreeBuilder>,
    semantic_collaborators: Vec<Arc<dyn SemanticCollaborator>>,
}

impl PipelineOrchestrator {
    pub fn new(registry: AnalyzerRegistry, tree_builder: Arc<dyn TreeBuilder>) -> Self {
        Self {
            registry,
            tree_builder,
            semantic_collaborators: Vec::new(),
        }
    }

    pub fn with_semantic_collaborators(
        mut self,
        collaborators: Vec<Arc<dyn SemanticCollaborator>>,
    ) -> Self {
        self.semantic_collaborators = collaborators;
        self
    }

    /// Full run: build the tree from scratch, analyze every file, run every
    /// downstream phase (spec §4.3 steps 1-7).
    pub fn run(&self, ctx: &SharedContext) -> Result<()> {
        self.run_initialization(ctx)?;

        let files: Vec<PathBuf> = ctx
            .file_tree()
            .map(|tree| tree.walk_files().into_iter().map(|f| f.path.clone()).collect())
            .unwrap_or_default();

        self.run_file_analysis(ctx, files)?;
        self.run_downstream(ctx)?;
        Ok(())
    }

    /// Incremental run (spec §4.3 "Incremental mode"). Rebuilds the tree,
    /// diffs it against `old_tree`, removes deleted paths from the context,
    /// then re-processes only added/modified files through `FILE_ANALYSIS`
    /// before re-running every downstream phase globally — a pragmatic
    /// choice named explicitly in the spec, not an oversight.
    pub fn run_incremental(
        &self,
        ctx: &SharedContext,
        old_tree: &FileTreeEntry,
    ) -> Result<TreeDiff> {
        self.run_initialization(ctx)?;

        let new_tree = ctx
            .file_tree()
            .ok_or_else(|| CoreError::invariant("tree builder did not populate the file tree"))?;
        let diff = compare_trees(old_tree, &new_tree);
        ctx.remove_files(&diff.deleted);

        let mut changed: Vec<PathBuf> = diff
            .added
            .iter()
            .chain(diff.modified.iter())
            .cloned()
            .collect();
        changed.sort();
        changed.dedup();

        self.run_file_analysis(ctx, changed)?;
        self.run_downstream(ctx)?;
        Ok(diff)
    }

    fn run_initialization(&self, ctx: &SharedContext) -> Result<()> {
        ctx.set_phase(Phase::Initialization);
        self.tree_builder.build(ctx)?;
        for analyzer in self.registry.ordered() {
            self.check_cancelled(ctx)?;
            analyzer.initialize(ctx)?;
        }
        Ok(())
    }

    /// Processes `files` in memory-sized batches, parallel across files
    /// within a batch, analyzers run in topological order per file (spec
    /// §5 "each worker reads its own file's content ... appends to a
    /// per-worker buffer that is merged ... at a synchronization point").
    fn run_file_analysis(&self, ctx: &SharedContext, files: Vec<PathBuf>) -> Result<()> {
        ctx.set_phase(Phase::FileAnalysis);
        if files.is_empty() {
            return Ok(());
        }

        for batch in plan_batches(files) {
            self.check_cancelled(ctx)?;

            let analyzers: Vec<_> = self.registry.ordered().cloned().collect();
            let results: Vec<Result<(usize, Vec<CodeNode>)>> = batch
                .par_iter()
                .enumerate()
                .map(|(idx, path)| -> Result<(usize, Vec<CodeNode>)> {
                    let task = read_file_task(ctx, path).map_err(|e| {
                        ctx.record_event(
                            "file-failed",
                            serde_json::json!({ "path": path.display().to_string(), "cause": e.to_string() }),
                        );
                        e
                    });
                    let task = match task {
                        Ok(t) => t,
                        Err(_) => return Ok((idx, Vec::new())),
                    };

                    let mut produced = Vec::new();
                    for analyzer in &analyzers {
                        match analyzer.analyze_file(ctx, &task) {
                            Ok(mut nodes) => produced.append(&mut nodes),
                            Err(e) if e.is_recoverable() => {
                                ctx.record_event(
                                    "file-failed",
                                    serde_json::json!({
                                        "path": path.display().to_string(),
                                        "analyzer": analyzer.id(),
                                        "cause": e.to_string(),
                                    }),
                                );
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    Ok((idx, produced))
                })
                .collect();

            // Sort by original index before merging so the synchronization
            // point sees files in deterministic walk order regardless of
            // which worker finished first (spec §5c).
            let mut ordered: Vec<(usize, Vec<CodeNode>)> = Vec::with_capacity(results.len());
            for r in results {
                ordered.push(r?);
            }
            ordered.sort_by_key(|(idx, _)| *idx);

            let merged: Vec<CodeNode> = ordered.into_iter().flat_map(|(_, nodes)| nodes).collect();
            ctx.merge_code_nodes(merged);
            ctx.request_memory_release(0.25);
        }
        Ok(())
    }

    fn run_downstream(&self, ctx: &SharedContext) -> Result<()> {
        ctx.set_phase(Phase::RelationshipMapping);
        for analyzer in self.registry.ordered() {
            self.check_cancelled(ctx)?;
            analyzer.process_relationships(ctx)?;
        }

        ctx.set_phase(Phase::PatternDiscovery);
        for analyzer in self.registry.ordered() {
            self.check_cancelled(ctx)?;
            analyzer.discover_patterns(ctx)?;
        }

        ctx.set_phase(Phase::SemanticAnalysis);
        if ctx.options().semantic_analysis {
            for collaborator in &self.semantic_collaborators {
                self.check_cancelled(ctx)?;
                collaborator.run(ctx)?;
            }
        }

        ctx.set_phase(Phase::Integration);
        for analyzer in self.registry.ordered() {
            self.check_cancelled(ctx)?;
            analyzer.integrate_analysis(ctx)?;
        }

        ctx.set_phase(Phase::Finalization);
        for analyzer in self.registry.ordered() {
            analyzer.cleanup(ctx)?;
        }
        ctx.request_memory_release(1.0);
        Ok(())
    }

    fn check_cancelled(&self, ctx: &SharedContext) -> Result<()> {
        if ctx.is_cancelled() {
            ctx.set_phase(Phase::Finalization);
            return Err(CoreError::Cancelled);
        }
        Ok(())
    }
}
