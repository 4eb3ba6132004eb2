//! The shared analysis context (spec §4.2): the single source of truth for
//! one indexing run. Analyzers hold only transient views derived from the
//! narrow accessors below; every mutation is typed so invariants can be
//! checked in tests, matching spec §3's "the context does not expose a
//! free-form mutable-state channel".

use crate::error::{CoreError, Result};
use crate::fs_adapter::FileSystem;
use crate::model::{
    CodeNode, Concept, Dependency, DependencyCategory, DependencyGraph, Cluster, DataFlow,
    DataFlowGraph, DataFlowPath, DataNode, FileTreeEntry, LanguageStats, NodeId, Pattern,
    PatternId, Relationship, SemanticUnit,
};
use crate::options::RunOptions;
use crate::phase::Phase;
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One observability record (spec §4.2 `recordEvent`).
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub phase: Phase,
    pub kind: String,
    pub payload: serde_json::Value,
}

/// The pattern registry: keyed by type tag, supports `findMatchingPatterns`
/// (spec §3). Regexes that fail to compile are dropped — the pattern never
/// enters `by_id`, so it is absent from the persisted model too.
#[derive(Default)]
pub struct PatternRegistry {
    by_id: IndexMap<PatternId, Pattern>,
    compiled: IndexMap<PatternId, Regex>,
    by_type_tag: IndexMap<String, Vec<PatternId>>,
}

impl PatternRegistry {
    pub fn register(&mut self, pattern: Pattern) -> Result<()> {
        if let Some(Err(e)) = pattern.try_compile() {
            return Err(CoreError::Pattern(format!(
                "pattern {} failed to compile: {e}",
                pattern.id
            )));
        }
        if let Some(Ok(re)) = pattern.try_compile() {
            self.compiled.insert(pattern.id.clone(), re);
        }
        self.by_type_tag
            .entry(pattern.type_tag.clone())
            .or_default()
            .push(pattern.id.clone());
        self.by_id.insert(pattern.id.clone(), pattern);
        Ok(())
    }

    pub fn find_matching(&self, text: &str, type_tag: &str) -> Vec<&Pattern> {
        let Some(ids) = self.by_type_tag.get(type_tag) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| {
                let pattern = self.by_id.get(id)?;
                let matches = match self.compiled.get(id) {
                    Some(re) => re.is_match(text),
                    None => text.contains(pattern.name.as_str()),
                };
                matches.then_some(pattern)
            })
            .collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &Pattern> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// File-content cache with release and best-effort LRU purge (spec §4.2,
/// §5 "protected by a reader-writer policy"). `DashMap` gives sharded,
/// lock-free-in-practice concurrent reads; `recency` is a coarse counter
/// used only to pick eviction candidates under `request_memory_release`.
struct ContentCache {
    entries: DashMap<PathBuf, Arc<Vec<u8>>>,
    recency: DashMap<PathBuf, u64>,
    clock: AtomicU64,
}

impl ContentCache {
    fn new() -> Self {
        Self {
            entries: DashMap::new(),
            recency: DashMap::new(),
            clock: AtomicU64::new(0),
        }
    }

    fn touch(&self, path: &Path) {
        let t = self.clock.fetch_add(1, Ordering::Relaxed);
        self.recency.insert(path.to_path_buf(), t);
    }

    fn insert(&self, path: PathBuf, content: Vec<u8>) -> Arc<Vec<u8>> {
        let arc = Arc::new(content);
        self.entries.insert(path.clone(), arc.clone());
        self.touch(&path);
        arc
    }

    fn get(&self, path: &Path) -> Option<Arc<Vec<u8>>> {
        let hit = self.entries.get(path).map(|v| v.clone());
        if hit.is_some() {
            self.touch(path);
        }
        hit
    }

    fn release(&self, path: &Path) {
        self.entries.remove(path);
        self.recency.remove(path);
    }

    /// Evicts the least-recently-touched `pressure` fraction of entries.
    fn purge(&self, pressure: f32) {
        let pressure = pressure.clamp(0.0, 1.0);
        let to_evict = ((self.entries.len() as f32) * pressure).ceil() as usize;
        if to_evict == 0 {
            return;
        }
        let mut ranked: Vec<(PathBuf, u64)> = self
            .recency
            .iter()
            .map(|kv| (kv.key().clone(), *kv.value()))
            .collect();
        ranked.sort_by_key(|(_, t)| *t);
        for (path, _) in ranked.into_iter().take(to_evict) {
            self.release(&path);
        }
    }
}

/// The run-scoped owner of the model (spec §4.2). Constructed once per
/// `analyze`/`update` call; dropped at the end of the run (spec §9
/// "Global mutable state").
pub struct SharedContext {
    fs: Arc<dyn FileSystem>,
    options: RunOptions,
    current_phase: RwLock<Phase>,
    cancelled: std::sync::atomic::AtomicBool,

    file_tree: Mutex<Option<FileTreeEntry>>,
    languages: Mutex<IndexMap<String, LanguageStats>>,
    code_nodes: Mutex<IndexMap<NodeId, CodeNode>>,
    relationships: Mutex<Vec<Relationship>>,
    patterns: Mutex<PatternRegistry>,
    data_flow: Mutex<DataFlowGraph>,
    dependencies: Mutex<DependencyGraph>,
    concepts: Mutex<Vec<Concept>>,
    semantic_units: Mutex<Vec<SemanticUnit>>,
    clusters: Mutex<Vec<Cluster>>,

    content_cache: ContentCache,
    events: Mutex<Vec<EventRecord>>,
    metrics: Mutex<IndexMap<String, f64>>,
}

impl SharedContext {
    pub fn new(fs: Arc<dyn FileSystem>, options: RunOptions) -> Self {
        Self {
            fs,
            options,
            current_phase: RwLock::new(Phase::Initialization),
            cancelled: std::sync::atomic::AtomicBool::new(false),
            file_tree: Mutex::new(None),
            languages: Mutex::new(IndexMap::new()),
            code_nodes: Mutex::new(IndexMap::new()),
            relationships: Mutex::new(Vec::new()),
            patterns: Mutex::new(PatternRegistry::default()),
            data_flow: Mutex::new(DataFlowGraph::default()),
            dependencies: Mutex::new(DependencyGraph::default()),
            concepts: Mutex::new(Vec::new()),
            semantic_units: Mutex::new(Vec::new()),
            clusters: Mutex::new(Vec::new()),
            content_cache: ContentCache::new(),
            events: Mutex::new(Vec::new()),
            metrics: Mutex::new(IndexMap::new()),
        }
    }

    // ---- options / phase -------------------------------------------------

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    pub fn current_phase(&self) -> Phase {
        *self.current_phase.read()
    }

    pub fn set_phase(&self, phase: Phase) {
        *self.current_phase.write() = phase;
        self.record_event("phase-started", serde_json::json!({ "phase": phase.as_str() }));
    }

    pub fn request_cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    // ---- observability -----------------------------------------------------

    pub fn record_event(&self, kind: &str, payload: serde_json::Value) {
        let phase = self.current_phase();
        match kind {
            "file-failed" | "pattern-dropped" | "timeout" => {
                tracing::warn!(phase = %phase, kind, %payload, "recoverable event");
            }
            _ => tracing::info!(phase = %phase, kind, %payload, "event"),
        }
        self.events.lock().push(EventRecord {
            phase,
            kind: kind.to_string(),
            payload,
        });
    }

    pub fn record_metric(&self, name: &str, value: f64) {
        *self.metrics.lock().entry(name.to_string()).or_insert(0.0) += value;
        tracing::debug!(name, value, "metric");
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.events.lock().clone()
    }

    pub fn metrics(&self) -> IndexMap<String, f64> {
        self.metrics.lock().clone()
    }

    // ---- file content cache --------------------------------------------

    pub fn get_file_content(&self, path: &Path) -> Result<Arc<Vec<u8>>> {
        if let Some(hit) = self.content_cache.get(path) {
            return Ok(hit);
        }
        let bytes = self
            .fs
            .read_file(path)
            .map_err(|e| CoreError::io(path.display().to_string(), std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
        Ok(self.content_cache.insert(path.to_path_buf(), bytes))
    }

    pub fn release_file_content(&self, path: &Path) {
        self.content_cache.release(path);
    }

    pub fn request_memory_release(&self, pressure: f32) {
        self.content_cache.purge(pressure);
        self.record_metric("memory_release_events", 1.0);
    }

    // ---- patterns --------------------------------------------------------

    pub fn register_pattern(&self, pattern: Pattern) {
        let id = pattern.id.clone();
        if let Err(e) = self.patterns.lock().register(pattern) {
            self.record_event(
                "pattern-dropped",
                serde_json::json!({ "pattern_id": id, "cause": e.to_string() }),
            );
        }
    }

    pub fn find_matching_patterns(&self, text: &str, type_tag: &str) -> Vec<Pattern> {
        self.patterns
            .lock()
            .find_matching(text, type_tag)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn patterns_snapshot(&self) -> Vec<Pattern> {
        self.patterns.lock().all().cloned().collect()
    }

    // ---- file tree / languages --------------------------------------------

    pub fn set_file_tree(&self, tree: FileTreeEntry) {
        *self.file_tree.lock() = Some(tree);
    }

    pub fn file_tree(&self) -> Option<FileTreeEntry> {
        self.file_tree.lock().clone()
    }

    pub fn set_languages(&self, languages: IndexMap<String, LanguageStats>) {
        *self.languages.lock() = languages;
    }

    pub fn languages(&self) -> IndexMap<String, LanguageStats> {
        self.languages.lock().clone()
    }

    // ---- code nodes --------------------------------------------------------

    /// Merges a batch of newly-produced code nodes at a synchronization
    /// point (spec §5: "appends to a per-worker buffer that is merged into
    /// the shared code-nodes map at a synchronization point at the end of
    /// the batch").
    pub fn merge_code_nodes(&self, batch: Vec<CodeNode>) {
        let mut nodes = self.code_nodes.lock();
        for node in batch {
            nodes.insert(node.id.clone(), node);
        }
    }

    pub fn get_code_node(&self, id: &str) -> Option<CodeNode> {
        self.code_nodes.lock().get(id).cloned()
    }

    pub fn code_nodes_snapshot(&self) -> IndexMap<NodeId, CodeNode> {
        self.code_nodes.lock().clone()
    }

    pub fn update_code_node_metadata(&self, id: &str, key: &str, value: serde_json::Value) {
        if let Some(node) = self.code_nodes.lock().get_mut(id) {
            node.metadata.insert(key.to_string(), value);
        }
    }

    // ---- relationships -----------------------------------------------------

    pub fn add_relationship(&self, relationship: Relationship) {
        self.relationships.lock().push(relationship);
    }

    pub fn relationships_snapshot(&self) -> Vec<Relationship> {
        self.relationships.lock().clone()
    }

    // ---- data flow -----------------------------------------------------------

    pub fn add_data_node(&self, node: DataNode) {
        self.data_flow.lock().nodes.insert(node.id.clone(), node);
    }

    pub fn add_data_flow(&self, flow: DataFlow) {
        self.data_flow.lock().flows.push(flow);
    }

    pub fn add_data_flow_path(&self, path: DataFlowPath) {
        self.data_flow.lock().paths.push(path);
    }

    pub fn data_flow_snapshot(&self) -> DataFlowGraph {
        self.data_flow.lock().clone()
    }

    pub fn with_data_flow_mut<R>(&self, f: impl FnOnce(&mut DataFlowGraph) -> R) -> R {
        f(&mut self.data_flow.lock())
    }

    // ---- dependencies --------------------------------------------------------

    pub fn upsert_dependency(&self, specifier: &str, category: DependencyCategory) {
        self.dependencies.lock().upsert(specifier, category);
    }

    pub fn with_dependencies_mut<R>(&self, f: impl FnOnce(&mut DependencyGraph) -> R) -> R {
        f(&mut self.dependencies.lock())
    }

    pub fn dependencies_snapshot(&self) -> DependencyGraph {
        self.dependencies.lock().clone()
    }

    // ---- collaborator hooks --------------------------------------------------

    pub fn set_concepts(&self, concepts: Vec<Concept>) {
        *self.concepts.lock() = concepts;
    }

    pub fn set_semantic_units(&self, units: Vec<SemanticUnit>) {
        *self.semantic_units.lock() = units;
    }

    pub fn set_clusters(&self, clusters: Vec<Cluster>) {
        *self.clusters.lock() = clusters;
    }

    pub fn concepts_snapshot(&self) -> Vec<Concept> {
        self.concepts.lock().clone()
    }

    pub fn semantic_units_snapshot(&self) -> Vec<SemanticUnit> {
        self.semantic_units.lock().clone()
    }

    pub fn clusters_snapshot(&self) -> Vec<Cluster> {
        self.clusters.lock().clone()
    }

    // ---- removal (incremental update) -----------------------------------------

    /// Removes every code node whose file path is in `deleted`, together
    /// with relationships, data nodes, and dependency bookkeeping that
    /// reference them (spec §4.3 incremental mode).
    pub fn remove_files(&self, deleted: &[PathBuf]) {
        let deleted_set: std::collections::HashSet<&PathBuf> = deleted.iter().collect();

        let removed_ids: Vec<NodeId> = {
            let mut nodes = self.code_nodes.lock();
            let removed: Vec<NodeId> = nodes
                .iter()
                .filter(|(_, n)| deleted_set.contains(&n.file_path))
                .map(|(id, _)| id.clone())
                .collect();
            for id in &removed {
                nodes.shift_remove(id);
            }
            removed
        };
        let removed_set: std::collections::HashSet<&NodeId> = removed_ids.iter().collect();

        self.relationships
            .lock()
            .retain(|r| !removed_set.contains(&r.source) && !removed_set.contains(&r.target));

        {
            let mut df = self.data_flow.lock();
            let removed_data_nodes: Vec<String> = df
                .nodes
                .iter()
                .filter(|(_, dn)| dn.node_id.as_ref().map(|n| removed_set.contains(n)).unwrap_or(false))
                .map(|(id, _)| id.clone())
                .collect();
            let removed_dn_set: std::collections::HashSet<&String> = removed_data_nodes.iter().collect();
            for id in &removed_data_nodes {
                df.nodes.shift_remove(id);
            }
            df.flows
                .retain(|f| !removed_dn_set.contains(&f.source) && !removed_dn_set.contains(&f.target));
            df.paths
                .retain(|p| p.nodes.iter().all(|n| !removed_dn_set.contains(n)));
        }

        {
            let mut deps = self.dependencies.lock();
            for dep in deps.dependencies.values_mut() {
                dep.importing_files.retain(|f| !deleted_set.contains(f));
            }
            deps.imports.retain(|i| !deleted_set.contains(&i.source_file));
            deps.exports.retain(|e| !deleted_set.contains(&e.source_file));
        }

        for path in deleted {
            self.release_file_content(path);
        }
    }
}
