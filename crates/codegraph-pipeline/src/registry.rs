//! Analyzer registration and topological ordering (spec §4.3 "Ordering"),
//! grounded on the teacher's `PipelineDAG::topological_sort`
//! (`codegraph-orchestration/src/dag.rs`) — a Kahn's-algorithm in-degree
//! sweep — generalized from the teacher's four fixed `StageId` variants to
//! an open set of analyzers keyed by string id, and flattened to a single
//! linear order (the teacher groups same-in-degree nodes as parallel
//! batches; the spec instead breaks ties by priority then id, so there is
//! exactly one correct order per registration).

use codegraph_core::{CoreError, Result};
use indexmap::IndexMap;
use std::collections::HashSet;

use crate::analyzer::Analyzer;
use std::sync::Arc;

/// Holds registered analyzers and computes the run order once, at
/// registry-build time — not per phase, since the dependency graph and
/// priorities are fixed for the run.
pub struct AnalyzerRegistry {
    analyzers: IndexMap<String, Arc<dyn Analyzer>>,
    order: Vec<String>,
}

impl AnalyzerRegistry {
    /// Builds the registry and computes the topological order immediately,
    /// so a cyclic dependency graph fails fast at construction (spec §4.3
    /// "a cycle fails fast with `ConfigError`").
    pub fn new(analyzers: Vec<Arc<dyn Analyzer>>) -> Result<Self> {
        let mut by_id = IndexMap::new();
        for a in analyzers {
            let id = a.id().to_string();
            if by_id.insert(id.clone(), a).is_some() {
                return Err(CoreError::config(format!("duplicate analyzer id {id}")));
            }
        }
        for a in by_id.values() {
            for dep in a.dependencies() {
                if !by_id.contains_key(&dep) {
                    return Err(CoreError::config(format!(
                        "analyzer {} depends on unknown analyzer {}",
                        a.id(),
                        dep
                    )));
                }
            }
        }

        let order = topological_order(&by_id)?;
        Ok(Self {
            analyzers: by_id,
            order,
        })
    }

    /// Analyzers in their fixed run order: dependency-then-priority, with a
    /// lexicographic id tie-break (spec §4.3, §5b).
    pub fn ordered(&self) -> impl Iterator<Item = &Arc<dyn Analyzer>> {
        self.order.iter().map(move |id| &self.analyzers[id])
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }
}

fn topological_order(by_id: &IndexMap<String, Arc<dyn Analyzer>>) -> Result<Vec<String>> {
    let mut in_degree: IndexMap<&str, usize> = by_id.keys().map(|id| (id.as_str(), 0)).collect();
    for a in by_id.values() {
        *in_degree.get_mut(a.id()).unwrap() += a.dependencies().len();
    }

    let mut done: HashSet<&str> = HashSet::new();
    let mut order = Vec::with_capacity(by_id.len());

    while done.len() < by_id.len() {
        let mut ready: Vec<&str> = in_degree
            .iter()
            .filter(|(id, &deg)| deg == 0 && !done.contains(*id))
            .map(|(id, _)| *id)
            .collect();

        if ready.is_empty() {
            return Err(CoreError::config("cyclic analyzer dependency graph"));
        }

        // Descending priority, then ascending id (spec §4.3 "ties are
        // broken by descending priority, then by id lexicographically").
        ready.sort_by(|a, b| {
            let pa = by_id[*a].priority();
            let pb = by_id[*b].priority();
            pb.cmp(&pa).then_with(|| a.cmp(b))
        });

        let next = ready[0];
        done.insert(next);
        order.push(next.to_string());
        in_degree.shift_remove(next);

        for a in by_id.values() {
            if a.dependencies().iter().any(|d| d == next) {
                *in_degree.get_mut(a.id()).unwrap() -= 1;
            }
        }
    }

    Ok(order)
}
