//! File-analysis batching (spec §4.3 "Batching": "sized by available
//! memory (a simple heuristic over free heap; the contract is only that
//! batch size is ≥ 1)"). Grounded on the teacher's `StageConfig::default`
//! (`codegraph-orchestration/src/pipeline.rs`), which sizes its worker pool
//! off `num_cpus::get()`; this heuristic instead sizes the *batch*, using
//! available parallelism as the proxy for how much file content can be
//! held resident at once without requesting an eviction pass.

use std::path::PathBuf;

const MIN_BATCH: usize = 8;
const MAX_BATCH: usize = 256;

/// Chooses a batch size and splits `files` into ordered batches. Order is
/// preserved across batches so each analyzer still sees files in walk
/// order overall (spec §5c).
pub fn plan_batches(files: Vec<PathBuf>) -> Vec<Vec<PathBuf>> {
    let parallelism = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let batch_size = (parallelism * 16).clamp(MIN_BATCH, MAX_BATCH);

    files
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}
