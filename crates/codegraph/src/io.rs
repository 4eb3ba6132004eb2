//! `save(model, path)` / `load(path) → Model` (spec §6). The persisted
//! document is plain `serde_json`; `IndexMap`'s `serde` feature already
//! gives the ordered-pairs-preserving-iteration-order behavior the spec
//! requires for map fields, so no custom (de)serializer is needed.

use codegraph_core::model::Model;
use codegraph_core::{CoreError, Result};
use std::path::Path;

pub fn save(model: &Model, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(model).map_err(CoreError::config)?;
    std::fs::write(path, json).map_err(|e| CoreError::io(path.display().to_string(), e))
}

pub fn load(path: &Path) -> Result<Model> {
    let bytes = std::fs::read(path).map_err(|e| CoreError::io(path.display().to_string(), e))?;
    serde_json::from_slice(&bytes).map_err(CoreError::config)
}
