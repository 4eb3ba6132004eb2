use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Import/export category (spec §3, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyCategory {
    LocalFile,
    InternalModule,
    ExternalPackage,
    StandardLibrary,
    LanguageCore,
}

impl DependencyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyCategory::LocalFile => "local_file",
            DependencyCategory::InternalModule => "internal_module",
            DependencyCategory::ExternalPackage => "external_package",
            DependencyCategory::StandardLibrary => "standard_library",
            DependencyCategory::LanguageCore => "language_core",
        }
    }
}

/// A single `import` occurrence, one per statement found in a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportStatement {
    pub id: String,
    pub source_file: PathBuf,
    pub line: u32,
    pub module_specifier: String,
    pub imported_symbols: Vec<String>,
    pub resolved_path: Option<PathBuf>,
    pub category: DependencyCategory,
    pub confidence: f32,
}

/// A single `export` occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportStatement {
    pub id: String,
    pub source_file: PathBuf,
    pub line: u32,
    pub named_exports: Vec<String>,
    pub default_export: Option<String>,
    pub confidence: f32,
}

/// Aggregate record for one module specifier, upserted as imports are
/// discovered (spec §4.5 "Dependency record update").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub specifier: String,
    pub category: DependencyCategory,
    pub import_count: u32,
    pub imported_symbols: IndexMap<String, u32>,
    pub importing_files: Vec<PathBuf>,
    pub version: Option<String>,
    pub confidence: f32,
}

impl Dependency {
    pub fn new(specifier: impl Into<String>, category: DependencyCategory) -> Self {
        Self {
            specifier: specifier.into(),
            category,
            import_count: 0,
            imported_symbols: IndexMap::new(),
            importing_files: Vec::new(),
            version: None,
            confidence: 0.0,
        }
    }

    /// Folds in one more observed import statement: bumps the count, adds
    /// the file (if new), counts the imported symbols, and updates
    /// confidence as a running mean of statement confidences — the
    /// `combine`-adjacent moving-average named in SPEC_FULL §11.
    pub fn record_import(&mut self, file: &std::path::Path, symbols: &[String], confidence: f32) {
        self.import_count += 1;
        if !self.importing_files.iter().any(|f| f == file) {
            self.importing_files.push(file.to_path_buf());
        }
        for sym in symbols {
            *self.imported_symbols.entry(sym.clone()).or_insert(0) += 1;
        }
        let n = self.import_count as f32;
        self.confidence += (confidence - self.confidence) / n;
    }
}

/// Map from module specifier to its [`Dependency`] record, plus the flat
/// statement lists (spec §3). `IndexMap` preserves discovery order so the
/// persisted document's iteration order is deterministic across runs
/// (spec invariant 5, §6 "Maps serialize as ordered sequences").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub dependencies: IndexMap<String, Dependency>,
    pub imports: Vec<ImportStatement>,
    pub exports: Vec<ExportStatement>,
}

impl DependencyGraph {
    pub fn upsert(&mut self, specifier: &str, category: DependencyCategory) -> &mut Dependency {
        self.dependencies
            .entry(specifier.to_string())
            .or_insert_with(|| Dependency::new(specifier, category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_import_moving_average_confidence() {
        let mut d = Dependency::new("lodash", DependencyCategory::ExternalPackage);
        d.record_import(&PathBuf::from("a.rs"), &["map".into()], 0.9);
        d.record_import(&PathBuf::from("b.rs"), &["map".into()], 0.7);
        assert_eq!(d.import_count, 2);
        assert_eq!(d.importing_files.len(), 2);
        assert_eq!(d.imported_symbols["map"], 2);
        assert!((d.confidence - 0.8).abs() < 1e-5);
    }

    #[test]
    fn record_import_dedupes_importing_file() {
        let mut d = Dependency::new("./helper", DependencyCategory::LocalFile);
        d.record_import(&PathBuf::from("a.rs"), &[], 0.8);
        d.record_import(&PathBuf::from("a.rs"), &[], 0.8);
        assert_eq!(d.importing_files.len(), 1);
        assert_eq!(d.import_count, 2);
    }
}
