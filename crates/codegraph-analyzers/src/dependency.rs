//! Dependency analyzer (spec §2, §4.5): pattern discovery over a
//! stratified sample, application to the whole tree, then local
//! resolution and category inference. The largest analyzer here after
//! data flow, grounded on the same pattern-registry idiom the data-flow
//! and pattern analyzers use (`ctx.find_matching_patterns`), rather than
//! any single ecosystem's grammar.

use codegraph_core::model::dependency::{DependencyCategory, ExportStatement, ImportStatement};
use codegraph_core::model::file_tree::FileTreeEntry;
use codegraph_core::model::Pattern;
use codegraph_core::{Result, SharedContext};
use codegraph_pipeline::Analyzer;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

const MAX_SAMPLE_FILES: usize = 50;
const MAX_SAMPLE_FILE_SIZE: u64 = 1024 * 1024;
const MIN_PER_EXTENSION: usize = 3;
const STRATIFICATION_FRACTION: f64 = 0.10;
const GENERALIZATION_THRESHOLD: usize = 5;

const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "py", "rs", "go", "rb", "java"];

const STANDARD_LIBRARY_NAMES: &[&str] = &[
    // node
    "fs", "path", "os", "http", "https", "crypto", "util", "events", "stream", "buffer",
    "child_process", "net", "url", "querystring", "assert", "zlib",
    // python
    "sys", "re", "json", "math", "collections", "itertools", "functools", "typing", "pathlib",
    "subprocess", "threading", "asyncio", "logging", "unittest", "dataclasses",
    // go
    "fmt", "strings", "strconv", "time", "context", "errors", "sync", "io",
];

const IMPORT_SEEDS: &[(&str, &str)] = &[
    ("es6-import-from", r#"import\s+[^;'"]*?from\s+['"]([^'"]+)['"]"#),
    ("es6-import-bare", r#"import\s+['"]([^'"]+)['"]"#),
    ("commonjs-require", r#"require\s*\(\s*['"]([^'"]+)['"]\s*\)"#),
    ("python-import", r#"(?m)^\s*import\s+([\w.]+)"#),
    ("python-from-import", r#"(?m)^\s*from\s+([\w.]+)\s+import"#),
    ("rust-use", r#"(?m)^\s*(?:pub\s+)?use\s+([\w:]+)"#),
    ("go-import-line", r#"(?m)^\s*['"]([^'"]+)['"]"#),
    ("java-import", r#"(?m)^\s*import\s+(?:static\s+)?([\w.]+)\s*;"#),
];

const EXPORT_SEEDS: &[(&str, &str)] = &[
    ("es6-export-named", r#"export\s+(?:const|function|class|let|var|interface|type)\s+(\w+)"#),
    ("es6-export-default", r#"export\s+default\s+(?:function\s+|class\s+)?(\w+)?"#),
    ("commonjs-exports", r#"module\.exports\.(\w+)\s*="#),
    ("rust-pub-item", r#"(?m)^\s*pub\s+(?:fn|struct|enum|const|mod|trait)\s+(\w+)"#),
];

pub struct DependencyAnalyzer;

impl DependencyAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DependencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for DependencyAnalyzer {
    fn id(&self) -> &str {
        "dependency-analyzer"
    }

    fn name(&self) -> &str {
        "Dependency Analyzer"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn initialize(&self, ctx: &SharedContext) -> Result<()> {
        seed_once(ctx, "dependency_import", IMPORT_SEEDS);
        seed_once(ctx, "dependency_export", EXPORT_SEEDS);
        Ok(())
    }

    fn discover_patterns(&self, ctx: &SharedContext) -> Result<()> {
        let Some(tree) = ctx.file_tree() else {
            return Ok(());
        };
        let files = tree.walk_files();
        if files.is_empty() {
            return Ok(());
        }

        let sample = stratified_sample(&files);
        generalize_from_sample(ctx, &sample);

        let top_level_dirs = top_level_directory_names(&tree);
        let manifest = discover_manifest(ctx, &tree);

        for file in &files {
            let Ok(content) = ctx.get_file_content(&file.path) else {
                ctx.record_event(
                    "file-failed",
                    serde_json::json!({ "path": file.path.display().to_string(), "analyzer": self.id() }),
                );
                continue;
            };
            let text = String::from_utf8_lossy(&content);

            for import in extract_imports(ctx, &text) {
                apply_import(ctx, &file.path, import, &top_level_dirs, &manifest);
            }
            for export in extract_exports(ctx, &file.path, &text) {
                ctx.with_dependencies_mut(|g| g.exports.push(export));
            }
        }
        Ok(())
    }
}

fn seed_once(ctx: &SharedContext, type_tag: &str, seeds: &[(&str, &str)]) {
    let existing: HashSet<String> = ctx.patterns_snapshot().into_iter().map(|p| p.id).collect();
    for (name, source) in seeds {
        let id = format!("seed:{type_tag}:{name}");
        if existing.contains(&id) {
            continue;
        }
        ctx.register_pattern(Pattern::new(id, type_tag, *name, Some((*source).to_string()), 0.70));
    }
}

struct SampledFile {
    path: PathBuf,
}

fn stratified_sample(files: &[&codegraph_core::model::file_tree::FileNode]) -> Vec<SampledFile> {
    let mut by_ext: HashMap<&str, Vec<&codegraph_core::model::file_tree::FileNode>> = HashMap::new();
    for f in files {
        if f.size > MAX_SAMPLE_FILE_SIZE {
            continue;
        }
        let ext = f.extension.as_deref().unwrap_or("");
        if !SOURCE_EXTENSIONS.contains(&ext) {
            continue;
        }
        by_ext.entry(ext).or_default().push(f);
    }

    let mut sample = Vec::new();
    for group in by_ext.values() {
        let take = (group.len() as f64 * STRATIFICATION_FRACTION).ceil() as usize;
        let take = take.max(MIN_PER_EXTENSION).min(group.len());
        for f in group.iter().take(take) {
            sample.push(SampledFile { path: f.path.clone() });
        }
    }
    sample.sort_by(|a, b| a.path.cmp(&b.path));
    sample.truncate(MAX_SAMPLE_FILES);
    sample
}

/// Finds lines that matched a seed import pattern, reduces each to a
/// "shape" by replacing quoted literals and identifiers with wildcard
/// markers, and promotes shapes recurring often enough in the sample into
/// new, more general patterns (spec §4.5 "generalizes high-frequency
/// matches ... replacing concrete paths and identifiers with capture
/// wildcards").
fn generalize_from_sample(ctx: &SharedContext, sample: &[SampledFile]) {
    let mut shape_counts: HashMap<String, u32> = HashMap::new();

    for file in sample {
        let Ok(content) = ctx.get_file_content(&file.path) else {
            continue;
        };
        let text = String::from_utf8_lossy(&content);
        for line in text.lines() {
            if !ctx.find_matching_patterns(line, "dependency_import").is_empty() {
                let shape = shape_of(line);
                *shape_counts.entry(shape).or_insert(0) += 1;
            }
        }
    }

    let existing_sources: HashSet<String> = ctx
        .patterns_snapshot()
        .into_iter()
        .filter(|p| p.type_tag == "dependency_import")
        .filter_map(|p| p.source)
        .collect();

    for (shape, count) in shape_counts {
        if (count as usize) < GENERALIZATION_THRESHOLD {
            continue;
        }
        let source = shape_to_regex(&shape);
        if existing_sources.contains(&source) {
            continue;
        }
        let id = format!("gen:dependency_import:{:x}", simple_hash(&source));
        ctx.register_pattern(Pattern::new(id, "dependency_import", "generalized-import", Some(source), 0.65));
    }
}

fn shape_of(line: &str) -> String {
    let quoted = Regex::new(r#"['"][^'"]*['"]"#).unwrap();
    let ident = Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b").unwrap();
    let s = quoted.replace_all(line.trim(), "Q");
    ident.replace_all(&s, "I").to_string()
}

fn shape_to_regex(shape: &str) -> String {
    let escaped = regex::escape(shape);
    escaped.replace("Q", r#"['"]([^'"]+)['"]"#).replace("I", r"\w+")
}

fn simple_hash(s: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut h = std::collections::hash_map::DefaultHasher::new();
    s.hash(&mut h);
    h.finish()
}

struct RawImport {
    line: u32,
    specifier: String,
}

fn extract_imports(ctx: &SharedContext, text: &str) -> Vec<RawImport> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for pattern in ctx.find_matching_patterns(text, "dependency_import") {
        let Some(Ok(re)) = pattern.try_compile() else {
            continue;
        };
        for caps in re.captures_iter(text) {
            let Some(specifier) = caps.get(1).map(|m| m.as_str().to_string()) else {
                continue;
            };
            if specifier.trim().is_empty() {
                continue;
            }
            let offset = caps.get(0).unwrap().start();
            let line = 1 + text[..offset].matches('\n').count() as u32;
            if seen.insert((line, specifier.clone())) {
                out.push(RawImport { line, specifier });
            }
        }
    }
    out.sort_by(|a, b| a.line.cmp(&b.line).then(a.specifier.cmp(&b.specifier)));
    out
}

fn extract_exports(ctx: &SharedContext, path: &Path, text: &str) -> Vec<ExportStatement> {
    let mut out = Vec::new();
    for pattern in ctx.find_matching_patterns(text, "dependency_export") {
        let Some(Ok(re)) = pattern.try_compile() else {
            continue;
        };
        for caps in re.captures_iter(text) {
            let name = caps.get(1).map(|m| m.as_str().to_string());
            let offset = caps.get(0).unwrap().start();
            let line = 1 + text[..offset].matches('\n').count() as u32;
            let is_default = pattern.id.contains("default");
            out.push(ExportStatement {
                id: format!("export:{}:{}", path.display(), line),
                source_file: path.to_path_buf(),
                line,
                named_exports: if is_default { Vec::new() } else { name.clone().into_iter().collect() },
                default_export: if is_default { name } else { None },
                confidence: pattern.confidence,
            });
        }
    }
    out
}

fn category_of(specifier: &str, top_level_dirs: &HashSet<String>, manifest: &HashMap<String, String>) -> DependencyCategory {
    if specifier.starts_with('.') || specifier.starts_with("crate::") || specifier.starts_with("self::") || specifier.starts_with("super::") {
        return DependencyCategory::LocalFile;
    }
    if specifier.starts_with("std::") || specifier.starts_with("core::") || specifier.starts_with("alloc::") {
        return DependencyCategory::LanguageCore;
    }
    let first_segment = specifier.split(&['/', '.', ':'][..]).next().unwrap_or(specifier);
    if top_level_dirs.contains(first_segment) {
        return DependencyCategory::InternalModule;
    }
    if manifest.contains_key(first_segment) || manifest.contains_key(specifier) {
        return DependencyCategory::ExternalPackage;
    }
    if !specifier.contains(['/', '.', ':']) && STANDARD_LIBRARY_NAMES.contains(&specifier) {
        return DependencyCategory::StandardLibrary;
    }
    DependencyCategory::ExternalPackage
}

fn apply_import(
    ctx: &SharedContext,
    importing_file: &Path,
    raw: RawImport,
    top_level_dirs: &HashSet<String>,
    manifest: &HashMap<String, String>,
) {
    let category = category_of(&raw.specifier, top_level_dirs, manifest);

    let resolved_path = if category == DependencyCategory::LocalFile {
        resolve_local_import(ctx, importing_file, &raw.specifier)
    } else {
        None
    };

    let confidence = if resolved_path.is_some() { 0.85 } else { 0.70 };
    ctx.upsert_dependency(&raw.specifier, category);
    ctx.with_dependencies_mut(|g| {
        if let Some(version) = manifest.get(raw.specifier.as_str()) {
            if let Some(dep) = g.dependencies.get_mut(&raw.specifier) {
                dep.version = Some(version.clone());
            }
        }
        let dep = g.dependencies.get_mut(&raw.specifier).expect("just upserted");
        dep.record_import(importing_file, &[], confidence);

        g.imports.push(ImportStatement {
            id: format!("import:{}:{}", importing_file.display(), raw.line),
            source_file: importing_file.to_path_buf(),
            line: raw.line,
            module_specifier: raw.specifier.clone(),
            imported_symbols: Vec::new(),
            resolved_path,
            category,
            confidence,
        });
    });
}

/// Lexically collapses `.`/`..` components without touching the
/// filesystem — `dir.join("./helper")` must compare equal to the file
/// tree's own `/r/helper.ts` for resolution to find it.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn resolve_local_import(ctx: &SharedContext, importing_file: &Path, specifier: &str) -> Option<PathBuf> {
    let dir = importing_file.parent().unwrap_or_else(|| Path::new(""));
    let base = normalize(&dir.join(specifier));

    if ctx.get_file_content(&base).is_ok() {
        return Some(base);
    }
    for ext in ["ts", "tsx", "js", "jsx", "py", "rs", "go", "rb"] {
        let candidate = PathBuf::from(format!("{}.{}", base.display(), ext));
        if ctx.get_file_content(&candidate).is_ok() {
            return Some(candidate);
        }
    }
    for index_name in ["index.ts", "index.tsx", "index.js", "mod.rs", "__init__.py"] {
        let candidate = base.join(index_name);
        if ctx.get_file_content(&candidate).is_ok() {
            return Some(candidate);
        }
    }
    None
}

fn top_level_directory_names(tree: &FileTreeEntry) -> HashSet<String> {
    match tree {
        FileTreeEntry::Dir(dir) => dir
            .children
            .iter()
            .filter(|c| matches!(c, FileTreeEntry::Dir(_)))
            .filter_map(|c| c.path().file_name())
            .map(|n| n.to_string_lossy().to_string())
            .collect(),
        FileTreeEntry::File(_) => HashSet::new(),
    }
}

/// Looks for `package.json` or `Cargo.toml` at the tree root and returns a
/// map from dependency name to version string (spec §4.5 "a discovered
/// manifest file").
fn discover_manifest(ctx: &SharedContext, tree: &FileTreeEntry) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let FileTreeEntry::Dir(root) = tree else {
        return out;
    };

    for child in &root.children {
        let FileTreeEntry::File(file) = child else { continue };
        let name = file.path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

        if name == "package.json" {
            if let Ok(content) = ctx.get_file_content(&file.path) {
                if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&content) {
                    for key in ["dependencies", "devDependencies"] {
                        if let Some(obj) = value.get(key).and_then(|v| v.as_object()) {
                            for (name, version) in obj {
                                out.insert(name.clone(), version.as_str().unwrap_or("").to_string());
                            }
                        }
                    }
                }
            }
        } else if name == "Cargo.toml" {
            if let Ok(content) = ctx.get_file_content(&file.path) {
                if let Ok(value) = String::from_utf8_lossy(&content).parse::<toml::Value>() {
                    if let Some(deps) = value.get("dependencies").and_then(|v| v.as_table()) {
                        for (name, spec) in deps {
                            let version = match spec {
                                toml::Value::String(s) => s.clone(),
                                toml::Value::Table(t) => t
                                    .get("version")
                                    .and_then(|v| v.as_str())
                                    .unwrap_or("")
                                    .to_string(),
                                _ => String::new(),
                            };
                            out.insert(name.clone(), version);
                        }
                    }
                }
            }
        }
    }
    out
}
