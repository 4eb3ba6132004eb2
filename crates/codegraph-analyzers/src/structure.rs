//! Generic code-structure extractor — the default collaborator filling the
//! "parser" seam the core deliberately leaves open (spec §1, §6 "Parser
//! collaborators"). It is not a real per-language parser: it recognizes a
//! handful of common function/class declaration shapes across ecosystems
//! by regex, good enough to exercise the rest of the pipeline and to
//! satisfy the boundary behavior in spec invariant 10 ("a file whose
//! content matches no parser produces a single module-kind code node and
//! no children"). A real deployment would register one precise parser per
//! language instead of this analyzer.

use codegraph_core::model::code_node::{meta_keys, Location};
use codegraph_core::model::{CodeNode, NodeKind};
use codegraph_core::{Result, SharedContext};
use codegraph_pipeline::{Analyzer, FileTask};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

struct Declaration {
    kind: NodeKind,
    name: String,
    has_params: bool,
    line: usize,
    body_start: usize,
}

static FUNCTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?m)^\s*(?:pub\s+)?(?:async\s+)?fn\s+(\w+)\s*\(([^)]*)\)").unwrap(),
        Regex::new(r"(?m)^\s*(?:export\s+)?(?:async\s+)?function\s+(\w+)\s*\(([^)]*)\)").unwrap(),
        Regex::new(r"(?m)^\s*(?:async\s+)?def\s+(\w+)\s*\(([^)]*)\)\s*:").unwrap(),
        Regex::new(r"(?m)^\s*func\s+(\w+)\s*\(([^)]*)\)").unwrap(),
        Regex::new(r"(?m)^\s*(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s*)?\(([^)]*)\)\s*=>").unwrap(),
    ]
});

static CLASS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?m)^\s*(?:pub\s+)?(?:struct|enum|trait)\s+(\w+)").unwrap(),
        Regex::new(r"(?m)^\s*(?:export\s+)?class\s+(\w+)").unwrap(),
        Regex::new(r"(?m)^\s*interface\s+(\w+)").unwrap(),
    ]
});

pub struct StructureExtractor;

impl StructureExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StructureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for StructureExtractor {
    fn id(&self) -> &str {
        "structure-extractor"
    }

    fn name(&self) -> &str {
        "Structure Extractor"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn analyze_file(&self, _ctx: &SharedContext, file: &FileTask) -> Result<Vec<CodeNode>> {
        let text = file.content_str();
        let module_id = format!("node:{}", file.path.display());
        let module_name = file
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file.path.display().to_string());

        let mut declarations = find_declarations(&text);
        declarations.sort_by_key(|d| d.body_start);

        let mut children = Vec::new();
        let mut nodes = Vec::new();

        for (i, decl) in declarations.iter().enumerate() {
            let body_end = declarations.get(i + 1).map(|d| d.body_start).unwrap_or(text.len());
            let body = &text[decl.body_start..body_end];
            let has_return = body.contains("return");

            let id = format!("{}::{}", module_id, decl.name);
            let mut metadata = IndexMap::new();
            metadata.insert(meta_keys::IS_PARAMETER.to_string(), serde_json::json!(decl.has_params));
            metadata.insert(meta_keys::IS_RETURN.to_string(), serde_json::json!(has_return));

            children.push(id.clone());
            nodes.push(CodeNode {
                id,
                kind: decl.kind.clone(),
                name: decl.name.clone(),
                qualified_name: format!("{module_name}::{}", decl.name),
                file_path: file.path.clone(),
                language: file.language.clone(),
                content_hash: codegraph_core::hash::hash_content(body.as_bytes()),
                location: Location::point(decl.line as u32, 0),
                content: None,
                children: Vec::new(),
                parent: Some(module_id.clone()),
                confidence: 0.65,
                metadata,
            });
        }

        let module_node = CodeNode {
            id: module_id,
            kind: NodeKind::Module,
            name: module_name.clone(),
            qualified_name: module_name,
            file_path: file.path.clone(),
            language: file.language.clone(),
            content_hash: codegraph_core::hash::hash_content(&file.content),
            location: Location::point(1, 0),
            content: None,
            children,
            parent: None,
            confidence: 0.70,
            metadata: IndexMap::new(),
        };

        let mut result = vec![module_node];
        result.append(&mut nodes);
        Ok(result)
    }
}

fn find_declarations(text: &str) -> Vec<Declaration> {
    let mut out = Vec::new();
    for re in FUNCTION_PATTERNS.iter() {
        for caps in re.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            let name = caps.get(1).unwrap().as_str().to_string();
            let params = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
            let line = 1 + text[..whole.start()].matches('\n').count();
            out.push(Declaration {
                kind: NodeKind::Function,
                name,
                has_params: !params.is_empty(),
                line,
                body_start: whole.end(),
            });
        }
    }
    for re in CLASS_PATTERNS.iter() {
        for caps in re.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            let name = caps.get(1).unwrap().as_str().to_string();
            let line = 1 + text[..whole.start()].matches('\n').count();
            out.push(Declaration {
                kind: NodeKind::Class,
                name,
                has_params: false,
                line,
                body_start: whole.end(),
            });
        }
    }
    out
}
