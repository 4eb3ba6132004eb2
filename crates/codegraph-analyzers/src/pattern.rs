//! Pattern analyzer (spec §2 "Pattern analyzer", §4.6.1 pattern-registry
//! signal). Seeds the shared registry with curated regexes for the four
//! data-flow role tags before file analysis begins, so the data-flow
//! analyzer's `findMatchingPatterns` calls have something to match against
//! from the first file. `discoverPatterns` then records, per type tag, how
//! many code nodes matched — a cheap observability signal, not consumed by
//! other analyzers.

use codegraph_core::model::Pattern;
use codegraph_core::{Result, SharedContext};
use codegraph_pipeline::Analyzer;

const DATA_SOURCE_SEEDS: &[(&str, &str)] = &[
    ("fetch-call", r"fetch\s*\("),
    ("axios-get", r"axios\.get\s*\("),
    ("http-get", r"(?:http|client)\.get\s*\("),
    ("read-file", r"read_?[Ff]ile(?:Sync)?\s*\("),
    ("query-call", r"\.query\s*\("),
    ("env-read", r"(?:process\.env|std::env::var)\s*[.(]"),
];

const DATA_SINK_SEEDS: &[(&str, &str)] = &[
    ("write-file", r"write_?[Ff]ile(?:Sync)?\s*\("),
    ("axios-post", r"axios\.post\s*\("),
    ("console-log", r"console\.(?:log|error|warn)\s*\("),
    ("db-save", r"\.(?:save|insert|persist)\s*\("),
    ("emit-call", r"\.?emit\s*\("),
];

const DATA_TRANSFORMER_SEEDS: &[(&str, &str)] = &[
    ("map-call", r"\.map\s*\("),
    ("filter-call", r"\.filter\s*\("),
    ("reduce-call", r"\.reduce\s*\("),
    ("parse-call", r"(?:JSON\.)?parse\s*\("),
    ("format-call", r"format!?\s*\("),
];

const DATA_STORE_SEEDS: &[(&str, &str)] = &[
    ("repository-name", r"(?i)repository"),
    ("cache-name", r"(?i)\bcache\b"),
    ("local-storage", r"localStorage\."),
    ("hashmap-decl", r"HashMap|IndexMap|BTreeMap"),
];

pub struct PatternAnalyzer;

impl PatternAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PatternAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn seed(ctx: &SharedContext, type_tag: &str, seeds: &[(&str, &str)]) {
    for (name, source) in seeds {
        ctx.register_pattern(Pattern::new(
            format!("seed:{type_tag}:{name}"),
            type_tag,
            *name,
            Some((*source).to_string()),
            0.70,
        ));
    }
}

impl Analyzer for PatternAnalyzer {
    fn id(&self) -> &str {
        "pattern-analyzer"
    }

    fn name(&self) -> &str {
        "Pattern Analyzer"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn initialize(&self, ctx: &SharedContext) -> Result<()> {
        seed(ctx, "data_source", DATA_SOURCE_SEEDS);
        seed(ctx, "data_sink", DATA_SINK_SEEDS);
        seed(ctx, "data_transformer", DATA_TRANSFORMER_SEEDS);
        seed(ctx, "data_store", DATA_STORE_SEEDS);
        Ok(())
    }

    fn discover_patterns(&self, ctx: &SharedContext) -> Result<()> {
        for type_tag in ["data_source", "data_sink", "data_transformer", "data_store"] {
            let mut hits = 0u32;
            for node in ctx.code_nodes_snapshot().values() {
                let Ok(content) = ctx.get_file_content(&node.file_path) else {
                    continue;
                };
                let text = String::from_utf8_lossy(&content);
                if !ctx.find_matching_patterns(&text, type_tag).is_empty() {
                    hits += 1;
                }
            }
            ctx.record_metric(&format!("pattern.{type_tag}.matches"), hits as f64);
        }
        Ok(())
    }
}
