use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub type PatternId = String;

/// A named regex-or-heuristic record retrievable by type tag (spec §3,
/// GLOSSARY). The compiled [`Regex`] is not stored here — `Regex` isn't
/// `Serialize`, and the persisted model must round-trip byte-for-byte
/// (spec invariant 5) — instead the source is kept as a string and the
/// registry (`crate::context::PatternRegistry`) owns the compiled form,
/// discarding patterns whose source fails to compile (`PatternError`,
/// recovered silently per spec §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: PatternId,
    pub type_tag: String,
    pub name: String,
    pub description: String,
    pub source: Option<String>,
    pub confidence: f32,
    pub metadata: IndexMap<String, serde_json::Value>,
}

impl Pattern {
    pub fn new(
        id: impl Into<String>,
        type_tag: impl Into<String>,
        name: impl Into<String>,
        source: Option<String>,
        confidence: f32,
    ) -> Self {
        Self {
            id: id.into(),
            type_tag: type_tag.into(),
            name: name.into(),
            description: String::new(),
            source,
            confidence,
            metadata: IndexMap::new(),
        }
    }

    /// Attempts to compile this pattern's source. `None` if there is no
    /// source (a pure name-based pattern) or `Err` if the regex is
    /// malformed — callers drop the pattern silently on `Err`.
    pub fn try_compile(&self) -> Option<Result<Regex, regex::Error>> {
        self.source.as_deref().map(Regex::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_regex_source_fails_to_compile() {
        let p = Pattern::new("p1", "data_source", "bad", Some("(unclosed".to_string()), 0.7);
        assert!(p.try_compile().unwrap().is_err());
    }

    #[test]
    fn well_formed_regex_compiles() {
        let p = Pattern::new(
            "p2",
            "data_source",
            "fetch-call",
            Some(r"fetch\(".to_string()),
            0.7,
        );
        assert!(p.try_compile().unwrap().is_ok());
    }
}
