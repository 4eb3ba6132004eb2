use serde::{Deserialize, Serialize};

/// The fixed order of orchestrator phases (spec §4.3). Each phase runs to
/// completion before the next begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Initialization,
    FileAnalysis,
    RelationshipMapping,
    PatternDiscovery,
    SemanticAnalysis,
    Integration,
    Finalization,
}

impl Phase {
    pub const ORDER: [Phase; 7] = [
        Phase::Initialization,
        Phase::FileAnalysis,
        Phase::RelationshipMapping,
        Phase::PatternDiscovery,
        Phase::SemanticAnalysis,
        Phase::Integration,
        Phase::Finalization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Initialization => "initialization",
            Phase::FileAnalysis => "file_analysis",
            Phase::RelationshipMapping => "relationship_mapping",
            Phase::PatternDiscovery => "pattern_discovery",
            Phase::SemanticAnalysis => "semantic_analysis",
            Phase::Integration => "integration",
            Phase::Finalization => "finalization",
        }
    }

    pub fn next(&self) -> Option<Phase> {
        let idx = Phase::ORDER.iter().position(|p| p == self)?;
        Phase::ORDER.get(idx + 1).copied()
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_fixed_order() {
        let mut p = Phase::Initialization;
        let mut seen = vec![p];
        while let Some(next) = p.next() {
            seen.push(next);
            p = next;
        }
        assert_eq!(seen, Phase::ORDER.to_vec());
        assert_eq!(p, Phase::Finalization);
        assert!(p.next().is_none());
    }
}
