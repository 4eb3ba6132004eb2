//! Concrete analyzers for the codegraph engine (spec §2, §4.4-§4.6):
//! the file-tree builder, relationship analyzer, pattern analyzer,
//! dependency analyzer, and data-flow analyzer, plus the disk `FileSystem`
//! and language-detection collaborators the pipeline needs to run against
//! a real checkout.

pub mod data_flow;
pub mod dependency;
pub mod fs;
pub mod language;
pub mod pattern;
pub mod relationship;
pub mod structure;
pub mod tree_builder;

#[cfg(test)]
mod test_support;

pub use data_flow::DataFlowAnalyzer;
pub use dependency::DependencyAnalyzer;
pub use fs::DiskFileSystem;
pub use pattern::PatternAnalyzer;
pub use relationship::RelationshipAnalyzer;
pub use structure::StructureExtractor;
pub use tree_builder::FileTreeBuilder;
