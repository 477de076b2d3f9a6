use std::path::Path;

use cc_core::{Chunk, ChunkId, Language};

use crate::error::IndexerError;

/// The analyzer boundary (§6): pushes chunks into the indexer. Real
/// analyzers are language-specific syntactic parsers and live outside this
/// crate entirely; what's here is the contract the indexer calls against,
/// plus a minimal reference implementation for tests and fixtures.
///
/// Contract: each chunk conforms to the Chunk invariants in §3;
/// `symbol_path` entries, when supplied, are stable within a file.
pub trait Analyzer: Send + Sync {
    fn analyze(
        &self,
        relative_path: &str,
        absolute_path: &Path,
        content: &str,
    ) -> Result<Vec<Chunk>, IndexerError>;
}

/// Whole-file reference analyzer: produces exactly one chunk spanning the
/// entire file, tagged by extension. Used where no real syntactic analyzer
/// is wired in (tests, fixtures, and as a fallback for unrecognized
/// languages that still deserve to be searchable).
pub struct WholeFileAnalyzer;

impl Analyzer for WholeFileAnalyzer {
    fn analyze(
        &self,
        relative_path: &str,
        absolute_path: &Path,
        content: &str,
    ) -> Result<Vec<Chunk>, IndexerError> {
        if content.is_empty() {
            return Ok(Vec::new());
        }
        let line_count = content.lines().count().max(1) as u32;
        let language = absolute_path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Language::from_extension)
            .unwrap_or_else(|| Language::new("unknown"));

        let chunk = Chunk {
            id: ChunkId::derive(relative_path, 1, line_count),
            absolute_path: absolute_path.to_path_buf(),
            relative_path: relative_path.to_string(),
            start_line: 1,
            end_line: line_count,
            language,
            framework: None,
            component_type: None,
            layer: None,
            dependencies: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            tags: Default::default(),
            content: content.to_string(),
            symbol_path: None,
            component_name: file_stem(relative_path),
            complexity: None,
            embedding: None,
        };
        Ok(vec![chunk])
    }
}

fn file_stem(relative_path: &str) -> Option<String> {
    Path::new(relative_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
