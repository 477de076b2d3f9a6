use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::language::Language;

/// Stable, uuid-like identifier for a chunk. Unique within one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkId(pub Uuid);

impl ChunkId {
    /// Fresh random id, for analyzers that mint new chunks.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id derived from a chunk's identifying fields, for
    /// reproducible fixtures and reference analyzers. Not random, but stable
    /// across runs given the same inputs.
    pub fn derive(relative_path: &str, start_line: u32, end_line: u32) -> Self {
        let input = format!("{relative_path}|{start_line}|{end_line}");
        let digest = xxhash_rust::xxh3::xxh3_128(input.as_bytes());
        Self(Uuid::new_v5(&Uuid::NAMESPACE_DNS, &digest.to_le_bytes()))
    }
}

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The smallest indexed unit: a contiguous region of a source file plus the
/// metadata the retriever ranks and filters on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    /// Absolute path at analysis time (not persisted across machines).
    pub absolute_path: PathBuf,
    /// Root-relative, forward-slash normalized path.
    pub relative_path: String,
    /// 1-based, inclusive.
    pub start_line: u32,
    /// 1-based, inclusive.
    pub end_line: u32,
    pub language: Language,
    pub framework: Option<String>,
    pub component_type: Option<String>,
    pub layer: Option<String>,
    pub dependencies: Vec<String>,
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    pub tags: BTreeSet<String>,
    pub content: String,
    /// Ordered identifier sequence, e.g. `["AuthService", "login"]`.
    pub symbol_path: Option<Vec<String>>,
    pub component_name: Option<String>,
    pub complexity: Option<f32>,
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// `symbol_path`'s last segment, used for snippet scope headers and
    /// exact-name matching (§4.B, §4.H definition-first boost).
    pub fn symbol_name(&self) -> Option<String> {
        self.symbol_path
            .as_ref()
            .and_then(|segs| segs.last().cloned())
    }

    pub fn is_valid(&self) -> bool {
        self.start_line <= self.end_line
    }
}
