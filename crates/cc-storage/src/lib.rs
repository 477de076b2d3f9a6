pub mod chunkstore;
pub mod error;
pub mod filemanifest;
pub mod fuzzy;
pub mod intelligence;
pub mod manifest;
pub mod vector;

pub use chunkstore::ChunkStoreFile;
pub use error::StorageError;
pub use filemanifest::{FileDiff, FileManifest, FileRecord};
pub use fuzzy::{FuzzyIndex, FuzzyMatch, DISTANCE_THRESHOLD};
pub use intelligence::{
    GoldenFile, IntelligenceSidecar, PatternCategory, PatternEntry, PrecomputedSignals,
};
pub use manifest::{MANIFEST_FILE, VECTOR_BUILD_MARKER_FILE};
pub use vector::{VectorEntry, VectorEntryMeta, VectorFilters, VectorHit, VectorStore};
