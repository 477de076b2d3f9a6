pub mod analyzer;
pub mod embedding;
pub mod error;
pub mod lock;
pub mod report;
pub mod scanner;
pub mod staging;

pub use analyzer::{Analyzer, WholeFileAnalyzer};
pub use embedding::{EmbeddingProvider, HashEmbeddingProvider};
pub use error::IndexerError;
pub use lock::BuildLock;
pub use report::{IncrementalCounters, IndexOptions, SkipReason, Stats};
pub use scanner::scan_files;
pub use staging::index;
