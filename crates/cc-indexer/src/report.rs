use std::time::Duration;

/// Options accepted by `index` (§4.E).
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    /// When `true`, run only the incremental protocol; the caller is
    /// responsible for ensuring a prior build exists (a missing prior build
    /// falls back to a full build regardless of this flag).
    pub incremental_only: bool,
}

/// Reason a scanned file produced no chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    TooLarge,
    Binary,
    UnsupportedLanguage,
    AnalyzerError,
}

/// Per-run diff counters, present only when `index` ran the incremental
/// protocol (§4.E `Stats`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncrementalCounters {
    pub added: usize,
    pub changed: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

/// Result of one `index` call (§4.E `Stats`). When a no-op incremental run
/// short-circuits (no file changed), the caller must preserve the prior
/// run's counters rather than resetting them to zero.
#[derive(Debug, Clone)]
pub struct Stats {
    pub indexed_files: usize,
    pub total_chunks: usize,
    pub total_files: usize,
    pub duration: Duration,
    pub incremental: Option<IncrementalCounters>,
}
