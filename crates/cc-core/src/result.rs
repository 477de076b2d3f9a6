use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Trend classification of a pattern, derived from the intelligence sidecar
/// (§3 Intelligence Sidecar, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Rising,
    Stable,
    Declining,
}

/// One returned region from `search` (§3 Search Result, §6 query interface).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub score: f64,
    pub summary: String,
    pub snippet: Option<String>,
    pub language: Language,
    pub framework: Option<String>,
    pub component_type: Option<String>,
    pub layer: Option<String>,
    pub trend: Option<Trend>,
    pub pattern_warning: Option<String>,
    pub callers: Option<Vec<String>>,
    pub consumers: Option<Vec<String>>,
    pub tests: Option<Vec<String>>,
    pub relationships_count: Option<usize>,
}

/// `searchQuality` block returned alongside every response, successful or
/// not, so callers can gate downstream decisions (§7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuality {
    pub status: QualityStatus,
    pub confidence: f64,
    pub next_steps: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityStatus {
    Ok,
    LowConfidence,
}
