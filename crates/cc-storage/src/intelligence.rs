use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use cc_core::Trend;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// A single detected pattern occurrence, used both for `primary` and for
/// entries in `also_detected` (§3 Intelligence Sidecar).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternEntry {
    pub name: String,
    pub frequency: u32,
    pub trend: Trend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_example_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternCategory {
    pub primary: PatternEntry,
    #[serde(default)]
    pub also_detected: Vec<PatternEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenFile {
    pub path: String,
    pub score: f64,
}

/// The on-disk intelligence sidecar (§3, §4.D). Unknown fields are ignored
/// on read via serde's default behavior; this type defines the closed
/// schema written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntelligenceSidecar {
    #[serde(default)]
    pub patterns: BTreeMap<String, PatternCategory>,
    #[serde(default)]
    pub import_graph: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub golden_files: Vec<GoldenFile>,
}

/// Ranking signals precomputed once per searcher lifetime from the sidecar
/// (§4.D). Empty/disabled when the sidecar is absent or malformed — that is
/// not corruption, it just turns off trend/centrality boosts.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedSignals {
    pub declining: HashSet<String>,
    pub rising: HashSet<String>,
    pub pattern_warnings: HashMap<String, String>,
    pub centrality: HashMap<String, f64>,
}

impl PrecomputedSignals {
    pub fn is_disabled(&self) -> bool {
        self.declining.is_empty()
            && self.rising.is_empty()
            && self.pattern_warnings.is_empty()
            && self.centrality.is_empty()
    }
}

/// Load the sidecar at `path`. Absence or malformed JSON is not an error:
/// the caller gets an empty sidecar and disabled signals, per §4.D.
pub fn load_or_default(path: &Path) -> (Option<IntelligenceSidecar>, PrecomputedSignals) {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return (None, PrecomputedSignals::default()),
    };
    match serde_json::from_slice::<IntelligenceSidecar>(&bytes) {
        Ok(sidecar) => {
            let signals = precompute(&sidecar);
            (Some(sidecar), signals)
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "intelligence sidecar malformed, disabling trend/centrality signals");
            (None, PrecomputedSignals::default())
        }
    }
}

/// Write the sidecar atomically (temp file + rename), mirroring the
/// manifest's publish discipline (§4.A).
pub fn write_atomic(path: &Path, sidecar: &IntelligenceSidecar) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(sidecar)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Derive the declining/rising sets, pattern-warnings map, and centrality
/// map from a loaded sidecar (§4.D).
pub fn precompute(sidecar: &IntelligenceSidecar) -> PrecomputedSignals {
    let mut declining = HashSet::new();
    let mut rising = HashSet::new();
    let mut pattern_warnings = HashMap::new();

    for category in sidecar.patterns.values() {
        let entries = std::iter::once(&category.primary).chain(category.also_detected.iter());
        for entry in entries {
            let lowered = entry.name.to_lowercase();
            match entry.trend {
                Trend::Declining => {
                    declining.insert(lowered.clone());
                    if let Some(guidance) = &entry.guidance {
                        pattern_warnings.insert(lowered, guidance.clone());
                    }
                }
                Trend::Rising => {
                    rising.insert(lowered);
                }
                Trend::Stable => {}
            }
        }
    }

    let centrality = compute_centrality(&sidecar.import_graph);

    PrecomputedSignals {
        declining,
        rising,
        pattern_warnings,
        centrality,
    }
}

/// `in_degree / max_in_degree` over the internal import graph (§4.D). A
/// graph with no edges yields an empty map (no centrality signal at all,
/// rather than division by zero).
fn compute_centrality(import_graph: &BTreeMap<String, Vec<String>>) -> HashMap<String, f64> {
    let mut in_degree: HashMap<String, u32> = HashMap::new();
    for targets in import_graph.values() {
        for target in targets {
            *in_degree.entry(target.clone()).or_insert(0) += 1;
        }
    }
    let max_in_degree = in_degree.values().copied().max().unwrap_or(0);
    if max_in_degree == 0 {
        return HashMap::new();
    }
    in_degree
        .into_iter()
        .map(|(path, degree)| (path, degree as f64 / max_in_degree as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, trend: Trend, guidance: Option<&str>) -> PatternEntry {
        PatternEntry {
            name: name.to_string(),
            frequency: 1,
            trend,
            canonical_example_path: None,
            guidance: guidance.map(|s| s.to_string()),
        }
    }

    #[test]
    fn precompute_splits_declining_and_rising_lowercased() {
        let mut patterns = BTreeMap::new();
        patterns.insert(
            "state-management".to_string(),
            PatternCategory {
                primary: entry("Redux", Trend::Declining, Some("prefer signals")),
                also_detected: vec![entry("MobX", Trend::Rising, None)],
            },
        );
        let sidecar = IntelligenceSidecar {
            patterns,
            import_graph: BTreeMap::new(),
            golden_files: Vec::new(),
        };
        let signals = precompute(&sidecar);
        assert!(signals.declining.contains("redux"));
        assert!(signals.rising.contains("mobx"));
        assert_eq!(
            signals.pattern_warnings.get("redux"),
            Some(&"prefer signals".to_string())
        );
    }

    #[test]
    fn declining_without_guidance_has_no_warning() {
        let mut patterns = BTreeMap::new();
        patterns.insert(
            "routing".to_string(),
            PatternCategory {
                primary: entry("HashRouter", Trend::Declining, None),
                also_detected: Vec::new(),
            },
        );
        let sidecar = IntelligenceSidecar {
            patterns,
            import_graph: BTreeMap::new(),
            golden_files: Vec::new(),
        };
        let signals = precompute(&sidecar);
        assert!(signals.declining.contains("hashrouter"));
        assert!(signals.pattern_warnings.is_empty());
    }

    #[test]
    fn centrality_normalizes_by_max_in_degree() {
        let mut graph = BTreeMap::new();
        graph.insert("src/a.ts".to_string(), vec!["src/util.ts".to_string()]);
        graph.insert("src/b.ts".to_string(), vec!["src/util.ts".to_string()]);
        graph.insert("src/c.ts".to_string(), vec!["src/other.ts".to_string()]);

        let centrality = compute_centrality(&graph);
        assert_eq!(centrality.get("src/util.ts"), Some(&1.0));
        assert_eq!(centrality.get("src/other.ts"), Some(&0.5));
        assert_eq!(centrality.get("src/a.ts"), None);
    }

    #[test]
    fn empty_import_graph_yields_empty_centrality() {
        let centrality = compute_centrality(&BTreeMap::new());
        assert!(centrality.is_empty());
    }

    #[test]
    fn missing_file_yields_disabled_signals_not_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let (sidecar, signals) = load_or_default(&tmp.path().join("missing.json"));
        assert!(sidecar.is_none());
        assert!(signals.is_disabled());
    }

    #[test]
    fn malformed_file_yields_disabled_signals_not_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("intelligence.json");
        std::fs::write(&path, b"not json").unwrap();
        let (sidecar, signals) = load_or_default(&path);
        assert!(sidecar.is_none());
        assert!(signals.is_disabled());
    }

    #[test]
    fn round_trip_write_and_load() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("intelligence.json");
        let mut patterns = BTreeMap::new();
        patterns.insert(
            "auth".to_string(),
            PatternCategory {
                primary: entry("JWT", Trend::Rising, None),
                also_detected: Vec::new(),
            },
        );
        let sidecar = IntelligenceSidecar {
            patterns,
            import_graph: BTreeMap::new(),
            golden_files: vec![GoldenFile {
                path: "src/auth.ts".to_string(),
                score: 0.9,
            }],
        };
        write_atomic(&path, &sidecar).unwrap();

        let (loaded, signals) = load_or_default(&path);
        assert!(loaded.is_some());
        assert!(signals.rising.contains("jwt"));
    }
}
