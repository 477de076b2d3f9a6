use cc_core::Chunk;

/// Per-candidate distance threshold on normalized similarity in `[0,1]`
/// (§4.B). A field comparison with `distance > DISTANCE_THRESHOLD` does not
/// contribute to a candidate's match.
pub const DISTANCE_THRESHOLD: f64 = 0.4;

const WEIGHT_CONTENT: f64 = 0.40;
const WEIGHT_COMPONENT_NAME: f64 = 0.25;
const WEIGHT_TAGS: f64 = 0.15;
const WEIGHT_FILE_PATH: f64 = 0.15;
const WEIGHT_RELATIVE_PATH: f64 = 0.15;
const WEIGHT_COMPONENT_TYPE: f64 = 0.15;
const WEIGHT_LAYER: f64 = 0.10;

/// A chunk's match against a fuzzy query: its index into the backing slice
/// of chunks, and the aggregated similarity in `[0,1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatch {
    pub chunk_index: usize,
    pub similarity: f64,
}

/// In-memory fuzzy index over a loaded chunk list (§4.B). Built once per
/// searcher lifetime (§5) and invalidated on manifest change.
pub struct FuzzyIndex<'a> {
    chunks: &'a [Chunk],
}

impl<'a> FuzzyIndex<'a> {
    pub fn build(chunks: &'a [Chunk]) -> Self {
        Self { chunks }
    }

    /// Weighted-field fuzzy search: aggregate the per-field similarity
    /// across content, component name, tags, file path, relative path,
    /// component type, and layer, then keep candidates whose aggregate
    /// distance is within `DISTANCE_THRESHOLD`.
    pub fn search(&self, query: &str) -> Vec<FuzzyMatch> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        let query_lower = query.to_lowercase();

        let mut matches = Vec::new();
        for (index, chunk) in self.chunks.iter().enumerate() {
            let similarity = aggregate_similarity(&query_lower, chunk);
            if 1.0 - similarity <= DISTANCE_THRESHOLD {
                matches.push(FuzzyMatch {
                    chunk_index: index,
                    similarity,
                });
            }
        }
        matches
    }
}

fn aggregate_similarity(query_lower: &str, chunk: &Chunk) -> f64 {
    let tags_joined = chunk
        .tags
        .iter()
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    let mut add = |weight: f64, field: &str| {
        if field.is_empty() {
            return;
        }
        weighted_sum += weight * best_substring_similarity(query_lower, field);
        weight_total += weight;
    };

    add(WEIGHT_CONTENT, &chunk.content);
    add(
        WEIGHT_COMPONENT_NAME,
        chunk.component_name.as_deref().unwrap_or(""),
    );
    add(WEIGHT_TAGS, &tags_joined);
    add(WEIGHT_FILE_PATH, &chunk.absolute_path.to_string_lossy());
    add(WEIGHT_RELATIVE_PATH, &chunk.relative_path);
    add(
        WEIGHT_COMPONENT_TYPE,
        chunk.component_type.as_deref().unwrap_or(""),
    );
    add(WEIGHT_LAYER, chunk.layer.as_deref().unwrap_or(""));

    if weight_total == 0.0 {
        return 0.0;
    }
    weighted_sum / weight_total
}

/// Best similarity of `query` against any equal-length substring window of
/// `field`, case-insensitive. This is what gives matching "no global-position
/// penalty": a hit buried deep inside a long `content` field scores the same
/// as one at the start.
fn best_substring_similarity(query_lower: &str, field: &str) -> f64 {
    let field_lower = field.to_lowercase();
    if field_lower.contains(query_lower) {
        return 1.0;
    }

    let query_chars: Vec<char> = query_lower.chars().collect();
    let field_chars: Vec<char> = field_lower.chars().collect();
    if query_chars.is_empty() || field_chars.is_empty() {
        return 0.0;
    }
    if field_chars.len() <= query_chars.len() {
        return strsim::normalized_levenshtein(query_lower, &field_lower);
    }

    let window_len = query_chars.len();
    let mut best = 0.0f64;
    for start in 0..=(field_chars.len() - window_len) {
        let window: String = field_chars[start..start + window_len].iter().collect();
        let sim = strsim::normalized_levenshtein(query_lower, &window);
        if sim > best {
            best = sim;
        }
        if best >= 1.0 {
            break;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_core::{ChunkId, Language};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn make_chunk(content: &str, component_name: Option<&str>, relative_path: &str) -> Chunk {
        Chunk {
            id: ChunkId::new_random(),
            absolute_path: PathBuf::from(relative_path),
            relative_path: relative_path.to_string(),
            start_line: 1,
            end_line: 1,
            language: Language::new("typescript"),
            framework: None,
            component_type: None,
            layer: None,
            dependencies: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            tags: BTreeSet::new(),
            content: content.to_string(),
            symbol_path: None,
            component_name: component_name.map(|s| s.to_string()),
            complexity: None,
            embedding: None,
        }
    }

    #[test]
    fn exact_substring_anywhere_scores_full_similarity() {
        let long_content = format!("{}class AuthService {{}}{}", "x".repeat(500), "y".repeat(500));
        let chunk = make_chunk(&long_content, None, "src/auth.service.ts");
        assert_eq!(best_substring_similarity("authservice", &long_content.to_lowercase()), 1.0);
        let index = FuzzyIndex::build(std::slice::from_ref(&chunk));
        let matches = index.search("AuthService");
        assert_eq!(matches.len(), 1);
        assert!((matches[0].similarity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn near_miss_within_threshold_matches() {
        let chunk = make_chunk("class AuthServic {}", Some("AuthServic"), "src/auth.ts");
        let index = FuzzyIndex::build(std::slice::from_ref(&chunk));
        let matches = index.search("AuthService");
        assert_eq!(matches.len(), 1);
        assert!(matches[0].similarity > 0.6);
    }

    #[test]
    fn unrelated_query_is_excluded() {
        let chunk = make_chunk("totally unrelated content here", None, "src/other.ts");
        let index = FuzzyIndex::build(std::slice::from_ref(&chunk));
        let matches = index.search("AuthService");
        assert!(matches.is_empty());
    }

    #[test]
    fn empty_query_returns_empty() {
        let chunk = make_chunk("content", None, "src/a.ts");
        let index = FuzzyIndex::build(std::slice::from_ref(&chunk));
        assert!(index.search("").is_empty());
        assert!(index.search("   ").is_empty());
    }
}
