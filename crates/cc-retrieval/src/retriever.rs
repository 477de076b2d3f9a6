use std::collections::HashMap;
use std::path::Path;

use cc_core::{Chunk, ChunkId, QueryVariant};
use cc_indexer::EmbeddingProvider;
use cc_storage::{FuzzyIndex, VectorFilters, VectorStore};

/// Equality/membership filters applied inside each retrieval channel (§4.G).
#[derive(Debug, Clone, Default)]
pub struct RetrievalFilters {
    pub framework: Option<String>,
    pub language: Option<String>,
    pub component_type: Option<String>,
    pub layer: Option<String>,
    pub tags: Vec<String>,
}

impl RetrievalFilters {
    pub fn matches_chunk(&self, chunk: &Chunk) -> bool {
        if let Some(framework) = &self.framework {
            if chunk.framework.as_deref() != Some(framework.as_str()) {
                return false;
            }
        }
        if let Some(language) = &self.language {
            if chunk.language.as_str() != language.to_lowercase() {
                return false;
            }
        }
        if let Some(component_type) = &self.component_type {
            if chunk.component_type.as_deref() != Some(component_type.as_str()) {
                return false;
            }
        }
        if let Some(layer) = &self.layer {
            if chunk.layer.as_deref() != Some(layer.as_str()) {
                return false;
            }
        }
        if !self.tags.is_empty() && !self.tags.iter().all(|tag| chunk.tags.contains(tag)) {
            return false;
        }
        true
    }

    fn to_vector_filters(&self) -> VectorFilters {
        VectorFilters {
            framework: self.framework.clone(),
            component_type: self.component_type.clone(),
            layer: self.layer.clone(),
            language: self.language.clone(),
        }
    }
}

/// `candidate_limit = max(2·limit, 30)` per §4.G.
pub fn candidate_limit(limit: usize) -> usize {
    (2 * limit).max(30)
}

/// Per-chunk accumulated `(0-indexed rank, effective weight)` pairs within
/// one channel, across every query variant searched (§4.G).
pub type ChannelAccumulator = HashMap<ChunkId, Vec<(usize, f64)>>;

/// Semantic channel: embed each variant's text, run cosine-knn, filter, and
/// accumulate ranks. A channel failure degrades to "no results" rather than
/// propagating (transient channel failures per §4.G) unless the underlying
/// store itself is corrupted, which the caller's manifest validation
/// already guards against before this runs.
pub fn collect_semantic(
    variants: &[QueryVariant],
    channel_weight: f64,
    limit: usize,
    filters: &RetrievalFilters,
    embedder: &dyn EmbeddingProvider,
    vector_store: &VectorStore,
    chunk_by_id: &HashMap<ChunkId, &Chunk>,
) -> ChannelAccumulator {
    let mut accumulator: ChannelAccumulator = HashMap::new();
    let limit = candidate_limit(limit);
    let vector_filters = filters.to_vector_filters();

    for variant in variants {
        let query_vector = match embedder.embed(&variant.query_text) {
            Ok(v) => v,
            Err(_) => continue,
        };
        let hits = match vector_store.cosine_knn(&query_vector, limit, &vector_filters) {
            Ok(h) => h,
            Err(_) => continue,
        };
        let mut rank = 0usize;
        for hit in hits {
            let Some(chunk) = chunk_by_id.get(&hit.chunk_id) else {
                continue;
            };
            if !filters.tags.is_empty() && !filters.matches_chunk(chunk) {
                continue;
            }
            let weight = channel_weight * variant.weight;
            accumulator.entry(hit.chunk_id).or_default().push((rank, weight));
            rank += 1;
        }
    }
    accumulator
}

/// Lexical channel: fuzzy-match each variant's text over the in-memory
/// chunk list, apply exact-match rank boosts, filter, sort, and accumulate
/// ranks. The boosts reshape *rank order only* — the RRF weight recorded
/// per occurrence never carries the boosted similarity value (§4.G).
pub fn collect_lexical(
    variants: &[QueryVariant],
    channel_weight: f64,
    limit: usize,
    filters: &RetrievalFilters,
    fuzzy: &FuzzyIndex<'_>,
    chunks: &[Chunk],
) -> ChannelAccumulator {
    let mut accumulator: ChannelAccumulator = HashMap::new();
    let limit = candidate_limit(limit);

    for variant in variants {
        let matches = fuzzy.search(&variant.query_text);
        let mut boosted: Vec<(usize, f64)> = matches
            .into_iter()
            .filter_map(|m| {
                let chunk = &chunks[m.chunk_index];
                if !filters.matches_chunk(chunk) {
                    return None;
                }
                let boosted_similarity = apply_rank_boosts(&variant.query_text, chunk, m.similarity);
                Some((m.chunk_index, boosted_similarity))
            })
            .collect();
        boosted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        boosted.truncate(limit);

        for (rank, (chunk_index, _)) in boosted.into_iter().enumerate() {
            let weight = channel_weight * variant.weight;
            accumulator
                .entry(chunks[chunk_index].id)
                .or_default()
                .push((rank, weight));
        }
    }
    accumulator
}

/// +0.3 exact component-name match, +0.2 exact file-name match, +0.1
/// path-substring match; clamped to 1.0 (§4.G).
fn apply_rank_boosts(query: &str, chunk: &Chunk, similarity: f64) -> f64 {
    let query_lower = query.to_lowercase();
    let mut boosted = similarity;

    if let Some(name) = &chunk.component_name {
        if name.to_lowercase() == query_lower {
            boosted += 0.3;
        }
    }
    if let Some(file_stem) = Path::new(&chunk.relative_path)
        .file_stem()
        .and_then(|s| s.to_str())
    {
        if file_stem.to_lowercase() == query_lower {
            boosted += 0.2;
        }
    }
    if chunk.relative_path.to_lowercase().contains(&query_lower) {
        boosted += 0.1;
    }

    boosted.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_core::{ChunkId, Language};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn make_chunk(relative_path: &str, component_name: Option<&str>, content: &str) -> Chunk {
        Chunk {
            id: ChunkId::new_random(),
            absolute_path: PathBuf::from(relative_path),
            relative_path: relative_path.to_string(),
            start_line: 1,
            end_line: 10,
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
    fn candidate_limit_floor_is_30() {
        assert_eq!(candidate_limit(5), 30);
        assert_eq!(candidate_limit(20), 40);
    }

    #[test]
    fn exact_component_name_boost_reorders_results() {
        let a = make_chunk("src/auth.service.ts", Some("AuthService"), "class AuthService {}");
        let b = make_chunk("src/auth.helper.ts", Some("AuthHelper"), "class AuthService helper {}");
        let chunks = vec![a, b];
        let fuzzy = FuzzyIndex::build(&chunks);

        let variants = vec![QueryVariant::new("AuthService", 1.0)];
        let accum = collect_lexical(&variants, 1.0, 10, &RetrievalFilters::default(), &fuzzy, &chunks);

        let a_rank = accum.get(&chunks[0].id).unwrap()[0].0;
        let b_rank = accum.get(&chunks[1].id).map(|v| v[0].0);
        assert_eq!(a_rank, 0);
        if let Some(b_rank) = b_rank {
            assert!(a_rank < b_rank);
        }
    }

    #[test]
    fn filters_exclude_non_matching_chunks() {
        let mut a = make_chunk("src/a.ts", None, "process data");
        a.layer = Some("backend".to_string());
        let chunks = vec![a];
        let fuzzy = FuzzyIndex::build(&chunks);

        let filters = RetrievalFilters {
            layer: Some("frontend".to_string()),
            ..Default::default()
        };
        let variants = vec![QueryVariant::new("process data", 1.0)];
        let accum = collect_lexical(&variants, 1.0, 10, &filters, &fuzzy, &chunks);
        assert!(accum.is_empty());
    }
}
