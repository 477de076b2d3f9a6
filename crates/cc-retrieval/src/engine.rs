use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cc_core::{BuildManifest, Chunk, ChunkId, QualityStatus, SearchQuality, SearchResult};
use cc_indexer::{Analyzer, EmbeddingProvider, IndexOptions, Stats};
use cc_storage::{FuzzyIndex, IntelligenceSidecar, PrecomputedSignals, StorageError, VectorStore};

use crate::autoheal::with_auto_heal;
use crate::classifier;
use crate::cycles::{self, Cycle};
use crate::error::RetrievalError;
use crate::expander;
use crate::fuser::{self, Candidate, Profile, RescoreContext};
use crate::quality;
use crate::reranker::{self, Reranker};
use crate::retriever::{self, RetrievalFilters};
use crate::symbol_refs::{self, SymbolReferencesResult};

/// Query options object (§6): missing weights are filled in from intent
/// classification, everything else defaults to the conservative baseline.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    pub filters: RetrievalFilters,
    pub use_semantic_search: bool,
    pub use_lexical_search: bool,
    pub semantic_weight: Option<f64>,
    pub keyword_weight: Option<f64>,
    pub profile: Profile,
    pub enable_query_expansion: bool,
    pub enable_low_confidence_rescue: bool,
    pub candidate_floor: Option<usize>,
    pub enable_reranker: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            filters: RetrievalFilters::default(),
            use_semantic_search: true,
            use_lexical_search: true,
            semantic_weight: None,
            keyword_weight: None,
            profile: Profile::Explore,
            enable_query_expansion: true,
            enable_low_confidence_rescue: true,
            candidate_floor: None,
            enable_reranker: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub quality: SearchQuality,
}

#[derive(Debug, Clone, Default)]
pub struct RefreshOptions {
    pub incremental_only: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndexingStatus {
    Ready { build_id: String, total_chunks: usize, total_files: usize },
    NeverIndexed,
    Corrupted { reason: String },
}

struct EngineState {
    #[allow(dead_code)]
    manifest: BuildManifest,
    chunks: Vec<Chunk>,
    vector_store: VectorStore,
    sidecar: Option<IntelligenceSidecar>,
    signals: PrecomputedSignals,
}

fn load_state(root: &Path) -> Result<EngineState, RetrievalError> {
    let manifest = cc_storage::manifest::read_manifest(root)?;
    cc_storage::manifest::validate(root, &manifest)?;

    let chunk_store_path = root.join(&manifest.artifacts.keyword_store_path);
    let chunks = cc_storage::chunkstore::load(&chunk_store_path, &manifest)?;

    let vector_store_path = root.join(&manifest.artifacts.vector_store_path);
    let vector_store = VectorStore::open(&vector_store_path, manifest.embedding_dimension)?;

    let intelligence_path = root.join(&manifest.artifacts.intelligence_path);
    let (sidecar, signals) = cc_storage::intelligence::load_or_default(&intelligence_path);

    Ok(EngineState { manifest, chunks, vector_store, sidecar, signals })
}

/// Top-level query surface (§6): `search`, `find_symbol_references`,
/// `detect_cycles`, `get_indexing_status`, `refresh_index`. Every
/// index-reading method goes through the auto-heal wrapper (§4.M, P10).
pub struct QueryEngine<'a> {
    root: PathBuf,
    analyzer: &'a dyn Analyzer,
    embedder: &'a dyn EmbeddingProvider,
    tool_version: String,
    reranker: Option<&'a dyn Reranker>,
    state: EngineState,
}

impl<'a> QueryEngine<'a> {
    pub fn open(
        root: &Path,
        analyzer: &'a dyn Analyzer,
        embedder: &'a dyn EmbeddingProvider,
        tool_version: impl Into<String>,
        reranker: Option<&'a dyn Reranker>,
    ) -> Result<Self, RetrievalError> {
        let tool_version = tool_version.into();
        let state = with_auto_heal(root, analyzer, embedder, &tool_version, || load_state(root))?;
        Ok(Self {
            root: root.to_path_buf(),
            analyzer,
            embedder,
            tool_version,
            reranker,
            state,
        })
    }

    pub fn search(&mut self, query: &str, options: &SearchOptions) -> Result<SearchResponse, RetrievalError> {
        if query.trim().is_empty() {
            return Err(RetrievalError::InvalidParams { reason: "query must not be empty".to_string() });
        }
        if options.limit == 0 {
            return Err(RetrievalError::InvalidParams { reason: "limit must be greater than zero".to_string() });
        }

        let root = self.root.clone();
        let analyzer = self.analyzer;
        let embedder = self.embedder;
        let tool_version = self.tool_version.clone();

        let primary = with_auto_heal(&root, analyzer, embedder, &tool_version, || {
            self.state = load_state(&root)?;
            self.run_search(query, options, 1)
        })?;

        if primary.1.status == QualityStatus::LowConfidence && options.enable_low_confidence_rescue {
            let rescue = with_auto_heal(&root, analyzer, embedder, &tool_version, || {
                self.state = load_state(&root)?;
                self.run_search(query, options, 2)
            })?;

            if quality::should_swap_to_rescue(&primary.1, &rescue.1) {
                return Ok(SearchResponse { results: rescue.0, quality: rescue.1 });
            }
        }

        Ok(SearchResponse { results: primary.0, quality: primary.1 })
    }

    fn run_search(
        &self,
        query: &str,
        options: &SearchOptions,
        expansion_depth: usize,
    ) -> Result<(Vec<SearchResult>, SearchQuality), RetrievalError> {
        let classified = classifier::classify(query);
        let semantic_weight = options.semantic_weight.unwrap_or(classified.semantic_weight);
        let lexical_weight = options.keyword_weight.unwrap_or(classified.lexical_weight);

        let n = if options.enable_query_expansion { expansion_depth } else { 0 };
        let variants = expander::expand(query, n);

        let retrieval_limit = options.candidate_floor.unwrap_or(options.limit).max(options.limit);

        let chunk_by_id: HashMap<ChunkId, &Chunk> = self.state.chunks.iter().map(|c| (c.id, c)).collect();

        let semantic_map = if options.use_semantic_search {
            retriever::collect_semantic(
                &variants,
                semantic_weight,
                retrieval_limit,
                &options.filters,
                self.embedder,
                &self.state.vector_store,
                &chunk_by_id,
            )
        } else {
            HashMap::new()
        };

        let fuzzy = FuzzyIndex::build(&self.state.chunks);
        let lexical_map = if options.use_lexical_search {
            retriever::collect_lexical(
                &variants,
                lexical_weight,
                retrieval_limit,
                &options.filters,
                &fuzzy,
                &self.state.chunks,
            )
        } else {
            HashMap::new()
        };

        let total_variant_weight: f64 =
            variants.iter().map(|v| v.weight * (semantic_weight + lexical_weight)).sum();
        let scores = fuser::fuse(&semantic_map, &lexical_map, total_variant_weight);

        let mut candidates: Vec<Candidate<'_>> = scores
            .into_iter()
            .filter_map(|(id, score)| chunk_by_id.get(&id).map(|&chunk| Candidate { chunk, score }))
            .collect();

        let testing_query = fuser::is_testing_query(query);
        let mut held_back_tests = Vec::new();
        if !testing_query {
            let (tests, rest): (Vec<_>, Vec<_>) = candidates.into_iter().partition(|c| fuser::is_test_file(c.chunk));
            held_back_tests = tests;
            candidates = rest;
        }

        let query_tokens = expander::tokenize(query);
        let ctx = RescoreContext {
            query,
            query_tokens,
            intent: classified.intent,
            profile: options.profile,
            centrality: &self.state.signals.centrality,
            rising: &self.state.signals.rising,
            declining: &self.state.signals.declining,
            pattern_warnings: &self.state.signals.pattern_warnings,
        };

        fuser::rescore(&mut candidates, &ctx);
        fuser::rescore(&mut held_back_tests, &ctx);
        fuser::sort_desc(&mut candidates);
        fuser::sort_desc(&mut held_back_tests);

        fuser::apply_definition_first_boost(&mut candidates, query, classified.intent);

        let deduped = fuser::dedup_by_file(candidates, options.limit.max(retrieval_limit));
        let mut deduped = fuser::dedup_by_symbol(deduped);

        if !testing_query && deduped.len() < 3 {
            if let Some(best_test) = held_back_tests.first() {
                deduped.push(Candidate { chunk: best_test.chunk, score: best_test.score * 0.5 });
                fuser::sort_desc(&mut deduped);
            }
        }
        deduped.truncate(options.limit);

        let results: Vec<SearchResult> = deduped.iter().map(|c| fuser::into_search_result(c, &ctx, true)).collect();
        let results = reranker::maybe_rerank(options.enable_reranker, self.reranker, query, results);

        let assessed = quality::assess(query, &results);
        Ok((results, assessed))
    }

    pub fn find_symbol_references(&mut self, symbol: &str, n: usize) -> Result<SymbolReferencesResult, RetrievalError> {
        if symbol.trim().is_empty() {
            return Err(RetrievalError::InvalidParams { reason: "symbol must not be empty".to_string() });
        }
        let root = self.root.clone();
        let tool_version = self.tool_version.clone();
        with_auto_heal(&root, self.analyzer, self.embedder, &tool_version, || {
            self.state = load_state(&root)?;
            Ok(symbol_refs::find_symbol_references(symbol, &self.state.chunks, n))
        })
    }

    pub fn detect_cycles(&mut self, scope: Option<&str>) -> Result<Vec<Cycle>, RetrievalError> {
        let root = self.root.clone();
        let tool_version = self.tool_version.clone();
        with_auto_heal(&root, self.analyzer, self.embedder, &tool_version, || {
            self.state = load_state(&root)?;
            let import_graph = self
                .state
                .sidecar
                .as_ref()
                .map(|s| s.import_graph.clone())
                .unwrap_or_default();
            Ok(cycles::detect_cycles(&import_graph, scope))
        })
    }

    pub fn get_indexing_status(&self) -> IndexingStatus {
        match cc_storage::manifest::read_manifest(&self.root) {
            Err(StorageError::NotFound { .. }) => IndexingStatus::NeverIndexed,
            Err(e) => IndexingStatus::Corrupted { reason: e.to_string() },
            Ok(manifest) => match cc_storage::manifest::validate(&self.root, &manifest) {
                Ok(()) => IndexingStatus::Ready {
                    build_id: manifest.build_id.to_string(),
                    total_chunks: self.state.chunks.len(),
                    total_files: self
                        .state
                        .chunks
                        .iter()
                        .map(|c| &c.relative_path)
                        .collect::<std::collections::HashSet<_>>()
                        .len(),
                },
                Err(e) => IndexingStatus::Corrupted { reason: e.to_string() },
            },
        }
    }

    pub fn refresh_index(&mut self, options: RefreshOptions) -> Result<Stats, RetrievalError> {
        if let Some(reason) = &options.reason {
            tracing::info!(reason = %reason, incremental_only = options.incremental_only, "refresh_index requested");
        }
        let stats = cc_indexer::index(
            &self.root,
            self.analyzer,
            self.embedder,
            &self.tool_version,
            &IndexOptions { incremental_only: options.incremental_only },
        )?;
        self.state = load_state(&self.root)?;
        Ok(stats)
    }
}
