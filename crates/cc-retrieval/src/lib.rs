pub mod autoheal;
pub mod classifier;
pub mod cycles;
pub mod engine;
pub mod error;
pub mod expander;
pub mod fuser;
pub mod quality;
pub mod reranker;
pub mod retriever;
pub mod symbol_refs;

pub use autoheal::with_auto_heal;
pub use classifier::{classify, ClassifiedQuery, Intent};
pub use cycles::{detect_cycles, Cycle, Severity};
pub use engine::{IndexingStatus, QueryEngine, RefreshOptions, SearchOptions, SearchResponse};
pub use error::RetrievalError;
pub use expander::expand;
pub use fuser::{
    apply_definition_first_boost, dedup_by_file, dedup_by_symbol, fuse, into_search_result, is_test_file,
    is_testing_query, rescore, scope_header, sort_desc, Candidate, Profile, RescoreContext,
};
pub use quality::{assess, should_swap_to_rescue, QUALITY_CONFIDENCE_THRESHOLD};
pub use reranker::{maybe_rerank, NoopReranker, Reranker, RerankerError, RERANK_AMBIGUITY_MARGIN};
pub use retriever::{candidate_limit, collect_lexical, collect_semantic, ChannelAccumulator, RetrievalFilters};
pub use symbol_refs::{find_symbol_references, SymbolReference, SymbolReferencesResult};
