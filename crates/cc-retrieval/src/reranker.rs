use cc_core::SearchResult;

/// Boundary for a cross-encoder reranking backend (§4.J). Implementations
/// are expected to be expensive relative to the fused score, which is why
/// the engine only calls through this when the top results are ambiguous.
pub trait Reranker {
    /// Re-score `results` against `query`, returning them in the reranker's
    /// own order. Any error is treated as non-fatal by the caller.
    fn rerank(&self, query: &str, results: Vec<SearchResult>) -> Result<Vec<SearchResult>, RerankerError>;
}

#[derive(Debug, thiserror::Error)]
#[error("reranker failed: {reason}")]
pub struct RerankerError {
    pub reason: String,
}

/// Relative-margin ambiguity trigger (§9 Open Question): rerank only fires
/// when the top two fused scores are within this fraction of the top score.
/// A relative margin was chosen over an absolute one because RRF base scores
/// are normalized to `[0, 1]` but their absolute magnitude still varies a lot
/// with candidate-set size — a fixed gap would over- or under-trigger
/// depending on how spread out a given query's scores happen to be, while a
/// ratio stays scale-invariant.
pub const RERANK_AMBIGUITY_MARGIN: f64 = 0.10;

pub fn is_ambiguous(results: &[SearchResult]) -> bool {
    if results.len() < 2 {
        return false;
    }
    let top = results[0].score;
    if top <= 0.0 {
        return false;
    }
    (top - results[1].score) / top < RERANK_AMBIGUITY_MARGIN
}

/// Apply `reranker` when enabled and the top results are ambiguous.
/// Failures are logged and the input order is returned unchanged, per
/// §4.J's non-fatal failure handling.
pub fn maybe_rerank(
    enabled: bool,
    reranker: Option<&dyn Reranker>,
    query: &str,
    results: Vec<SearchResult>,
) -> Vec<SearchResult> {
    if !enabled || !is_ambiguous(&results) {
        return results;
    }
    let Some(reranker) = reranker else {
        return results;
    };

    match reranker.rerank(query, results.clone()) {
        Ok(reranked) => reranked,
        Err(err) => {
            tracing::warn!(reason = %err.reason, "reranker failed, falling back to fused order");
            results
        }
    }
}

/// Deterministic stub used when no real cross-encoder backend is wired in:
/// returns results untouched.
pub struct NoopReranker;

impl Reranker for NoopReranker {
    fn rerank(&self, _query: &str, results: Vec<SearchResult>) -> Result<Vec<SearchResult>, RerankerError> {
        Ok(results)
    }
}
