use cc_core::{QualityStatus, SearchQuality, SearchResult};

/// Below this confidence threshold, a result set is reported
/// `low_confidence` and becomes eligible for rescue (§4.I, §9 Open Question).
/// Chosen so scenario S4's sparse-hit fixture (single weak hit, no
/// path-token overlap) falls under it while a normal multi-hit result with a
/// decent top score and path overlap does not.
pub const QUALITY_CONFIDENCE_THRESHOLD: f64 = 0.35;

/// `assess(query, results) -> {status, confidence, next_steps?}` (§4.I).
/// Heuristic over the top score's magnitude, the score spread between the
/// first and last surviving result, and whether any result's path shares a
/// token with the query.
pub fn assess(query: &str, results: &[SearchResult]) -> SearchQuality {
    if results.is_empty() {
        return SearchQuality {
            status: QualityStatus::LowConfidence,
            confidence: 0.0,
            next_steps: Some(vec![
                "widen the query or drop filters".to_string(),
                "try find_symbol_references if searching for a known identifier".to_string(),
            ]),
        };
    }

    let top_score = results[0].score;
    let spread = top_score - results.last().map(|r| r.score).unwrap_or(top_score);
    let has_path_overlap = has_query_path_overlap(query, results);

    let mut confidence = top_score;
    if spread < 0.05 && results.len() > 1 {
        // Flat score distribution: nothing stands out above the rest.
        confidence *= 0.85;
    }
    if !has_path_overlap {
        confidence *= 0.9;
    }
    confidence = confidence.clamp(0.0, 1.0);

    if confidence < QUALITY_CONFIDENCE_THRESHOLD {
        SearchQuality {
            status: QualityStatus::LowConfidence,
            confidence,
            next_steps: Some(vec![
                "rephrase with more specific terms".to_string(),
                "use find_symbol_references for a known symbol name".to_string(),
            ]),
        }
    } else {
        SearchQuality {
            status: QualityStatus::Ok,
            confidence,
            next_steps: None,
        }
    }
}

fn has_query_path_overlap(query: &str, results: &[SearchResult]) -> bool {
    let tokens: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| t.len() > 2)
        .collect();
    if tokens.is_empty() {
        return true;
    }
    results.iter().any(|r| {
        let path_lower = r.path.to_lowercase();
        tokens.iter().any(|t| path_lower.contains(t.as_str()))
    })
}

/// Decide whether a rescue result set should replace the primary one
/// (§4.I): the primary was low-confidence and rescue is at least as good
/// and non-worse in status, or rescue clears the primary by a 0.05 margin
/// regardless of status.
pub fn should_swap_to_rescue(primary: &SearchQuality, rescue: &SearchQuality) -> bool {
    let primary_was_low = primary.status == QualityStatus::LowConfidence;
    let rescue_is_ok = rescue.status == QualityStatus::Ok;
    let rescue_at_least_as_good = rescue.confidence >= primary.confidence;

    (primary_was_low && rescue_is_ok && rescue_at_least_as_good)
        || (rescue.confidence >= primary.confidence + 0.05)
}
