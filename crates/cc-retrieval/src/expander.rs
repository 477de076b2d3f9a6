use cc_core::QueryVariant;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "to", "of", "for", "and", "or", "with", "in", "on", "by", "how", "are",
    "is", "after", "before",
];

/// `(predicate, added terms)`. A rule fires when its predicate matches
/// anywhere in the lowercased query; its terms are candidates to add to the
/// expansion pool, in order, skipping anything already present (§4.F step 3).
const HINT_RULES: &[(&[&str], &[&str])] = &[
    (
        &["auth", "login", "session", "credential"],
        &["login", "session", "token", "credential", "authenticate"],
    ),
    (
        &["route", "routing", "navigate", "redirect"],
        &["router", "navigation", "path", "endpoint"],
    ),
    (
        &["config", "setting", "environment", "bootstrap"],
        &["configuration", "settings", "environment", "options"],
    ),
    (
        &["permission", "role", "access", "authoriz"],
        &["authorization", "role", "permission", "policy"],
    ),
    (
        &["middleware", "interceptor", "guard"],
        &["middleware", "interceptor", "guard", "filter"],
    ),
    (
        &["theme", "style", "upload", "asset"],
        &["theme", "style", "upload", "asset"],
    ),
];

/// Tokenize `query` into terms longer than 2 characters, excluding the fixed
/// stop-word set (§4.F step 2). Case-folded, order-preserving.
pub(crate) fn tokenize(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| t.len() > 2 && !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Collect hint-rule-added terms for `query`, in rule order, skipping terms
/// already present in `existing` or already added earlier (§4.F step 3).
fn collect_added_terms(query_lower: &str, existing: &[String]) -> Vec<String> {
    let mut added = Vec::new();
    for (triggers, terms) in HINT_RULES {
        if triggers.iter().any(|t| query_lower.contains(t)) {
            for term in *terms {
                let term = term.to_string();
                if !existing.contains(&term) && !added.contains(&term) {
                    added.push(term);
                }
            }
        }
    }
    added
}

/// Expand `query` into up to `n` additional weighted variants beyond the
/// original (§4.F). `n = 0` yields just the original query at weight 1.0.
pub fn expand(query: &str, n: usize) -> Vec<QueryVariant> {
    let mut variants = vec![QueryVariant::new(query, 1.0)];

    let query_lower = query.to_lowercase();
    let tokens = tokenize(query);
    let added = collect_added_terms(&query_lower, &tokens);

    if n >= 1 && !added.is_empty() {
        let first_six: Vec<&String> = added.iter().take(6).collect();
        let joined = first_six.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ");
        variants.push(QueryVariant::new(format!("{query} {joined}"), 0.35));
    }

    if n >= 2 && added.len() >= 6 {
        let next_six: Vec<&String> = added.iter().skip(6).take(6).collect();
        if !next_six.is_empty() {
            let joined = next_six.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ");
            variants.push(QueryVariant::new(format!("{query} {joined}"), 0.25));
        }
    }

    variants
}
