use std::collections::{HashMap, HashSet};

use cc_core::{Chunk, ChunkId, SearchResult, Trend};

use crate::classifier::Intent;
use crate::retriever::ChannelAccumulator;

/// Profile from the query options object (§6), shapes the wiring/flow
/// composition-root rescoring step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Explore,
    Edit,
    Refactor,
    Migrate,
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Explore
    }
}

const RRF_K: f64 = 60.0;

const TESTING_KEYWORDS: &[&str] = &[
    "test", "tests", "testing", "spec", "specs", "unit", "e2e", "mock", "spy", "fixture", "jest",
    "mocha", "vitest", "pytest", "rspec", "junit",
];

/// `rrf_score = Σ weight/(60+rank)` summed across every `(channel, variant)`
/// entry, then normalized by the theoretical maximum so the base score lands
/// in `[0, 1]` (§4.H, P9).
pub fn fuse(
    semantic: &ChannelAccumulator,
    lexical: &ChannelAccumulator,
    total_variant_weight: f64,
) -> HashMap<ChunkId, f64> {
    let mut raw: HashMap<ChunkId, f64> = HashMap::new();
    for (id, entries) in semantic.iter().chain(lexical.iter()) {
        let contribution: f64 = entries.iter().map(|(rank, weight)| weight / (RRF_K + *rank as f64)).sum();
        *raw.entry(*id).or_insert(0.0) += contribution;
    }

    let theoretical_max = total_variant_weight / RRF_K;
    if theoretical_max <= 0.0 {
        return raw.into_iter().map(|(id, _)| (id, 0.0)).collect();
    }
    raw.into_iter().map(|(id, score)| (id, (score / theoretical_max).min(1.0))).collect()
}

/// Everything the rescoring pipeline needs about the query beyond the raw
/// text (§4.H).
pub struct RescoreContext<'a> {
    pub query: &'a str,
    pub query_tokens: Vec<String>,
    pub intent: Intent,
    pub profile: Profile,
    pub centrality: &'a HashMap<String, f64>,
    pub rising: &'a HashSet<String>,
    pub declining: &'a HashSet<String>,
    pub pattern_warnings: &'a HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub chunk: &'a Chunk,
    pub score: f64,
}

/// One multiplicative rescoring pass over every candidate (§4.H). Steps are
/// unclamped between each other; only the caller's final normalization (none
/// here — rescoring can legitimately exceed 1.0) bounds the result.
pub fn rescore(candidates: &mut [Candidate<'_>], ctx: &RescoreContext<'_>) {
    let action_query = is_action_query(ctx.query, &ctx.query_tokens);
    let wiring_or_flow = matches!(ctx.intent, Intent::Wiring | Intent::Flow);

    for candidate in candidates.iter_mut() {
        let chunk = candidate.chunk;

        if chunk.component_type.is_some() {
            candidate.score *= 1.10;
        }
        if chunk.layer.is_some() {
            candidate.score *= 1.10;
        }
        if action_query && is_definition_heavy(chunk) {
            candidate.score *= 0.82;
        }
        if action_query && is_action_shaped_component(chunk) {
            candidate.score *= 1.06;
        }
        if (matches!(ctx.intent, Intent::Flow | Intent::Wiring) || action_query) && is_template_or_style_path(chunk) {
            candidate.score *= 0.75;
        }
        if wiring_or_flow && ctx.profile != Profile::Explore && is_composition_root(chunk) {
            candidate.score *= 1.12;
        }
        if ctx.intent == Intent::Flow && is_flow_component(chunk) {
            candidate.score *= 1.15;
        }
        if ctx.intent == Intent::Config && is_composition_root(chunk) {
            candidate.score *= 1.20;
        }
        if ctx.intent == Intent::Wiring && is_wiring_component(chunk) {
            candidate.score *= 1.18;
            if is_composition_root(chunk) {
                candidate.score *= 1.22;
            }
        }
        if path_token_overlap(&ctx.query_tokens, &chunk.relative_path) >= 2 {
            candidate.score *= 1.08;
        }
        if let Some(&centrality) = ctx.centrality.get(&chunk.relative_path) {
            if centrality > 0.1 {
                candidate.score *= 1.0 + 0.15 * centrality;
            }
        }
        match chunk_trend(chunk, ctx.rising, ctx.declining) {
            Some(Trend::Rising) => candidate.score *= 1.15,
            Some(Trend::Declining) => candidate.score *= 0.90,
            _ => {}
        }
    }
}

/// EXACT_NAME-only: a chunk whose symbol name matches the query
/// case-insensitively gets boosted once more and the list is re-sorted
/// (§4.H, S3).
pub fn apply_definition_first_boost(candidates: &mut Vec<Candidate<'_>>, query: &str, intent: Intent) {
    if intent != Intent::ExactName {
        return;
    }
    let query_lower = query.to_lowercase();
    for candidate in candidates.iter_mut() {
        if let Some(name) = candidate.chunk.symbol_name() {
            if name.to_lowercase() == query_lower {
                candidate.score *= 1.15;
            }
        }
    }
    sort_desc(candidates);
}

pub fn sort_desc(candidates: &mut [Candidate<'_>]) {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
}

/// Score-descending, first occurrence per case-insensitive normalized path
/// (§4.H, P6).
pub fn dedup_by_file<'a>(candidates: Vec<Candidate<'a>>, limit: usize) -> Vec<Candidate<'a>> {
    let mut seen_paths: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for candidate in candidates {
        let normalized = candidate.chunk.relative_path.to_lowercase().replace('\\', "/");
        if seen_paths.insert(normalized) {
            out.push(candidate);
            if out.len() >= limit {
                break;
            }
        }
    }
    out
}

/// Collapse chunks sharing a `symbol_path` to the highest-scoring one
/// (§4.H, P7). Chunks with no `symbol_path` are never collapsed against
/// each other.
pub fn dedup_by_symbol<'a>(candidates: Vec<Candidate<'a>>) -> Vec<Candidate<'a>> {
    let mut best_by_symbol: HashMap<Vec<String>, usize> = HashMap::new();
    let mut out: Vec<Candidate<'a>> = Vec::new();

    for candidate in candidates {
        match &candidate.chunk.symbol_path {
            Some(path) => match best_by_symbol.get(path) {
                Some(&existing_index) if out[existing_index].score >= candidate.score => {}
                Some(&existing_index) => {
                    out[existing_index] = candidate;
                }
                None => {
                    best_by_symbol.insert(path.clone(), out.len());
                    out.push(candidate);
                }
            },
            None => out.push(candidate),
        }
    }
    out
}

pub fn is_testing_query(query: &str) -> bool {
    let lower = query.to_lowercase();
    TESTING_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

pub fn is_test_file(chunk: &Chunk) -> bool {
    let path = chunk.relative_path.to_lowercase();
    path.contains(".test.")
        || path.contains(".spec.")
        || path.contains("__tests__")
        || path.contains("/tests/")
        || path.contains("/test/")
        || path.ends_with("_test.py")
        || path.ends_with("_test.go")
}

fn chunk_trend(chunk: &Chunk, rising: &HashSet<String>, declining: &HashSet<String>) -> Option<Trend> {
    let tags_lower: Vec<String> = chunk.tags.iter().map(|t| t.to_lowercase()).collect();
    if tags_lower.iter().any(|t| declining.contains(t)) {
        return Some(Trend::Declining);
    }
    if tags_lower.iter().any(|t| rising.contains(t)) {
        return Some(Trend::Rising);
    }
    None
}

fn pattern_warning_for(chunk: &Chunk, pattern_warnings: &HashMap<String, String>) -> Option<String> {
    chunk
        .tags
        .iter()
        .map(|t| t.to_lowercase())
        .find_map(|t| pattern_warnings.get(&t).cloned())
}

const ACTION_TERMS: &[&str] = &[
    "how", "navigate", "redirect", "route", "handle", "process", "execute", "trigger", "dispatch",
];

fn is_action_query(query: &str, tokens: &[String]) -> bool {
    let lower = query.to_lowercase();
    ACTION_TERMS.iter().any(|t| lower.contains(t)) || tokens.iter().any(|t| ACTION_TERMS.contains(&t.as_str()))
}

const DEFINITION_PREFIXES: &[&str] = &["class ", "interface ", "type ", "struct ", "enum ", "trait "];
const DEFINITION_HEAVY_PATH_MARKERS: &[&str] = &["/models/", "/interfaces/", "/types/", "/constants"];

fn is_definition_heavy(chunk: &Chunk) -> bool {
    let trimmed = chunk.content.trim_start();
    if DEFINITION_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        return true;
    }
    let path = chunk.relative_path.to_lowercase();
    DEFINITION_HEAVY_PATH_MARKERS.iter().any(|m| path.contains(m))
}

const ACTION_COMPONENT_TYPES: &[&str] = &["service", "component", "interceptor", "guard", "module", "resolver"];

fn is_action_shaped_component(chunk: &Chunk) -> bool {
    chunk
        .component_type
        .as_deref()
        .map(|t| ACTION_COMPONENT_TYPES.contains(&t))
        .unwrap_or(false)
}

const TEMPLATE_EXTENSIONS: &[&str] = &[".html", ".scss", ".css", ".less", ".sass", ".styl"];

fn is_template_or_style_path(chunk: &Chunk) -> bool {
    let path = chunk.relative_path.to_lowercase();
    TEMPLATE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
        || path.contains("/templates/")
        || path.contains("/styles/")
}

const COMPOSITION_ROOT_STEM_PREFIXES: &[&str] = &["main", "index", "bootstrap", "startup"];
const COMPOSITION_ROOT_PATH_MARKERS: &[&str] = &["/routes", "/routing", "/router", "/config", "/providers"];

fn is_composition_root(chunk: &Chunk) -> bool {
    if chunk.tags.contains("composition-root") {
        return true;
    }
    let path = chunk.relative_path.to_lowercase();
    let stem = path.rsplit('/').next().unwrap_or(&path).split('.').next().unwrap_or("");
    if COMPOSITION_ROOT_STEM_PREFIXES.iter().any(|p| stem.starts_with(p)) {
        return true;
    }
    COMPOSITION_ROOT_PATH_MARKERS.iter().any(|m| path.contains(m))
}

const FLOW_COMPONENT_TYPES: &[&str] = &["service", "guard", "interceptor", "middleware"];

fn is_flow_component(chunk: &Chunk) -> bool {
    chunk
        .component_type
        .as_deref()
        .map(|t| FLOW_COMPONENT_TYPES.contains(&t))
        .unwrap_or(false)
}

const WIRING_COMPONENT_TYPES: &[&str] = &["module", "provider", "config"];

fn is_wiring_component(chunk: &Chunk) -> bool {
    chunk
        .component_type
        .as_deref()
        .map(|t| WIRING_COMPONENT_TYPES.contains(&t))
        .unwrap_or(false)
}

fn path_tokens(path: &str) -> Vec<String> {
    path.split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn path_token_overlap(query_tokens: &[String], path: &str) -> usize {
    let tokens = path_tokens(path);
    query_tokens.iter().filter(|t| tokens.contains(t)).count()
}

/// Build the comment-style scope header used for snippet enrichment, e.g.
/// `// AuthService.login` (§4.H).
pub fn scope_header(chunk: &Chunk) -> Option<String> {
    chunk.symbol_path.as_ref().map(|segments| format!("// {}", segments.join(".")))
}

/// Convert a deduped, rescored candidate into the public `SearchResult`,
/// attaching trend/pattern-warning enrichment from the precomputed signals.
pub fn into_search_result(
    candidate: &Candidate<'_>,
    ctx: &RescoreContext<'_>,
    include_snippet: bool,
) -> SearchResult {
    let chunk = candidate.chunk;
    let trend = chunk_trend(chunk, ctx.rising, ctx.declining);
    let pattern_warning = pattern_warning_for(chunk, ctx.pattern_warnings);
    let snippet = if include_snippet {
        let header = scope_header(chunk);
        Some(match header {
            Some(h) => format!("{h}\n{}", chunk.content),
            None => chunk.content.clone(),
        })
    } else {
        None
    };

    SearchResult {
        path: chunk.relative_path.clone(),
        start_line: chunk.start_line,
        end_line: chunk.end_line,
        score: candidate.score,
        summary: chunk.component_name.clone().unwrap_or_else(|| chunk.relative_path.clone()),
        snippet,
        language: chunk.language.clone(),
        framework: chunk.framework.clone(),
        component_type: chunk.component_type.clone(),
        layer: chunk.layer.clone(),
        trend,
        pattern_warning,
        callers: None,
        consumers: None,
        tests: None,
        relationships_count: None,
    }
}
