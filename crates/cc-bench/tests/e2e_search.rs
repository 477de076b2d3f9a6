use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::PathBuf;

use cc_bench::fixture::{create_project, FixtureAnalyzer};
use cc_core::{Chunk, ChunkId, Language};
use cc_indexer::{index, HashEmbeddingProvider, IndexOptions};
use cc_retrieval::{
    apply_definition_first_boost, classify, rescore, sort_desc, Candidate, Intent, Profile, QueryEngine,
    RescoreContext, SearchOptions,
};
use tempfile::TempDir;

fn make_chunk(relative_path: &str, content: &str) -> Chunk {
    Chunk {
        id: ChunkId::new_random(),
        absolute_path: PathBuf::from(relative_path),
        relative_path: relative_path.to_string(),
        start_line: 1,
        end_line: content.lines().count().max(1) as u32,
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
        component_name: None,
        complexity: None,
        embedding: None,
    }
}

fn empty_ctx<'a>(
    query: &'a str,
    tokens: Vec<String>,
    intent: Intent,
    centrality: &'a HashMap<String, f64>,
    rising: &'a HashSet<String>,
    declining: &'a HashSet<String>,
    pattern_warnings: &'a HashMap<String, String>,
) -> RescoreContext<'a> {
    RescoreContext {
        query,
        query_tokens: tokens,
        intent,
        profile: Profile::Edit,
        centrality,
        rising,
        declining,
        pattern_warnings,
    }
}

/// S1 — a query matching a class name exactly outranks a test file that
/// merely imports and describes that class.
#[test]
fn exact_name_outranks_test_file() {
    let tmp = TempDir::new().unwrap();
    create_project(tmp.path());

    let analyzer = FixtureAnalyzer;
    let embedder = HashEmbeddingProvider::new(32);
    index(tmp.path(), &analyzer, &embedder, "e2e", &IndexOptions::default()).unwrap();

    let mut engine = QueryEngine::open(tmp.path(), &analyzer, &embedder, "e2e", None).unwrap();
    let options = SearchOptions {
        use_semantic_search: false,
        ..SearchOptions::default()
    };
    let response = engine.search("AuthService", &options).unwrap();

    assert!(!response.results.is_empty());
    assert!(response.results[0].path.ends_with("auth.service.ts"));
    assert!(!response.results[0].path.contains(".test."));
}

/// S2 — under FLOW intent, a guard (service-shaped) component outranks a
/// plain data-model chunk once both reach the rescoring stage at the same
/// starting score.
#[test]
fn flow_intent_favors_service_shaped_component() {
    let mut guard = make_chunk("src/login.guard.ts", "export class LoginGuard { handleLogin() {} }");
    guard.component_type = Some("guard".to_string());
    guard.layer = Some("backend".to_string());

    let model = make_chunk("src/user.model.ts", "export class UserModel { handleLogin = false; }");

    let classified = classify("navigate after login");
    assert_eq!(classified.intent, Intent::Flow);

    let mut candidates = vec![
        Candidate { chunk: &model, score: 0.7 },
        Candidate { chunk: &guard, score: 0.7 },
    ];
    let centrality = HashMap::new();
    let rising = HashSet::new();
    let declining = HashSet::new();
    let pattern_warnings = HashMap::new();
    let ctx = empty_ctx(
        "navigate after login",
        vec!["navigate".into(), "login".into()],
        classified.intent,
        &centrality,
        &rising,
        &declining,
        &pattern_warnings,
    );
    rescore(&mut candidates, &ctx);
    sort_desc(&mut candidates);

    assert_eq!(candidates[0].chunk.relative_path, "src/login.guard.ts");
}

/// S3 — the chunk that defines a symbol outranks one that merely calls it,
/// once the definition-first boost fires for an EXACT_NAME query.
#[test]
fn definition_first_boost_outranks_a_mere_caller() {
    let mut definition = make_chunk("src/data.service.ts", "export class DataService { getData() { return 1; } }");
    definition.symbol_path = Some(vec!["DataService".into()]);

    let caller = make_chunk("src/data.controller.ts", "export class DataController { run() { return getData(); } }");

    let mut candidates = vec![
        Candidate { chunk: &caller, score: 0.95 },
        Candidate { chunk: &definition, score: 0.90 },
    ];
    apply_definition_first_boost(&mut candidates, "DataService", Intent::ExactName);

    assert_eq!(candidates[0].chunk.relative_path, "src/data.service.ts");
}

/// S4 — with both retrieval channels disabled, no candidate is ever
/// collected; the engine must report low confidence rather than a result
/// set it has no basis for, and the rescue pass must not swap in a
/// no-better-off retry.
#[test]
fn no_candidates_stays_low_confidence_through_rescue() {
    let tmp = TempDir::new().unwrap();
    create_project(tmp.path());

    let analyzer = FixtureAnalyzer;
    let embedder = HashEmbeddingProvider::new(32);
    index(tmp.path(), &analyzer, &embedder, "e2e", &IndexOptions::default()).unwrap();

    let mut engine = QueryEngine::open(tmp.path(), &analyzer, &embedder, "e2e", None).unwrap();
    let options = SearchOptions {
        use_semantic_search: false,
        use_lexical_search: false,
        ..SearchOptions::default()
    };
    let response = engine.search("authentication flow", &options).unwrap();

    assert!(response.results.is_empty());
    assert_eq!(response.quality.status, cc_core::QualityStatus::LowConfidence);
    assert!((response.quality.confidence - 0.0).abs() < f64::EPSILON);
    assert!(response.quality.next_steps.is_some());
}
