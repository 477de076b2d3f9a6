use std::fs;

use cc_bench::fixture::{add_import_cycle, create_project, FixtureAnalyzer};
use cc_core::{ArtifactHeader, BuildId, FORMAT_VERSION};
use cc_indexer::{index, HashEmbeddingProvider, IndexOptions};
use cc_retrieval::{QueryEngine, Severity};
use tempfile::TempDir;

/// S5 — a build marker stamped with a build_id that no longer matches the
/// manifest is a corrupted index; search transparently rebuilds once and
/// still answers the query instead of surfacing the corruption.
#[test]
fn stale_vector_marker_triggers_auto_heal_then_succeeds() {
    let tmp = TempDir::new().unwrap();
    create_project(tmp.path());

    let analyzer = FixtureAnalyzer;
    let embedder = HashEmbeddingProvider::new(32);
    index(tmp.path(), &analyzer, &embedder, "e2e", &IndexOptions::default()).unwrap();

    let stale_header = ArtifactHeader {
        build_id: BuildId::fresh(),
        format_version: FORMAT_VERSION,
    };
    cc_storage::manifest::write_vector_build_marker_atomic(&tmp.path().join("index"), &stale_header).unwrap();

    let mut engine = QueryEngine::open(tmp.path(), &analyzer, &embedder, "e2e", None).unwrap();
    let response = engine.search("AuthService", &cc_retrieval::SearchOptions::default()).unwrap();

    assert!(!response.results.is_empty());
}

/// S6 — with both a mutual pair and a three-file ring in the import graph,
/// the mutual pair is reported as the more severe, shorter cycle.
#[test]
fn two_cycle_outranks_three_cycle_in_severity() {
    let tmp = TempDir::new().unwrap();
    create_project(tmp.path());
    add_import_cycle(tmp.path());

    let src = tmp.path().join("src");
    fs::write(
        src.join("tri_a.service.ts"),
        r#"
import { TriB } from './tri_b.service';

export class TriA {
    b: any;
}
"#,
    )
    .unwrap();
    fs::write(
        src.join("tri_b.service.ts"),
        r#"
import { TriC } from './tri_c.service';

export class TriB {
    c: any;
}
"#,
    )
    .unwrap();
    fs::write(
        src.join("tri_c.service.ts"),
        r#"
import { TriA } from './tri_a.service';

export class TriC {
    a: any;
}
"#,
    )
    .unwrap();

    let analyzer = FixtureAnalyzer;
    let embedder = HashEmbeddingProvider::new(32);
    index(tmp.path(), &analyzer, &embedder, "e2e", &IndexOptions::default()).unwrap();

    let mut engine = QueryEngine::open(tmp.path(), &analyzer, &embedder, "e2e", None).unwrap();
    let cycles = engine.detect_cycles(None).unwrap();

    assert!(cycles.len() >= 2);
    assert_eq!(cycles[0].nodes.len(), 2);
    assert_eq!(cycles[0].severity, Severity::High);
    assert!(cycles.iter().any(|c| c.nodes.len() == 3 && c.severity == Severity::Medium));
}
