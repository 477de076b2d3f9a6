use std::fs;

use cc_bench::fixture::{create_project, FixtureAnalyzer};
use cc_indexer::{index, HashEmbeddingProvider, IndexOptions};
use cc_retrieval::QueryEngine;
use tempfile::TempDir;

/// P4 — running an incremental build with nothing changed returns the same
/// stats as the build it followed.
#[test]
fn incremental_no_op_preserves_stats() {
    let tmp = TempDir::new().unwrap();
    create_project(tmp.path());

    let analyzer = FixtureAnalyzer;
    let embedder = HashEmbeddingProvider::new(32);
    let full = index(tmp.path(), &analyzer, &embedder, "e2e", &IndexOptions::default()).unwrap();
    assert!(!full.incremental);

    let options = IndexOptions { incremental_only: true };
    let no_op = index(tmp.path(), &analyzer, &embedder, "e2e", &options).unwrap();

    assert_eq!(no_op.total_chunks, full.total_chunks);
    assert_eq!(no_op.total_files, full.total_files);
    assert_eq!(no_op.indexed_files, full.indexed_files);
}

/// An incremental rebuild after editing a single file is reflected by a
/// subsequent search, and a file untouched by the edit keeps returning the
/// same path.
#[test]
fn incremental_update_is_visible_to_search() {
    let tmp = TempDir::new().unwrap();
    create_project(tmp.path());

    let analyzer = FixtureAnalyzer;
    let embedder = HashEmbeddingProvider::new(32);
    index(tmp.path(), &analyzer, &embedder, "e2e", &IndexOptions::default()).unwrap();

    fs::write(
        tmp.path().join("src/auth.service.ts"),
        r#"
import { UserRepository } from './user.repository';

export class AuthService {
    constructor(private repo: UserRepository) {}

    login(user: string, password: string): boolean {
        return this.repo.verify(user, password);
    }

    refreshSession(token: string): string {
        return token;
    }
}
"#,
    )
    .unwrap();

    let options = IndexOptions { incremental_only: true };
    let stats = index(tmp.path(), &analyzer, &embedder, "e2e", &options).unwrap();
    assert!(stats.incremental);

    let mut engine = QueryEngine::open(tmp.path(), &analyzer, &embedder, "e2e", None).unwrap();
    let refs = engine.find_symbol_references("refreshSession", 10).unwrap();

    assert_eq!(refs.usage_count, 1);
    assert!(refs.references[0].path.ends_with("auth.service.ts"));

    let status = engine.get_indexing_status();
    assert!(matches!(status, cc_retrieval::IndexingStatus::Ready { .. }));
}
