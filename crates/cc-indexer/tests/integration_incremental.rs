use std::fs;

use cc_indexer::{index, HashEmbeddingProvider, IndexOptions, WholeFileAnalyzer};
use tempfile::TempDir;

fn create_fixture(root: &std::path::Path) {
    let src = root.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(
        src.join("main.py"),
        "class UserService:\n    def create_user(self, name):\n        return {\"name\": name}\n",
    )
    .unwrap();
    fs::write(
        src.join("utils.py"),
        "def format_name(name):\n    return name.strip().title()\n",
    )
    .unwrap();
}

#[test]
fn incremental_rebuild_reflects_a_modified_file() {
    let tmp = TempDir::new().unwrap();
    create_fixture(tmp.path());

    let analyzer = WholeFileAnalyzer;
    let embedder = HashEmbeddingProvider::new(16);
    let full = index(tmp.path(), &analyzer, &embedder, "test", &IndexOptions::default()).unwrap();
    assert_eq!(full.total_files, 2);

    fs::write(
        tmp.path().join("src/main.py"),
        "class UserService:\n    def create_user(self, name):\n        return {\"name\": name}\n\ndef new_handler(req):\n    return req\n",
    )
    .unwrap();

    let incremental_stats = index(
        tmp.path(),
        &analyzer,
        &embedder,
        "test",
        &IndexOptions {
            incremental_only: true,
        },
    )
    .unwrap();

    let counters = incremental_stats.incremental.unwrap();
    assert_eq!(counters.changed, 1);
    assert_eq!(counters.added, 0);
    assert_eq!(counters.deleted, 0);
    assert_eq!(counters.unchanged, 1);
    assert_eq!(incremental_stats.total_files, 2);
}

#[test]
fn incremental_rebuild_drops_a_deleted_file() {
    let tmp = TempDir::new().unwrap();
    create_fixture(tmp.path());

    let analyzer = WholeFileAnalyzer;
    let embedder = HashEmbeddingProvider::new(16);
    index(tmp.path(), &analyzer, &embedder, "test", &IndexOptions::default()).unwrap();

    fs::remove_file(tmp.path().join("src/utils.py")).unwrap();

    let incremental_stats = index(
        tmp.path(),
        &analyzer,
        &embedder,
        "test",
        &IndexOptions {
            incremental_only: true,
        },
    )
    .unwrap();

    let counters = incremental_stats.incremental.unwrap();
    assert_eq!(counters.deleted, 1);
    assert_eq!(incremental_stats.total_files, 1);
    assert_eq!(incremental_stats.total_chunks, 1);
}

#[test]
fn incremental_no_op_preserves_counters_and_touches_nothing() {
    let tmp = TempDir::new().unwrap();
    create_fixture(tmp.path());

    let analyzer = WholeFileAnalyzer;
    let embedder = HashEmbeddingProvider::new(16);
    index(tmp.path(), &analyzer, &embedder, "test", &IndexOptions::default()).unwrap();
    let manifest_before = fs::read(tmp.path().join("index-meta.json")).unwrap();

    let stats = index(
        tmp.path(),
        &analyzer,
        &embedder,
        "test",
        &IndexOptions {
            incremental_only: true,
        },
    )
    .unwrap();

    let counters = stats.incremental.unwrap();
    assert_eq!(counters.added, 0);
    assert_eq!(counters.changed, 0);
    assert_eq!(counters.deleted, 0);
    assert_eq!(counters.unchanged, 2);

    let manifest_after = fs::read(tmp.path().join("index-meta.json")).unwrap();
    assert_eq!(manifest_before, manifest_after, "no-op incremental run must not republish the manifest");
}

#[test]
fn convergence_incremental_matches_fresh_full_build() {
    let tmp = TempDir::new().unwrap();
    create_fixture(tmp.path());

    let analyzer = WholeFileAnalyzer;
    let embedder = HashEmbeddingProvider::new(16);
    index(tmp.path(), &analyzer, &embedder, "test", &IndexOptions::default()).unwrap();

    fs::write(
        tmp.path().join("src/main.py"),
        "def only_one_function():\n    pass\n",
    )
    .unwrap();
    fs::write(tmp.path().join("src/extra.py"), "VALUE = 1\n").unwrap();

    let incremental_stats = index(
        tmp.path(),
        &analyzer,
        &embedder,
        "test",
        &IndexOptions {
            incremental_only: true,
        },
    )
    .unwrap();

    let fresh_stats = index(tmp.path(), &analyzer, &embedder, "test", &IndexOptions::default()).unwrap();

    assert_eq!(incremental_stats.total_chunks, fresh_stats.total_chunks);
    assert_eq!(incremental_stats.total_files, fresh_stats.total_files);
}
