use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use cc_core::{
    ArtifactDescriptor, ArtifactHeader, BuildId, BuildManifest, Chunk, Trend, FORMAT_VERSION,
    META_VERSION,
};
use cc_storage::filemanifest::{self, FileManifest, FileRecord};
use cc_storage::intelligence;
use cc_storage::manifest as storage_manifest;
use cc_storage::vector::{VectorEntry, VectorEntryMeta, VectorStore};
use cc_storage::{chunkstore, GoldenFile, IntelligenceSidecar, PatternCategory, PatternEntry};

use crate::analyzer::Analyzer;
use crate::embedding::EmbeddingProvider;
use crate::error::IndexerError;
use crate::lock::BuildLock;
use crate::report::{IncrementalCounters, IndexOptions, Stats};
use crate::scanner::scan_files;

const MAX_FILE_SIZE: u64 = 1_048_576;
const STAGING_DIR: &str = ".staging";
const KEYWORD_STORE_RELATIVE: &str = "index.json";
const VECTOR_STORE_RELATIVE: &str = "index";
const INTELLIGENCE_RELATIVE: &str = "intelligence.json";

/// Run a build against `root`: incremental if a valid prior manifest exists
/// and `options.incremental_only` asks for it, full otherwise (§4.E).
///
/// Takes the root-scoped build lock for the duration of the call, so only
/// one build can be in flight against a given root at a time.
pub fn index(
    root: &Path,
    analyzer: &dyn Analyzer,
    embedder: &dyn EmbeddingProvider,
    tool_version: &str,
    options: &IndexOptions,
) -> Result<Stats, IndexerError> {
    let _lock = BuildLock::acquire(root)?;
    clean_orphan_staging(root)?;

    let previous = storage_manifest::read_manifest(root)
        .ok()
        .filter(|m| storage_manifest::validate(root, m).is_ok());

    match (options.incremental_only, &previous) {
        (true, Some(previous)) => run_incremental(root, analyzer, embedder, tool_version, previous),
        _ => run_full(root, analyzer, embedder, tool_version),
    }
}

/// Remove any `.staging/<build_id>` directories left behind by a crashed
/// build (§4.E: "orphan staging directories are cleaned on next run").
/// Safe to run before allocating this run's own staging directory.
fn clean_orphan_staging(root: &Path) -> Result<(), IndexerError> {
    let dir = root.join(STAGING_DIR);
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if entry.path().is_dir() {
            let _ = fs::remove_dir_all(entry.path());
        }
    }
    Ok(())
}

fn run_full(
    root: &Path,
    analyzer: &dyn Analyzer,
    embedder: &dyn EmbeddingProvider,
    tool_version: &str,
) -> Result<Stats, IndexerError> {
    let start = Instant::now();
    let build_id = BuildId::fresh();
    let staging = root.join(STAGING_DIR).join(build_id.0.to_string());
    fs::create_dir_all(&staging)?;

    let outcome = (|| -> Result<Stats, IndexerError> {
        let scan_result = scan_files(root);
        let (mut chunks, file_records, total_files, indexed_files) =
            analyze_all(root, &scan_result.files, analyzer);
        embed_missing(&mut chunks, embedder)?;

        let header = ArtifactHeader {
            build_id,
            format_version: FORMAT_VERSION,
        };
        let total_chunks = chunks.len();

        write_artifacts(&staging, &chunks, &header, embedder.dimension())?;

        let sidecar = build_intelligence(&chunks, None);
        intelligence::write_atomic(&staging.join(INTELLIGENCE_RELATIVE), &sidecar)?;

        filemanifest::write_atomic(&staging, &FileManifest { files: file_records })?;

        let manifest = build_manifest(build_id, tool_version, embedder.dimension());
        storage_manifest::write_manifest_atomic(&staging, &manifest)?;

        publish_staging(root, &staging, &manifest)?;

        Ok(Stats {
            indexed_files,
            total_chunks,
            total_files,
            duration: start.elapsed(),
            incremental: None,
        })
    })();

    let _ = fs::remove_dir_all(&staging);
    outcome
}

fn run_incremental(
    root: &Path,
    analyzer: &dyn Analyzer,
    embedder: &dyn EmbeddingProvider,
    tool_version: &str,
    previous_manifest: &BuildManifest,
) -> Result<Stats, IndexerError> {
    let start = Instant::now();

    let previous_files = filemanifest::read(root)?;
    let scan_result = scan_files(root);

    let mut current_records = BTreeMap::new();
    for rel_path in &scan_result.files {
        let abs = root.join(rel_path);
        let bytes = match fs::read(&abs) {
            Ok(b) => b,
            Err(_) => continue,
        };
        if bytes.len() as u64 > MAX_FILE_SIZE || is_binary(&bytes) {
            continue;
        }
        current_records.insert(
            normalize_path(rel_path),
            FileRecord::for_content(&bytes, current_unix_seconds()),
        );
    }
    let current_manifest = FileManifest {
        files: current_records,
    };
    let diff = filemanifest::diff(&previous_files, &current_manifest);

    if !diff.has_changes() {
        // Nothing moved: preserve the prior run's counters rather than
        // resetting them to zero, and leave every artifact untouched.
        let prior_chunk_count = chunkstore::load(
            &root.join(&previous_manifest.artifacts.keyword_store_path),
            previous_manifest,
        )
        .map(|chunks| chunks.len())
        .unwrap_or(0);
        return Ok(Stats {
            indexed_files: previous_files.files.len(),
            total_chunks: prior_chunk_count,
            total_files: previous_files.files.len(),
            duration: start.elapsed(),
            incremental: Some(IncrementalCounters {
                added: 0,
                changed: 0,
                deleted: 0,
                unchanged: diff.unchanged.len(),
            }),
        });
    }

    let build_id = BuildId::fresh();
    let staging = root.join(STAGING_DIR).join(build_id.0.to_string());
    fs::create_dir_all(&staging).map_err(|e| IndexerError::IncrementalStagingInfeasible {
        reason: e.to_string(),
    })?;

    let outcome = (|| -> Result<Stats, IndexerError> {
        let prior_chunks = chunkstore::load(
            &root.join(&previous_manifest.artifacts.keyword_store_path),
            previous_manifest,
        )?;

        let changed_or_added: HashSet<String> = diff
            .added
            .iter()
            .chain(diff.changed.iter())
            .cloned()
            .collect();
        let deleted: HashSet<String> = diff.deleted.iter().cloned().collect();

        let kept_chunks: Vec<Chunk> = prior_chunks
            .into_iter()
            .filter(|c| !changed_or_added.contains(&c.relative_path) && !deleted.contains(&c.relative_path))
            .collect();

        let files_to_analyze: Vec<PathBuf> = scan_result
            .files
            .iter()
            .filter(|p| changed_or_added.contains(&normalize_path(p)))
            .cloned()
            .collect();

        let (mut new_chunks, _new_records, _total, analyzed_count) =
            analyze_all(root, &files_to_analyze, analyzer);
        embed_missing(&mut new_chunks, embedder)?;

        let mut combined_chunks = kept_chunks;
        combined_chunks.extend(new_chunks);

        let header = ArtifactHeader {
            build_id,
            format_version: FORMAT_VERSION,
        };
        let total_chunks = combined_chunks.len();
        write_artifacts(&staging, &combined_chunks, &header, embedder.dimension())?;

        let (previous_sidecar, _) =
            intelligence::load_or_default(&root.join(&previous_manifest.artifacts.intelligence_path));
        let sidecar = build_intelligence(&combined_chunks, previous_sidecar.as_ref());
        intelligence::write_atomic(&staging.join(INTELLIGENCE_RELATIVE), &sidecar)?;

        filemanifest::write_atomic(&staging, &current_manifest)?;

        let manifest = build_manifest(build_id, tool_version, embedder.dimension());
        storage_manifest::write_manifest_atomic(&staging, &manifest)?;

        publish_staging(root, &staging, &manifest)?;

        Ok(Stats {
            indexed_files: analyzed_count,
            total_chunks,
            total_files: current_manifest.files.len(),
            duration: start.elapsed(),
            incremental: Some(IncrementalCounters {
                added: diff.added.len(),
                changed: diff.changed.len(),
                deleted: diff.deleted.len(),
                unchanged: diff.unchanged.len(),
            }),
        })
    })();

    let _ = fs::remove_dir_all(&staging);
    outcome
}

fn build_manifest(build_id: BuildId, tool_version: &str, embedding_dimension: usize) -> BuildManifest {
    BuildManifest {
        meta_version: META_VERSION,
        format_version: FORMAT_VERSION,
        build_id,
        generated_at: cc_core::time::now_rfc3339(),
        tool_version: tool_version.to_string(),
        artifacts: ArtifactDescriptor {
            keyword_store_path: KEYWORD_STORE_RELATIVE.to_string(),
            vector_store_path: VECTOR_STORE_RELATIVE.to_string(),
            vector_provider_tag: "usearch".to_string(),
            intelligence_path: INTELLIGENCE_RELATIVE.to_string(),
        },
        embedding_dimension,
    }
}

/// Rename every staged artifact onto its active location, manifest last
/// (§4.E step 5 — the manifest rename is the build's linearization point).
/// Each rename is a single filesystem `rename`, so a crash between two
/// renames leaves a mix of old and new artifact files but never a manifest
/// pointing at a build_id that isn't fully written.
fn publish_staging(root: &Path, staging: &Path, manifest: &BuildManifest) -> Result<(), IndexerError> {
    rename_file(
        &staging.join(&manifest.artifacts.keyword_store_path),
        &root.join(&manifest.artifacts.keyword_store_path),
    )?;

    let staged_vector_dir = staging.join(&manifest.artifacts.vector_store_path);
    let active_vector_dir = root.join(&manifest.artifacts.vector_store_path);
    fs::create_dir_all(&active_vector_dir)?;
    for entry in fs::read_dir(&staged_vector_dir)? {
        let entry = entry?;
        let dest = active_vector_dir.join(entry.file_name());
        rename_file(&entry.path(), &dest)?;
    }

    rename_file(
        &staging.join(&manifest.artifacts.intelligence_path),
        &root.join(&manifest.artifacts.intelligence_path),
    )?;
    rename_file(
        &staging.join(filemanifest::FILE_MANIFEST_FILE),
        &root.join(filemanifest::FILE_MANIFEST_FILE),
    )?;
    rename_file(
        &staging.join(storage_manifest::MANIFEST_FILE),
        &root.join(storage_manifest::MANIFEST_FILE),
    )?;
    Ok(())
}

fn rename_file(from: &Path, to: &Path) -> Result<(), IndexerError> {
    fs::rename(from, to)?;
    Ok(())
}

enum FileOutcome {
    Analyzed {
        chunks: Vec<Chunk>,
        record: (String, FileRecord),
    },
    Skipped,
    Failed,
}

fn analyze_all(
    root: &Path,
    files: &[PathBuf],
    analyzer: &dyn Analyzer,
) -> (Vec<Chunk>, BTreeMap<String, FileRecord>, usize, usize) {
    let now = current_unix_seconds();
    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|rel_path| analyze_one(root, rel_path, analyzer, now))
        .collect();

    let mut chunks = Vec::new();
    let mut records = BTreeMap::new();
    let mut indexed_files = 0usize;
    for outcome in outcomes {
        if let FileOutcome::Analyzed {
            chunks: file_chunks,
            record,
        } = outcome
        {
            indexed_files += 1;
            chunks.extend(file_chunks);
            records.insert(record.0, record.1);
        }
    }
    (chunks, records, files.len(), indexed_files)
}

fn analyze_one(root: &Path, rel_path: &Path, analyzer: &dyn Analyzer, now: i64) -> FileOutcome {
    let rel_str = normalize_path(rel_path);
    let abs_path = root.join(rel_path);
    let content_bytes = match fs::read(&abs_path) {
        Ok(bytes) => bytes,
        Err(_) => return FileOutcome::Failed,
    };
    if content_bytes.len() as u64 > MAX_FILE_SIZE || is_binary(&content_bytes) {
        return FileOutcome::Skipped;
    }
    let content = match String::from_utf8(content_bytes.clone()) {
        Ok(s) => s,
        Err(_) => return FileOutcome::Skipped,
    };
    let chunks = match analyzer.analyze(&rel_str, &abs_path, &content) {
        Ok(c) => c,
        Err(_) => return FileOutcome::Failed,
    };
    let record = FileRecord::for_content(&content_bytes, now);
    FileOutcome::Analyzed {
        chunks,
        record: (rel_str, record),
    }
}

fn embed_missing(chunks: &mut [Chunk], embedder: &dyn EmbeddingProvider) -> Result<(), IndexerError> {
    let needs_embedding: Vec<usize> = chunks
        .iter()
        .enumerate()
        .filter(|(_, c)| c.embedding.is_none())
        .map(|(i, _)| i)
        .collect();
    if needs_embedding.is_empty() {
        return Ok(());
    }
    let texts: Vec<String> = needs_embedding.iter().map(|&i| chunks[i].content.clone()).collect();
    let vectors = embedder.embed_batch(&texts)?;
    for (idx, vector) in needs_embedding.into_iter().zip(vectors) {
        chunks[idx].embedding = Some(vector);
    }
    Ok(())
}

fn write_artifacts(
    staging: &Path,
    chunks: &[Chunk],
    header: &ArtifactHeader,
    dimension: usize,
) -> Result<(), IndexerError> {
    chunkstore::write(&staging.join(KEYWORD_STORE_RELATIVE), *header, chunks)?;

    let mut store = VectorStore::new(dimension)?;
    let entries: Vec<VectorEntry> = chunks
        .iter()
        .filter_map(|chunk| {
            chunk.embedding.as_ref().map(|embedding| VectorEntry {
                meta: VectorEntryMeta {
                    chunk_id: chunk.id,
                    relative_path: chunk.relative_path.clone(),
                    framework: chunk.framework.clone(),
                    component_type: chunk.component_type.clone(),
                    layer: chunk.layer.clone(),
                    language: Some(chunk.language.as_str().to_string()),
                },
                vector: embedding.clone(),
            })
        })
        .collect();
    store.upsert(entries)?;
    store.save(&staging.join(VECTOR_STORE_RELATIVE), header)?;

    Ok(())
}

/// Build the intelligence sidecar from the final chunk set (§4.D). Pattern
/// frequency is counted directly from chunk tags (the tags an analyzer
/// assigns are the only pattern vocabulary this indexer has); trend is
/// derived by comparing each tag's frequency against the previous build's
/// sidecar, defaulting to `Stable` the first time a tag is seen. Each tag is
/// its own category (no cross-tag clustering into alsoDetected — building a
/// real taxonomy of "similar" patterns would need a catalog this crate
/// doesn't have).
fn build_intelligence(chunks: &[Chunk], previous: Option<&IntelligenceSidecar>) -> IntelligenceSidecar {
    let import_graph = build_import_graph(chunks);
    let tag_freq = build_tag_frequency(chunks);
    let previous_freq: BTreeMap<String, u32> = previous
        .map(|p| {
            p.patterns
                .iter()
                .map(|(k, v)| (k.clone(), v.primary.frequency))
                .collect()
        })
        .unwrap_or_default();

    let mut patterns = BTreeMap::new();
    for (tag, frequency) in &tag_freq {
        let frequency = *frequency;
        let trend = match previous_freq.get(tag) {
            Some(&prev) if frequency > prev => Trend::Rising,
            Some(&prev) if frequency < prev => Trend::Declining,
            _ => Trend::Stable,
        };
        let canonical_example_path = chunks
            .iter()
            .filter(|c| c.tags.contains(tag))
            .map(|c| c.relative_path.clone())
            .min();
        let guidance = if trend == Trend::Declining {
            Some(format!("{tag} usage is declining in this codebase"))
        } else {
            None
        };
        patterns.insert(
            tag.clone(),
            PatternCategory {
                primary: PatternEntry {
                    name: tag.clone(),
                    frequency,
                    trend,
                    canonical_example_path,
                    guidance,
                },
                also_detected: Vec::new(),
            },
        );
    }

    let golden_files = compute_golden_files(&import_graph);

    IntelligenceSidecar {
        patterns,
        import_graph,
        golden_files,
    }
}

fn build_tag_frequency(chunks: &[Chunk]) -> BTreeMap<String, u32> {
    let mut freq = BTreeMap::new();
    for chunk in chunks {
        for tag in &chunk.tags {
            *freq.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    freq
}

/// Resolve each chunk's `imports` against the set of relative paths in this
/// build, keeping only targets that resolve to a file in the repo (§3
/// import graph is "internal only"). Resolution is by file stem: an import
/// like `./Button` or `components/Button` matches `src/components/Button.tsx`
/// because `Button` is the last path segment before any extension. External
/// imports (package names with no matching stem) are dropped.
fn build_import_graph(chunks: &[Chunk]) -> BTreeMap<String, Vec<String>> {
    let mut stems: BTreeMap<String, String> = BTreeMap::new();
    for chunk in chunks {
        stems.insert(file_stem_lower(&chunk.relative_path), chunk.relative_path.clone());
    }

    let mut graph: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for chunk in chunks {
        let mut targets = Vec::new();
        for import in &chunk.imports {
            if let Some(target) = resolve_import(import, &stems) {
                if target != chunk.relative_path && !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        if !targets.is_empty() {
            graph
                .entry(chunk.relative_path.clone())
                .or_default()
                .extend(targets);
        }
    }
    graph
}

fn file_stem_lower(relative_path: &str) -> String {
    let last_segment = relative_path.rsplit('/').next().unwrap_or(relative_path);
    last_segment.split('.').next().unwrap_or(last_segment).to_lowercase()
}

fn resolve_import(import: &str, stems: &BTreeMap<String, String>) -> Option<String> {
    let last_segment = import.trim_end_matches('/').rsplit('/').next().unwrap_or(import);
    let stem = last_segment.split('.').next().unwrap_or(last_segment).to_lowercase();
    stems.get(&stem).cloned()
}

/// Rank files by normalized import in-degree and keep the top 10 (§3 golden
/// files). Uses the same centrality formula the retriever applies at query
/// time so the sidecar's own ranking is self-consistent.
fn compute_golden_files(import_graph: &BTreeMap<String, Vec<String>>) -> Vec<GoldenFile> {
    let mut in_degree: BTreeMap<String, u32> = BTreeMap::new();
    for targets in import_graph.values() {
        for target in targets {
            *in_degree.entry(target.clone()).or_insert(0) += 1;
        }
    }
    let max = in_degree.values().copied().max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }
    let mut golden: Vec<GoldenFile> = in_degree
        .into_iter()
        .map(|(path, degree)| GoldenFile {
            path,
            score: degree as f64 / max as f64,
        })
        .collect();
    golden.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap().then_with(|| a.path.cmp(&b.path)));
    golden.truncate(10);
    golden
}

fn is_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(8000).any(|&b| b == 0)
}

fn normalize_path(p: &Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}

fn current_unix_seconds() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
