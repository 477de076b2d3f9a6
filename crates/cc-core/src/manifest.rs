use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Compiled-in meta-schema version. Readers refuse manifests whose
/// `meta_version` differs (§4.A check 1).
pub const META_VERSION: u32 = 1;

/// Compiled-in artifact-format version. Readers refuse manifests or
/// artifacts whose `format_version` differs (§4.A check 2, §8 P3).
pub const FORMAT_VERSION: u32 = 1;

/// Opaque fresh identifier stamped into every artifact of a single build;
/// used to detect cross-build mixing (§8 P1/P2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildId(pub Uuid);

impl BuildId {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for BuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `{build_id, format_version}` pair embedded in every artifact's header, so
/// the validator can check it against the manifest (§3 Build Manifest
/// invariants, §4.A checks 4-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub build_id: BuildId,
    pub format_version: u32,
}

impl ArtifactHeader {
    pub fn matches(&self, manifest: &BuildManifest) -> bool {
        self.build_id == manifest.build_id && self.format_version == manifest.format_version
    }
}

/// Paths (relative to the index root) and provider metadata for each
/// artifact a build produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub keyword_store_path: String,
    pub vector_store_path: String,
    pub vector_provider_tag: String,
    pub intelligence_path: String,
}

/// Authoritative per-build metadata record (§3 Build Manifest).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildManifest {
    pub meta_version: u32,
    pub format_version: u32,
    pub build_id: BuildId,
    pub generated_at: String,
    pub tool_version: String,
    pub artifacts: ArtifactDescriptor,
    /// Embedding dimension recorded so the chunk store and vector store can
    /// validate their own vectors against it (§3 Chunk invariants).
    pub embedding_dimension: usize,
}

impl BuildManifest {
    pub fn header(&self) -> ArtifactHeader {
        ArtifactHeader {
            build_id: self.build_id,
            format_version: self.format_version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_manifest(build_id: BuildId, format_version: u32) -> BuildManifest {
        BuildManifest {
            meta_version: META_VERSION,
            format_version,
            build_id,
            generated_at: crate::time::now_rfc3339(),
            tool_version: "test".to_string(),
            artifacts: ArtifactDescriptor {
                keyword_store_path: "index.json".to_string(),
                vector_store_path: "index/".to_string(),
                vector_provider_tag: "usearch".to_string(),
                intelligence_path: "intelligence.json".to_string(),
            },
            embedding_dimension: 384,
        }
    }

    #[test]
    fn header_matches_same_manifest() {
        let manifest = make_manifest(BuildId::fresh(), FORMAT_VERSION);
        assert!(manifest.header().matches(&manifest));
    }

    #[test]
    fn header_mismatch_on_different_build_id() {
        let manifest = make_manifest(BuildId::fresh(), FORMAT_VERSION);
        let other_header = ArtifactHeader {
            build_id: BuildId::fresh(),
            format_version: FORMAT_VERSION,
        };
        assert!(!other_header.matches(&manifest));
    }

    #[test]
    fn header_mismatch_on_different_format_version() {
        let manifest = make_manifest(BuildId::fresh(), FORMAT_VERSION);
        let stale_header = ArtifactHeader {
            build_id: manifest.build_id,
            format_version: FORMAT_VERSION + 1,
        };
        assert!(!stale_header.matches(&manifest));
    }
}
