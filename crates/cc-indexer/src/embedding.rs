use crate::error::IndexerError;

/// The embedding-adapter boundary (§6). Dimension is fixed per provider and
/// recorded in the build manifest; a mismatch between a provider's declared
/// dimension and a vector it actually produces is corruption, not a
/// transient failure.
pub trait EmbeddingProvider: Send + Sync {
    fn dimension(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexerError>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexerError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Deterministic stand-in for a real embedding model: hashes the text into
/// a fixed-dimension unit vector. No semantic content whatsoever — this
/// exists purely so the rest of the pipeline (staging, vector store,
/// fusion) has something reproducible to embed against in tests and
/// fixtures, without pulling in a real model.
pub struct HashEmbeddingProvider {
    dimension: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl EmbeddingProvider for HashEmbeddingProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexerError> {
        let mut vector = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return Ok(vector);
        }
        for (index, byte) in text.bytes().enumerate() {
            let slot = index % self.dimension;
            vector[slot] += (byte as f32 + 1.0) * if index % 2 == 0 { 1.0 } else { -1.0 };
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}
