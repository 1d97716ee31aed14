use async_trait::async_trait;

use crate::error::Result;
use crate::types::{MovieStream, SearchOptions};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `hf:BAAI/bge-small-en-v1.5`).
    fn embedder_id(&self) -> &str;
    /// Expected dimensionality, when the provider knows it up front.
    fn dim(&self) -> Option<usize>;
    /// Compute one embedding. Every call recomputes; nothing is cached.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait VectorSearcher: Send + Sync {
    async fn search(&self, query_vector: &[f32], options: &SearchOptions) -> Result<MovieStream>;
}
