use tracing::{info, instrument, warn};

use moviedb_core::{Embedder, MovieStream, Result, SearchOptions, VectorSearcher};

/// Text query in, ranked movies out: `embed` then `search`, nothing between.
pub struct SemanticSearch<VS>
where
    VS: VectorSearcher,
{
    embedder: Box<dyn Embedder>,
    searcher: VS,
    options: SearchOptions,
}

impl<VS> SemanticSearch<VS>
where
    VS: VectorSearcher,
{
    pub fn new(embedder: Box<dyn Embedder>, searcher: VS, options: SearchOptions) -> Self {
        Self { embedder, searcher, options }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Give back the searcher so the caller can release it.
    pub fn into_searcher(self) -> VS {
        self.searcher
    }

    /// Errors from either stage propagate untouched; if embedding fails the
    /// store is never queried.
    #[instrument(skip(self), fields(embedder = self.embedder.embedder_id()))]
    pub async fn search_by_text(&self, query: &str) -> Result<MovieStream> {
        self.search_with(query, &self.options).await
    }

    /// Same as [`Self::search_by_text`] with per-call options.
    pub async fn search_with(&self, query: &str, options: &SearchOptions) -> Result<MovieStream> {
        let query_vector = self
            .embedder
            .embed(query)
            .await
            .inspect_err(|e| warn!(status = ?e.status(), error = %e, "query embedding failed"))?;
        info!(dim = query_vector.len(), limit = options.limit, "query embedded");
        self.searcher.search(&query_vector, options).await
    }
}
