use async_trait::async_trait;
use futures::StreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::error::ErrorKind;
use mongodb::{Client, Collection};
use tracing::{debug, info, instrument};

use moviedb_core::{Error, Movie, MovieStream, Result, SearchOptions, Settings, VectorSearcher};

use crate::pipeline::vector_search_pipeline;

/// Map driver failures onto the connection / query split.
pub(crate) fn classify(err: mongodb::error::Error) -> Error {
    match err.kind.as_ref() {
        ErrorKind::Authentication { .. }
        | ErrorKind::ServerSelection { .. }
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::Io(_) => Error::Connection(err.to_string()),
        _ => Error::Query(err.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStatus {
    pub total: u64,
    pub with_embedding: u64,
}

impl CatalogStatus {
    pub fn missing(&self) -> u64 {
        self.total.saturating_sub(self.with_embedding)
    }
}

/// Owned handle on the movies collection. Open once, share by reference,
/// release with [`MovieStore::shutdown`].
pub struct MovieStore {
    client: Client,
    database: String,
    collection: Collection<Document>,
}

impl MovieStore {
    pub async fn connect(settings: &Settings) -> Result<Self> {
        info!(uri = %settings.redacted_connection_string(), "connecting to document store");
        Self::connect_uri(
            &settings.connection_string(),
            &settings.database.name,
            &settings.database.collection,
        )
        .await
    }

    /// Open and verify the connection with a `ping`.
    pub async fn connect_uri(uri: &str, database: &str, collection: &str) -> Result<Self> {
        let store = Self::from_uri(uri, database, collection).await?;
        store.ping().await?;
        info!(database, collection, "document store ready");
        Ok(store)
    }

    /// Build the handle without contacting any server (SRV lookups aside).
    pub async fn from_uri(uri: &str, database: &str, collection: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        let collection = client.database(database).collection::<Document>(collection);
        Ok(Self { client, database: database.to_string(), collection })
    }

    pub async fn ping(&self) -> Result<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(())
    }

    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }

    /// Count all documents and those already carrying an embedding.
    pub async fn status(&self, vector_path: &str) -> Result<CatalogStatus> {
        let total = self.collection.count_documents(doc! {}).await.map_err(classify)?;
        let with_embedding = self
            .collection
            .count_documents(doc! { vector_path: { "$exists": true } })
            .await
            .map_err(classify)?;
        Ok(CatalogStatus { total, with_embedding })
    }

    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }
}

#[async_trait]
impl VectorSearcher for MovieStore {
    #[instrument(skip(self, query_vector), fields(dim = query_vector.len(), index = %options.index_name))]
    async fn search(&self, query_vector: &[f32], options: &SearchOptions) -> Result<MovieStream> {
        options.validate()?;
        let pipeline = vector_search_pipeline(query_vector, options);
        debug!(
            num_candidates = options.num_candidates,
            limit = options.limit,
            "running $vectorSearch"
        );
        let cursor = self.collection.aggregate(pipeline).await.map_err(classify)?;
        Ok(cursor
            .map(|item| {
                let doc = item.map_err(classify)?;
                bson::from_document::<Movie>(doc).map_err(|e| Error::Decode(e.to_string()))
            })
            .boxed())
    }
}
