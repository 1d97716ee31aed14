//! Hugging Face inference router client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use moviedb_core::{Embedder, Error, Result, Settings};

use crate::response::EmbeddingResponse;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    inputs: &'a str,
}

/// Remote embedder: one `POST {"inputs": text}` per call, bearer-authenticated.
pub struct HfEmbeddingClient {
    client: Client,
    url: String,
    token: String,
    dimensions: Option<usize>,
    id: String,
}

impl HfEmbeddingClient {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        let id = format!("hf:{}", model_name(&url));
        Ok(Self { client, url, token: token.into(), dimensions: None, id })
    }

    /// Reject responses whose length differs from `dimensions`.
    pub fn with_dimensions(mut self, dimensions: Option<usize>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(&settings.embedding.url, &settings.credentials.hugging_face_token)?
            .with_dimensions(Some(settings.embedding.dimensions)))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn model_name(url: &str) -> &str {
    url.split_once("/models/").map_or(url, |(_, model)| model.trim_end_matches('/'))
}

#[async_trait]
impl Embedder for HfEmbeddingClient {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> Option<usize> {
        self.dimensions
    }

    #[instrument(skip(self, text), fields(embedder = %self.id, chars = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&EmbeddingRequest { inputs: text })
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            warn!(status = status.as_u16(), "embedding request failed");
            return Err(Error::RemoteService { status: status.as_u16(), body });
        }

        let body = response.text().await.map_err(|e| Error::Http(e.to_string()))?;
        let vector = EmbeddingResponse::parse(&body)?.into_vector()?;
        if let Some(expected) = self.dimensions {
            if vector.len() != expected {
                return Err(Error::Dimension { expected, actual: vector.len() });
            }
        }
        debug!(dim = vector.len(), "embedding computed");
        Ok(vector)
    }
}
