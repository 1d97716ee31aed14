//! Text to vector conversion.
//!
//! `HfEmbeddingClient` calls the remote inference endpoint; `FakeEmbedder`
//! is a deterministic local stand-in selected with
//! `embedding.provider = "fake"`.

use tracing::info;

use moviedb_core::config::EmbeddingProvider;
use moviedb_core::{Embedder, Result, Settings};

mod fake;
mod remote;
pub mod response;

pub use fake::FakeEmbedder;
pub use remote::HfEmbeddingClient;
pub use response::EmbeddingResponse;

pub fn get_default_embedder(settings: &Settings) -> Result<Box<dyn Embedder>> {
    match settings.embedding.provider {
        EmbeddingProvider::Fake => {
            info!(dim = settings.embedding.dimensions, "using FakeEmbedder");
            Ok(Box::new(FakeEmbedder::new(settings.embedding.dimensions)))
        }
        EmbeddingProvider::HuggingFace => {
            let client = HfEmbeddingClient::from_settings(settings)?;
            info!(url = client.url(), "using remote embedding endpoint");
            Ok(Box::new(client))
        }
    }
}
