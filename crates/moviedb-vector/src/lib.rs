//! MongoDB-backed vector search over the movie catalog.
//!
//! `MovieStore` owns the driver client and implements `VectorSearcher` with a
//! single `$vectorSearch` aggregation. `backfill` populates missing
//! embeddings; `pipeline` builds the aggregation stages.

pub mod backfill;
pub mod pipeline;
pub mod store;

pub use backfill::{backfill_embeddings, embed_documents, BackfillOptions, BackfillReport, DocumentWriter};
pub use store::{CatalogStatus, MovieStore};
