//! Decoding of the inference endpoint's response body.
//!
//! The feature-extraction route answers a single input either with a flat
//! `[f32, ...]` or with a one-element batch `[[f32, ...]]`. Both shapes are
//! normalised to a flat vector.

use serde::Deserialize;
use tracing::warn;

use moviedb_core::{Error, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingResponse {
    Flat(Vec<f32>),
    Nested(Vec<Vec<f32>>),
}

impl EmbeddingResponse {
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| Error::Decode(format!("embedding body is not a float array: {e}")))
    }

    /// Flat responses come back unchanged; nested ones yield their first row.
    pub fn into_vector(self) -> Result<Vec<f32>> {
        match self {
            EmbeddingResponse::Flat(v) => Ok(v),
            EmbeddingResponse::Nested(rows) => {
                if rows.len() > 1 {
                    warn!(rows = rows.len(), "nested embedding response has extra rows; using the first");
                }
                rows.into_iter()
                    .next()
                    .ok_or_else(|| Error::Decode("nested embedding response is empty".to_string()))
            }
        }
    }
}
