//! Domain types shared by the embedding and vector crates.

use bson::{Bson, Document};
use futures::stream::BoxStream;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Upper bound Atlas accepts for `numCandidates`.
pub const MAX_NUM_CANDIDATES: u32 = 10_000;

/// One catalog item as stored in the movies collection.
///
/// - `id`: opaque `_id`, whatever BSON type the store uses
/// - `title`/`plot`: the text fields rendered to users; absent on some rows,
///   and stored with other scalar types on a few (those are read as text)
/// - `score`: `vectorSearchScore`, only set when the search projected it
/// - `fields`: every other stored field, embedding included, kept verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "_id", default)]
    pub id: Bson,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    #[serde(default, deserialize_with = "lenient_score", skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(flatten)]
    pub fields: Document,
}

impl Movie {
    /// Read the stored embedding at a (possibly dotted) field path.
    ///
    /// Returns `None` when the field is missing, is not an array, or holds a
    /// non-numeric element.
    pub fn embedding(&self, path: &str) -> Option<Vec<f32>> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_document()?.get(segment)?;
        }
        current
            .as_array()?
            .iter()
            .map(|value| match value {
                Bson::Double(v) => Some(*v as f32),
                Bson::Int32(v) => Some(*v as f32),
                Bson::Int64(v) => Some(*v as f32),
                _ => None,
            })
            .collect()
    }
}

/// Strings verbatim, other scalars formatted; null reads as absent.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Bson>::deserialize(deserializer)? {
        None | Some(Bson::Null | Bson::Undefined) => None,
        Some(Bson::String(s)) => Some(s),
        Some(Bson::Int32(v)) => Some(v.to_string()),
        Some(Bson::Int64(v)) => Some(v.to_string()),
        Some(Bson::Double(v)) => Some(v.to_string()),
        Some(Bson::Boolean(v)) => Some(v.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_score<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Bson>::deserialize(deserializer)? {
        Some(Bson::Double(v)) => Some(v),
        Some(Bson::Int32(v)) => Some(f64::from(v)),
        Some(Bson::Int64(v)) => Some(v as f64),
        _ => None,
    })
}

/// Lazy, forward-only result sequence backed by a server-side cursor.
pub type MovieStream = BoxStream<'static, Result<Movie>>;

/// Knobs of a single `$vectorSearch` stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub index_name: String,
    pub vector_path: String,
    pub num_candidates: u32,
    pub limit: u32,
    pub include_score: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            index_name: "PlotSemanticSearch".to_string(),
            vector_path: "plot_embedding_hf".to_string(),
            num_candidates: 100,
            limit: 4,
            include_score: false,
        }
    }
}

impl SearchOptions {
    /// Reject option sets the index would answer with undefined results.
    ///
    /// `num_candidates < limit` is refused rather than clamped.
    pub fn validate(&self) -> Result<()> {
        if self.index_name.trim().is_empty() {
            return Err(Error::Query("index name must not be blank".to_string()));
        }
        if self.vector_path.trim().is_empty() {
            return Err(Error::Query("vector path must not be blank".to_string()));
        }
        if self.limit == 0 {
            return Err(Error::Query("limit must be at least 1".to_string()));
        }
        if self.num_candidates < self.limit {
            return Err(Error::Query(format!(
                "numCandidates ({}) must be >= limit ({})",
                self.num_candidates, self.limit
            )));
        }
        if self.num_candidates > MAX_NUM_CANDIDATES {
            return Err(Error::Query(format!(
                "numCandidates ({}) exceeds the maximum of {}",
                self.num_candidates, MAX_NUM_CANDIDATES
            )));
        }
        Ok(())
    }
}
