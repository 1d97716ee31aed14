use mongodb::bson::{doc, Bson, Document};

use moviedb_core::SearchOptions;

pub fn vector_to_bson(vector: &[f32]) -> Bson {
    Bson::Array(vector.iter().map(|x| Bson::Double(f64::from(*x))).collect())
}

/// Aggregation pipeline for one nearest-neighbour query.
///
/// The `$vectorSearch` stage does all ranking and truncation; the optional
/// `$addFields` stage only exposes the index score on each document.
pub fn vector_search_pipeline(query_vector: &[f32], options: &SearchOptions) -> Vec<Document> {
    let mut pipeline = vec![doc! {
        "$vectorSearch": {
            "queryVector": vector_to_bson(query_vector),
            "path": options.vector_path.as_str(),
            "numCandidates": i64::from(options.num_candidates),
            "limit": i64::from(options.limit),
            "index": options.index_name.as_str(),
        }
    }];
    if options.include_score {
        pipeline.push(doc! { "$addFields": { "score": { "$meta": "vectorSearchScore" } } });
    }
    pipeline
}
