use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;
use mongodb::bson::{doc, Bson, Document};

use moviedb_core::{Embedder, Error, Result};
use moviedb_embed::FakeEmbedder;
use moviedb_vector::{embed_documents, BackfillOptions, BackfillReport, DocumentWriter};

const DIM: usize = 16;
const TARGET: &str = "plot_embedding_hf";

/// Catalog held in memory; `pending` mirrors the server-side filter.
struct InMemoryCatalog {
    docs: Mutex<Vec<Document>>,
}

impl InMemoryCatalog {
    fn new(docs: Vec<Document>) -> Self {
        Self { docs: Mutex::new(docs) }
    }

    fn pending(&self, options: &BackfillOptions) -> Vec<Document> {
        self.docs
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.get_str(&options.source_field).is_ok_and(|s| !s.is_empty()))
            .filter(|d| !d.contains_key(&options.vector_path))
            .cloned()
            .collect()
    }

    fn get(&self, id: i32) -> Document {
        self.docs
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.get("_id") == Some(&Bson::Int32(id)))
            .cloned()
            .expect("document exists")
    }
}

#[async_trait]
impl DocumentWriter for InMemoryCatalog {
    async fn replace(&self, id: Bson, doc: Document) -> Result<()> {
        let mut docs = self.docs.lock().unwrap();
        match docs.iter_mut().find(|d| d.get("_id") == Some(&id)) {
            Some(slot) => {
                *slot = doc;
                Ok(())
            }
            None => Err(Error::Query(format!("no document with _id {id}"))),
        }
    }
}

/// Fails on any text mentioning `poison`, embeds everything else.
struct PickyEmbedder(FakeEmbedder);

#[async_trait]
impl Embedder for PickyEmbedder {
    fn embedder_id(&self) -> &str {
        "picky"
    }
    fn dim(&self) -> Option<usize> {
        self.0.dim()
    }
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains("poison") {
            return Err(Error::RemoteService { status: 503, body: "model loading".to_string() });
        }
        self.0.embed(text).await
    }
}

fn options() -> BackfillOptions {
    BackfillOptions {
        source_field: "plot".into(),
        vector_path: TARGET.into(),
        concurrency: 2,
        limit: None,
        show_progress: false,
    }
}

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new(vec![
        doc! { "_id": 1, "title": "Alien", "plot": "A crew meets a creature in space." },
        doc! { "_id": 2, "title": "Heat", "plot": "A detective hunts a thief." },
        doc! { "_id": 3, "title": "Blank", "plot": "" },
        doc! { "_id": 4, "title": "Untold" },
        doc! { "_id": 5, "title": "Done", "plot": "Already embedded.", TARGET: [0.0, 1.0] },
        doc! { "_id": 6, "title": "Toxic", "plot": "A poison spreads through town." },
    ])
}

async fn run(catalog: &InMemoryCatalog, embedder: &dyn Embedder) -> Result<BackfillReport> {
    let opts = options();
    let pending = catalog.pending(&opts);
    let expected = pending.len() as u64;
    embed_documents(stream::iter(pending.into_iter().map(Ok)), expected, catalog, embedder, &opts).await
}

#[tokio::test]
async fn embeddings_are_written_under_the_target_field() -> anyhow::Result<()> {
    let catalog = catalog();
    let embedder = FakeEmbedder::new(DIM);

    let report = run(&catalog, &embedder).await?;
    assert_eq!(report, BackfillReport { scanned: 3, embedded: 3, failed: 0 });

    let alien = catalog.get(1);
    let stored = alien.get_array(TARGET)?;
    assert_eq!(stored.len(), DIM);
    let expected: Vec<f32> = embedder.embed_sync("A crew meets a creature in space.");
    let actual: Vec<f32> = stored.iter().map(|v| v.as_f64().unwrap_or(f64::NAN) as f32).collect();
    assert_eq!(actual, expected);
    assert_eq!(alien.get_str("title")?, "Alien", "other fields are kept");

    assert!(!catalog.get(3).contains_key(TARGET), "empty plot is skipped");
    assert!(!catalog.get(4).contains_key(TARGET), "missing plot is skipped");
    assert_eq!(catalog.get(5).get_array(TARGET)?.len(), 2, "existing embedding untouched");
    Ok(())
}

#[tokio::test]
async fn failures_are_counted_and_retried_on_the_next_run() -> anyhow::Result<()> {
    let catalog = catalog();

    let first = run(&catalog, &PickyEmbedder(FakeEmbedder::new(DIM))).await?;
    assert_eq!(first, BackfillReport { scanned: 3, embedded: 2, failed: 1 });
    assert!(!catalog.get(6).contains_key(TARGET));

    let still_pending: Vec<Bson> = catalog.pending(&options()).iter().filter_map(|d| d.get("_id").cloned()).collect();
    assert_eq!(still_pending, vec![Bson::Int32(6)], "only the failed document remains");

    let second = run(&catalog, &FakeEmbedder::new(DIM)).await?;
    assert_eq!(second, BackfillReport { scanned: 1, embedded: 1, failed: 0 });
    assert!(catalog.pending(&options()).is_empty());

    let third = run(&catalog, &FakeEmbedder::new(DIM)).await?;
    assert_eq!(third, BackfillReport::default());
    Ok(())
}

#[tokio::test]
async fn bad_documents_and_write_errors_do_not_abort_the_batch() -> anyhow::Result<()> {
    let catalog = InMemoryCatalog::new(vec![doc! { "_id": 1, "plot": "Kept in the catalog." }]);
    let docs = vec![
        Ok(doc! { "_id": 1, "plot": "Kept in the catalog." }),
        Ok(doc! { "plot": "No identifier." }),
        Ok(doc! { "_id": 2, "plot": 42 }),
        Ok(doc! { "_id": 3, "plot": "Not in the catalog." }),
        Err(Error::Connection("cursor lost".into())),
    ];

    let report = embed_documents(stream::iter(docs), 5, &catalog, &FakeEmbedder::new(DIM), &options()).await?;
    assert_eq!(report, BackfillReport { scanned: 5, embedded: 1, failed: 4 });
    assert!(catalog.get(1).contains_key(TARGET));
    Ok(())
}

#[tokio::test]
async fn invalid_options_fail_before_any_document() {
    let catalog = catalog();
    let opts = BackfillOptions { concurrency: 0, ..options() };
    let docs = stream::iter(catalog.pending(&options()).into_iter().map(Ok));
    let err = embed_documents(docs, 3, &catalog, &FakeEmbedder::new(DIM), &opts).await.unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "{err:?}");
    assert!(!catalog.get(1).contains_key(TARGET));
}
