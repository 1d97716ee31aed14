use async_trait::async_trait;
use futures::{pin_mut, Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use mongodb::bson::{doc, Bson, Document};
use mongodb::Collection;
use tracing::{info, instrument, warn};

use moviedb_core::{Embedder, Error, Result, Settings};

use crate::pipeline::vector_to_bson;
use crate::store::{classify, MovieStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillOptions {
    /// Text field fed to the embedder (e.g. `plot`).
    pub source_field: String,
    /// Top-level field receiving the embedding.
    pub vector_path: String,
    /// Documents embedded concurrently.
    pub concurrency: usize,
    pub limit: Option<u64>,
    pub show_progress: bool,
}

impl BackfillOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            source_field: settings.backfill.source_field.clone(),
            vector_path: settings.search.vector_path.clone(),
            concurrency: settings.backfill.concurrency,
            limit: settings.backfill.limit,
            show_progress: settings.backfill.show_progress,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_field.trim().is_empty() || self.vector_path.trim().is_empty() {
            return Err(Error::Configuration("backfill source and target fields must be set".to_string()));
        }
        if self.vector_path.contains('.') {
            return Err(Error::Configuration(format!(
                "backfill writes top-level fields only, got '{}'",
                self.vector_path
            )));
        }
        if self.concurrency == 0 {
            return Err(Error::Configuration("backfill concurrency must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Documents with usable source text and no embedding yet.
    pub fn pending_filter(&self) -> Document {
        doc! {
            self.source_field.as_str(): { "$type": "string", "$ne": "" },
            self.vector_path.as_str(): { "$exists": false },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub scanned: usize,
    pub embedded: usize,
    pub failed: usize,
}

/// Destination of backfilled documents.
#[async_trait]
pub trait DocumentWriter: Send + Sync {
    /// Overwrite the stored document whose `_id` is `id`.
    async fn replace(&self, id: Bson, doc: Document) -> Result<()>;
}

#[async_trait]
impl DocumentWriter for Collection<Document> {
    async fn replace(&self, id: Bson, doc: Document) -> Result<()> {
        self.replace_one(doc! { "_id": id }, doc).await.map_err(classify)?;
        Ok(())
    }
}

/// Compute and store embeddings for every document still missing one.
///
/// Selection is field-driven: a document is pending while the target field
/// is absent, so re-running resumes where the previous run stopped and
/// retries earlier failures. Each document is written independently with
/// `replace_one`; one failure never aborts the batch.
#[instrument(skip(store, embedder), fields(embedder_id = embedder.embedder_id()))]
pub async fn backfill_embeddings(
    store: &MovieStore,
    embedder: &dyn Embedder,
    options: &BackfillOptions,
) -> Result<BackfillReport> {
    options.validate()?;
    let collection = store.collection();
    let filter = options.pending_filter();

    let pending = collection.count_documents(filter.clone()).await.map_err(classify)?;
    let expected = options.limit.map_or(pending, |l| l.min(pending));
    info!(pending, expected, dim = ?embedder.dim(), "starting embedding backfill");
    if expected == 0 {
        return Ok(BackfillReport::default());
    }

    let find = collection.find(filter);
    let cursor = match options.limit {
        Some(limit) => find.limit(i64::try_from(limit).unwrap_or(i64::MAX)).await,
        None => find.await,
    }
    .map_err(classify)?;

    let docs = cursor.map(|item| item.map_err(classify));
    embed_documents(docs, expected, collection, embedder, options).await
}

/// Embed and write back every document of `docs`.
///
/// `expected` only sizes the progress bar. Failed documents, including
/// stream items that are errors, are counted and logged.
pub async fn embed_documents<S>(
    docs: S,
    expected: u64,
    writer: &dyn DocumentWriter,
    embedder: &dyn Embedder,
    options: &BackfillOptions,
) -> Result<BackfillReport>
where
    S: Stream<Item = Result<Document>>,
{
    options.validate()?;
    let pb = if options.show_progress { ProgressBar::new(expected) } else { ProgressBar::hidden() };
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} movies ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let results = docs
        .map(|item| async move { embed_one(writer, embedder, item?, options).await })
        .buffer_unordered(options.concurrency);
    pin_mut!(results);

    let mut report = BackfillReport::default();
    while let Some(outcome) = results.next().await {
        report.scanned += 1;
        match outcome {
            Ok(()) => report.embedded += 1,
            Err(e) => {
                report.failed += 1;
                warn!(error = %e, "document left without embedding");
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");
    info!(scanned = report.scanned, embedded = report.embedded, failed = report.failed, "backfill finished");
    Ok(report)
}

async fn embed_one(
    writer: &dyn DocumentWriter,
    embedder: &dyn Embedder,
    mut doc: Document,
    options: &BackfillOptions,
) -> Result<()> {
    let id = doc
        .get("_id")
        .cloned()
        .ok_or_else(|| Error::Decode("document without _id".to_string()))?;
    let text = doc
        .get_str(&options.source_field)
        .map_err(|e| Error::Decode(format!("{} {}: {e}", options.source_field, describe(&id))))?
        .to_owned();

    let vector = embedder.embed(&text).await?;
    doc.insert(options.vector_path.clone(), vector_to_bson(&vector));
    writer.replace(id, doc).await
}

fn describe(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}
