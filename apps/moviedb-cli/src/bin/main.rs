use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::TryStreamExt;
use tracing::info;

use moviedb_cli::render::{write_movie, write_query, write_status, DEFAULT_QUERY};
use moviedb_core::{Config, Settings};
use moviedb_embed::get_default_embedder;
use moviedb_search::SemanticSearch;
use moviedb_vector::{backfill_embeddings, BackfillOptions, MovieStore};

/// Semantic search over the movie catalog.
#[derive(Parser, Debug)]
#[command(name = "moviedb", version, about = "Semantic movie search over MongoDB Atlas")]
struct Cli {
    /// Settings file (defaults to ./moviedb.toml when present).
    #[arg(long, global = true, env = "MOVIEDB_CONFIG")]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find movies whose plot is closest to the query.
    Search {
        #[arg(default_value = DEFAULT_QUERY)]
        query: String,
        #[arg(short, long)]
        limit: Option<u32>,
        /// Candidate pool examined by the index before ranking.
        #[arg(long)]
        num_candidates: Option<u32>,
        /// Vector index name.
        #[arg(long)]
        index: Option<String>,
        /// Field holding the stored embedding.
        #[arg(long)]
        path: Option<String>,
        /// Print the similarity score of each result.
        #[arg(long)]
        score: bool,
    },
    /// Print the embedding of a piece of text.
    Embed { text: String },
    /// Embed every movie that has a plot but no stored embedding yet.
    Backfill {
        #[arg(short, long)]
        limit: Option<u64>,
        #[arg(short, long)]
        concurrency: Option<usize>,
        #[arg(long)]
        no_progress: bool,
    },
    /// Count movies with and without embeddings.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Config::load_from(cli.config.as_deref())
        .and_then(|config| config.settings())
        .context("loading settings")?;

    match cli.command {
        Commands::Search { query, limit, num_candidates, index, path, score } => {
            let options = &mut settings.search;
            if let Some(limit) = limit {
                options.limit = limit;
            }
            if let Some(n) = num_candidates {
                options.num_candidates = n;
            }
            if let Some(index) = index {
                options.index_name = index;
            }
            if let Some(path) = path {
                options.vector_path = path;
            }
            options.include_score |= score;
            options.validate()?;
            run_search(&settings, &query).await?;
        }
        Commands::Embed { text } => {
            let embedder = get_default_embedder(&settings)?;
            let vector = embedder.embed(&text).await?;
            println!("{} dimensions ({})", vector.len(), embedder.embedder_id());
            println!("{}", serde_json::to_string(&vector)?);
        }
        Commands::Backfill { limit, concurrency, no_progress } => {
            if let Some(limit) = limit {
                settings.backfill.limit = Some(limit);
            }
            if let Some(c) = concurrency {
                settings.backfill.concurrency = c;
            }
            settings.backfill.show_progress &= !no_progress;
            run_backfill(&settings).await?;
        }
        Commands::Status => {
            let store = MovieStore::connect(&settings).await?;
            let status = store.status(&settings.search.vector_path).await;
            store.shutdown().await;
            write_status(&mut io::stdout().lock(), &status?, &settings.search.vector_path)?;
        }
    }
    Ok(())
}

async fn run_search(settings: &Settings, query: &str) -> Result<()> {
    let embedder = get_default_embedder(settings)?;
    let store = MovieStore::connect(settings).await?;
    let search = SemanticSearch::new(embedder, store, settings.search.clone());

    let outcome = print_results(&search, query).await;
    search.into_searcher().shutdown().await;
    outcome
}

async fn print_results(search: &SemanticSearch<MovieStore>, query: &str) -> Result<()> {
    let mut out = io::stdout().lock();
    write_query(&mut out, query)?;
    out.flush()?;
    drop(out);

    let mut results = search.search_by_text(query).await?;
    let show_score = search.options().include_score;
    let mut count = 0usize;
    while let Some(movie) = results.try_next().await? {
        write_movie(&mut io::stdout().lock(), &movie, show_score)?;
        count += 1;
    }
    info!(count, "search finished");
    Ok(())
}

async fn run_backfill(settings: &Settings) -> Result<()> {
    let embedder = get_default_embedder(settings)?;
    let store = MovieStore::connect(settings).await?;
    let options = BackfillOptions::from_settings(settings);

    let report = backfill_embeddings(&store, embedder.as_ref(), &options).await;
    store.shutdown().await;
    let report = report?;
    println!(
        "✅ Backfill complete: {} scanned, {} embedded, {} failed",
        report.scanned, report.embedded, report.failed
    );
    Ok(())
}
