//! Exegete CLI
//!
//! Seed, search and maintain a passage store from the command line.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use exegete_core::{
    Config, ContextSnippet, DocumentStore, EmbeddingProvider, HybridRetriever, Ingestor,
    RetrievalMethod, VectorStoreKind, build_provider, open_store,
};

/// Exegete - hybrid retrieval over scripture passages and word studies
#[derive(Parser)]
#[command(name = "exegete")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Hybrid vector + keyword retrieval over scripture passages and word studies")]
#[command(long_about = "Exegete embeds passages and Strong's word studies into a document store and \
retrieves them by combining semantic similarity with exact keyword matches.\n\n\
Configuration comes from --config FILE (JSON) or from the environment \
(EMBEDDING_PROVIDER, OPENAI_API_KEY, VECTOR_STORE, ...).")]
struct Cli {
    /// JSON configuration file (defaults to environment variables)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed and load NDJSON seed files ({id, content, metadata} per line)
    Seed {
        /// Seed files, loaded in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Hybrid search for a query
    Search {
        /// Query text
        query: String,
        /// Number of results
        #[arg(short, default_value_t = exegete_core::DEFAULT_TOP_K)]
        k: usize,
        /// Print results as JSON snippets
        #[arg(long)]
        json: bool,
    },

    /// Print a document as JSON
    Get {
        /// Document id
        id: String,
    },

    /// Delete a document (no-op if absent)
    Delete {
        /// Document id
        id: String,
    },

    /// List documents in store order
    List {
        #[arg(long, default_value = "20")]
        limit: usize,
        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Check store liveness
    Health,

    /// Re-embed every stored document with the configured provider
    Reindex {
        /// Documents embedded per page
        #[arg(long, default_value = "32")]
        page_size: usize,
    },
}

fn init_logging(json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load configuration from a file, or from the process environment
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Config::from_env().context("invalid configuration in environment"),
    }
}

/// Refuse writes that would vanish when the process exits
fn ensure_persistent(kind: VectorStoreKind, command: &str) -> anyhow::Result<()> {
    if kind == VectorStoreKind::Memory {
        anyhow::bail!(
            "`{}` against the memory store is lost when exegete exits; \
             set VECTOR_STORE=local-index (or \"store.kind\" in --config)",
            command
        );
    }
    Ok(())
}

struct App {
    config: Config,
    embeddings: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn DocumentStore>,
}

impl App {
    fn open(config: Config) -> anyhow::Result<Self> {
        let embeddings = build_provider(&config.embedding)?;
        let store = open_store(&config.store, embeddings.clone())?;
        Ok(Self {
            config,
            embeddings,
            store,
        })
    }

    fn ingestor(&self) -> Ingestor {
        Ingestor::new(self.store.clone(), self.embeddings.clone())
    }

    fn retriever(&self) -> HybridRetriever {
        HybridRetriever::new(
            self.store.clone(),
            self.embeddings.clone(),
            self.config.retrieval.clone(),
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let config = load_config(cli.config.as_deref())?;
    tracing::info!(
        provider = %config.embedding.provider,
        model = %config.embedding.model,
        store = %config.store.kind,
        "Exegete v{} starting",
        exegete_core::VERSION
    );
    match &cli.command {
        Commands::Seed { .. } => ensure_persistent(config.store.kind, "seed")?,
        Commands::Reindex { .. } => ensure_persistent(config.store.kind, "reindex")?,
        _ => {}
    }
    let app = App::open(config)?;

    match cli.command {
        Commands::Seed { files } => run_seed(&app, &files).await,
        Commands::Search { query, k, json } => run_search(&app, &query, k, json).await,
        Commands::Get { id } => run_get(&app, &id).await,
        Commands::Delete { id } => run_delete(&app, &id).await,
        Commands::List { limit, offset } => run_list(&app, limit, offset).await,
        Commands::Health => run_health(&app).await,
        Commands::Reindex { page_size } => run_reindex(&app, page_size).await,
    }
}

async fn run_seed(app: &App, files: &[PathBuf]) -> anyhow::Result<()> {
    let ingestor = app.ingestor();
    println!("{}", "=== Seeding ===".cyan().bold());

    for file in files {
        let report = ingestor
            .seed_file(file)
            .await
            .with_context(|| format!("failed to seed {}", file.display()))?;
        println!(
            "{} {}: {} added, {} skipped, {} malformed",
            "✓".green(),
            file.display(),
            report.added,
            report.skipped,
            report.malformed
        );
    }
    Ok(())
}

fn method_label(method: RetrievalMethod) -> colored::ColoredString {
    match method {
        RetrievalMethod::Hybrid => "hybrid".green(),
        RetrievalMethod::Vector => "vector".cyan(),
        RetrievalMethod::Keyword => "keyword".yellow(),
    }
}

async fn run_search(app: &App, query: &str, k: usize, json: bool) -> anyhow::Result<()> {
    let retrieval = app.retriever().retrieve_detailed(query, k).await?;

    if json {
        let snippets: Vec<ContextSnippet> = retrieval
            .results
            .iter()
            .map(ContextSnippet::from_result)
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "sources": snippets,
                "degraded": retrieval.degraded,
            }))?
        );
        return Ok(());
    }

    if let Some(degraded) = &retrieval.degraded {
        println!("{}: {:?}", "Degraded".yellow().bold(), degraded);
    }
    if retrieval.results.is_empty() {
        println!("{}", "No results".white());
        return Ok(());
    }
    for (rank, hit) in retrieval.results.iter().enumerate() {
        let snippet = ContextSnippet::from_result(hit);
        println!(
            "{:>2}. {} {:.3} [{}]",
            rank + 1,
            hit.document.id.white().bold(),
            hit.score,
            method_label(hit.retrieval_method)
        );
        println!("    {}", snippet.preview);
    }
    Ok(())
}

async fn run_get(app: &App, id: &str) -> anyhow::Result<()> {
    match app.store.get_document(id).await? {
        Some(doc) => {
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(())
        }
        None => anyhow::bail!("document not found: {}", id),
    }
}

async fn run_delete(app: &App, id: &str) -> anyhow::Result<()> {
    app.store.delete_document(id).await?;
    println!("{} deleted {}", "✓".green(), id);
    Ok(())
}

async fn run_list(app: &App, limit: usize, offset: usize) -> anyhow::Result<()> {
    let documents = app.store.list_documents(limit, offset).await?;
    for doc in &documents {
        let preview: String = doc.content.chars().take(60).collect();
        println!("{}  {}", doc.id.white().bold(), preview);
    }
    println!("{} {}", documents.len().to_string().cyan(), "documents".white());
    Ok(())
}

async fn run_health(app: &App) -> anyhow::Result<()> {
    println!("{}", "=== Exegete Health Check ===".cyan().bold());
    println!();

    let healthy = app.store.health().await;
    let status = if healthy {
        "HEALTHY".green().bold()
    } else {
        "UNAVAILABLE".red().bold()
    };
    println!("{}: {}", "Store".white().bold(), status);
    println!("{}: {}", "Backend".white(), app.config.store.kind);
    println!(
        "{}: {} ({}d)",
        "Embedding Model".white(),
        app.embeddings.model_name(),
        app.embeddings.dimensions()
    );

    if !healthy {
        anyhow::bail!("store health check failed");
    }
    Ok(())
}

async fn run_reindex(app: &App, page_size: usize) -> anyhow::Result<()> {
    let report = app.ingestor().reindex(page_size).await?;
    println!(
        "{} re-embedded {} of {} documents ({} skipped)",
        "✓".green(),
        report.added,
        report.parsed,
        report.skipped
    );
    Ok(())
}
