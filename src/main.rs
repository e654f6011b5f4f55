use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use docsearch::api::{AppState, create_router};
use docsearch::config::CONFIG;
use docsearch::es_client::EsClient;
use docsearch::indexer::Indexer;
use docsearch::project::{IndexerOptions, Project};
use docsearch::widget::{HtmlSlot, RenderTarget, SearchOutcome, SearchWidget};

#[derive(Parser)]
#[command(name = "docsearch", version, about = "Search and index documentation in Elasticsearch")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one search and print the status and results HTML
    Search {
        text: String,
        /// Overrides SEARCH_ENDPOINT
        #[arg(long)]
        endpoint: Option<String>,
        /// Overrides SITE_BASE_URL
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Apply the configured index actions for a documentation project
    Index {
        #[arg(long, default_value = "foliant.yml")]
        project: PathBuf,
        /// Standalone options file, replacing the project's preprocessor options
        #[arg(long)]
        options: Option<PathBuf>,
        /// Current build target, matched against `targets`
        #[arg(long)]
        target: Option<String>,
        /// Directory chapter paths are relative to (default: <project dir>/src)
        #[arg(long)]
        working_dir: Option<PathBuf>,
    },
    /// Serve the search page and API
    Serve {
        #[arg(long)]
        addr: Option<String>,
        #[arg(long)]
        static_dir: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Bridge log crate -> tracing (so log::info! etc. work)
    tracing_log::LogTracer::init()?;

    match cli.command {
        Command::Search {
            text,
            endpoint,
            base_url,
        } => search(text, endpoint, base_url).await,
        Command::Index {
            project,
            options,
            target,
            working_dir,
        } => index(project, options, target, working_dir).await,
        Command::Serve { addr, static_dir } => serve(addr, static_dir).await,
    }
}

async fn search(
    text: String,
    endpoint: Option<String>,
    base_url: Option<String>,
) -> anyhow::Result<()> {
    let mut config = CONFIG.widget_config();
    if let Some(endpoint) = endpoint {
        config.search_endpoint = endpoint;
    }
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }

    let total = Arc::new(HtmlSlot::new());
    let results = Arc::new(HtmlSlot::new());
    let widget = SearchWidget::new(config, total.clone(), results.clone())
        .context("Failed to build HTTP client")?;

    let outcome = widget.perform_search(&text).await;
    println!("{}", total.inner_html());
    println!("{}", results.inner_html());

    match outcome {
        SearchOutcome::Failed(e) => Err::<(), _>(e).context("Search failed"),
        _ => Ok(()),
    }
}

async fn index(
    project_path: PathBuf,
    options_path: Option<PathBuf>,
    target: Option<String>,
    working_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut project = Project::load(&project_path)
        .with_context(|| format!("Failed to load project {}", project_path.display()))?;

    if let Some(path) = options_path {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read options {}", path.display()))?;
        project.indexer_options = IndexerOptions::from_yaml(&text)?;
    }
    if let Some(dir) = working_dir {
        project.src_dir = dir;
    }

    let client = EsClient::new(None).context("Failed to build HTTP client")?;
    let indexer = Indexer::from_project(client, project)?;
    indexer.apply(target.as_deref()).await?;
    Ok(())
}

async fn serve(addr: Option<String>, static_dir: Option<String>) -> anyhow::Result<()> {
    let addr = addr.unwrap_or_else(|| CONFIG.bind_addr.clone());
    let static_dir = static_dir.unwrap_or_else(|| CONFIG.static_dir.clone());

    let widget_config = CONFIG.widget_config();
    let client = EsClient::new(widget_config.timeout).context("Failed to build HTTP client")?;
    let state = Arc::new(AppState {
        client,
        widget_config,
    });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    log::info!(
        "Serving search on http://{addr}, endpoint: {}",
        state.widget_config.search_endpoint
    );

    axum::serve(listener, create_router(state, &static_dir)).await?;
    Ok(())
}
