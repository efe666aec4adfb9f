use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;

use resumedb_cli::{build_app, init_tracing, AppState};
use resumedb_core::config::{resolve_with_base, Config};
use resumedb_embed::default_embedder;
use resumedb_llm::completer_from_config;
use resumedb_match::ResumeMatcher;
use resumedb_vector::VectorStore;

#[derive(Parser)]
#[command(about = "Serve resume matching over HTTP")]
struct Args {
    /// Index directory (defaults to index.dir)
    #[arg(long)]
    index: Option<String>,
    /// Host to bind (defaults to server.host)
    #[arg(long)]
    host: Option<String>,
    /// Port to bind (defaults to server.port)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = Config::load()?;
    let settings = config.settings()?;

    let index_arg = args.index.as_deref().unwrap_or(&settings.index.dir);
    let index_dir = resolve_with_base(&std::env::current_dir()?, index_arg);
    let store = VectorStore::load(&index_dir, settings.search)
        .with_context(|| format!("loading index from {}", index_dir.display()))?;
    let embedder = default_embedder(&settings.embedding, store.dim())?;
    let completer = completer_from_config(&settings.llm)?;
    let matcher = ResumeMatcher::new(Arc::new(store), embedder, completer)?
        .with_policies(settings.ranking, settings.scoring);

    let state = AppState {
        matcher: Arc::new(matcher),
        llm_backend: settings.llm.backend.as_str().to_string(),
        default_top_k: settings.ranking.default_top_k,
        request_timeout: Duration::from_secs(settings.server.request_timeout_secs.max(1)),
        cors_origins: settings.server.cors_origins.clone(),
    };
    let app = build_app(state);

    let host = args.host.unwrap_or(settings.server.host);
    let port = args.port.unwrap_or(settings.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, env = config.env_name(), "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
