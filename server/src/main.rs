use anyhow::Result;
use axum::Router;
use clap::Parser;
use docsearch_core::SearchConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use server::build_app;
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// searchindex.js, raw .json index, or compiled snapshot directory
    #[arg(long, default_value = "./_build/html/searchindex.js")]
    index: PathBuf,
    /// JSON search config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Use Sphinx settings (stemming + stopwords) when no config file is given
    #[arg(long, default_value_t = false)]
    sphinx: bool,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => SearchConfig::from_file(path)?,
        None if args.sphinx => SearchConfig::sphinx(),
        None => SearchConfig::default(),
    };
    let app: Router = build_app(args.index.clone(), config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, index = %args.index.display(), "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
