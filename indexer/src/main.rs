use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docsearch_core::persist::{open_index, save_snapshot, IndexPaths};
use docsearch_core::{Engine, SearchConfig, SearchResult};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "docsearch")]
#[command(about = "Query and compile documentation search indexes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a searchindex.js (or raw .json) file and cache it as a snapshot directory
    Compile {
        /// Input searchindex.js or .json file
        #[arg(long)]
        input: PathBuf,
        /// Output snapshot directory
        #[arg(long)]
        output: PathBuf,
    },
    /// Run a query against an index file or snapshot directory
    Query {
        /// searchindex.js, .json file, or compiled snapshot directory
        #[arg(long)]
        index: PathBuf,
        /// Free-text query; prefix a word with '-' to exclude it
        query: String,
        /// Maximum number of results to print
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// JSON search config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Use Sphinx settings (stemming + stopwords) when no config file is given
        #[arg(long, default_value_t = false)]
        sphinx: bool,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print document, term and object counts
    Stats {
        #[arg(long)]
        index: PathBuf,
    },
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    query: &'a str,
    total_hits: usize,
    results: &'a [SearchResult],
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { input, output } => compile(&input, &output),
        Commands::Query { index, query, k, config, sphinx, json } => {
            let config = match config {
                Some(path) => SearchConfig::from_file(&path)
                    .with_context(|| format!("reading config {}", path.display()))?,
                None if sphinx => SearchConfig::sphinx(),
                None => SearchConfig::default(),
            };
            run_query(&index, &query, k, config, json)
        }
        Commands::Stats { index } => stats(&index),
    }
}

fn compile(input: &Path, output: &Path) -> Result<()> {
    let snapshot = open_index(input).with_context(|| format!("loading {}", input.display()))?;
    let meta = save_snapshot(&IndexPaths::new(output), &snapshot)?;
    tracing::info!(
        num_docs = meta.num_docs,
        num_terms = meta.num_terms,
        num_objects = meta.num_objects,
        output = %output.display(),
        "snapshot compiled"
    );
    Ok(())
}

fn run_query(index: &Path, query: &str, k: usize, config: SearchConfig, json: bool) -> Result<()> {
    let engine = Engine::new(config)?;
    engine.load_index(open_index(index).with_context(|| format!("loading {}", index.display()))?)?;
    let results = engine.search(query)?;
    let shown = &results[..results.len().min(k)];

    if json {
        let out = QueryOutput { query, total_hits: results.len(), results: shown };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    println!("{} hit(s) for {query:?}", results.len());
    for r in shown {
        println!("{:>7.2}  {}  ({})", r.score, r.document.title, r.document.name);
        for obj in &r.objects {
            println!("           {} [{}]", obj.name, obj.category);
        }
    }
    Ok(())
}

fn stats(index: &Path) -> Result<()> {
    let snapshot = open_index(index).with_context(|| format!("loading {}", index.display()))?;
    println!("documents:   {}", snapshot.num_docs());
    println!("terms:       {}", snapshot.num_terms());
    println!("title terms: {}", snapshot.num_title_terms());
    println!("objects:     {}", snapshot.num_objects());
    Ok(())
}
