//! Command-line front end.
//!
//! Every call takes the same positional arguments as the library's
//! `invoke` entry points; each argument is parsed as JSON when possible and
//! taken as a plain string otherwise.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sage::{BulkIndexer, Client, DocType, SageConfig};

#[derive(Parser, Debug)]
#[command(name = "sage")]
#[command(about = "Call the Elasticsearch REST API", version)]
struct Args {
    /// Elasticsearch URL (overrides the config file)
    #[arg(long)]
    url: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print JSON on one line
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    target: Target,
}

#[derive(Subcommand, Debug)]
enum Target {
    /// Cluster-level call: health, state, nodes, stats, config, tmpl, untmpl, river, unriver
    Client {
        op: String,
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Index-level or document call
    Index {
        name: String,
        op: String,
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Document call on a type: get, all, find, post, put, del, up, mlt
    Type {
        index: String,
        name: String,
        op: String,
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Bulk-load newline-delimited JSON documents into a type
    Load {
        index: String,
        name: String,
        file: PathBuf,
        /// Batch size for bulk indexing
        #[arg(long, default_value = "500")]
        batch_size: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SageConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SageConfig::default(),
    };
    if let Some(url) = &args.url {
        config.url = url.clone();
    }

    let client = Client::from_config(&config).context("Failed to create client")?;
    info!("Using Elasticsearch at {}", client.uri());

    let output = match args.target {
        Target::Client { op, args } => client.invoke(&op, parse_values(args)).await?,
        Target::Index { name, op, args } => {
            client.index(name).invoke(&op, parse_values(args)).await?
        }
        Target::Type {
            index,
            name,
            op,
            args,
        } => {
            client
                .index(index)
                .doc_type(&name)
                .invoke(&op, parse_values(args))
                .await?
        }
        Target::Load {
            index,
            name,
            file,
            batch_size,
        } => {
            let doc_type = client.index(index).doc_type(&name);
            let (indexed, errors) = load(doc_type, &file, batch_size).await?;
            info!("Indexed {} documents with {} errors", indexed, errors);
            return Ok(());
        }
    };

    let value = output.into_value();
    let rendered = if args.compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    println!("{}", rendered);

    Ok(())
}

fn parse_values(args: Vec<String>) -> Vec<Value> {
    args.into_iter()
        .map(|arg| serde_json::from_str(&arg).unwrap_or(Value::String(arg)))
        .collect()
}

async fn load(doc_type: DocType, file: &Path, batch_size: usize) -> Result<(usize, usize)> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?,
    );
    let mut indexer = BulkIndexer::new(doc_type, batch_size);

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: Value = serde_json::from_str(&line)
            .with_context(|| format!("Invalid JSON on line {}", line_no + 1))?;
        indexer.add(doc).await?;
    }

    Ok(indexer.finish().await?)
}
