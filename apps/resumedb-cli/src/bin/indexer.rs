use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use resumedb_cli::init_tracing;
use resumedb_core::config::{expand_path, Config};
use resumedb_core::data_processor::DataProcessor;
use resumedb_embed::default_embedder;
use resumedb_vector::IndexBuilder;

#[derive(Parser)]
#[command(about = "Chunk, embed and index clean resume/job-description documents")]
struct Args {
    /// A .jsonl file or a directory of .jsonl files
    #[arg(long)]
    input: PathBuf,
    /// Output index directory (defaults to index.dir)
    #[arg(long)]
    index: Option<String>,
    /// Only index the first N documents
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let settings = Config::load()?.settings()?;

    let processor = DataProcessor::new(settings.chunking)?;
    let mut documents = processor.load_documents(&args.input)?;
    if let Some(limit) = args.limit { documents.truncate(limit); }
    let chunks = processor.process_documents(&documents);
    if chunks.is_empty() {
        bail!("no chunks produced from {}", args.input.display());
    }

    let embedder = default_embedder(&settings.embedding, settings.index.dim)?;
    let store = IndexBuilder::new(embedder.as_ref())
        .batch_size(settings.embedding.batch_size)
        .policy(settings.search)
        .progress(true)
        .build(&chunks)?;

    let out = expand_path(args.index.as_deref().unwrap_or(&settings.index.dir));
    store.save(&out)?;
    println!(
        "Indexed {} documents as {} chunks into {}",
        documents.len(),
        store.len(),
        out.display()
    );
    Ok(())
}
