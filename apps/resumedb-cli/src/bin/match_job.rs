use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::Parser;

use resumedb_cli::init_tracing;
use resumedb_core::config::{expand_path, Config};
use resumedb_core::traits::Completer;
use resumedb_embed::default_embedder;
use resumedb_llm::completer_from_config;
use resumedb_match::{match_score, ResumeMatcher};
use resumedb_vector::VectorStore;

#[derive(Parser)]
#[command(about = "Match one job description against the index")]
struct Args {
    /// Job description text
    #[arg(long, conflicts_with = "jd_file")]
    jd: Option<String>,
    /// File holding the job description
    #[arg(long)]
    jd_file: Option<PathBuf>,
    #[arg(long, default_value = "cli")]
    job_id: String,
    #[arg(long)]
    top_k: Option<usize>,
    /// Index directory (defaults to index.dir)
    #[arg(long)]
    index: Option<String>,
    /// Print the ranking only, without calling the explanation backend
    #[arg(long)]
    rank_only: bool,
}

/// Stand-in used with `--rank-only`; never called.
struct NoExplanations;

#[async_trait]
impl Completer for NoExplanations {
    fn id(&self) -> &str {
        "none"
    }

    async fn complete(&self, _prompt: &str) -> resumedb_core::Result<String> {
        Ok(String::new())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let settings = Config::load()?.settings()?;

    let jd = match (args.jd, args.jd_file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => bail!("pass --jd or --jd-file"),
    };
    let top_k = args.top_k.unwrap_or(settings.ranking.default_top_k);

    let index_dir = expand_path(args.index.as_deref().unwrap_or(&settings.index.dir));
    let store = VectorStore::load(index_dir, settings.search)?;
    let embedder = default_embedder(&settings.embedding, store.dim())?;
    let completer: Box<dyn Completer> = if args.rank_only {
        Box::new(NoExplanations)
    } else {
        completer_from_config(&settings.llm)?
    };
    let matcher = Arc::new(
        ResumeMatcher::new(Arc::new(store), embedder, completer)?
            .with_policies(settings.ranking, settings.scoring),
    );

    if args.rank_only {
        let ranking = matcher.rank_text(&jd, top_k)?;
        println!("{} resumes scanned", ranking.distinct_resumes);
        for (i, group) in ranking.groups.iter().enumerate() {
            println!(
                "{:>2}. {:<24} score {:>6.2}  avg {:.3}  chunks {}",
                i + 1,
                group.doc_id,
                match_score(group.avg_score, group.count(), &settings.scoring),
                group.avg_score,
                group.count()
            );
        }
        return Ok(());
    }

    let report = matcher.match_job(&args.job_id, &jd, top_k).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
