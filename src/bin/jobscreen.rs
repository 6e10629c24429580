//! Job screening CLI.
//!
//! Screens job postings from an explicit URL list or a SearxNG search,
//! writing a ranked text report (or TSV) to the output path. Individual
//! URL failures land in the report's failures section; only configuration
//! errors produce a non-zero exit.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobscreen::traits::{HttpToolSessionFactory, JobSearcher, SearxngJobSearcher};
use jobscreen::{
    report, BatchConfig, BatchScheduler, OpenAiReasoner, PipelineEngine, ScreenInputs,
    TransitionTable,
};

#[derive(Parser, Debug)]
#[command(name = "jobscreen", about = "Screen job postings against a resume")]
struct Cli {
    /// Job title to search for (required unless --urls is given)
    #[arg(short = 'j', long)]
    job_title: Option<String>,

    /// Skip the search and screen these URLs
    #[arg(short = 'u', long, num_args = 1..)]
    urls: Option<Vec<String>>,

    /// Path to the resume text file
    #[arg(short = 'r', long)]
    resume: Option<PathBuf>,

    /// Path to the preferences text file
    #[arg(short = 'p', long)]
    preferences: Option<PathBuf>,

    /// URLs screened concurrently per chunk
    #[arg(short = 'b', long, default_value_t = 3)]
    batch_size: usize,

    /// Keep screening in batches until this many succeed (<= 0: no threshold)
    #[arg(short = 'm', long)]
    min_successful: Option<i64>,

    /// Only screen the first N URLs
    #[arg(short = 'n', long)]
    top_n: Option<usize>,

    /// Only run the search and write the URL list
    #[arg(short = 's', long)]
    search_only: bool,

    /// Output file path
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Log file path (defaults to stderr)
    #[arg(long)]
    log: Option<PathBuf>,

    /// Write TSV instead of the text report
    #[arg(long)]
    tsv: bool,

    /// SearxNG base URL
    #[arg(long, default_value = "http://localhost:8080")]
    searxng_url: String,

    /// Chat model override
    #[arg(long)]
    model: Option<String>,
}

fn init_logging(log: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn read_input(path: Option<&PathBuf>, what: &str) -> Result<Option<String>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {what} file {}", path.display()))?;
            Ok(Some(text))
        }
        None => Ok(None),
    }
}

/// Pull search pages until exhausted, for search-only mode.
async fn collect_urls(
    searcher: &dyn JobSearcher,
    query: &str,
    top_n: Option<usize>,
) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    let mut pageno = 1usize;
    loop {
        let page = searcher
            .search_page(query, pageno)
            .await
            .context("search provider failed")?;
        if page.is_empty() {
            break;
        }
        urls.extend(page);
        if top_n.is_some_and(|n| urls.len() >= n) {
            urls.truncate(top_n.unwrap_or(urls.len()));
            break;
        }
        pageno += 1;
    }
    Ok(urls)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.log.as_ref())?;

    if cli.job_title.is_none() && cli.urls.is_none() {
        bail!("either --job-title or --urls is required");
    }

    let searcher = SearxngJobSearcher::new(&cli.searxng_url);

    if cli.search_only {
        let Some(query) = &cli.job_title else {
            bail!("--search-only requires --job-title");
        };
        let urls = collect_urls(&searcher, query, cli.top_n).await?;
        let mut out = urls.join("\n");
        out.push('\n');
        std::fs::write(&cli.output, out)
            .with_context(|| format!("cannot write {}", cli.output.display()))?;
        println!("Found {} URLs -> {}", urls.len(), cli.output.display());
        return Ok(());
    }

    let mut reasoner = OpenAiReasoner::from_env().context("reasoner configuration")?;
    if let Some(model) = &cli.model {
        reasoner = reasoner.with_model(model);
    }

    let mut config = BatchConfig::new().with_batch_size(cli.batch_size);
    if let Some(min) = cli.min_successful {
        if min > 0 {
            config = config.with_desired_success_count(min as usize);
        }
    }
    if let Some(top_n) = cli.top_n {
        config = config.with_top_n(top_n);
    }

    let mut inputs = ScreenInputs::new();
    if let Some(resume) = read_input(cli.resume.as_ref(), "resume")? {
        inputs = inputs.with_resume(resume);
    }
    if let Some(preferences) = read_input(cli.preferences.as_ref(), "preferences")? {
        inputs = inputs.with_preferences(preferences);
    }

    let engine = PipelineEngine::new(TransitionTable::job_screening())?;
    let scheduler = BatchScheduler::new(
        engine,
        Arc::new(reasoner),
        Arc::new(HttpToolSessionFactory::new()),
        config,
    )?
    .with_inputs(inputs);

    let records = match &cli.urls {
        Some(urls) => {
            jobscreen::batch::require_urls(urls)?;
            scheduler.run_batch(urls).await?
        }
        None => {
            let query = cli.job_title.as_deref().unwrap_or_default();
            scheduler.run_search(&searcher, query).await?
        }
    };

    let compiled = report::compile(&records);
    let rendered = if cli.tsv {
        compiled.render_tsv()
    } else {
        compiled.render_text()
    };
    std::fs::write(&cli.output, rendered)
        .with_context(|| format!("cannot write {}", cli.output.display()))?;

    println!(
        "Screened {} URLs: {} succeeded, {} failed (avg fit {:.2}) -> {}",
        compiled.total,
        compiled.success_count,
        compiled.failed_count,
        compiled.average_fit_score,
        cli.output.display()
    );
    Ok(())
}
