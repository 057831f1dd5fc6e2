use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use jobsift_client::session::BrowserSessionFactory;
use jobsift_client::StrategyBuilder;
use jobsift_core::retry::{RetryPolicy, RetryingLedger};
use jobsift_core::runner::{ScanRunner, TracingReporter};
use jobsift_core::{classify, ScanConfig};
use jobsift_ledger::{read_companies, CsvLedger};

#[derive(Parser)]
#[command(name = "jobsift", version, about = "Adaptive job posting scanner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the company roster and reconcile findings into the ledger
    Scan {
        /// CSV roster of companies (name, career_url, platform, ...)
        #[arg(short, long, env = "JOBSIFT_COMPANIES")]
        companies: PathBuf,

        /// Directory holding the ledger files
        #[arg(short, long, env = "JOBSIFT_LEDGER_DIR", default_value = "ledger")]
        ledger_dir: PathBuf,

        /// Scan only the named company from the roster
        #[arg(long)]
        company: Option<String>,

        /// Scan at most this many companies
        #[arg(long)]
        limit: Option<usize>,

        /// Extract and report without writing to the ledger
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Page ceiling per company
        #[arg(long)]
        max_pages: Option<u32>,

        /// Comma-separated keyword override
        #[arg(short, long, env = "JOBSIFT_KEYWORDS")]
        keywords: Option<String>,

        /// Page load timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Show which platform a career URL classifies as
    Classify {
        url: String,

        /// Platform hint, as a roster row would carry it
        #[arg(long)]
        hint: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobsift=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            companies,
            ledger_dir,
            company,
            limit,
            dry_run,
            max_pages,
            keywords,
            timeout,
        } => {
            cmd_scan(
                &companies, &ledger_dir, company, limit, dry_run, max_pages, keywords, timeout,
            )
            .await
        }
        Commands::Classify { url, hint } => {
            println!("{}", classify(&url, hint.as_deref()));
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_scan(
    roster: &PathBuf,
    ledger_dir: &PathBuf,
    only_company: Option<String>,
    limit: Option<usize>,
    dry_run: bool,
    max_pages: Option<u32>,
    keywords: Option<String>,
    timeout: u64,
) -> Result<()> {
    let mut companies = read_companies(roster)
        .with_context(|| format!("Failed to read roster {}", roster.display()))?;

    if let Some(name) = &only_company {
        companies.retain(|c| c.name.eq_ignore_ascii_case(name));
        if companies.is_empty() {
            anyhow::bail!("Company '{name}' not found in roster");
        }
    }
    if let Some(limit) = limit {
        companies.truncate(limit);
    }
    if companies.is_empty() {
        anyhow::bail!("Roster {} has no scannable companies", roster.display());
    }

    let mut config = ScanConfig::default();
    config.page_load_timeout = Duration::from_secs(timeout);
    if let Some(max_pages) = max_pages {
        config = config.with_max_pages(max_pages);
    }
    if let Some(keywords) = keywords {
        let keywords: Vec<String> = keywords
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            anyhow::bail!("--keywords given but no usable keywords in it");
        }
        config = config.with_keywords(keywords);
    }

    let ledger = CsvLedger::open(ledger_dir)
        .with_context(|| format!("Failed to open ledger at {}", ledger_dir.display()))?;
    let ledger = RetryingLedger::new(ledger, RetryPolicy::default());

    let sessions = BrowserSessionFactory::launch(config.clone())
        .await
        .context("Failed to launch headless browser")?;
    let factory = StrategyBuilder::new(sessions, config.clone());

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received; finishing current company");
            ctrl_c_cancel.cancel();
        }
    });

    let mut runner = ScanRunner::new(factory, ledger, config);
    if dry_run {
        runner = runner.dry_run();
    }

    let stats = runner
        .run(&companies, &cancel, &TracingReporter)
        .await
        .context("Scan run failed")?;

    println!("Companies processed: {}", stats.companies_processed);
    println!("Companies with errors: {}", stats.companies_with_errors);
    println!("Jobs found (matching): {}", stats.total_jobs_found);
    println!("New jobs added: {}", stats.new_jobs_added);
    println!("Existing jobs refreshed: {}", stats.existing_jobs_refreshed);

    Ok(())
}
