use std::future::Future;
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use stats_client::HttpChainClient;
use stats_core::{ChainClient, QueryOptions, StatsConfig, StatsError};
use stats_metrics::MetricsConfig;
use stats_output::{write_pool_summaries, JsonlWriter};
use stats_store::{count_pool_investors, GenesisBalance};
use stats_sync::SummaryEngine;
use tokio::io::{AsyncBufReadExt, BufReader as AsyncBufReader};
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dex-stats", version, about = "Liquidity pool swap statistics extractor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate swaps per pool into a CSV table
    Summary {
        /// Begin block height
        #[arg(short, long)]
        begin: Option<u64>,
        /// End block height (default: latest)
        #[arg(short, long)]
        end: Option<u64>,
        /// Output file name
        #[arg(short, long, default_value = "pools.csv")]
        out: PathBuf,
    },
    /// Write every height's decoded swap events as JSON lines
    Dump {
        /// Begin block height (default: 999 blocks before end)
        #[arg(short, long)]
        begin: Option<u64>,
        /// End block height (default: latest)
        #[arg(short, long)]
        end: Option<u64>,
        /// Output file name
        #[arg(short, long, default_value = "output.jsonl")]
        out: PathBuf,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Find the first block after an RFC 3339 time
    SearchBlock {
        #[arg(value_parser = parse_time)]
        time: DateTime<Utc>,
    },
    /// Count pool-share holders per pool in a genesis file
    ReadGenesis { file: PathBuf },
}

fn parse_time(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (ignore if not found)
    dotenvy::dotenv().ok();

    // stdout carries the report, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = StatsConfig::load().context("Failed to load configuration")?;
    info!(
        rpc_url = %config.client.rpc_url,
        api_url = %config.client.api_url,
        floor_anchor_height = config.scan.floor_anchor_height,
        concurrency = config.scan.concurrency,
        "Configuration loaded"
    );

    let metrics_config = MetricsConfig::from_env()?;
    if metrics_config.is_enabled() {
        stats_metrics::install(&metrics_config)?;
    }

    // Ctrl+C flips the flag for the scanner and interrupts whatever step is running
    let shutdown = Arc::new(AtomicBool::new(false));
    let interrupted = Arc::new(Notify::new());
    {
        let shutdown = Arc::clone(&shutdown);
        let interrupted = Arc::clone(&interrupted);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Shutdown signal received (Ctrl+C)");
                shutdown.store(true, Ordering::SeqCst);
                interrupted.notify_one();
            }
        });
    }

    let client: Arc<dyn ChainClient> = Arc::new(HttpChainClient::new(config.client.clone())?);
    let engine = SummaryEngine::new(client, config.scan.clone(), Arc::clone(&shutdown));

    let run = async {
        let run = run_command(cli.command, &engine);
        match config.run_timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result,
                Err(_) => {
                    shutdown.store(true, Ordering::SeqCst);
                    Err(StatsError::Aborted(format!("run exceeded {}s", limit.as_secs())).into())
                }
            },
            None => run.await,
        }
    };
    let result = until_interrupted(run, interrupted.notified()).await;

    if let Err(e) = &result {
        error!(error = %e, "Run failed, no output written");
        if shutdown.load(Ordering::SeqCst) {
            // a pending stdin read would hold the runtime open on return
            std::process::exit(130);
        }
    }
    result
}

/// Drive `run` to completion unless `interrupt` resolves first. The run
/// future is dropped on interruption, discarding any unfinished output.
async fn until_interrupted<R, I>(run: R, interrupt: I) -> anyhow::Result<()>
where
    R: Future<Output = anyhow::Result<()>>,
    I: Future<Output = ()>,
{
    tokio::select! {
        result = run => result,
        _ = interrupt => Err(StatsError::Aborted("interrupted".to_string()).into()),
    }
}

async fn run_command(command: Command, engine: &SummaryEngine) -> anyhow::Result<()> {
    match command {
        Command::Summary { begin, end, out } => {
            let range = engine.summary_range(begin, end).await?;
            let report = engine.summary(range).await?;
            if !report.has_swaps() {
                println!("no swap events found");
                return Ok(());
            }

            println!("DEX Summary (block height: {})", report.end_height());
            println!("* {} kind(s) of token", report.state.denoms().len());
            println!("* {} swap trader(s)", report.state.requesters().len());

            let path = write_pool_summaries(&out, report.state.rows())
                .with_context(|| format!("Failed to write {}", out.display()))?;
            info!(path = %path.display(), "Summary complete");
        }

        Command::Dump {
            begin,
            end,
            out,
            yes,
        } => {
            let range = engine.dump_range(begin, end).await?;
            let prompt = format!(
                "begin height = {}, end height = {}. continue? [y/N] ",
                range.begin, range.end
            );
            if !yes && !confirm(&prompt).await? {
                return Err(StatsError::Aborted("declined at prompt".to_string()).into());
            }

            let mut writer = JsonlWriter::create(&out)?;
            let stats = engine
                .dump(range, |block| writer.write_block(&block))
                .await?;
            let path = writer.finish()?;
            println!(
                "wrote {} height(s), {} swap event(s) to {}",
                stats.heights,
                stats.swaps,
                path.display()
            );
        }

        Command::SearchBlock { time } => match engine.search_block(time).await? {
            Some((height, block_time)) => {
                println!("height = {height}, time = {}", block_time.to_rfc3339());
            }
            None => bail!("no block found after {}", time.to_rfc3339()),
        },

        Command::ReadGenesis { file } => {
            let roster = engine.roster(QueryOptions::latest()).await?;
            let balances = tokio::task::spawn_blocking(move || {
                let reader = std::fs::File::open(&file)
                    .with_context(|| format!("Failed to open {}", file.display()))?;
                Ok::<_, anyhow::Error>(GenesisBalance::from_reader(BufReader::new(reader))?)
            })
            .await??;

            println!("number of pool investors");
            println!("========================");
            for pool in count_pool_investors(&roster, &balances) {
                println!("pool {}: {}", pool.pool_id, pool.investors);
            }
        }
    }
    Ok(())
}

/// Ask a yes/no question on stdin; anything but "y" is a no
async fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    AsyncBufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await
        .context("Failed to read answer")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
