use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use onehop::config::Config;
use onehop::extractor::ArticleExtractor;
use onehop::fetcher::PageFetcher;
use onehop::ledger::RedisLedger;
use onehop::policy::PolicyFilter;
use onehop::publisher::NatsEventPublisher;
use onehop::worker::CrawlWorker;

#[derive(Parser)]
#[command(
    name = "onehop",
    version,
    about = "Single-hop web-crawl worker: policy-gated fetch, reader-mode extraction, link fan-out",
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file (environment variables used when unset)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format (text, json); overrides the config file
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate().context("invalid configuration")?;

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!(
        edge_subject = %config.transport.edge_subject,
        link_subject = %config.transport.link_subject,
        article_subject = %config.transport.article_subject,
        namespace = %config.ledger.namespace,
        "onehop worker starting"
    );

    let nats = async_nats::connect(&config.transport.nats_url)
        .await
        .with_context(|| format!("failed to connect to NATS at {}", config.transport.nats_url))?;

    let ledger = RedisLedger::connect(&config.ledger.redis_url, &config.ledger.namespace)
        .await
        .with_context(|| format!("failed to connect to Redis at {}", config.ledger.redis_url))?;

    let publisher = NatsEventPublisher::new(
        nats.clone(),
        config.transport.link_subject.clone(),
        config.transport.article_subject.clone(),
        config.transport.batch_max_messages,
        config.batch_max_latency(),
    );

    let worker = Arc::new(CrawlWorker::new(
        PolicyFilter::new(&config.policy)?,
        PageFetcher::new(config.request_timeout(), config.fetcher.user_agent.clone())?,
        ArticleExtractor::new(),
        Arc::new(ledger),
        Arc::new(publisher),
    ));

    let mut edges = nats
        .subscribe(config.transport.edge_subject.clone())
        .await
        .context("failed to subscribe to edge subject")?;

    let mut invocations = tokio::task::JoinSet::new();

    loop {
        tokio::select! {
            message = edges.next() => {
                let Some(message) = message else {
                    tracing::warn!("Edge subscription closed, shutting down");
                    break;
                };
                let worker = worker.clone();
                invocations.spawn(async move {
                    let _ = worker.handle_raw(&message.payload).await;
                });
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received interrupt, draining in-flight invocations");
                break;
            }
        }
    }

    drop(edges);
    while invocations.join_next().await.is_some() {}

    tracing::info!("onehop worker stopped");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("onehop=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new(format!("onehop={level},warn"))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
