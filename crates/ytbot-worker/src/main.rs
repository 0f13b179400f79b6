//! `ytbot` binary: queue management and the production worker.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info, warn};

use ytbot_models::{RenderSettings, Topic, TopicId};
use ytbot_queue::TopicQueue;
use ytbot_worker::metrics::init_metrics;
use ytbot_worker::{
    init_tracing, Backends, JobExecutor, LocalPublisher, ProductionPipeline, Publisher,
    PublisherKind, RunOutcome, WorkerConfig, YouTubePublisher,
};

/// Id used for trial runs. Their files live under `trial/`, so a queued
/// topic with the same id is never overwritten.
const TRIAL_TOPIC_ID: u64 = 1001;

#[derive(Parser)]
#[command(name = "ytbot")]
#[command(about = "Turns queued topics into narrated vertical shorts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the queue until interrupted
    Run,

    /// Process at most one topic and exit
    Once,

    /// Append topics to the queue
    Enqueue {
        /// Topic texts, one per argument
        #[arg(required = true)]
        topics: Vec<String>,
    },

    /// Show queue counts and recent completions
    Status {
        /// Number of history entries to show
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Reset topics stuck in processing
    Recover,

    /// Produce a video for a topic without touching the queue
    Trial {
        /// Topic text
        topic: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let queue = TopicQueue::from_env();
    let (cancel_tx, cancel_rx) = watch::channel(false);

    match cli.command {
        Commands::Enqueue { topics } => {
            for content in &topics {
                let topic = queue.enqueue(content).await?;
                println!("queued #{}: {}", topic.id, topic.content);
            }
        }
        Commands::Status { limit } => {
            let stats = queue.stats().await?;
            println!(
                "pending: {}  processing: {}  completed: {}  failed: {}  (total {})",
                stats.pending,
                stats.processing,
                stats.completed,
                stats.failed,
                stats.total()
            );
            let history = queue.history().await?;
            for record in history.iter().rev().take(limit) {
                println!(
                    "#{} {} {}",
                    record.topic_id, record.completion_timestamp, record.youtube_url
                );
            }
        }
        Commands::Recover => {
            let recovered = queue.recover_stale().await?;
            println!("recovered {} topic(s)", recovered);
        }
        Commands::Trial { topic } => {
            let config = WorkerConfig::from_env()?.for_trial();
            let pipeline = build_pipeline(config, cancel_rx)?;
            let video = pipeline
                .produce(&Topic::new(TopicId(TRIAL_TOPIC_ID), topic))
                .await?;
            println!(
                "{} ({:.1}s, {} scenes): {}",
                video.metadata.title,
                video.duration_secs,
                video.scene_count,
                video.video_path.display()
            );
        }
        Commands::Once => {
            let executor = build_executor(queue, cancel_rx)?;
            executor.queue().recover_stale().await?;
            match executor.run_once().await? {
                RunOutcome::Idle => println!("queue empty"),
                RunOutcome::Done { topic_id, url } => println!("#{} published: {}", topic_id, url),
            }
        }
        Commands::Run => {
            let executor = Arc::new(build_executor(queue, cancel_rx)?);

            // First Ctrl-C drains, the second kills the running FFmpeg pass.
            let signal_handle = {
                let executor = Arc::clone(&executor);
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("Received shutdown signal, finishing current topic");
                        executor.shutdown();
                    }
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Received second shutdown signal, aborting render");
                        cancel_tx.send_replace(true);
                    }
                })
            };

            if let Err(e) = executor.run().await {
                error!("Executor error: {}", e);
                return Err(e.into());
            }
            signal_handle.abort();
            info!("Worker shutdown complete");
        }
    }

    Ok(())
}

fn build_pipeline(
    config: WorkerConfig,
    cancel_rx: watch::Receiver<bool>,
) -> Result<ProductionPipeline> {
    if let Some(addr) = config.metrics_addr {
        init_metrics(addr)?;
    }
    let backends = Backends::from_env(&config, &RenderSettings::default(), cancel_rx)
        .context("configuring backends")?;
    Ok(ProductionPipeline::new(config, backends))
}

fn build_executor(queue: TopicQueue, cancel_rx: watch::Receiver<bool>) -> Result<JobExecutor> {
    let pipeline = build_pipeline(WorkerConfig::from_env()?, cancel_rx)?;
    let publisher: Arc<dyn Publisher> = match pipeline.config().publisher {
        PublisherKind::Local => Arc::new(LocalPublisher),
        PublisherKind::YouTube => Arc::new(YouTubePublisher::from_env()?),
    };
    info!(publisher = publisher.name(), "Worker configured");
    Ok(JobExecutor::new(queue, Arc::new(pipeline), publisher))
}
