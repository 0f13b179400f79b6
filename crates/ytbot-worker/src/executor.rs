//! Job executor: claims topics from the queue and drives them through
//! production and publishing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{error, info, warn};

use ytbot_models::{Topic, TopicId};
use ytbot_queue::TopicQueue;

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics::{self, stages, StageTimer};
use crate::pipeline::ProductionPipeline;
use crate::publish::Publisher;
use crate::retry::{retry_async_when, FailureTracker, RetryConfig};

/// Outcome of a single `run_once`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No pending topic
    Idle,
    Done { topic_id: TopicId, url: String },
}

/// Processes topics one at a time.
pub struct JobExecutor {
    queue: TopicQueue,
    pipeline: Arc<ProductionPipeline>,
    publisher: Arc<dyn Publisher>,
    retry: RetryConfig,
    shutdown: watch::Sender<bool>,
}

impl JobExecutor {
    pub fn new(
        queue: TopicQueue,
        pipeline: Arc<ProductionPipeline>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            queue,
            pipeline,
            publisher,
            retry: RetryConfig::new("publish").with_max_retries(2),
            shutdown,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn queue(&self) -> &TopicQueue {
        &self.queue
    }

    /// Claim and fully process the next pending topic.
    ///
    /// A failed topic is released back to the queue (or marked failed once
    /// it runs out of attempts) and the error is returned.
    pub async fn run_once(&self) -> WorkerResult<RunOutcome> {
        let Some(topic) = self.queue.claim_next().await? else {
            info!("Queue empty, no pending topics");
            return Ok(RunOutcome::Idle);
        };

        match self.process(&topic).await {
            Ok(url) => {
                // The video is live; a retry would upload it twice.
                if let Err(e) = self.queue.mark_done(topic.id, &url).await {
                    error!(
                        topic_id = %topic.id,
                        %url,
                        "Published but could not record completion: {}",
                        e
                    );
                    return Err(e.into());
                }
                metrics::record_topic_completed();
                info!(topic_id = %topic.id, %url, "Topic published");
                Ok(RunOutcome::Done {
                    topic_id: topic.id,
                    url,
                })
            }
            Err(e) => {
                JobLogger::new(topic.id, "run_once").log_error(&e.to_string());
                match self.queue.release(topic.id, &e.to_string()).await {
                    Ok(status) => metrics::record_topic_failed(status.as_str()),
                    Err(release_err) => {
                        error!(topic_id = %topic.id, "Failed to release topic: {}", release_err)
                    }
                }
                Err(e)
            }
        }
    }

    /// Produce and publish within one `job_timeout` budget.
    async fn process(&self, topic: &Topic) -> WorkerResult<String> {
        let limit = self.pipeline.config().job_timeout;
        let started = Instant::now();
        let video = self.pipeline.produce(topic).await?;

        let _timer = StageTimer::start(stages::PUBLISH);
        let publish = retry_async_when(
            &self.retry,
            || self.publisher.publish(&video),
            WorkerError::is_retryable,
        );
        match tokio::time::timeout(limit.saturating_sub(started.elapsed()), publish).await {
            Ok(result) => result.into_result(),
            Err(_) => Err(WorkerError::Timeout(limit)),
        }
    }

    /// Run until shutdown, sleeping `poll_interval` when idle and
    /// `error_backoff` after a failure.
    pub async fn run(&self) -> WorkerResult<()> {
        let recovered = self.queue.recover_stale().await?;
        if recovered > 0 {
            warn!("Recovered {} topic(s) left in processing by a previous run", recovered);
        }

        let config = self.pipeline.config();
        info!(
            publisher = self.publisher.name(),
            poll_secs = config.poll_interval.as_secs(),
            "Starting job executor"
        );

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut failures = FailureTracker::new(5);

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let pause = match self.run_once().await {
                Ok(RunOutcome::Idle) => {
                    failures.record_success();
                    config.poll_interval
                }
                Ok(RunOutcome::Done { .. }) => {
                    failures.record_success();
                    Duration::ZERO
                }
                Err(e) => {
                    if failures.record_failure() {
                        warn!("Backing off for {:?} after error: {}", config.error_backoff, e);
                    }
                    config.error_backoff
                }
            };

            if pause.is_zero() {
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = shutdown_rx.changed() => {}
            }
        }

        info!("Job executor stopped");
        Ok(())
    }

    /// Ask `run` to stop after the current topic. Sticky: a later `run`
    /// returns immediately.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}
