//! Prometheus metrics for the production worker.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const TOPICS_COMPLETED_TOTAL: &str = "ytbot_topics_completed_total";
    pub const TOPICS_FAILED_TOTAL: &str = "ytbot_topics_failed_total";
    pub const STAGE_DURATION_SECONDS: &str = "ytbot_stage_duration_seconds";
}

/// Pipeline stages, used as the `stage` label.
pub mod stages {
    pub const SCRIPT: &str = "script";
    pub const VOICEOVER: &str = "voiceover";
    pub const CAPTIONS: &str = "captions";
    pub const FOOTAGE: &str = "footage";
    pub const RENDER: &str = "render";
    pub const PUBLISH: &str = "publish";
}

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> WorkerResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::config_error(format!("metrics exporter: {}", e)))?;
    info!("Metrics listening on http://{}/metrics", addr);
    Ok(())
}

pub fn record_topic_completed() {
    counter!(names::TOPICS_COMPLETED_TOTAL).increment(1);
}

/// `outcome` is the status the topic was released to (`pending` or `failed`).
pub fn record_topic_failed(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::TOPICS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_stage_duration(stage: &'static str, duration_secs: f64) {
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => stage).record(duration_secs);
}

/// Records the elapsed time for a stage when dropped.
pub struct StageTimer {
    stage: &'static str,
    started: Instant,
}

impl StageTimer {
    pub fn start(stage: &'static str) -> Self {
        Self {
            stage,
            started: Instant::now(),
        }
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        record_stage_duration(self.stage, self.started.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_topic_completed();
        record_topic_failed("pending");
        let timer = StageTimer::start(stages::RENDER);
        drop(timer);
    }
}
