//! Structured logging: subscriber setup and per-topic job logging.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ytbot_models::TopicId;

/// Install the global tracing subscriber.
///
/// `LOG_FORMAT=json` switches to JSON lines; `RUST_LOG` overrides the
/// default `ytbot=info` directive.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ytbot=info,ytbot_worker=info,ytbot_queue=info,ytbot_llm=info,ytbot_media=info,ytbot_stock=info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if use_json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init()
    };

    // A subscriber may already be installed (tests)
    let _ = result;
}

/// Logs the lifecycle of one topic with consistent fields.
#[derive(Debug, Clone)]
pub struct JobLogger {
    topic_id: TopicId,
    operation: String,
}

impl JobLogger {
    /// # Arguments
    /// * `topic_id` - Queue id of the topic being produced
    /// * `operation` - e.g. "produce_video", "trial"
    pub fn new(topic_id: TopicId, operation: &str) -> Self {
        Self {
            topic_id,
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            topic_id = %self.topic_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            topic_id = %self.topic_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            topic_id = %self.topic_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            topic_id = %self.topic_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            topic_id = %self.topic_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span carrying the topic id, for instrumenting a whole production.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            topic_id = %self.topic_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let logger = JobLogger::new(TopicId(12), "produce_video");
        assert_eq!(logger.topic_id(), TopicId(12));
        assert_eq!(logger.operation(), "produce_video");
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing();
        init_tracing();
        logger_smoke();
    }

    fn logger_smoke() {
        let logger = JobLogger::new(TopicId(1), "trial");
        let _guard = logger.create_span().entered();
        logger.log_start("start");
        logger.log_progress("half");
        logger.log_warning("careful");
        logger.log_error("oops");
        logger.log_completion("done");
    }
}
