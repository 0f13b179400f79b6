//! Topic-to-short production worker.
//!
//! This crate provides:
//! - The production pipeline (script, voiceover, captions, footage, render)
//! - Publishers (local library, YouTube resumable upload)
//! - The job executor driving the topic queue
//! - Retry, logging and metrics helpers

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod publish;
pub mod retry;

pub use config::{PublisherKind, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use executor::{JobExecutor, RunOutcome};
pub use logging::{init_tracing, JobLogger};
pub use pipeline::{Backends, ProductionPipeline};
pub use publish::{LocalPublisher, Publisher, YouTubeConfig, YouTubePublisher};
pub use retry::{retry_async, retry_async_when, RetryConfig};
