//! Flat-file topic queue.
//!
//! This crate provides:
//! - Topic claiming from `queue.json`
//! - Completion logging to `completed.json`
//! - Release/retry accounting and the startup sweep for stuck topics

pub mod error;
pub mod queue;
pub mod store;

pub use error::{QueueError, QueueResult};
pub use queue::{QueueConfig, QueueStats, TopicQueue};
