//! Topic queue backed by `queue.json` and `completed.json`.
//!
//! Single writer, no locking. A crash between `claim_next` and `mark_done`
//! leaves the topic in `processing`; `recover_stale` sweeps those back to
//! `pending` on the next start.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use ytbot_models::{CompletionRecord, Topic, TopicId, TopicStatus};

use crate::error::{QueueError, QueueResult};
use crate::store::{read_array, write_array};

/// Queue file name inside the data directory.
pub const QUEUE_FILE: &str = "queue.json";
/// History file name inside the data directory.
pub const COMPLETED_FILE: &str = "completed.json";

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Directory holding `queue.json` and `completed.json`
    pub data_dir: PathBuf,
    /// Failed attempts before a topic is marked `failed` (0 = retry forever)
    pub max_attempts: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            max_attempts: 3,
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("YTBOT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            max_attempts: std::env::var("YTBOT_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Topic counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

impl QueueStats {
    pub fn total(&self) -> usize {
        self.pending + self.processing + self.completed + self.failed
    }
}

/// Flat-file topic queue.
#[derive(Debug, Clone)]
pub struct TopicQueue {
    config: QueueConfig,
    queue_file: PathBuf,
    completed_file: PathBuf,
}

impl TopicQueue {
    /// Create a new queue over `config.data_dir`.
    pub fn new(config: QueueConfig) -> Self {
        let queue_file = config.data_dir.join(QUEUE_FILE);
        let completed_file = config.data_dir.join(COMPLETED_FILE);
        Self {
            config,
            queue_file,
            completed_file,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(QueueConfig::from_env())
    }

    pub fn queue_file(&self) -> &Path {
        &self.queue_file
    }

    pub fn completed_file(&self) -> &Path {
        &self.completed_file
    }

    /// All topics in file order. A missing queue file reads as empty.
    pub async fn topics(&self) -> QueueResult<Vec<Topic>> {
        Ok(read_array(&self.queue_file).await?.unwrap_or_default())
    }

    /// First pending topic in file order.
    pub async fn next_pending(&self) -> QueueResult<Option<Topic>> {
        let Some(topics) = read_array::<Topic>(&self.queue_file).await? else {
            error!(path = %self.queue_file.display(), "Queue file not found");
            return Ok(None);
        };

        Ok(topics.into_iter().find(Topic::is_pending))
    }

    /// Claim the first pending topic by moving it to `processing`.
    pub async fn claim_next(&self) -> QueueResult<Option<Topic>> {
        let Some(mut topics) = read_array::<Topic>(&self.queue_file).await? else {
            error!(path = %self.queue_file.display(), "Queue file not found");
            return Ok(None);
        };

        let Some(topic) = topics.iter_mut().find(|t| t.is_pending()) else {
            return Ok(None);
        };

        topic.transition(TopicStatus::Processing);
        let claimed = topic.clone();
        write_array(&self.queue_file, &topics).await?;

        info!(topic_id = %claimed.id, "Claimed topic: {}", claimed.content);
        Ok(Some(claimed))
    }

    /// Mark a topic completed and append it to the history log.
    pub async fn mark_done(&self, id: TopicId, video_url: &str) -> QueueResult<CompletionRecord> {
        info!(topic_id = %id, "Moving topic to completion history");

        let mut topics = self.topics().await?;
        match topics.iter_mut().find(|t| t.id == id) {
            Some(topic) => {
                topic.transition(TopicStatus::Completed);
                topic.last_error = None;
                write_array(&self.queue_file, &topics).await?;
            }
            None => warn!(topic_id = %id, "Completed topic is not in the queue file"),
        }

        let mut history = self.history().await?;
        let record = CompletionRecord::success(id, video_url);
        history.push(record.clone());
        write_array(&self.completed_file, &history).await?;

        Ok(record)
    }

    /// Return a failed topic to the queue, or mark it `failed` once it has
    /// used up its attempts. Returns the topic's new status.
    pub async fn release(&self, id: TopicId, reason: &str) -> QueueResult<TopicStatus> {
        let mut topics = self.topics().await?;
        let topic = topics
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(QueueError::TopicNotFound(id))?;

        topic.attempts += 1;
        topic.last_error = Some(reason.to_string());

        let exhausted = self.config.max_attempts > 0 && topic.attempts >= self.config.max_attempts;
        let status = if exhausted {
            TopicStatus::Failed
        } else {
            TopicStatus::Pending
        };
        topic.transition(status);

        if exhausted {
            warn!(
                topic_id = %id,
                attempts = topic.attempts,
                "Topic failed permanently: {}", reason
            );
        } else {
            info!(
                topic_id = %id,
                attempts = topic.attempts,
                "Topic returned to queue: {}", reason
            );
        }

        write_array(&self.queue_file, &topics).await?;
        Ok(status)
    }

    /// Reset every topic stuck in `processing` back to `pending`.
    pub async fn recover_stale(&self) -> QueueResult<usize> {
        let Some(mut topics) = read_array::<Topic>(&self.queue_file).await? else {
            return Ok(0);
        };

        let mut recovered = 0;
        for topic in topics
            .iter_mut()
            .filter(|t| t.status == TopicStatus::Processing)
        {
            debug!(topic_id = %topic.id, "Resetting stuck topic");
            topic.transition(TopicStatus::Pending);
            recovered += 1;
        }

        if recovered > 0 {
            write_array(&self.queue_file, &topics).await?;
            info!("Recovered {} stuck topic(s)", recovered);
        }

        Ok(recovered)
    }

    /// Append a new pending topic, creating the queue file if needed.
    pub async fn enqueue(&self, content: &str) -> QueueResult<Topic> {
        let content = content.trim();
        if content.is_empty() {
            return Err(QueueError::invalid_topic("topic content is empty"));
        }

        let mut topics = self.topics().await?;
        let next_id = topics.iter().map(|t| t.id.as_u64()).max().unwrap_or(0) + 1;

        let topic = Topic::new(next_id, content);
        topics.push(topic.clone());
        write_array(&self.queue_file, &topics).await?;

        info!(topic_id = %topic.id, "Enqueued topic: {}", topic.content);
        Ok(topic)
    }

    /// Count topics per status.
    pub async fn stats(&self) -> QueueResult<QueueStats> {
        let mut stats = QueueStats::default();
        for topic in self.topics().await? {
            match topic.status {
                TopicStatus::Pending => stats.pending += 1,
                TopicStatus::Processing => stats.processing += 1,
                TopicStatus::Completed => stats.completed += 1,
                TopicStatus::Failed => stats.failed += 1,
            }
        }
        Ok(stats)
    }

    /// Completion history. A missing or unreadable history reads as empty.
    pub async fn history(&self) -> QueueResult<Vec<CompletionRecord>> {
        match read_array(&self.completed_file).await {
            Ok(records) => Ok(records.unwrap_or_default()),
            Err(QueueError::Corrupt { path, source }) => {
                warn!(path = %path.display(), error = %source, "Ignoring unreadable history file");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    fn queue_in(dir: &TempDir) -> TopicQueue {
        TopicQueue::new(QueueConfig::default().with_data_dir(dir.path()))
    }

    fn write_queue(dir: &TempDir, json: &str) {
        std::fs::write(dir.path().join(QUEUE_FILE), json).unwrap();
    }

    #[tokio::test]
    async fn test_missing_queue_yields_none() {
        let dir = TempDir::new().unwrap();
        let queue = queue_in(&dir);
        assert!(queue.next_pending().await.unwrap().is_none());
        assert!(queue.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_next_pending_uses_file_order() {
        let dir = TempDir::new().unwrap();
        write_queue(
            &dir,
            r#"[
                {"id": 1, "content": "Done", "status": "completed"},
                {"id": 5, "content": "Bees", "status": "pending"},
                {"id": 2, "content": "Ants", "status": "pending"}
            ]"#,
        );
        let topic = queue_in(&dir).next_pending().await.unwrap().unwrap();
        assert_eq!(topic.id, TopicId(5));
    }

    #[tokio::test]
    async fn test_claim_marks_processing() {
        let dir = TempDir::new().unwrap();
        write_queue(&dir, r#"[{"id": 1, "content": "Bees", "status": "pending"}]"#);
        let queue = queue_in(&dir);

        let claimed = queue.claim_next().await.unwrap().unwrap();
        assert_eq!(claimed.status, TopicStatus::Processing);

        let topics = queue.topics().await.unwrap();
        assert_eq!(topics[0].status, TopicStatus::Processing);
        assert!(queue.claim_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_done_appends_history() {
        let dir = TempDir::new().unwrap();
        write_queue(&dir, r#"[{"id": 1, "content": "Bees", "status": "processing"}]"#);
        let queue = queue_in(&dir);

        queue.mark_done(TopicId(1), "file:///tmp/a.mp4").await.unwrap();
        queue.mark_done(TopicId(1), "file:///tmp/b.mp4").await.unwrap();

        let history = queue.history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].youtube_url, "file:///tmp/b.mp4");
        assert_eq!(history[0].status, "success");
        assert_eq!(queue.topics().await.unwrap()[0].status, TopicStatus::Completed);
    }

    #[tokio::test]
    async fn test_corrupt_history_is_replaced() {
        let dir = TempDir::new().unwrap();
        write_queue(&dir, r#"[{"id": 1, "content": "Bees", "status": "processing"}]"#);
        std::fs::write(dir.path().join(COMPLETED_FILE), "not json").unwrap();
        let queue = queue_in(&dir);

        queue.mark_done(TopicId(1), "url").await.unwrap();
        assert_eq!(queue.history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_queue_is_error() {
        let dir = TempDir::new().unwrap();
        write_queue(&dir, "{oops");
        let result = queue_in(&dir).claim_next().await;
        assert!(matches!(result, Err(QueueError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn test_release_until_failed() {
        let dir = TempDir::new().unwrap();
        write_queue(&dir, r#"[{"id": 1, "content": "Bees", "status": "processing"}]"#);
        let queue = TopicQueue::new(
            QueueConfig::default()
                .with_data_dir(dir.path())
                .with_max_attempts(2),
        );

        assert_eq!(
            queue.release(TopicId(1), "tts failed").await.unwrap(),
            TopicStatus::Pending
        );
        assert!(assert_ok!(queue.claim_next().await).is_some());
        assert_eq!(
            queue.release(TopicId(1), "tts failed again").await.unwrap(),
            TopicStatus::Failed
        );

        let topic = &queue.topics().await.unwrap()[0];
        assert_eq!(topic.attempts, 2);
        assert_eq!(topic.last_error.as_deref(), Some("tts failed again"));
        assert!(queue.next_pending().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_release_unknown_topic() {
        let dir = TempDir::new().unwrap();
        write_queue(&dir, "[]");
        let err = assert_err!(queue_in(&dir).release(TopicId(9), "x").await);
        assert!(matches!(err, QueueError::TopicNotFound(TopicId(9))));
    }

    #[tokio::test]
    async fn test_recover_stale() {
        let dir = TempDir::new().unwrap();
        write_queue(
            &dir,
            r#"[
                {"id": 1, "content": "A", "status": "processing"},
                {"id": 2, "content": "B", "status": "completed"},
                {"id": 3, "content": "C", "status": "processing"}
            ]"#,
        );
        let queue = queue_in(&dir);

        assert_eq!(queue.recover_stale().await.unwrap(), 2);
        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.processing, 0);
        assert_eq!(queue.recover_stale().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_enqueue_assigns_next_id() {
        let dir = TempDir::new().unwrap();
        let queue = queue_in(&dir);

        let first = queue.enqueue("  Octopus intelligence ").await.unwrap();
        assert_eq!(first.id, TopicId(1));
        assert_eq!(first.content, "Octopus intelligence");

        let second = queue.enqueue("Deep sea vents").await.unwrap();
        assert_eq!(second.id, TopicId(2));
        assert_eq!(queue.stats().await.unwrap().total(), 2);

        assert!(matches!(
            queue.enqueue("   ").await,
            Err(QueueError::InvalidTopic(_))
        ));
    }
}
