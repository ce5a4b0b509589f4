//! Job-queue collaborator contract

use std::sync::Mutex;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// A normalized job ready for the queue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    /// Target action identifier
    pub action: String,
    /// Transport-safe arguments
    pub args: Map<String, Value>,
    /// Opaque dispatch options (queue name, priority, ...)
    pub options: Map<String, Value>,
}

/// Job dispatch failure, reported by the queue collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Job queue unavailable: {0}")]
    Unavailable(String),

    #[error("Job rejected: {0}")]
    Rejected(String),
}

/// Durable job enqueue
pub trait JobQueue: Send + Sync {
    fn enqueue(&self, job: &Job) -> Result<(), DispatchError>;
}

/// Stand-in used when no queue is configured: logs and drops every job
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingJobQueue;

impl JobQueue for LoggingJobQueue {
    fn enqueue(&self, job: &Job) -> Result<(), DispatchError> {
        warn!(action = %job.action, "no job queue configured, dropping job");
        Ok(())
    }
}

/// In-memory queue that records every accepted job
#[derive(Debug, Default)]
pub struct MemoryJobQueue {
    jobs: Mutex<Vec<Job>>,
    reject_action: Option<String>,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue that rejects every job for `action`
    pub fn rejecting(action: impl Into<String>) -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            reject_action: Some(action.into()),
        }
    }

    /// Snapshot of accepted jobs
    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.lock().map(|j| j.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().map(|j| j.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JobQueue for MemoryJobQueue {
    fn enqueue(&self, job: &Job) -> Result<(), DispatchError> {
        if self.reject_action.as_deref() == Some(job.action.as_str()) {
            return Err(DispatchError::Rejected(job.action.clone()));
        }

        self.jobs
            .lock()
            .map_err(|_| DispatchError::Unavailable("lock poisoned".into()))?
            .push(job.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(action: &str) -> Job {
        Job {
            action: action.to_string(),
            args: Map::new(),
            options: Map::new(),
        }
    }

    #[test]
    fn test_memory_queue_records_jobs() {
        let queue = MemoryJobQueue::new();
        queue.enqueue(&job("a")).unwrap();
        queue.enqueue(&job("b")).unwrap();

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.jobs()[1].action, "b");
    }

    #[test]
    fn test_rejecting_queue() {
        let queue = MemoryJobQueue::rejecting("bad");

        assert_eq!(
            queue.enqueue(&job("bad")),
            Err(DispatchError::Rejected("bad".to_string()))
        );
        assert!(queue.enqueue(&job("good")).is_ok());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_logging_queue_never_fails() {
        assert!(LoggingJobQueue.enqueue(&job("anything")).is_ok());
    }
}
