//! Pub/sub collaborator contract

use std::sync::Mutex;

use thiserror::Error;
use tracing::warn;

use super::event::ChangeEvent;

/// Broadcast failure, reported by the pub/sub collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
    #[error("Pub/sub unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown pub/sub target: {0}")]
    UnknownTarget(String),
}

/// Fire-and-forget delivery of change events
pub trait PubSub: Send + Sync {
    fn publish(&self, target: &str, topic: &str, event: &ChangeEvent) -> Result<(), BroadcastError>;
}

/// Stand-in used when no pub/sub is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPubSub;

impl PubSub for LoggingPubSub {
    fn publish(&self, target: &str, topic: &str, event: &ChangeEvent) -> Result<(), BroadcastError> {
        warn!(target_name = %target, topic = %topic, event = %event.event, "no pub/sub configured, dropping broadcast");
        Ok(())
    }
}

/// A message captured by [`MemoryPubSub`]
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub target: String,
    pub topic: String,
    pub event: ChangeEvent,
}

/// In-memory pub/sub that records every message
#[derive(Debug, Default)]
pub struct MemoryPubSub {
    messages: Mutex<Vec<Published>>,
}

impl MemoryPubSub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Published> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PubSub for MemoryPubSub {
    fn publish(&self, target: &str, topic: &str, event: &ChangeEvent) -> Result<(), BroadcastError> {
        self.messages
            .lock()
            .map_err(|_| BroadcastError::Unavailable("lock poisoned".into()))?
            .push(Published {
                target: target.to_string(),
                topic: topic.to_string(),
                event: event.clone(),
            });
        Ok(())
    }
}
