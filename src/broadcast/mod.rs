//! # Broadcaster
//!
//! Optional post-mutation change notification. A resource opts in with a
//! [`BroadcastConfig`] naming the pub/sub target and how to derive the topic
//! from the affected record.

mod event;
mod pubsub;

pub use event::{ChangeEvent, ChangeKind};
pub use pubsub::{BroadcastError, LoggingPubSub, MemoryPubSub, PubSub, Published};

use std::fmt;
use std::sync::Arc;

use crate::record::{FieldValue, Record};

/// Derives a topic from the affected record
pub type TopicFn = Arc<dyn Fn(&Record) -> String + Send + Sync>;

/// Per-resource broadcast configuration
#[derive(Clone)]
pub struct BroadcastConfig {
    /// Pub/sub target identifier
    pub target: String,
    topic: TopicFn,
}

impl BroadcastConfig {
    pub fn new<F>(target: impl Into<String>, topic: F) -> Self
    where
        F: Fn(&Record) -> String + Send + Sync + 'static,
    {
        Self {
            target: target.into(),
            topic: Arc::new(topic),
        }
    }

    /// Same topic for every record
    pub fn fixed(target: impl Into<String>, topic: impl Into<String>) -> Self {
        let topic = topic.into();
        Self::new(target, move |_| topic.clone())
    }

    pub fn topic_for(&self, record: &Record) -> String {
        (self.topic)(record)
    }
}

impl fmt::Debug for BroadcastConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BroadcastConfig")
            .field("target", &self.target)
            .field("topic", &"<fn>")
            .finish()
    }
}

/// Publish a change event if the resource is configured for it.
///
/// The topic is derived from `after`, falling back to `before` for deletes.
/// Returns the published event, or `None` when nothing was sent.
pub fn maybe_broadcast(
    pubsub: &dyn PubSub,
    kind: ChangeKind,
    resource: &str,
    id: &FieldValue,
    before: Option<&Record>,
    after: Option<&Record>,
    config: Option<&BroadcastConfig>,
) -> Result<Option<ChangeEvent>, BroadcastError> {
    let Some(config) = config else {
        return Ok(None);
    };
    let Some(record) = after.or(before) else {
        return Ok(None);
    };

    let topic = config.topic_for(record);
    let event = ChangeEvent {
        event: kind,
        resource: resource.to_string(),
        id: id.to_transport(),
    };

    pubsub.publish(&config.target, &topic, &event)?;
    Ok(Some(event))
}
