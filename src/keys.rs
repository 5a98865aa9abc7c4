//! # Backing-store key and channel naming.
//!
//! These names are shared with every other producer/consumer using the same
//! store and must match exactly:
//!
//! ```text
//! <prefix>.<queue>        list    FIFO job list
//! <prefix>queues          set     known bare queue names
//! <prefix>meta.<queue>    hash    lastEnqueued / lastDequeued / completed
//! <prefix>enqueued        channel serialized envelope on enqueue
//! <prefix>dequeued        channel serialized envelope on dequeue
//! <prefix>processed       channel serialized envelope on completion
//! ```

/// Metadata hash fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    LastEnqueued,
    LastDequeued,
    Completed,
}

impl MetaField {
    pub fn as_str(self) -> &'static str {
        match self {
            MetaField::LastEnqueued => "lastEnqueued",
            MetaField::LastDequeued => "lastDequeued",
            MetaField::Completed => "completed",
        }
    }
}

/// Lifecycle notification channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Enqueued,
    Dequeued,
    Processed,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Enqueued => "enqueued",
            Channel::Dequeued => "dequeued",
            Channel::Processed => "processed",
        }
    }
}

/// Key builder for one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keys {
    prefix: String,
}

impl Keys {
    pub const DEFAULT_PREFIX: &'static str = "cumin";

    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `<prefix>.<queue>`
    pub fn list(&self, queue: &str) -> String {
        format!("{}.{queue}", self.prefix)
    }

    /// `<prefix>queues`
    pub fn registry(&self) -> String {
        format!("{}queues", self.prefix)
    }

    /// `<prefix>meta.<queue>`
    pub fn meta(&self, queue: &str) -> String {
        format!("{}meta.{queue}", self.prefix)
    }

    /// `<prefix><channel>`
    pub fn channel(&self, channel: Channel) -> String {
        format!("{}{}", self.prefix, channel.as_str())
    }
}

impl Default for Keys {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}
