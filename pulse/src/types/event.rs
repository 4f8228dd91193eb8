use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of user activity an [`Event`] represents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Post,
    Comment,
    Upvote,
    Downvote,
}

impl EventType {
    /// Every event type, in a fixed order used for uniform sampling.
    pub const ALL: [EventType; 4] = [
        EventType::Post,
        EventType::Comment,
        EventType::Upvote,
        EventType::Downvote,
    ];

    /// Returns the name stored in the `type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Post => "post",
            EventType::Comment => "comment",
            EventType::Upvote => "upvote",
            EventType::Downvote => "downvote",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A synthetic user activity event.
///
/// Events only live between the generator and the persister, afterwards they exist solely as
/// stored rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub user: String,
    /// Opaque content of the activity.
    #[serde(rename = "data")]
    pub payload: String,
    pub timestamp: DateTime<Utc>,
}

/// Identifier of a stored event row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub i64);

impl EventId {
    pub fn into_inner(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EventId {
    fn from(value: i64) -> Self {
        EventId(value)
    }
}
