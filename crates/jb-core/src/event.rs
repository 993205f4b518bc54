//! Poll samples produced by the reader.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TagId;

/// A single poll of the reader.
///
/// The timestamp is kept for observability only; classification is driven by
/// the counters accumulated in [`PlaybackSession`](crate::PlaybackSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEvent {
    /// The detected token, or `None` when nothing is under the reader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<TagId>,
    /// When the sample was taken.
    pub timestamp: DateTime<Utc>,
}

impl TagEvent {
    /// Creates an event stamped with the current time.
    pub fn new(tag_id: Option<TagId>) -> Self {
        Self::at(tag_id, Utc::now())
    }

    /// Creates an event with an explicit timestamp.
    pub const fn at(tag_id: Option<TagId>, timestamp: DateTime<Utc>) -> Self {
        Self { tag_id, timestamp }
    }

    /// Whether a token was detected.
    pub const fn is_present(&self) -> bool {
        self.tag_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_event_omits_tag_when_serialized() {
        let timestamp = "2025-01-01T00:00:00Z".parse().unwrap();
        let event = TagEvent::at(None, timestamp);

        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"timestamp":"2025-01-01T00:00:00Z"}"#);
        assert!(!event.is_present());
    }

    #[test]
    fn event_rejects_empty_tag() {
        let json = r#"{"tag_id": "", "timestamp": "2025-01-01T00:00:00Z"}"#;
        let result: Result<TagEvent, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
