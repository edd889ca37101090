//! # Change Feeds and the Write Path
//!
//! The diary core does not persist anything itself. It talks to two narrow
//! collaborator contracts:
//!
//! - [`EntryWriter`]: the persistence write path. Local edits are written here
//!   and are *not* applied to the store directly.
//! - [`ChangeFeed`]: the source of truth. It pushes batches of
//!   [`ChangeEvent`]s into a [`FeedSink`] obtained from a
//!   [`crate::sync::Subscription`], and the sync bridge applies them.
//!
//! Feeds are assumed at-least-once and possibly reordered: the same `Added`
//! event can arrive twice, a `Modified` can precede its `Added`, a `Removed`
//! can name an id that is already gone.
//!
//! ## Implementations
//!
//! - [`memory::MemoryFeed`]: an in-process document collection, for tests and
//!   embedding. Can hold events back and deliver them as one batch.
//! - [`fs::JsonFileFeed`]: documents persisted as a JSON file.
//!
//! Both echo their own writes back through the feed, so a local edit becomes
//! visible exactly when the feed confirms it.

use crate::error::Result;
use crate::grouper::DisplayZone;
use crate::model::{Entry, EntryId};
use crate::sync::{Delivery, FeedSink};
use crate::timestamp::RawTimestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod fs;
pub mod memory;

/// Failure reported by a feed. Carried as-is to `on_error` callbacks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("feed unavailable: {0}")]
    Unavailable(String),

    #[error("malformed entry {id}: {reason}")]
    Malformed { id: String, reason: String },

    #[error("feed storage error: {0}")]
    Storage(String),
}

impl FeedError {
    pub fn malformed(id: impl Into<String>, reason: impl ToString) -> Self {
        FeedError::Malformed {
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// Entry payload as it travels through a feed, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "image", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(alias = "date", alias = "createdAt")]
    pub timestamp: RawTimestamp,
}

impl RawEntry {
    /// Turns the payload into a store-ready entry, reading naive times in `zone`.
    pub fn normalize(&self, zone: &DisplayZone) -> std::result::Result<Entry, FeedError> {
        if self.id.trim().is_empty() {
            return Err(FeedError::malformed("", "missing id"));
        }
        let created_at = self
            .timestamp
            .normalize(zone)
            .map_err(|e| FeedError::malformed(&self.id, e))?;
        let entry = Entry::new(
            EntryId::new(self.id.clone()),
            self.content.clone(),
            self.image_url.clone(),
            created_at,
        );
        entry
            .validate()
            .map_err(|e| FeedError::malformed(&self.id, e))?;
        Ok(entry)
    }
}

impl From<&Entry> for RawEntry {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id.to_string(),
            content: entry.content.clone(),
            image_url: entry.image_ref.clone(),
            timestamp: RawTimestamp::from(entry.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub doc: RawEntry,
}

impl ChangeEvent {
    pub fn added(doc: impl Into<RawEntry>) -> Self {
        Self {
            kind: ChangeKind::Added,
            doc: doc.into(),
        }
    }

    pub fn modified(doc: impl Into<RawEntry>) -> Self {
        Self {
            kind: ChangeKind::Modified,
            doc: doc.into(),
        }
    }

    pub fn removed(doc: impl Into<RawEntry>) -> Self {
        Self {
            kind: ChangeKind::Removed,
            doc: doc.into(),
        }
    }
}

/// Persistence write path. Writes are optimistic; the feed confirms them.
pub trait EntryWriter {
    /// Create or overwrite the document for `entry.id`.
    fn put(&mut self, entry: &Entry) -> Result<()>;

    /// Delete a document. Unknown ids are [`crate::error::DiaryError::NotFound`].
    fn delete(&mut self, id: &EntryId) -> Result<()>;
}

pub trait ChangeFeed {
    /// Starts delivering to `sink`. The current collection arrives first, as one batch of `Added` events.
    fn attach(&mut self, sink: FeedSink) -> std::result::Result<(), FeedError>;
}

/// Sinks attached to one feed. Closed sinks are dropped on the next broadcast.
#[derive(Debug, Default)]
pub(crate) struct SinkSet {
    sinks: Vec<FeedSink>,
}

impl SinkSet {
    pub(crate) fn add(&mut self, sink: FeedSink) {
        self.sinks.push(sink);
    }

    pub(crate) fn broadcast(&mut self, batch: &[ChangeEvent]) {
        self.sinks
            .retain(|sink| sink.deliver(batch.to_vec()) == Delivery::Accepted);
    }

    pub(crate) fn broadcast_error(&mut self, error: &FeedError) {
        self.sinks
            .retain(|sink| sink.fail(error.clone()) == Delivery::Accepted);
    }

    pub(crate) fn len(&self) -> usize {
        self.sinks.iter().filter(|s| !s.is_closed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn parses_document_store_payload() {
        let json = r#"{
            "kind": "added",
            "doc": {
                "id": "abc",
                "content": "<p>Hello</p>",
                "imageUrl": "https://cdn/x.png",
                "timestamp": {"seconds": 1704189600, "nanoseconds": 0}
            }
        }"#;

        let event: ChangeEvent = serde_json::from_str(json).unwrap();
        let entry = event.doc.normalize(&DisplayZone::Utc).unwrap();

        assert_eq!(event.kind, ChangeKind::Added);
        assert_eq!(entry.id.as_str(), "abc");
        assert_eq!(entry.image_ref.as_deref(), Some("https://cdn/x.png"));
        assert_eq!(
            entry.created_at,
            Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn parses_local_storage_payload() {
        let json = r#"{"id": "1", "content": "walked", "image": null, "date": "1/2/2024"}"#;
        let raw: RawEntry = serde_json::from_str(json).unwrap();
        let entry = raw.normalize(&DisplayZone::Utc).unwrap();
        assert_eq!(
            entry.created_at,
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn empty_payload_is_malformed() {
        let raw = RawEntry {
            id: "x".into(),
            content: "  ".into(),
            image_url: None,
            timestamp: RawTimestamp::Millis(0),
        };
        assert!(matches!(
            raw.normalize(&DisplayZone::Utc),
            Err(FeedError::Malformed { id, .. }) if id == "x"
        ));
    }

    #[test]
    fn bad_timestamp_is_malformed() {
        let raw = RawEntry {
            id: "x".into(),
            content: "text".into(),
            image_url: None,
            timestamp: RawTimestamp::Text("soon".into()),
        };
        assert!(matches!(
            raw.normalize(&DisplayZone::Utc),
            Err(FeedError::Malformed { .. })
        ));
    }

    #[test]
    fn entry_round_trips_through_raw_payload() {
        let entry = Entry::new(
            "id-1".into(),
            "text",
            Some("img".into()),
            Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap(),
        );
        let raw = RawEntry::from(&entry);
        assert_eq!(raw.normalize(&DisplayZone::Local).unwrap(), entry);
    }
}
