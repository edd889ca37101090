use super::{ChangeEvent, ChangeFeed, EntryWriter, FeedError, RawEntry, SinkSet};
use crate::error::{DiaryError, Result};
use crate::model::{Entry, EntryId};
use crate::sync::FeedSink;
use std::collections::BTreeMap;

/// In-memory document collection that reports its own writes as change events.
///
/// Events are delivered immediately, one batch per write, unless the feed is
/// [held](MemoryFeed::hold): then they queue up and [`MemoryFeed::flush`]
/// delivers them as a single batch.
#[derive(Debug, Default)]
pub struct MemoryFeed {
    docs: BTreeMap<String, RawEntry>,
    sinks: SinkSet,
    held: Option<Vec<ChangeEvent>>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds documents without emitting events, as if they existed before anyone listened.
    pub fn with_docs<I>(mut self, docs: I) -> Self
    where
        I: IntoIterator<Item = RawEntry>,
    {
        for doc in docs {
            self.docs.insert(doc.id.clone(), doc);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn doc(&self, id: &str) -> Option<&RawEntry> {
        self.docs.get(id)
    }

    pub fn listeners(&self) -> usize {
        self.sinks.len()
    }

    pub fn hold(&mut self) {
        self.held.get_or_insert_with(Vec::new);
    }

    /// Delivers everything queued since [`MemoryFeed::hold`] as one batch and resumes immediate delivery.
    pub fn flush(&mut self) {
        if let Some(batch) = self.held.take() {
            self.sinks.broadcast(&batch);
        }
    }

    /// Delivers raw events as-is, without touching the stored documents.
    ///
    /// Lets callers reproduce redelivery and reordering.
    pub fn emit(&mut self, batch: Vec<ChangeEvent>) {
        self.sinks.broadcast(&batch);
    }

    pub fn fail(&mut self, error: FeedError) {
        self.sinks.broadcast_error(&error);
    }

    fn publish(&mut self, event: ChangeEvent) {
        match self.held.as_mut() {
            Some(queue) => queue.push(event),
            None => self.sinks.broadcast(&[event]),
        }
    }
}

impl EntryWriter for MemoryFeed {
    fn put(&mut self, entry: &Entry) -> Result<()> {
        let doc = RawEntry::from(entry);
        let event = match self.docs.insert(doc.id.clone(), doc.clone()) {
            Some(_) => ChangeEvent::modified(doc),
            None => ChangeEvent::added(doc),
        };
        self.publish(event);
        Ok(())
    }

    fn delete(&mut self, id: &EntryId) -> Result<()> {
        let doc = self
            .docs
            .remove(id.as_str())
            .ok_or_else(|| DiaryError::NotFound(id.clone()))?;
        self.publish(ChangeEvent::removed(doc));
        Ok(())
    }
}

impl ChangeFeed for MemoryFeed {
    fn attach(&mut self, sink: FeedSink) -> std::result::Result<(), FeedError> {
        let backfill: Vec<ChangeEvent> = self
            .docs
            .values()
            .cloned()
            .map(ChangeEvent::added)
            .collect();
        sink.deliver(backfill);
        self.sinks.add(sink);
        Ok(())
    }
}
