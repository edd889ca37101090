use super::{ChangeEvent, ChangeFeed, EntryWriter, FeedError, RawEntry, SinkSet};
use crate::error::{DiaryError, Result};
use crate::model::{Entry, EntryId};
use crate::sync::FeedSink;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_DATA_FILE: &str = "entries.json";

/// Documents as stored on disk, before each one is parsed.
type DocumentMap = BTreeMap<String, Value>;

/// Documents persisted as a pretty-printed JSON object keyed by entry id.
///
/// The file is re-read on every write, so edits made by another process are
/// picked up instead of overwritten. Documents that do not parse are reported
/// on attach and written back untouched.
#[derive(Debug)]
pub struct JsonFileFeed {
    path: PathBuf,
    sinks: SinkSet,
}

impl JsonFileFeed {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::at(dir.as_ref().join(DEFAULT_DATA_FILE))
    }

    /// A feed backed by the JSON file at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sinks: SinkSet::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses every stored document, returning the readable ones and an error
    /// per document that could not be read.
    pub fn load(&self) -> Result<(Vec<RawEntry>, Vec<FeedError>)> {
        let mut docs = Vec::new();
        let mut malformed = Vec::new();
        for (key, value) in self.load_documents()? {
            match serde_json::from_value::<RawEntry>(value) {
                Ok(doc) => docs.push(doc),
                Err(e) => malformed.push(FeedError::malformed(key, e)),
            }
        }
        Ok((docs, malformed))
    }

    fn load_documents(&self) -> Result<DocumentMap> {
        if !self.path.exists() {
            return Ok(DocumentMap::new());
        }
        let content = fs::read_to_string(&self.path).map_err(DiaryError::Io)?;
        if content.trim().is_empty() {
            return Ok(DocumentMap::new());
        }
        let docs = serde_json::from_str(&content).map_err(DiaryError::Serialization)?;
        Ok(docs)
    }

    fn save(&self, docs: &DocumentMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(DiaryError::Io)?;
            }
        }
        let content = serde_json::to_string_pretty(docs).map_err(DiaryError::Serialization)?;
        fs::write(&self.path, content).map_err(DiaryError::Io)?;
        Ok(())
    }
}

impl EntryWriter for JsonFileFeed {
    fn put(&mut self, entry: &Entry) -> Result<()> {
        let mut docs = self.load_documents()?;
        let doc = RawEntry::from(entry);
        let value = serde_json::to_value(&doc).map_err(DiaryError::Serialization)?;
        let existed = docs.insert(doc.id.clone(), value).is_some();
        self.save(&docs)?;
        debug!(id = %entry.id, path = %self.path.display(), "entry written");

        let event = if existed {
            ChangeEvent::modified(doc)
        } else {
            ChangeEvent::added(doc)
        };
        self.sinks.broadcast(&[event]);
        Ok(())
    }

    fn delete(&mut self, id: &EntryId) -> Result<()> {
        let mut docs = self.load_documents()?;
        let value = docs
            .remove(id.as_str())
            .ok_or_else(|| DiaryError::NotFound(id.clone()))?;
        self.save(&docs)?;
        debug!(id = %id, path = %self.path.display(), "entry deleted");

        // An unreadable document never reached a store, so there is nothing to retract.
        if let Ok(doc) = serde_json::from_value::<RawEntry>(value) {
            self.sinks.broadcast(&[ChangeEvent::removed(doc)]);
        }
        Ok(())
    }
}

impl ChangeFeed for JsonFileFeed {
    fn attach(&mut self, sink: FeedSink) -> std::result::Result<(), FeedError> {
        let (docs, malformed) = self
            .load()
            .map_err(|e| FeedError::Storage(format!("{}: {}", self.path.display(), e)))?;
        if !malformed.is_empty() {
            warn!(
                count = malformed.len(),
                path = %self.path.display(),
                "skipping unreadable documents"
            );
        }
        sink.deliver(docs.into_iter().map(ChangeEvent::added).collect());
        for error in malformed {
            sink.fail(error);
        }
        self.sinks.add(sink);
        Ok(())
    }
}
