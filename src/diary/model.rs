use crate::error::{DiaryError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a diary entry, assigned by storage or generated locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, enough to select an entry from the CLI.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One diary record. `content` is an opaque rich-text blob and is never parsed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(
        id: EntryId,
        content: impl Into<String>,
        image_ref: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            content: content.into(),
            image_ref: normalize_image_ref(image_ref),
            created_at,
        }
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// An entry may only be empty when it carries an image.
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().is_empty() {
            return Err(DiaryError::InvalidEntry("entry id cannot be empty".into()));
        }
        if !self.has_content() && self.image_ref.is_none() {
            return Err(DiaryError::InvalidEntry(format!(
                "entry {} has neither content nor image",
                self.id
            )));
        }
        Ok(())
    }
}

fn normalize_image_ref(image_ref: Option<String>) -> Option<String> {
    image_ref.filter(|r| !r.trim().is_empty())
}

/// Input for a new entry, before an id has been assigned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryDraft {
    pub content: String,
    pub image_ref: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl EntryDraft {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    pub fn with_timestamp(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn into_entry(self) -> Result<Entry> {
        let entry = Entry::new(
            EntryId::generate(),
            self.content,
            self.image_ref,
            self.created_at.unwrap_or_else(Utc::now),
        );
        entry.validate()?;
        Ok(entry)
    }
}

/// Replacement values for an existing entry. Unset fields are left as they are.
///
/// `image_ref` is doubly optional: `Some(None)` removes the image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub content: Option<String>,
    pub image_ref: Option<Option<String>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl EntryPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A patch that turns any entry with the same id into `entry`.
    pub fn replacing_with(entry: &Entry) -> Self {
        Self {
            content: Some(entry.content.clone()),
            image_ref: Some(entry.image_ref.clone()),
            created_at: Some(entry.created_at),
        }
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(Some(image_ref.into()));
        self
    }

    pub fn clear_image(mut self) -> Self {
        self.image_ref = Some(None);
        self
    }

    pub fn timestamp(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.image_ref.is_none() && self.created_at.is_none()
    }

    pub fn apply_to(&self, entry: &Entry) -> Entry {
        let mut patched = entry.clone();
        if let Some(content) = &self.content {
            patched.content = content.clone();
        }
        if let Some(image_ref) = &self.image_ref {
            patched.image_ref = normalize_image_ref(image_ref.clone());
        }
        if let Some(created_at) = self.created_at {
            patched.created_at = created_at;
        }
        patched
    }
}
