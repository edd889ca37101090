use crate::config::DiaryConfig;
use crate::model::Entry;
use crate::view_model::VisibleWindow;
use std::path::{Path, PathBuf};

pub mod add;
pub mod config;
pub mod delete;
pub mod edit;
pub mod helpers;
pub mod list;
pub mod search;
pub mod view;

#[derive(Debug, Clone)]
pub struct DiaryPaths {
    /// Holds `config.json` and the entries file.
    pub data_dir: PathBuf,
}

impl DiaryPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn data_file(&self, config: &DiaryConfig) -> PathBuf {
        self.data_dir.join(&config.data_file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_entries: Vec<Entry>,
    pub window: Option<VisibleWindow>,
    pub config: Option<DiaryConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_entries(mut self, entries: Vec<Entry>) -> Self {
        self.affected_entries = entries;
        self
    }

    pub fn with_window(mut self, window: VisibleWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_config(mut self, config: DiaryConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}
