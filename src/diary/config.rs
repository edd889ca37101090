use crate::error::{DiaryError, Result};
use crate::feed::fs::DEFAULT_DATA_FILE;
use crate::grouper::{DateGrouper, DisplayZone, IntraDayOrder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_PAGE_SIZE: usize = 7;

pub const KEYS: [&str; 4] = ["timezone", "intra-day-order", "page-size", "data-file"];

/// Configuration for the diary, stored in `<data dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiaryConfig {
    /// Zone whose calendar decides which day an entry belongs to
    #[serde(default)]
    pub timezone: DisplayZone,

    #[serde(default)]
    pub intra_day_order: IntraDayOrder,

    /// Days shown per page by `list` and `search`
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Entries file, relative to the data directory
    #[serde(default = "default_data_file")]
    pub data_file: String,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_data_file() -> String {
    DEFAULT_DATA_FILE.to_string()
}

impl Default for DiaryConfig {
    fn default() -> Self {
        Self {
            timezone: DisplayZone::default(),
            intra_day_order: IntraDayOrder::default(),
            page_size: DEFAULT_PAGE_SIZE,
            data_file: default_data_file(),
        }
    }
}

impl DiaryConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(DiaryError::Io)?;
        serde_json::from_str(&content)
            .map_err(|e| DiaryError::Config(format!("{}: {}", config_path.display(), e)))
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(DiaryError::Io)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(DiaryError::Serialization)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content).map_err(DiaryError::Io)?;
        Ok(())
    }

    pub fn grouper(&self) -> DateGrouper {
        DateGrouper::new(self.timezone).with_order(self.intra_day_order)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match normalize_key(key).as_str() {
            "timezone" => Some(self.timezone.to_string()),
            "intra-day-order" => Some(self.intra_day_order.to_string()),
            "page-size" => Some(self.page_size.to_string()),
            "data-file" => Some(self.data_file.clone()),
            _ => None,
        }
    }

    /// Sets one key from its textual form. The error is a user-facing message.
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        let value = value.trim();
        match normalize_key(key).as_str() {
            "timezone" => {
                self.timezone = value.parse()?;
            }
            "intra-day-order" => {
                self.intra_day_order = value.parse()?;
            }
            "page-size" => {
                let size: usize = value
                    .parse()
                    .map_err(|_| format!("Invalid page size '{}'", value))?;
                if size == 0 {
                    return Err("Page size must be at least 1".to_string());
                }
                self.page_size = size;
            }
            "data-file" => {
                if value.is_empty() {
                    return Err("Data file name cannot be empty".to_string());
                }
                self.data_file = value.to_string();
            }
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}
