//! Per-user tool usage history.
//!
//! Each user has one JSON array stored under `toolHistory_<email>`. New
//! entries are prepended so the list reads most-recent-first; existing
//! entries are never edited and nothing is ever evicted.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::store::KeyValueStore;
use crate::types::Timestamp;

/// Key prefix shared with the browser app's `localStorage` layout.
pub const HISTORY_KEY_PREFIX: &str = "toolHistory_";

/// Catalog id of the AI image generator tool.
pub const IMAGE_GENERATOR_TOOL_ID: &str = "ai-image-generator";
/// Display name of the AI image generator tool.
pub const IMAGE_GENERATOR_TOOL_NAME: &str = "AI Image Generator";

/// One recorded tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub tool_id: String,
    pub tool_name: String,
    pub prompt: String,
    #[serde(alias = "date")]
    pub timestamp: Timestamp,
}

impl HistoryEntry {
    /// Entry for an image generation submitted now.
    pub fn image_generation(prompt: impl Into<String>) -> Self {
        Self {
            tool_id: IMAGE_GENERATOR_TOOL_ID.to_string(),
            tool_name: IMAGE_GENERATOR_TOOL_NAME.to_string(),
            prompt: prompt.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Store key holding the history list for `user_email`.
pub fn history_key(user_email: &str) -> String {
    format!("{HISTORY_KEY_PREFIX}{user_email}")
}

/// Append-only history log over a [`KeyValueStore`].
#[derive(Clone)]
pub struct HistoryLog {
    store: Arc<dyn KeyValueStore>,
}

impl HistoryLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the full history for a user, most recent first. A user with
    /// no stored history gets an empty list.
    pub fn list(&self, user_email: &str) -> Result<Vec<HistoryEntry>, CoreError> {
        match self.store.get(&history_key(user_email))? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Prepend `entry` to the user's history.
    ///
    /// Read-then-write with no transaction; a concurrent writer for the
    /// same user can overwrite this append.
    pub fn append(&self, user_email: &str, entry: HistoryEntry) -> Result<(), CoreError> {
        let existing = self.list(user_email)?;

        let mut updated = Vec::with_capacity(existing.len() + 1);
        updated.push(entry);
        updated.extend(existing);

        let raw = serde_json::to_string(&updated)?;
        self.store.set(&history_key(user_email), &raw)?;

        tracing::debug!(user = %user_email, entries = updated.len(), "History entry recorded");
        Ok(())
    }
}
