//! Bounded, newest-first history of generated replies.
//!
//! The log keeps at most [`MAX_HISTORY_ITEMS`] entries and writes the whole
//! sequence back to the [`PersistentStore`] after every change. Storage
//! failures are logged and swallowed: losing history must never break a
//! generation that already succeeded.

use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::{PersistentStore, HISTORY_KEY};

/// Maximum number of entries kept.
pub const MAX_HISTORY_ITEMS: usize = 10;

/// Stored in place of the short answer when suggestions were generated.
pub const SUGGESTIONS_MARKER: &str = "[Suggestions Generated]";

/// Separator used to join suggestions into one `generated_text`.
pub const SUGGESTION_SEPARATOR: &str = "\n\n";

/// One past interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: i64,
    pub timestamp: String,
    pub client_message: String,
    #[serde(rename = "shortAnswer")]
    pub short_answer_or_marker: String,
    pub generated_text: String,
}

impl HistoryItem {
    /// Whether this entry came from suggestion mode.
    pub fn is_suggestions(&self) -> bool {
        self.short_answer_or_marker == SUGGESTIONS_MARKER
    }

    /// Split suggestion-mode text back into individual suggestions.
    pub fn suggestions(&self) -> Vec<&str> {
        self.generated_text.split(SUGGESTION_SEPARATOR).collect()
    }
}

type Observer = Box<dyn Fn(&[HistoryItem]) + Send + Sync>;

/// Bounded history backed by a persistent store.
pub struct HistoryLog {
    items: Vec<HistoryItem>,
    store: Arc<dyn PersistentStore>,
    observers: Vec<Observer>,
    last_id: i64,
}

impl HistoryLog {
    /// Create a log, loading any previously persisted entries.
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        let items = Self::load_from_store(store.as_ref());
        let last_id = items.iter().map(|i| i.id).max().unwrap_or(0);

        Self {
            items,
            store,
            observers: Vec::new(),
            last_id,
        }
    }

    /// Read persisted entries. Absent or undecodable state yields an empty log.
    pub fn load_from_store(store: &dyn PersistentStore) -> Vec<HistoryItem> {
        let raw = match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read history: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<HistoryItem>>(&raw) {
            Ok(mut items) => {
                items.truncate(MAX_HISTORY_ITEMS);
                debug!("Loaded {} history items", items.len());
                items
            }
            Err(e) => {
                warn!("Discarding unreadable history: {}", e);
                Vec::new()
            }
        }
    }

    /// Register a callback invoked with the full sequence after every change.
    pub fn subscribe(&mut self, observer: impl Fn(&[HistoryItem]) + Send + Sync + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Record a successful interaction at the front of the log.
    pub fn record(
        &mut self,
        client_message: &str,
        short_answer_or_marker: &str,
        generated_text: &str,
    ) -> &HistoryItem {
        let item = HistoryItem {
            id: self.next_id(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            client_message: client_message.to_string(),
            short_answer_or_marker: short_answer_or_marker.to_string(),
            generated_text: generated_text.to_string(),
        };

        self.items.insert(0, item);
        self.items.truncate(MAX_HISTORY_ITEMS);

        self.persist();
        self.notify();

        &self.items[0]
    }

    /// Write the current sequence to the store. Failures are only logged.
    pub fn persist(&self) {
        let result = serde_json::to_string(&self.items)
            .map_err(crate::Error::from)
            .and_then(|json| self.store.set(HISTORY_KEY, &json));

        if let Err(e) = result {
            warn!("Failed to persist history: {}", e);
        }
    }

    /// Drop every entry and remove the persisted copy.
    pub fn clear(&mut self) {
        self.items.clear();
        if let Err(e) = self.store.remove(HISTORY_KEY) {
            warn!("Failed to clear persisted history: {}", e);
        }
        self.notify();
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn notify(&self) {
        for observer in &self.observers {
            observer(&self.items);
        }
    }

    // Millisecond clock, bumped when it does not advance.
    fn next_id(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        self.last_id = if now > self.last_id { now } else { self.last_id + 1 };
        self.last_id
    }
}
