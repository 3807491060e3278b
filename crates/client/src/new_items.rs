//! "New item" highlighting tracker.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

/// Flags identifiers so list views can highlight them.
pub trait NewItemsTracker: Send + Sync {
    fn add_new_item(&self, id: &str);

    fn is_new(&self, id: &str) -> bool;
}

/// Process-local tracker. Items stay flagged until cleared.
#[derive(Debug, Default)]
pub struct InMemoryNewItems {
    items: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryNewItems {
    pub fn new() -> Self {
        Self::default()
    }

    /// The user has seen it.
    pub fn clear(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    pub fn clear_all(&self) {
        self.lock().clear();
    }

    /// Flagged ids, oldest first.
    pub fn items(&self) -> Vec<String> {
        let items = self.lock();
        let mut flagged: Vec<_> = items.iter().collect();
        flagged.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
        flagged.into_iter().map(|(id, _)| id.clone()).collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NewItemsTracker for InMemoryNewItems {
    fn add_new_item(&self, id: &str) {
        self.lock().entry(id.to_owned()).or_insert_with(Utc::now);
    }

    fn is_new(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }
}
