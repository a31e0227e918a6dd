use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::error::LayoutError;
use crate::geometry::NormalizedBounds;
use crate::layout::TextLayoutProvider;
use crate::text::normalize_search_text;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheState {
    /// Searched before; `None` means the provider found nothing.
    Hit(Option<NormalizedBounds>),
    Miss,
}

/// Session-scoped memo of first-occurrence searches, keyed by normalized text.
#[derive(Debug, Default)]
pub struct BoundsCache {
    entries: RwLock<HashMap<String, Option<NormalizedBounds>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheCounters {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

impl BoundsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, text: &str) -> CacheState {
        let key = normalize_search_text(text);
        // Entries are replaced whole, so a poisoned lock still holds consistent values.
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match entries.get(&key) {
            Some(bounds) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                CacheState::Hit(*bounds)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                CacheState::Miss
            }
        }
    }

    pub fn store(&self, text: &str, bounds: Option<NormalizedBounds>) {
        let key = normalize_search_text(text);
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key, bounds);
    }

    /// First occurrence of `text`, asking the provider only on a cache miss.
    ///
    /// Provider errors are returned as-is and leave the cache untouched.
    pub fn find_first(
        &self,
        provider: &dyn TextLayoutProvider,
        text: &str,
    ) -> Result<Option<NormalizedBounds>, LayoutError> {
        if let CacheState::Hit(bounds) = self.lookup(text) {
            return Ok(bounds);
        }

        let bounds = provider.search(text)?.into_iter().next();
        self.store(text, bounds);
        Ok(bounds)
    }

    pub fn counters(&self) -> CacheCounters {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len();
        CacheCounters {
            entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
