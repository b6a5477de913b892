//! Cursor-paginated directory walker.
//!
//! The walker turns the listing provider's page protocol into a flat, lazy
//! stream of entries. The first request lists the root recursively; every
//! later request carries the cursor from the response before it. A walk is
//! single-use: once `has_more` comes back false the walker is exhausted.
//!
//! A page that fails to load is logged and treated as an empty final page, so
//! the scan proceeds with whatever was listed before it and is reported as
//! incomplete through [`WalkStats::pages_failed`].

#![allow(missing_docs)]

use serde::Serialize;

use crate::storage::{Entry, ListPage, ListingProvider};

/// Pagination position.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WalkState {
    Initial,
    Continuing(String),
    Done,
}

/// Counters for one walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub entries_yielded: usize,
}

impl WalkStats {
    /// True when every requested page loaded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.pages_failed == 0
    }
}

/// Lazy iterator over every entry under a root path.
#[derive(Debug)]
pub struct DirectoryWalker<P> {
    provider: P,
    root: String,
    state: WalkState,
    buffer: std::vec::IntoIter<Entry>,
    stats: WalkStats,
}

/// Start a walk of `root`. No request is made until the first entry is pulled.
pub fn walk<P: ListingProvider>(provider: P, root: impl Into<String>) -> DirectoryWalker<P> {
    DirectoryWalker::new(provider, root)
}

impl<P: ListingProvider> DirectoryWalker<P> {
    pub fn new(provider: P, root: impl Into<String>) -> Self {
        Self {
            provider,
            root: root.into(),
            state: WalkState::Initial,
            buffer: Vec::new().into_iter(),
            stats: WalkStats::default(),
        }
    }

    #[must_use]
    pub const fn stats(&self) -> WalkStats {
        self.stats
    }

    /// Whether the provider has no further pages.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.state == WalkState::Done
    }

    fn fetch_next_page(&mut self) -> Option<ListPage> {
        let (operation, result) = match &self.state {
            WalkState::Initial => ("list_folder", self.provider.list(&self.root, true)),
            WalkState::Continuing(cursor) => (
                "list_folder/continue",
                self.provider.continue_listing(cursor),
            ),
            WalkState::Done => return None,
        };
        self.stats.pages_fetched += 1;

        let mut page = result.unwrap_or_else(|err| {
            self.stats.pages_failed += 1;
            tracing::error!(operation, "could not list folders: {err}");
            ListPage::default()
        });
        tracing::debug!(
            page = self.stats.pages_fetched,
            "found {} files/folders in the directory",
            page.entries.len()
        );

        self.state = if page.has_more {
            WalkState::Continuing(std::mem::take(&mut page.cursor))
        } else {
            WalkState::Done
        };
        Some(page)
    }
}

impl<P: ListingProvider> Iterator for DirectoryWalker<P> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        loop {
            if let Some(entry) = self.buffer.next() {
                self.stats.entries_yielded += 1;
                return Some(entry);
            }
            let page = self.fetch_next_page()?;
            self.buffer = page.entries.into_iter();
        }
    }
}
