//! Remote folder listing: entry model and the paginated listing provider seam.

#![allow(missing_docs)]

pub mod dropbox;

use serde::{Deserialize, Serialize};

use crate::core::errors::Result;

/// Folder or file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

/// One record returned by the listing provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub kind: EntryKind,
    pub name: String,
    /// Full path, lowercased by the provider. Used for ignore matching.
    pub path_lower: String,
    /// Full path with original casing. Used in reports.
    pub path_display: String,
}

impl Entry {
    #[must_use]
    pub fn new(
        kind: EntryKind,
        name: impl Into<String>,
        path_lower: impl Into<String>,
        path_display: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            path_lower: path_lower.into(),
            path_display: path_display.into(),
        }
    }

    /// Folder entry derived from its display path.
    #[must_use]
    pub fn folder(path_display: &str) -> Self {
        Self::from_display(EntryKind::Folder, path_display)
    }

    /// File entry derived from its display path.
    #[must_use]
    pub fn file(path_display: &str) -> Self {
        Self::from_display(EntryKind::File, path_display)
    }

    fn from_display(kind: EntryKind, path_display: &str) -> Self {
        let name = path_display
            .rsplit('/')
            .next()
            .unwrap_or(path_display)
            .to_string();
        Self::new(kind, name, path_display.to_lowercase(), path_display)
    }

    #[must_use]
    pub const fn is_folder(&self) -> bool {
        matches!(self.kind, EntryKind::Folder)
    }

    /// Lowercase path of the containing folder (`"/"` for top-level entries).
    #[must_use]
    pub fn parent_path(&self) -> &str {
        match self.path_lower.rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &self.path_lower[..idx],
        }
    }

    /// Ordered, non-empty segments of [`Entry::parent_path`].
    #[must_use]
    pub fn parent_segments(&self) -> Vec<&str> {
        self.parent_path()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect()
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub entries: Vec<Entry>,
    /// Opaque continuation token; only meaningful when `has_more` is set.
    pub cursor: String,
    pub has_more: bool,
}

/// Cursor-paginated, recursive folder listing.
pub trait ListingProvider {
    /// First page of the listing rooted at `path`.
    fn list(&self, path: &str, recursive: bool) -> Result<ListPage>;

    /// Next page, using the cursor returned by the previous response.
    fn continue_listing(&self, cursor: &str) -> Result<ListPage>;
}

impl<P: ListingProvider + ?Sized> ListingProvider for &P {
    fn list(&self, path: &str, recursive: bool) -> Result<ListPage> {
        (**self).list(path, recursive)
    }

    fn continue_listing(&self, cursor: &str) -> Result<ListPage> {
        (**self).continue_listing(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_helper_derives_name_and_lower_path() {
        let entry = Entry::folder("/Invoices/John Doe");
        assert_eq!(entry.kind, EntryKind::Folder);
        assert_eq!(entry.name, "John Doe");
        assert_eq!(entry.path_lower, "/invoices/john doe");
        assert_eq!(entry.path_display, "/Invoices/John Doe");
    }

    #[test]
    fn parent_segments_of_nested_file() {
        let entry = Entry::file("/Invoices/2019/John Doe/013119-01.docx");
        assert_eq!(entry.parent_path(), "/invoices/2019/john doe");
        assert_eq!(entry.parent_segments(), vec!["invoices", "2019", "john doe"]);
    }

    #[test]
    fn top_level_entry_has_no_parent_segments() {
        let entry = Entry::folder("/Invoices");
        assert_eq!(entry.parent_path(), "/");
        assert!(entry.parent_segments().is_empty());
    }

    #[test]
    fn default_page_is_empty_and_final() {
        let page = ListPage::default();
        assert!(page.entries.is_empty());
        assert!(page.cursor.is_empty());
        assert!(!page.has_more);
    }
}
