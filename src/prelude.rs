//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use invoices_validator::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{IvError, Result};

// Storage
pub use crate::storage::dropbox::DropboxClient;
pub use crate::storage::{Entry, EntryKind, ListPage, ListingProvider};

// Scanner
pub use crate::scanner::aggregator::ViolationAggregator;
pub use crate::scanner::rules::{CheckOutcome, IgnoreSet, RuleChecker, ValidationError};
pub use crate::scanner::walker::{DirectoryWalker, walk};

// Notify
pub use crate::notify::{DispatchSummary, NotificationManager, Notifier, subject_for};

// Pipeline
pub use crate::controller::{RunOutcome, ScanReport, run, scan};
