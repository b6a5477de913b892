//! Pipeline: walk the root, check every entry, aggregate, dispatch.

#![allow(missing_docs)]

use chrono::NaiveDate;
use serde::Serialize;

use crate::core::config::Config;
use crate::notify::{DispatchSummary, NotificationManager, subject_for};
use crate::scanner::aggregator::ViolationAggregator;
use crate::scanner::rules::{CheckOutcome, IgnoreSet, RuleChecker, ValidationError};
use crate::scanner::walker::DirectoryWalker;
use crate::storage::{EntryKind, ListingProvider};

/// Everything one scan found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub root_path: String,
    pub entries_checked: usize,
    pub folders_checked: usize,
    pub files_checked: usize,
    pub entries_ignored: usize,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub violations: Vec<ValidationError>,
}

impl ScanReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// False when a listing page failed and part of the tree went unchecked.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.pages_failed == 0
    }
}

/// Result of a scheduled run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub report: ScanReport,
    /// Subject used for dispatch; `None` when nothing was sent.
    pub subject: Option<String>,
    pub dispatch: DispatchSummary,
}

/// Walk `config.storage.root_path` and check every entry against the naming rules.
pub fn scan<P: ListingProvider>(config: &Config, provider: P) -> ScanReport {
    let checker = RuleChecker::new(IgnoreSet::from_config(&config.ignore));
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        root = %config.storage.root_path,
        "starting invoice validation"
    );
    tracing::info!("folders to ignore: {:?}", checker.ignore_set().folder_names());
    tracing::info!("files to ignore: {:?}", checker.ignore_set().file_names());

    let mut report = ScanReport {
        root_path: config.storage.root_path.clone(),
        ..ScanReport::default()
    };
    let mut aggregator = ViolationAggregator::new();
    let mut walker = DirectoryWalker::new(provider, config.storage.root_path.as_str());

    for entry in walker.by_ref() {
        report.entries_checked += 1;
        match entry.kind {
            EntryKind::Folder => report.folders_checked += 1,
            EntryKind::File => report.files_checked += 1,
        }
        match checker.check(&entry) {
            CheckOutcome::Ignored => report.entries_ignored += 1,
            CheckOutcome::Passed => {}
            CheckOutcome::Violation(err) => aggregator.add_error(err),
        }
    }

    let stats = walker.stats();
    report.pages_fetched = stats.pages_fetched;
    report.pages_failed = stats.pages_failed;

    let (valid, errors) = aggregator.is_valid();
    if valid {
        tracing::info!("all files and folders passed validation");
    } else {
        tracing::info!("found {} failed validations", errors.len());
        for err in errors {
            tracing::info!("{err}");
        }
        report.violations = errors.to_vec();
    }

    if !report.is_complete() {
        tracing::warn!(
            pages_failed = report.pages_failed,
            "listing ended early, the scan is incomplete"
        );
    }
    tracing::info!(
        entries = report.entries_checked,
        violations = report.violations.len(),
        "scan finished"
    );
    report
}

/// Scan, then notify every channel when violations were found.
///
/// Delivery failures are recorded in the outcome, not returned as errors.
pub fn run<P: ListingProvider>(
    config: &Config,
    provider: P,
    manager: &NotificationManager,
    today: NaiveDate,
) -> RunOutcome {
    let report = scan(config, provider);

    if report.is_clean() || manager.channel_count() == 0 {
        return RunOutcome {
            report,
            subject: None,
            dispatch: DispatchSummary::default(),
        };
    }

    let subject = subject_for(&config.notifications.subject, today);
    let dispatch = manager.notify(&subject, &report.violations);
    RunOutcome {
        report,
        subject: Some(subject),
        dispatch,
    }
}
