//! Naming rules for invoice folders and files, plus the ignore lists.
//!
//! Folder ignores are case-insensitive; file ignores are exact.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::config::IgnoreConfig;
use crate::storage::{Entry, EntryKind};

/// A comma means the folder was named "Last, First".
pub const FOLDER_NAME_PATTERN: &str = "^[^,]*$";
pub const FOLDER_NAME_EXPECTED: &str = "First Last, ie John Doe";

/// `MMDDCY-NN.docx`, where `C` is the decade digit (1 or 2).
pub const FILE_NAME_PATTERN: &str =
    r"^(0[1-9]|1[0-2])(0[1-9]|1[0-9]|2[0-9]|3[01])(1|2)[0-9]-[0-9]{2}\.docx$";
pub const FILE_NAME_EXPECTED: &str = "Something like \"013119-01.docx\"";

/// One naming violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Observed name, quoted.
    pub actual: String,
    /// Human-readable description of the expected pattern.
    pub expected: String,
    /// Where the entry lives, e.g. `Folder: "/Invoices/Doe, John"`.
    pub additional_info: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: actual {}, expected {}",
            self.additional_info, self.actual, self.expected
        )
    }
}

/// A regex over entry names with the text shown when it does not match.
#[derive(Debug, Clone)]
pub struct NameRule {
    regex: Option<Regex>,
    expected: &'static str,
}

impl NameRule {
    /// Compile `pattern`. A pattern that fails to compile is logged and the
    /// rule then rejects every name.
    #[must_use]
    pub fn new(pattern: &str, expected: &'static str) -> Self {
        let regex = match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(err) => {
                tracing::error!("invalid name pattern {pattern:?}, every name will fail: {err}");
                None
            }
        };
        Self { regex, expected }
    }

    #[must_use]
    pub fn folder_name() -> Self {
        Self::new(FOLDER_NAME_PATTERN, FOLDER_NAME_EXPECTED)
    }

    #[must_use]
    pub fn file_name() -> Self {
        Self::new(FILE_NAME_PATTERN, FILE_NAME_EXPECTED)
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.regex.as_ref().is_some_and(|regex| regex.is_match(name))
    }

    /// `None` when `name` matches, otherwise the violation to record.
    #[must_use]
    pub fn validate(&self, name: &str, additional_info: String) -> Option<ValidationError> {
        if self.matches(name) {
            return None;
        }
        Some(ValidationError {
            actual: format!("{name:?}"),
            expected: self.expected.to_string(),
            additional_info,
        })
    }
}

/// Configured names excluded from validation. Immutable for a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    /// Lowercased.
    folders: HashSet<String>,
    /// Exact.
    files: HashSet<String>,
}

impl IgnoreSet {
    pub fn new<F, G, S, T>(folders: F, files: G) -> Self
    where
        F: IntoIterator<Item = S>,
        G: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: Into<String>,
    {
        Self {
            folders: folders
                .into_iter()
                .map(|name| name.as_ref().to_lowercase())
                .collect(),
            files: files.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn from_config(config: &IgnoreConfig) -> Self {
        Self::new(&config.folders, config.files.iter().cloned())
    }

    /// Whether any folder above `entry` is ignored.
    #[must_use]
    pub fn ignores_parent_of(&self, entry: &Entry) -> bool {
        entry
            .parent_segments()
            .iter()
            .any(|segment| self.folders.contains(*segment))
    }

    #[must_use]
    pub fn ignores_folder(&self, entry: &Entry) -> bool {
        self.ignores_parent_of(entry) || self.folders.contains(&entry.name.to_lowercase())
    }

    #[must_use]
    pub fn ignores_file(&self, entry: &Entry) -> bool {
        self.ignores_parent_of(entry) || self.files.contains(&entry.name)
    }

    #[must_use]
    pub fn folder_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.folders.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn file_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.files.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Result of checking one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Ignored,
    Passed,
    Violation(ValidationError),
}

impl CheckOutcome {
    #[must_use]
    pub fn into_violation(self) -> Option<ValidationError> {
        match self {
            Self::Violation(err) => Some(err),
            Self::Ignored | Self::Passed => None,
        }
    }
}

/// Applies the ignore lists and the naming rules to entries.
#[derive(Debug, Clone)]
pub struct RuleChecker {
    ignore: IgnoreSet,
    folder_rule: NameRule,
    file_rule: NameRule,
}

impl RuleChecker {
    #[must_use]
    pub fn new(ignore: IgnoreSet) -> Self {
        Self::with_rules(ignore, NameRule::folder_name(), NameRule::file_name())
    }

    #[must_use]
    pub fn with_rules(ignore: IgnoreSet, folder_rule: NameRule, file_rule: NameRule) -> Self {
        Self {
            ignore,
            folder_rule,
            file_rule,
        }
    }

    #[must_use]
    pub const fn ignore_set(&self) -> &IgnoreSet {
        &self.ignore
    }

    #[must_use]
    pub fn check(&self, entry: &Entry) -> CheckOutcome {
        match entry.kind {
            EntryKind::Folder => self.check_folder(entry),
            EntryKind::File => self.check_file(entry),
        }
    }

    #[must_use]
    pub fn check_folder(&self, entry: &Entry) -> CheckOutcome {
        if self.ignore.ignores_folder(entry) {
            tracing::debug!("ignoring folder {:?}", entry.name);
            return CheckOutcome::Ignored;
        }
        tracing::debug!("found folder {:?}", entry.name);
        outcome(
            self.folder_rule
                .validate(&entry.name, format!("Folder: {:?}", entry.path_display)),
        )
    }

    #[must_use]
    pub fn check_file(&self, entry: &Entry) -> CheckOutcome {
        if self.ignore.ignores_file(entry) {
            tracing::debug!("ignoring file {:?}", entry.path_display);
            return CheckOutcome::Ignored;
        }
        tracing::debug!("found file {:?}", entry.path_display);
        outcome(
            self.file_rule
                .validate(&entry.name, format!("File: {:?}", entry.path_display)),
        )
    }
}

fn outcome(violation: Option<ValidationError>) -> CheckOutcome {
    violation.map_or(CheckOutcome::Passed, CheckOutcome::Violation)
}
