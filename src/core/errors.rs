//! IV-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, IvError>;

/// Top-level error type for the invoices validator.
#[derive(Debug, Error)]
pub enum IvError {
    #[error("[IV-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[IV-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[IV-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[IV-1004] required setting(s) not set: {}", keys.join(", "))]
    MissingSetting { keys: Vec<&'static str> },

    #[error("[IV-2001] listing failure in {operation}: {details}")]
    Listing {
        operation: &'static str,
        details: String,
    },

    #[error("[IV-3001] {channel} transport failure: {details}")]
    Transport {
        channel: &'static str,
        details: String,
    },

    #[error("[IV-3002] empty {channel} recipient list")]
    EmptyRecipients { channel: &'static str },

    #[error("[IV-3003] could not format {channel} content: {details}")]
    Format {
        channel: &'static str,
        details: String,
    },

    #[error("[IV-3004] no usable notifier among requested channels: {}", requested.join(":"))]
    NoUsableNotifiers { requested: Vec<String> },

    #[error("[IV-3101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[IV-3902] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[IV-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl IvError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "IV-1001",
            Self::MissingConfig { .. } => "IV-1002",
            Self::ConfigParse { .. } => "IV-1003",
            Self::MissingSetting { .. } => "IV-1004",
            Self::Listing { .. } => "IV-2001",
            Self::Transport { .. } => "IV-3001",
            Self::EmptyRecipients { .. } => "IV-3002",
            Self::Format { .. } => "IV-3003",
            Self::NoUsableNotifiers { .. } => "IV-3004",
            Self::Serialization { .. } => "IV-3101",
            Self::Io { .. } => "IV-3902",
            Self::Runtime { .. } => "IV-3900",
        }
    }

    /// Whether the run must abort before (or instead of) scanning.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::MissingConfig { .. }
                | Self::ConfigParse { .. }
                | Self::MissingSetting { .. }
                | Self::NoUsableNotifiers { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for IvError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for IvError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for IvError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<IvError> {
        vec![
            IvError::InvalidConfig {
                details: String::new(),
            },
            IvError::MissingConfig {
                path: PathBuf::new(),
            },
            IvError::ConfigParse {
                context: "",
                details: String::new(),
            },
            IvError::MissingSetting { keys: Vec::new() },
            IvError::Listing {
                operation: "",
                details: String::new(),
            },
            IvError::Transport {
                channel: "",
                details: String::new(),
            },
            IvError::EmptyRecipients { channel: "" },
            IvError::Format {
                channel: "",
                details: String::new(),
            },
            IvError::NoUsableNotifiers {
                requested: Vec::new(),
            },
            IvError::Serialization {
                context: "",
                details: String::new(),
            },
            IvError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            IvError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = all_variants();
        let codes: Vec<&str> = errors.iter().map(IvError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn display_includes_code() {
        for err in all_variants() {
            let msg = err.to_string();
            assert!(
                msg.contains(err.code()),
                "display should contain error code: {msg}"
            );
        }
    }

    #[test]
    fn missing_setting_lists_every_key() {
        let err = IvError::MissingSetting {
            keys: vec!["DROPBOX_TOKEN", "DROPBOX_PATH"],
        };
        let msg = err.to_string();
        assert!(msg.contains("DROPBOX_TOKEN, DROPBOX_PATH"), "{msg}");
    }

    #[test]
    fn no_usable_notifiers_lists_requested_channels() {
        let err = IvError::NoUsableNotifiers {
            requested: vec!["email".to_string(), "sms".to_string()],
        };
        assert!(err.to_string().contains("email:sms"));
    }

    #[test]
    fn fatal_errors_are_configuration_errors() {
        assert!(IvError::MissingSetting { keys: Vec::new() }.is_fatal());
        assert!(
            IvError::NoUsableNotifiers {
                requested: Vec::new()
            }
            .is_fatal()
        );
        assert!(!IvError::EmptyRecipients { channel: "sms" }.is_fatal());
        assert!(
            !IvError::Listing {
                operation: "list_folder",
                details: String::new()
            }
            .is_fatal()
        );
    }

    #[test]
    fn io_convenience_constructor() {
        let err = IvError::io(
            "/tmp/config.toml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "IV-3902");
        assert!(err.to_string().contains("/tmp/config.toml"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: IvError = json_err.into();
        assert_eq!(err.code(), "IV-3101");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: IvError = toml_err.into();
        assert_eq!(err.code(), "IV-1003");
    }
}
