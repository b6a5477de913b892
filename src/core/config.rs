//! Configuration system: optional TOML file + env var overrides + defaults.
//!
//! Every setting can be supplied through the environment. List values in the
//! environment are colon-delimited (`"email:sms"`).

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{IvError, Result};
use crate::notify::NotificationConfig;

pub const DROPBOX_TOKEN_ENV: &str = "DROPBOX_TOKEN";
pub const DROPBOX_PATH_ENV: &str = "DROPBOX_PATH";
pub const FOLDERS_TO_IGNORE_ENV: &str = "FOLDERS_TO_IGNORE";
pub const FILES_TO_IGNORE_ENV: &str = "FILES_TO_IGNORE";
pub const NOTIFIERS_ENV: &str = "NOTIFIERS";
pub const NOTIFIER_SUBJECT_ENV: &str = "NOTIFIER_SUBJECT";
pub const SENDGRID_API_KEY_ENV: &str = "SENDGRID_API_KEY";
pub const NOTIFIER_SENDER_NAME_ENV: &str = "NOTIFIER_SENDER_NAME";
pub const NOTIFIER_SENDER_EMAIL_ENV: &str = "NOTIFIER_SENDER_EMAIL";
pub const NOTIFIER_EMAILS_ENV: &str = "NOTIFIER_EMAILS";
pub const TWILIO_API_KEY_ENV: &str = "TWILIO_API_KEY";
pub const TWILIO_ACCOUNT_SID_ENV: &str = "TWILIO_ACCOUNT_SID";
pub const NOTIFIER_SENDER_PHONE_NUMBER_ENV: &str = "NOTIFIER_SENDER_PHONE_NUMBER";
pub const NOTIFIER_PHONE_NUMBERS_ENV: &str = "NOTIFIER_PHONE_NUMBERS";

const REDACTED: &str = "********";

/// Full validator configuration. Built once at startup and passed by reference
/// into the walker, the rule checker and the notification manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub ignore: IgnoreConfig,
    pub notifications: NotificationConfig,
    /// File the config was read from, if any.
    #[serde(skip)]
    pub source_file: Option<PathBuf>,
}

/// Dropbox access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub access_token: String,
    pub root_path: String,
}

/// Names excluded from validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Folder names, matched case-insensitively against the folder and its parents.
    pub folders: Vec<String>,
    /// File names, matched exactly.
    pub files: Vec<String>,
}

impl Config {
    /// Default configuration path: `$HOME/.config/invoices-validator/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        default_path_from(env_var("HOME"))
    }

    /// Load config from the default or an explicit path, then apply env overrides
    /// and validate.
    ///
    /// A missing file at the default path is not an error; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, env_var)
    }

    /// Same as [`Config::load`], reading the environment through `lookup`.
    pub fn load_with<F>(path: Option<&Path>, mut lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let resolved = match path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(IvError::MissingConfig {
                        path: explicit.to_path_buf(),
                    });
                }
                Some(explicit.to_path_buf())
            }
            None => default_path_from(lookup("HOME")).filter(|p| p.exists()),
        };

        let mut cfg = match &resolved {
            Some(file) => {
                let raw = fs::read_to_string(file).map_err(|source| IvError::io(file, source))?;
                toml::from_str::<Self>(&raw)?
            }
            None => Self::default(),
        };

        cfg.source_file = resolved;
        cfg.apply_env_overrides_from(|name| lookup(name).filter(|raw| !raw.trim().is_empty()));
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check that the settings required before any scan work are present.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.storage.access_token.trim().is_empty() {
            missing.push(DROPBOX_TOKEN_ENV);
        }
        if self.storage.root_path.trim().is_empty() {
            missing.push(DROPBOX_PATH_ENV);
        }
        if !missing.is_empty() {
            return Err(IvError::MissingSetting { keys: missing });
        }

        if !is_dropbox_root(&self.storage.root_path) {
            return Err(IvError::InvalidConfig {
                details: format!(
                    "{DROPBOX_PATH_ENV} must be an absolute Dropbox path or an id:/ns: reference, got {:?}",
                    self.storage.root_path
                ),
            });
        }
        Ok(())
    }

    /// Copy with credentials masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        redact(&mut copy.storage.access_token);
        redact(&mut copy.notifications.email.api_key);
        redact(&mut copy.notifications.sms.api_key);
        copy
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        // storage
        set_string(&mut lookup, DROPBOX_TOKEN_ENV, &mut self.storage.access_token);
        set_string(&mut lookup, DROPBOX_PATH_ENV, &mut self.storage.root_path);

        // ignore lists
        set_list(&mut lookup, FOLDERS_TO_IGNORE_ENV, &mut self.ignore.folders);
        set_list(&mut lookup, FILES_TO_IGNORE_ENV, &mut self.ignore.files);

        // notifications
        let notifications = &mut self.notifications;
        set_list(&mut lookup, NOTIFIERS_ENV, &mut notifications.channels);
        set_string(&mut lookup, NOTIFIER_SUBJECT_ENV, &mut notifications.subject);

        let email = &mut notifications.email;
        set_string(&mut lookup, SENDGRID_API_KEY_ENV, &mut email.api_key);
        set_string(&mut lookup, NOTIFIER_SENDER_NAME_ENV, &mut email.sender_name);
        set_string(&mut lookup, NOTIFIER_SENDER_EMAIL_ENV, &mut email.sender_email);
        set_string(&mut lookup, NOTIFIER_EMAILS_ENV, &mut email.recipients);

        let sms = &mut notifications.sms;
        set_string(&mut lookup, TWILIO_API_KEY_ENV, &mut sms.api_key);
        set_string(&mut lookup, TWILIO_ACCOUNT_SID_ENV, &mut sms.account_sid);
        set_string(
            &mut lookup,
            NOTIFIER_SENDER_PHONE_NUMBER_ENV,
            &mut sms.sender_number,
        );
        set_string(&mut lookup, NOTIFIER_PHONE_NUMBERS_ENV, &mut sms.recipients);
    }
}

/// Split a colon-delimited list, trimming tokens and dropping empty ones.
#[must_use]
pub fn split_colon_list(raw: &str) -> Vec<String> {
    raw.split(':')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn default_path_from(home: Option<String>) -> Option<PathBuf> {
    home.map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("invoices-validator")
            .join("config.toml")
    })
}

/// Dropbox accepts `/path`, `id:<file id>` and `ns:<namespace>[/path]` roots.
fn is_dropbox_root(path: &str) -> bool {
    path.starts_with('/') || path.starts_with("id:") || path.starts_with("ns:")
}

fn redact(slot: &mut String) {
    if !slot.is_empty() {
        *slot = REDACTED.to_string();
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_string<F>(lookup: &mut F, name: &str, slot: &mut String)
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(raw) = lookup(name) {
        *slot = raw.trim().to_string();
    }
}

fn set_list<F>(lookup: &mut F, name: &str, slot: &mut Vec<String>)
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(raw) = lookup(name) {
        *slot = split_colon_list(&raw);
    }
}
